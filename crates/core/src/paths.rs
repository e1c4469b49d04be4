use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Paths {
    pub base: PathBuf,
}

impl Paths {
    pub fn new() -> Self {
        let base = dirs::home_dir()
            .map(|h| h.join(".pagepilot"))
            .unwrap_or_else(|| PathBuf::from(".pagepilot"));
        Self { base }
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.json")
    }

    /// Scratch profile directory for the browser launched by this process.
    ///
    /// Lives under the system temp dir and is keyed by pid, so nothing from a
    /// previous run (cookies, storage) leaks into a new session.
    pub fn browser_profile_dir(&self) -> PathBuf {
        std::env::temp_dir().join(format!("pagepilot-profile-{}", std::process::id()))
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.base)?;
        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_under_base() {
        let paths = Paths::with_base(PathBuf::from("/tmp/pp"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/pp/config.json"));
    }

    #[test]
    fn test_profile_dir_is_per_process() {
        let paths = Paths::new();
        let dir = paths.browser_profile_dir();
        let name = dir.file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(name, format!("pagepilot-profile-{}", std::process::id()));
    }
}
