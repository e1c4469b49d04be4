pub mod config;
pub mod error;
pub mod paths;

pub use config::{BrowserConfig, BrowserKind, Config, ResolverConfig};
pub use error::{Error, Result};
pub use paths::Paths;
