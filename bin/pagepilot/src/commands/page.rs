use pagepilot_tools::browser::{describe as describe_page, perform_action};
use serde_json::Value;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::open_session;

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Describe the current page (about:blank unless `url` is given).
pub async fn describe(config_path: Option<&Path>, url: Option<&str>) -> anyhow::Result<()> {
    let mut session = open_session(config_path)?;
    let description = describe_page(&mut session, url).await?;
    print_json(&serde_json::to_value(description)?)
}

/// Optionally load `url`, then perform `target`. Exits non-zero when the
/// target could not be resolved.
pub async fn act(config_path: Option<&Path>, target: &str, url: Option<&str>) -> anyhow::Result<()> {
    let mut session = open_session(config_path)?;
    if url.is_some() {
        describe_page(&mut session, url).await?;
    }

    let report = perform_action(&mut session, target).await?;
    let success = report.is_success();
    print_json(&serde_json::to_value(report)?)?;
    // exit() skips destructors; shut the browser down first.
    session.close();
    if !success {
        std::process::exit(2);
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum ShellCommand<'a> {
    Describe(Option<&'a str>),
    Act(&'a str),
    Help,
    Quit,
    Empty,
    Unknown(&'a str),
}

fn parse_line(line: &str) -> ShellCommand<'_> {
    let line = line.trim();
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };
    match cmd {
        "" => ShellCommand::Empty,
        "describe" | "d" => ShellCommand::Describe(Some(rest).filter(|r| !r.is_empty())),
        "act" | "a" if !rest.is_empty() => ShellCommand::Act(rest),
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => ShellCommand::Unknown(other),
    }
}

const SHELL_HELP: &str = "Commands:
  describe [url]   describe the current page, or load url first
  act <target>     click a target (selector, id, text, href or button name)
  quit             close the browser and exit";

/// Read commands from stdin against one browser session.
pub async fn shell(config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut session = open_session(config_path)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    eprintln!("pagepilot shell. Type 'help' for commands.");
    loop {
        stdout.write_all(b"pagepilot> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_line(&line) {
            ShellCommand::Empty => {}
            ShellCommand::Help => eprintln!("{}", SHELL_HELP),
            ShellCommand::Quit => break,
            ShellCommand::Unknown(cmd) => eprintln!("Unknown command '{}'. Type 'help'.", cmd),
            ShellCommand::Describe(url) => match describe_page(&mut session, url).await {
                Ok(description) => print_json(&serde_json::to_value(description)?)?,
                Err(e) => eprintln!("Error: {}", e),
            },
            ShellCommand::Act(target) => match perform_action(&mut session, target).await {
                Ok(report) => print_json(&serde_json::to_value(report)?)?,
                Err(e) => eprintln!("Error: {}", e),
            },
        }
    }

    session.close();
    Ok(())
}
