//! Pre-flight checks before starting the bot.
//!
//! Validates that required tools and configuration are available
//! before a long-running command starts and fails on the first message.

use crate::config::Settings;
use crate::error::{MediabotError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Serving users needs the model key and the media programs.
    Bot,
    /// Listing tools needs nothing.
    Tools,
}

/// Programs the media tools shell out to.
pub const REQUIRED_PROGRAMS: [&str; 3] = ["yt-dlp", "ffmpeg", "ffprobe"];

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Bot => {
            check_api_key(&settings.llm.api_key_env)?;
            for program in REQUIRED_PROGRAMS {
                check_tool(program)?;
            }
        }
        Operation::Tools => {}
    }
    Ok(())
}

/// Check that the model API key variable is set.
fn check_api_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(MediabotError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(MediabotError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(MediabotError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(MediabotError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(MediabotError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
