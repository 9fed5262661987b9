//! Local terminal transport for trying the bot without Telegram.

use crate::bot::{ChatId, Event, FileKind, Inbound, Outbox, Reply};
use crate::error::Result;
use crate::session::UserId;
use async_trait::async_trait;
use console::style;
use std::path::{Path, PathBuf};

/// User and chat id used for the console session.
pub const CONSOLE_USER: UserId = 0;

/// One line typed at the console.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleLine {
    Quit,
    Empty,
    Event(Inbound),
}

/// Parse a console line.
///
/// `#data` presses the button with that callback data, `file <path>` uploads
/// a local file, `exit`/`quit` leave, anything else is a chat message.
pub fn parse_line(line: &str) -> ConsoleLine {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleLine::Empty;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return ConsoleLine::Quit;
    }

    let event = if let Some(data) = line.strip_prefix('#') {
        Event::Button(data.trim().to_string())
    } else if let Some(rest) = line.strip_prefix("file ") {
        let mut parts = rest.trim().splitn(2, " -- ");
        let path = PathBuf::from(shellexpand::tilde(parts.next().unwrap_or_default().trim()).into_owned());
        let caption = parts.next().map(|c| c.trim().to_string());
        Event::File {
            kind: guess_kind(&path),
            path,
            caption,
        }
    } else {
        return ConsoleLine::Event(Inbound::text(CONSOLE_USER, CONSOLE_USER, line));
    };

    ConsoleLine::Event(Inbound {
        user: CONSOLE_USER,
        chat: CONSOLE_USER,
        event,
    })
}

fn guess_kind(path: &Path) -> FileKind {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" | "mkv" | "webm" | "avi" | "mov" => FileKind::Video,
        "mp3" | "wav" | "aac" | "m4a" | "ogg" | "flac" => FileKind::Audio,
        "jpg" | "jpeg" | "png" | "webp" | "bmp" | "gif" | "tiff" => FileKind::Photo,
        _ => FileKind::Document,
    }
}

/// Prints replies, showing menu buttons with the data to type.
pub struct ConsoleOutbox;

#[async_trait]
impl Outbox for ConsoleOutbox {
    async fn send(&self, _chat: ChatId, reply: Reply) -> Result<()> {
        println!("\n{} {}", style("Bot:").cyan().bold(), reply.text);
        if let Some(menu) = reply.menu {
            for row in menu {
                let buttons: Vec<String> = row
                    .iter()
                    .map(|b| format!("{} {}", b.label, style(format!("#{}", b.data)).dim()))
                    .collect();
                println!("  {}", buttons.join("   "));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::Command;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("  "), ConsoleLine::Empty);
        assert_eq!(parse_line("QUIT"), ConsoleLine::Quit);

        let ConsoleLine::Event(inbound) = parse_line("#download_high") else {
            panic!("expected event");
        };
        assert_eq!(inbound.event, Event::Button("download_high".into()));

        let ConsoleLine::Event(inbound) = parse_line("/clear") else {
            panic!("expected event");
        };
        assert_eq!(inbound.event, Event::Command(Command::Clear));
    }

    #[test]
    fn test_parse_file_line() {
        let ConsoleLine::Event(inbound) = parse_line("file clips/a.MP4 -- cut the intro") else {
            panic!("expected event");
        };
        assert_eq!(
            inbound.event,
            Event::File {
                path: PathBuf::from("clips/a.MP4"),
                kind: FileKind::Video,
                caption: Some("cut the intro".into()),
            }
        );
        assert_eq!(guess_kind(Path::new("x.png")), FileKind::Photo);
        assert_eq!(guess_kind(Path::new("x.zip")), FileKind::Document);
    }
}
