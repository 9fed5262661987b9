//! Chat front end: commands, button menus and message routing.
//!
//! Transports turn platform updates into [`Inbound`] events and deliver
//! [`Reply`] values through an [`Outbox`]; everything in between is shared.

mod handler;
pub mod menu;
mod message;

pub use handler::{Bot, BotOptions};
pub use menu::{Action, Button, Menu};
pub use message::{ChatId, Command, Event, FileKind, Inbound, Outbox, Reply};
