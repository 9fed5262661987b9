//! Per-user session tracking: pending links, multi-step flows and history.

mod state;
mod store;
mod url;

pub use state::{parse_window, FlowInput, PendingOperation, SessionState, Stage, UploadAction, ARCHIVE_DONE};
pub use store::{SessionStore, SharedContext, UserContext, UserId};
pub use self::url::UrlExtractor;
