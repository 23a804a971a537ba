//! IMAP command handlers for the fake server.
//!
//! Each module processes one family of commands: session housekeeping
//! (CAPABILITY, LOGIN, NOOP, LOGOUT), LIST/LSUB, STATUS, and
//! SUBSCRIBE/UNSUBSCRIBE.

mod list;
mod session;
mod status;
mod subscribe;

pub use list::handle_list;
pub use session::{handle_capability, handle_login, handle_logout, handle_noop};
pub use status::handle_status;
pub use subscribe::handle_subscribe;
