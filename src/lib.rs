//! Watches user activity on behalf of a logged-in session, asks the server
//! to end the session after a period of inactivity, and periodically
//! confirms the session is still authenticated. Can be embedded in a richer
//! client through the activity channel, or run standalone with activity
//! keywords piped to stdin.

pub mod cli;
pub mod monitor;
pub mod session;
pub mod utils;
