//! Everything that talks to, or reads credentials for, the auth endpoints:
//! the http client, cookie-string parsing, and the navigation seam.

pub mod client;
pub mod cookies;
pub mod navigator;
