//! Browsing client: the page/selection state machine and the terminal shell
//! that drives it against a running server.

pub mod api;
pub mod controller;
pub mod location;
pub mod permalink;
pub mod shell;
pub mod viewer;
