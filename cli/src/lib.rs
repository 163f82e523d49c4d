//! codelib-cli library: command handlers exposed for unit tests.

pub mod commands;
pub mod notify;
pub mod utils;
