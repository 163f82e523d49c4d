pub mod chunks;
pub mod cli;
pub mod output;
pub mod tasks;
pub mod templates;
