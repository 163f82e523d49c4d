pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod notify;
pub mod selection;
pub mod task;
pub mod template;
pub mod workbench;
