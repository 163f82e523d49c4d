#[allow(clippy::module_inception)]
pub mod error;
pub mod backend;

pub use backend::{BackendError, TransportKind};
pub use error::{CliError, ClientError, WorkbenchError};
