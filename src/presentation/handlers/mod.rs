mod health;
mod root;
mod transcribe;

pub use health::{HealthResponse, health_handler};
pub use root::{RootResponse, root_handler};
pub use transcribe::{ErrorResponse, transcribe_handler};
