pub mod compare;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod model;
pub mod orchestrator;
pub mod runner;
pub mod transport;
pub mod verify;

// Re-export key types for external use
pub use config::{EndpointConfig, Settings};
pub use error::{HarnessError, Result};
pub use orchestrator::TestCaseOrchestrator;
pub use runner::{RunReport, Suite, SuiteRunner};
pub use transport::{HttpTransport, Transport};
