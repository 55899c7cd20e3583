pub mod config;
pub mod error;
pub mod gate;
pub mod git;
pub mod manifest;
pub mod orchestrator;
pub mod registry;
pub mod ui;
pub mod version;

pub use error::{ReleaseError, Result};
