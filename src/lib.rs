pub mod cli;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod model;
pub mod postprocess;
pub mod prompt;
pub mod reader;
pub mod util;

pub use client::{Summary, Usage};
pub use error::{ApiError, ConfigurationError, Error, ExtractionError};
pub use model::{Model, Vendor};
pub use reader::Reader;
