// Library interface for adls-meta
pub mod config;
pub mod error;
pub mod inputs;
pub mod listing;
pub mod pipeline;
pub mod record;
pub mod secrets;
pub mod storage;

// Re-export commonly used items
pub use error::{Result, ViewerError};
pub use inputs::{Field, FormInputs};
pub use pipeline::{NO_FILES_MESSAGE, Outcome, Pipeline};
pub use record::{FileRecord, FileTable};
