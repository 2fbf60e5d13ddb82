//! Display helpers shared by the table printer and the TUI

use adls_meta_core::ViewerError;
use chrono::{DateTime, Utc};
use miette::Diagnostic;

/// Last-modified column text; empty when the service reported none
pub fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_default()
}

/// Error text with its help line, as shown to the user
pub fn error_message(err: &ViewerError) -> String {
    match err.help() {
        Some(help) => format!("{}\n\n{}", err, help),
        None => err.to_string(),
    }
}
