//! Azure Data Lake Storage Gen2 access
//!
//! [`StorageConnector`] turns an account name and key into a [`DataLake`]
//! handle; the handle enumerates paths and reads file properties. The
//! production implementation talks to the ADLS Gen2 REST API with Shared Key
//! authorization.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

mod client;
mod shared_key;

pub use client::DataLakeServiceClient;
pub use shared_key::SharedKeySigner;

/// One item returned by a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub name: String,
    pub is_directory: bool,
}

/// Properties of a single file; either value may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileProperties {
    pub content_length: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Authenticated handle to one storage account
#[async_trait]
pub trait DataLake: Send + Sync {
    /// Enumerate every path under `directory` in `file_system`, recursively
    async fn list_paths(&self, file_system: &str, directory: &str) -> Result<Vec<PathEntry>>;

    /// Read the properties of the file at `path`
    async fn file_properties(&self, file_system: &str, path: &str) -> Result<FileProperties>;
}

/// Builds [`DataLake`] handles from account credentials
pub trait StorageConnector: Send + Sync {
    fn connect(&self, account_name: &str, account_key: &str) -> Result<Arc<dyn DataLake>>;
}

/// Connects to `https://{account}.dfs.core.windows.net` using the account key
#[derive(Debug, Default, Clone, Copy)]
pub struct AdlsConnector;

impl StorageConnector for AdlsConnector {
    fn connect(&self, account_name: &str, account_key: &str) -> Result<Arc<dyn DataLake>> {
        let client = DataLakeServiceClient::new(account_name, account_key)?;
        Ok(Arc::new(client))
    }
}

/// Service endpoint for a storage account
pub fn account_url(account_name: &str) -> String {
    format!("https://{}.dfs.core.windows.net", account_name)
}

/// Storage account names are 3-24 characters of lowercase letters and digits
pub fn is_valid_account_name(name: &str) -> bool {
    (3..=24).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}
