//! The list-files run: validate, fetch key, connect, list
//!
//! Every step returns a `Result`; [`Pipeline::run`] folds the first failure
//! into an [`Outcome`] so the caller renders every kind of failure the same
//! way.

use std::sync::Arc;

use crate::error::ViewerError;
use crate::inputs::FormInputs;
use crate::listing::list_files_and_metadata;
use crate::record::FileTable;
use crate::secrets::{KeyVaultSecretSource, SecretSource};
use crate::storage::{AdlsConnector, StorageConnector};

/// Shown instead of a table when nothing was listed
pub const NO_FILES_MESSAGE: &str = "No files found or error retrieving files.";

/// Result of one run
#[derive(Debug)]
pub enum Outcome {
    /// A required input was empty; no call was made
    Invalid(ViewerError),
    /// The storage key could not be read from the vault
    SecretFailed(ViewerError),
    /// No storage handle could be built; nothing was listed
    StorageFailed(ViewerError),
    /// Enumeration failed; `table` is always empty
    ListingFailed { error: ViewerError, table: FileTable },
    /// Enumeration succeeded (the table may still be empty)
    Listed(FileTable),
}

impl Outcome {
    pub fn error(&self) -> Option<&ViewerError> {
        match self {
            Outcome::Invalid(e)
            | Outcome::SecretFailed(e)
            | Outcome::StorageFailed(e)
            | Outcome::ListingFailed { error: e, .. } => Some(e),
            Outcome::Listed(_) => None,
        }
    }

    pub fn into_error(self) -> Option<ViewerError> {
        match self {
            Outcome::Invalid(e)
            | Outcome::SecretFailed(e)
            | Outcome::StorageFailed(e)
            | Outcome::ListingFailed { error: e, .. } => Some(e),
            Outcome::Listed(_) => None,
        }
    }

    /// The table to render, if the run got as far as listing
    pub fn table(&self) -> Option<&FileTable> {
        match self {
            Outcome::ListingFailed { table, .. } | Outcome::Listed(table) => Some(table),
            _ => None,
        }
    }

    /// Whether the renderer should show [`NO_FILES_MESSAGE`]
    pub fn shows_no_files_message(&self) -> bool {
        self.table().is_some_and(FileTable::is_empty)
    }
}

/// Runs the steps against a secret source and a storage connector
#[derive(Clone)]
pub struct Pipeline {
    secrets: Arc<dyn SecretSource>,
    storage: Arc<dyn StorageConnector>,
}

impl Pipeline {
    pub fn new(secrets: Arc<dyn SecretSource>, storage: Arc<dyn StorageConnector>) -> Self {
        Self { secrets, storage }
    }

    /// Azure Key Vault for the key, ADLS Gen2 REST for the listing
    pub fn azure() -> Self {
        Self::new(Arc::new(KeyVaultSecretSource), Arc::new(AdlsConnector))
    }

    pub async fn run(&self, inputs: &FormInputs) -> Outcome {
        let request = match inputs.validate() {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!("Not running: {}", e);
                return Outcome::Invalid(e);
            }
        };

        tracing::debug!("Resolving storage key '{}'", request.secret.secret_name);
        let account_key = match self.secrets.fetch_secret(&request.secret).await {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!("Failed to get storage key from Key Vault: {}", e);
                return Outcome::SecretFailed(e);
            }
        };

        tracing::debug!("Connecting to storage account '{}'", request.storage_account);
        let lake = match self.storage.connect(&request.storage_account, &account_key) {
            Ok(lake) => lake,
            Err(e) => {
                tracing::warn!("{}", e);
                return Outcome::StorageFailed(e);
            }
        };

        match list_files_and_metadata(
            lake.as_ref(),
            &request.file_system,
            &request.directory_path,
        )
        .await
        {
            Ok(table) => {
                tracing::info!(
                    "Found {} files under '{}' in '{}'",
                    table.len(),
                    request.directory_path,
                    request.file_system
                );
                Outcome::Listed(table)
            }
            Err(e) => {
                tracing::warn!("{}", e);
                Outcome::ListingFailed {
                    error: e,
                    table: FileTable::new(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::record::FileRecord;
    use crate::secrets::SecretRequest;
    use crate::storage::{DataLake, FileProperties, PathEntry};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Calls {
        secret: AtomicUsize,
        connect: AtomicUsize,
        list: AtomicUsize,
        properties: AtomicUsize,
    }

    struct FakeVault {
        calls: Arc<Calls>,
        value: Option<String>,
        seen: Mutex<Option<SecretRequest>>,
    }

    #[async_trait]
    impl SecretSource for FakeVault {
        async fn fetch_secret(&self, request: &SecretRequest) -> Result<String> {
            self.calls.secret.fetch_add(1, Ordering::SeqCst);
            *self.seen.lock().unwrap() = Some(request.clone());
            self.value
                .clone()
                .ok_or_else(|| ViewerError::VaultSecretNotFound {
                    provider: "Azure Key Vault".to_string(),
                    secret: request.secret_name.clone(),
                    hint: String::new(),
                })
        }
    }

    struct FakeLake {
        calls: Arc<Calls>,
        paths: Vec<PathEntry>,
        properties: HashMap<String, FileProperties>,
        fail_listing: bool,
    }

    #[async_trait]
    impl DataLake for FakeLake {
        async fn list_paths(&self, file_system: &str, directory: &str) -> Result<Vec<PathEntry>> {
            self.calls.list.fetch_add(1, Ordering::SeqCst);
            assert_eq!(file_system, "fs1");
            assert_eq!(directory, "dir/");
            if self.fail_listing {
                return Err(ViewerError::StorageRequest {
                    details: "connection reset".to_string(),
                });
            }
            Ok(self.paths.clone())
        }

        async fn file_properties(&self, _file_system: &str, path: &str) -> Result<FileProperties> {
            self.calls.properties.fetch_add(1, Ordering::SeqCst);
            Ok(self.properties.get(path).cloned().unwrap_or_default())
        }
    }

    struct FakeConnector {
        calls: Arc<Calls>,
        lake: Mutex<Option<FakeLake>>,
        expected_key: String,
    }

    impl StorageConnector for FakeConnector {
        fn connect(&self, account_name: &str, account_key: &str) -> Result<Arc<dyn DataLake>> {
            self.calls.connect.fetch_add(1, Ordering::SeqCst);
            assert_eq!(account_name, "acct1");
            if account_key != self.expected_key {
                return Err(ViewerError::StorageInit {
                    details: "account key is not valid base64".to_string(),
                    hint: String::new(),
                });
            }
            let lake = self.lake.lock().unwrap().take().expect("connect called once");
            Ok(Arc::new(lake))
        }
    }

    fn t1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap()
    }

    fn inputs() -> FormInputs {
        FormInputs {
            vault_url: "https://kv1.vault.azure.net".to_string(),
            secret_name: "storage-key".to_string(),
            tenant_id: "tenant".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            storage_account: "acct1".to_string(),
            file_system: "fs1".to_string(),
            directory_path: "dir/".to_string(),
        }
    }

    struct Harness {
        calls: Arc<Calls>,
        pipeline: Pipeline,
    }

    fn harness(vault_value: Option<&str>, fail_listing: bool) -> Harness {
        let calls = Arc::new(Calls::default());
        let lake = FakeLake {
            calls: calls.clone(),
            paths: vec![
                PathEntry {
                    name: "dir/a.csv".to_string(),
                    is_directory: false,
                },
                PathEntry {
                    name: "dir/b.csv".to_string(),
                    is_directory: false,
                },
                PathEntry {
                    name: "dir/sub".to_string(),
                    is_directory: true,
                },
            ],
            properties: HashMap::from([
                (
                    "dir/a.csv".to_string(),
                    FileProperties {
                        content_length: Some(100),
                        last_modified: Some(t1()),
                    },
                ),
                ("dir/b.csv".to_string(), FileProperties::default()),
            ]),
            fail_listing,
        };
        let vault = FakeVault {
            calls: calls.clone(),
            value: vault_value.map(str::to_string),
            seen: Mutex::new(None),
        };
        let connector = FakeConnector {
            calls: calls.clone(),
            lake: Mutex::new(Some(lake)),
            expected_key: "K1".to_string(),
        };
        Harness {
            calls,
            pipeline: Pipeline::new(Arc::new(vault), Arc::new(connector)),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_listing() {
        let h = harness(Some("K1"), false);
        let outcome = h.pipeline.run(&inputs()).await;

        let table = match &outcome {
            Outcome::Listed(table) => table,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(
            table.rows(),
            &[
                FileRecord {
                    name: "dir/a.csv".to_string(),
                    size: 100,
                    last_modified: Some(t1()),
                },
                FileRecord {
                    name: "dir/b.csv".to_string(),
                    size: 0,
                    last_modified: None,
                },
            ]
        );
        assert!(!outcome.shows_no_files_message());
        assert!(outcome.error().is_none());
        assert_eq!(h.calls.properties.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_input_makes_no_calls() {
        let h = harness(Some("K1"), false);
        let mut form = inputs();
        form.client_secret.clear();
        form.file_system.clear();

        let outcome = h.pipeline.run(&form).await;
        match outcome {
            Outcome::Invalid(ViewerError::MissingInputs { ref missing }) => {
                assert_eq!(missing, &vec!["Client Secret", "File System Name"]);
            }
            ref other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(outcome.table().is_none());
        assert_eq!(h.calls.secret.load(Ordering::SeqCst), 0);
        assert_eq!(h.calls.connect.load(Ordering::SeqCst), 0);
        assert_eq!(h.calls.list.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_secret_failure_is_reported_and_halts() {
        let h = harness(None, false);
        let outcome = h.pipeline.run(&inputs()).await;

        assert!(matches!(
            outcome,
            Outcome::SecretFailed(ViewerError::VaultSecretNotFound { .. })
        ));
        assert!(outcome.table().is_none());
        assert_eq!(h.calls.connect.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_storage_init_failure_skips_listing() {
        let h = harness(Some("wrong key"), false);
        let outcome = h.pipeline.run(&inputs()).await;

        assert!(matches!(
            outcome,
            Outcome::StorageFailed(ViewerError::StorageInit { .. })
        ));
        assert!(!outcome.shows_no_files_message());
        assert_eq!(h.calls.connect.load(Ordering::SeqCst), 1);
        assert_eq!(h.calls.list.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_listing_failure_yields_empty_table() {
        let h = harness(Some("K1"), true);
        let outcome = h.pipeline.run(&inputs()).await;

        match &outcome {
            Outcome::ListingFailed { error, table } => {
                assert!(matches!(error, ViewerError::StorageList { .. }));
                assert!(table.is_empty());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(outcome.shows_no_files_message());
        assert!(outcome.into_error().is_some());
    }

    #[tokio::test]
    async fn test_secret_request_carries_trimmed_credentials() {
        let calls = Arc::new(Calls::default());
        let vault = Arc::new(FakeVault {
            calls: calls.clone(),
            value: None,
            seen: Mutex::new(None),
        });
        let connector = FakeConnector {
            calls,
            lake: Mutex::new(None),
            expected_key: String::new(),
        };
        let pipeline = Pipeline::new(vault.clone(), Arc::new(connector));

        let mut form = inputs();
        form.tenant_id = " tenant ".to_string();
        pipeline.run(&form).await;

        let seen = vault.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.tenant_id, "tenant");
        assert_eq!(seen.vault_url, "https://kv1.vault.azure.net");
        assert_eq!(seen.secret_name, "storage-key");
        assert_eq!(seen.client_id, "client");
        assert_eq!(seen.client_secret, "secret");
    }
}
