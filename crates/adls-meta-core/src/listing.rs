use crate::error::{Result, ViewerError};
use crate::record::{FileRecord, FileTable};
use crate::storage::DataLake;

/// List the files under `directory` with their size and last-modified time
///
/// Directories are skipped. Properties are fetched one file at a time. Any
/// failure discards the rows gathered so far: the caller gets the error, never
/// a partial table.
pub async fn list_files_and_metadata(
    lake: &dyn DataLake,
    file_system: &str,
    directory: &str,
) -> Result<FileTable> {
    collect(lake, file_system, directory)
        .await
        .map_err(|e| ViewerError::StorageList {
            details: e.to_string(),
            hint: format!(
                "Check that file system '{}' and directory '{}' exist and the key has read access",
                file_system, directory
            ),
        })
}

async fn collect(lake: &dyn DataLake, file_system: &str, directory: &str) -> Result<FileTable> {
    let paths = lake.list_paths(file_system, directory).await?;

    let mut table = FileTable::new();
    for path in paths {
        if path.is_directory {
            tracing::trace!("Skipping directory: {}", path.name);
            continue;
        }

        let properties = lake.file_properties(file_system, &path.name).await?;
        table.push(FileRecord {
            name: path.name,
            size: properties.content_length.unwrap_or(0),
            last_modified: properties.last_modified,
        });
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileProperties, PathEntry};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeLake {
        paths: Vec<PathEntry>,
        properties: HashMap<String, FileProperties>,
        fail_listing: bool,
        fail_properties_for: Option<String>,
        property_calls: Mutex<Vec<String>>,
    }

    impl FakeLake {
        fn file(mut self, name: &str, props: FileProperties) -> Self {
            self.paths.push(PathEntry {
                name: name.to_string(),
                is_directory: false,
            });
            self.properties.insert(name.to_string(), props);
            self
        }

        fn dir(mut self, name: &str) -> Self {
            self.paths.push(PathEntry {
                name: name.to_string(),
                is_directory: true,
            });
            self
        }
    }

    #[async_trait]
    impl DataLake for FakeLake {
        async fn list_paths(&self, _file_system: &str, _directory: &str) -> Result<Vec<PathEntry>> {
            if self.fail_listing {
                return Err(ViewerError::StorageStatus {
                    status: 404,
                    details: "FilesystemNotFound".to_string(),
                });
            }
            Ok(self.paths.clone())
        }

        async fn file_properties(&self, _file_system: &str, path: &str) -> Result<FileProperties> {
            self.property_calls.lock().unwrap().push(path.to_string());
            if self.fail_properties_for.as_deref() == Some(path) {
                return Err(ViewerError::StorageStatus {
                    status: 403,
                    details: "AuthorizationFailure".to_string(),
                });
            }
            Ok(self.properties.get(path).cloned().unwrap_or_default())
        }
    }

    fn sized(size: u64) -> FileProperties {
        FileProperties {
            content_length: Some(size),
            last_modified: None,
        }
    }

    #[tokio::test]
    async fn test_directories_are_excluded() {
        let lake = FakeLake::default()
            .file("dir/a.csv", sized(1))
            .dir("dir/sub")
            .file("dir/sub/b.csv", sized(2))
            .dir("dir/other")
            .file("dir/c.csv", sized(3));

        let table = list_files_and_metadata(&lake, "fs1", "dir").await.unwrap();
        let names: Vec<&str> = table.rows().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["dir/a.csv", "dir/sub/b.csv", "dir/c.csv"]);
        assert_eq!(
            *lake.property_calls.lock().unwrap(),
            vec!["dir/a.csv", "dir/sub/b.csv", "dir/c.csv"]
        );
    }

    #[tokio::test]
    async fn test_missing_properties_use_defaults() {
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let lake = FakeLake::default()
            .file(
                "dir/a.csv",
                FileProperties {
                    content_length: Some(100),
                    last_modified: Some(t1),
                },
            )
            .file("dir/b.csv", FileProperties::default());

        let table = list_files_and_metadata(&lake, "fs1", "dir/").await.unwrap();
        assert_eq!(
            table.rows(),
            &[
                FileRecord {
                    name: "dir/a.csv".to_string(),
                    size: 100,
                    last_modified: Some(t1),
                },
                FileRecord {
                    name: "dir/b.csv".to_string(),
                    size: 0,
                    last_modified: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_only_directories_gives_empty_table() {
        let lake = FakeLake::default().dir("dir/x").dir("dir/y");
        let table = list_files_and_metadata(&lake, "fs1", "dir").await.unwrap();
        assert!(table.is_empty());
        assert!(lake.property_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_is_reported() {
        let lake = FakeLake {
            fail_listing: true,
            ..Default::default()
        };
        let err = list_files_and_metadata(&lake, "fs1", "dir").await.unwrap_err();
        match err {
            ViewerError::StorageList { details, .. } => {
                assert!(details.contains("FilesystemNotFound"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_property_failure_discards_partial_rows() {
        let lake = FakeLake {
            fail_properties_for: Some("dir/b.csv".to_string()),
            ..Default::default()
        }
        .file("dir/a.csv", sized(1))
        .file("dir/b.csv", sized(2))
        .file("dir/c.csv", sized(3));

        let result = list_files_and_metadata(&lake, "fs1", "dir").await;
        assert!(matches!(result, Err(ViewerError::StorageList { .. })));
        // Stops at the first failure
        assert_eq!(lake.property_calls.lock().unwrap().len(), 2);
    }
}
