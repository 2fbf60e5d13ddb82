use chrono::{DateTime, Utc};

/// One listed file and its basic metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path of the file relative to the file system root
    pub name: String,
    /// Content length in bytes, 0 when the service did not report one
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Files found under a directory, in the order the service listed them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTable {
    rows: Vec<FileRecord>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: FileRecord) {
        self.rows.push(record);
    }

    pub fn rows(&self) -> &[FileRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.rows.iter().map(|r| r.size).sum()
    }
}

impl From<Vec<FileRecord>> for FileTable {
    fn from(rows: Vec<FileRecord>) -> Self {
        Self { rows }
    }
}
