//! Batch state: per-file status, accumulated transactions and progress.
//!
//! Mutated only through the transition methods on [`BatchState`], so a
//! renderer can take a read-only snapshot at any point of a run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::transaction::{Transaction, sort_newest_first};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Processing => "processing",
            FileStatus::Completed => "completed",
            FileStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FileStatus::Completed | FileStatus::Error)
    }

    /// Pending -> Processing -> (Completed | Error). Nothing else.
    fn can_become(&self, next: FileStatus) -> bool {
        matches!(
            (self, next),
            (FileStatus::Pending, FileStatus::Processing)
                | (FileStatus::Processing, FileStatus::Completed)
                | (FileStatus::Processing, FileStatus::Error)
        )
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overall status of the current batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    #[default]
    Idle,
    LoadingFiles,
    Extracting,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub status: FileStatus,
    /// Set once rasterization produced pages
    pub page_count: Option<usize>,
}

impl FileEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: FileStatus::Pending,
            page_count: None,
        }
    }
}

/// Page counter for the file currently being extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageProgress {
    pub current: usize,
    pub total: usize,
}

impl PageProgress {
    /// Completion ratio in [0, 1]; 0 before any page is dispatched
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("no file at index {0}")]
    UnknownFile(usize),
    #[error("file {index} cannot move from {from} to {to}")]
    InvalidTransition {
        index: usize,
        from: FileStatus,
        to: FileStatus,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchState {
    status: ProcessingStatus,
    files: Vec<FileEntry>,
    transactions: Vec<Transaction>,
    progress: PageProgress,
    error: Option<String>,
}

impl BatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard whatever the previous batch left and queue `names` as pending.
    pub fn start_batch<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self = Self {
            status: ProcessingStatus::LoadingFiles,
            files: names.into_iter().map(FileEntry::new).collect(),
            ..Self::default()
        };
    }

    pub fn mark_file_status(&mut self, index: usize, status: FileStatus) -> Result<(), StateError> {
        let entry = self.files.get_mut(index).ok_or(StateError::UnknownFile(index))?;
        if !entry.status.can_become(status) {
            return Err(StateError::InvalidTransition {
                index,
                from: entry.status,
                to: status,
            });
        }
        entry.status = status;
        Ok(())
    }

    pub fn set_page_count(&mut self, index: usize, pages: usize) -> Result<(), StateError> {
        let entry = self.files.get_mut(index).ok_or(StateError::UnknownFile(index))?;
        entry.page_count = Some(pages);
        Ok(())
    }

    pub fn append_transactions(&mut self, txns: impl IntoIterator<Item = Transaction>) {
        self.transactions.extend(txns);
    }

    /// Record "now working on page `current` of `total`".
    pub fn set_progress(&mut self, current: usize, total: usize) {
        self.status = ProcessingStatus::Extracting;
        self.progress = PageProgress { current, total };
    }

    /// Sort the aggregate newest first and mark the batch completed.
    pub fn finish(&mut self) {
        sort_newest_first(&mut self.transactions);
        self.status = ProcessingStatus::Completed;
    }

    /// Terminal batch-level failure. Stays here until [`BatchState::reset`].
    pub fn fail(&mut self, message: impl Into<String>) {
        self.transactions.clear();
        self.error = Some(message.into());
        self.status = ProcessingStatus::Error;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn progress(&self) -> PageProgress {
        self.progress
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn completed_count(&self) -> usize {
        self.count_with(FileStatus::Completed)
    }

    pub fn pending_count(&self) -> usize {
        self.count_with(FileStatus::Pending)
    }

    pub fn failed_count(&self) -> usize {
        self.count_with(FileStatus::Error)
    }

    /// The file whose turn it currently is, if any
    pub fn processing_file(&self) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.status == FileStatus::Processing)
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.status,
            ProcessingStatus::LoadingFiles | ProcessingStatus::Extracting
        )
    }

    fn count_with(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }
}
