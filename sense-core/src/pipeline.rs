//! Batch orchestrator: files -> page images -> extracted transactions.
//!
//! Rasterization and extraction are provider traits so the control flow can
//! be driven by fakes in tests and by the real adapters in the CLI.
//! Files and pages are processed strictly one after another. Page failures
//! are contained per page, file failures per file; only an all-empty batch
//! fails as a whole.

use async_trait::async_trait;
use serde::Serialize;

use crate::batch::{BatchState, FileEntry, FileStatus, StateError};
use crate::document::{DocumentKind, InputFile, PageImage};
use crate::transaction::Transaction;

/// Turns input files into page images.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Render every page of a PDF. Either a non-empty page list or an error.
    async fn rasterize(&self, file: &InputFile) -> anyhow::Result<Vec<PageImage>>;

    /// Load an image file as a single page.
    async fn encode_image(&self, file: &InputFile) -> anyhow::Result<PageImage>;
}

/// Extracts transaction records from one page image.
#[async_trait]
pub trait PageExtractor: Send + Sync {
    async fn extract(&self, page: &PageImage) -> anyhow::Result<Vec<Transaction>>;
}

#[async_trait]
impl<'a, T: PageExtractor + ?Sized> PageExtractor for &'a T {
    async fn extract(&self, page: &PageImage) -> anyhow::Result<Vec<Transaction>> {
        (**self).extract(page).await
    }
}

/// Progress notifications emitted during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BatchEvent {
    Started { files: usize },
    FileStarted { file_index: usize },
    PagesDiscovered { file_index: usize, pages: usize },
    /// Emitted before the extraction call for `current` is awaited
    PageProgress { file_index: usize, current: usize, total: usize },
    FileFinished { file_index: usize, status: FileStatus },
    Finished { transactions: usize },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PageOutcome {
    Extracted { page: usize, records: usize },
    Failed { page: usize, reason: String },
}

impl PageOutcome {
    pub fn records(&self) -> usize {
        match self {
            PageOutcome::Extracted { records, .. } => *records,
            PageOutcome::Failed { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FileOutcome {
    /// `pages` is empty for media types that are not processed
    Completed { pages: Vec<PageOutcome> },
    Failed { reason: String },
}

impl FileOutcome {
    pub fn records(&self) -> usize {
        match self {
            FileOutcome::Completed { pages } => pages.iter().map(PageOutcome::records).sum(),
            FileOutcome::Failed { .. } => 0,
        }
    }

    pub fn failed_pages(&self) -> usize {
        match self {
            FileOutcome::Completed { pages } => pages
                .iter()
                .filter(|p| matches!(p, PageOutcome::Failed { .. }))
                .count(),
            FileOutcome::Failed { .. } => 0,
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    /// Sorted newest first
    pub transactions: Vec<Transaction>,
    /// Input order
    pub files: Vec<FileEntry>,
    /// One per input file, input order
    pub outcomes: Vec<FileOutcome>,
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("could not extract any transactions from the provided files")]
    NothingExtracted { files: usize },
    #[error(transparent)]
    State(#[from] StateError),
}

pub struct BatchOrchestrator<R: Rasterizer, X: PageExtractor> {
    rasterizer: R,
    extractor: X,
}

impl<R: Rasterizer, X: PageExtractor> BatchOrchestrator<R, X> {
    pub fn new(rasterizer: R, extractor: X) -> Self {
        Self { rasterizer, extractor }
    }

    /// Run one batch over `files`, in order.
    ///
    /// `state` is reset at the start of the run and left in its terminal
    /// state (completed or error) when this returns. `on_event` sees every
    /// progress notification together with the state right after it changed.
    pub async fn run_batch<F>(
        &self,
        files: &[InputFile],
        state: &mut BatchState,
        mut on_event: F,
    ) -> Result<BatchReport, BatchError>
    where
        F: FnMut(&BatchEvent, &BatchState),
    {
        state.start_batch(files.iter().map(|f| f.name.clone()));
        on_event(&BatchEvent::Started { files: files.len() }, state);

        let mut outcomes = Vec::with_capacity(files.len());

        for (index, file) in files.iter().enumerate() {
            state.mark_file_status(index, FileStatus::Processing)?;
            on_event(&BatchEvent::FileStarted { file_index: index }, state);

            let result = self.process_file(index, file, state, &mut on_event).await;
            let (status, outcome) = match result {
                Ok((pages, txns)) => {
                    state.append_transactions(txns);
                    (FileStatus::Completed, FileOutcome::Completed { pages })
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    tracing::warn!(file = %file.name, error = %reason, "file failed, continuing with batch");
                    (FileStatus::Error, FileOutcome::Failed { reason })
                }
            };

            state.mark_file_status(index, status)?;
            on_event(&BatchEvent::FileFinished { file_index: index, status }, state);
            outcomes.push(outcome);
        }

        if state.transactions().is_empty() && !files.is_empty() {
            let err = BatchError::NothingExtracted { files: files.len() };
            state.fail(err.to_string());
            on_event(&BatchEvent::Failed { message: err.to_string() }, state);
            return Err(err);
        }

        state.finish();
        tracing::info!(
            files = files.len(),
            transactions = state.transactions().len(),
            failed_files = state.failed_count(),
            "batch completed"
        );
        on_event(
            &BatchEvent::Finished {
                transactions: state.transactions().len(),
            },
            state,
        );

        Ok(BatchReport {
            transactions: state.transactions().to_vec(),
            files: state.files().to_vec(),
            outcomes,
        })
    }

    async fn process_file<F>(
        &self,
        index: usize,
        file: &InputFile,
        state: &mut BatchState,
        on_event: &mut F,
    ) -> anyhow::Result<(Vec<PageOutcome>, Vec<Transaction>)>
    where
        F: FnMut(&BatchEvent, &BatchState),
    {
        let pages = match file.kind() {
            Some(DocumentKind::Pdf) => self.rasterizer.rasterize(file).await?,
            Some(DocumentKind::Image) => vec![self.rasterizer.encode_image(file).await?],
            None => {
                tracing::info!(file = %file.name, media_type = %file.media_type, "unsupported media type, skipping");
                Vec::new()
            }
        };

        let total = pages.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut txns = Vec::new();
        if total == 0 {
            return Ok((outcomes, txns));
        }

        state.set_page_count(index, total)?;
        on_event(&BatchEvent::PagesDiscovered { file_index: index, pages: total }, state);

        for (page_index, page) in pages.iter().enumerate() {
            let current = page_index + 1;
            state.set_progress(current, total);
            on_event(&BatchEvent::PageProgress { file_index: index, current, total }, state);

            match self.extractor.extract(page).await {
                Ok(records) => {
                    tracing::debug!(file = %file.name, page = current, records = records.len(), "page extracted");
                    outcomes.push(PageOutcome::Extracted {
                        page: current,
                        records: records.len(),
                    });
                    txns.extend(records);
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    tracing::warn!(file = %file.name, page = current, error = %reason, "page extraction failed, skipping page");
                    outcomes.push(PageOutcome::Failed { page: current, reason });
                }
            }
        }

        Ok((outcomes, txns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    struct OnePagePerFile;

    #[async_trait]
    impl Rasterizer for OnePagePerFile {
        async fn rasterize(&self, file: &InputFile) -> anyhow::Result<Vec<PageImage>> {
            Ok(vec![PageImage::new(1, "image/jpeg", file.name.clone())])
        }

        async fn encode_image(&self, file: &InputFile) -> anyhow::Result<PageImage> {
            Ok(PageImage::new(1, file.media_type.clone(), file.name.clone()))
        }
    }

    /// Fails every page whose payload contains "bad"
    struct PickyExtractor;

    #[async_trait]
    impl PageExtractor for PickyExtractor {
        async fn extract(&self, page: &PageImage) -> anyhow::Result<Vec<Transaction>> {
            if page.data.contains("bad") {
                bail!("model returned garbage");
            }
            Ok(vec![Transaction::new("2024-05-01", page.data.clone(), -1.0, "misc", "")])
        }
    }

    #[tokio::test]
    async fn test_page_failure_is_contained() {
        let orchestrator = BatchOrchestrator::new(OnePagePerFile, PickyExtractor);
        let files = vec![
            InputFile::new("bad.pdf", "application/pdf", "bad.pdf"),
            InputFile::new("good.png", "image/png", "good.png"),
        ];
        let mut state = BatchState::new();

        let report = orchestrator.run_batch(&files, &mut state, |_, _| {}).await.unwrap();

        // A failed page leaves the file completed with zero records
        assert_eq!(report.files[0].status, FileStatus::Completed);
        assert_eq!(report.outcomes[0].failed_pages(), 1);
        assert_eq!(report.outcomes[0].records(), 0);
        assert_eq!(report.outcomes[1].records(), 1);
        assert_eq!(report.transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_succeeds() {
        let orchestrator = BatchOrchestrator::new(OnePagePerFile, PickyExtractor);
        let mut state = BatchState::new();

        let report = orchestrator.run_batch(&[], &mut state, |_, _| {}).await.unwrap();
        assert!(report.transactions.is_empty());
        assert!(report.files.is_empty());
        assert_eq!(state.status(), crate::batch::ProcessingStatus::Completed);
    }

    #[tokio::test]
    async fn test_event_sequence_for_single_image() {
        let orchestrator = BatchOrchestrator::new(OnePagePerFile, PickyExtractor);
        let files = vec![InputFile::new("scan.jpg", "image/jpeg", "scan.jpg")];
        let mut state = BatchState::new();
        let mut events = Vec::new();

        orchestrator
            .run_batch(&files, &mut state, |ev, _| events.push(ev.clone()))
            .await
            .unwrap();

        assert_eq!(
            events,
            vec![
                BatchEvent::Started { files: 1 },
                BatchEvent::FileStarted { file_index: 0 },
                BatchEvent::PagesDiscovered { file_index: 0, pages: 1 },
                BatchEvent::PageProgress { file_index: 0, current: 1, total: 1 },
                BatchEvent::FileFinished { file_index: 0, status: FileStatus::Completed },
                BatchEvent::Finished { transactions: 1 },
            ]
        );
    }
}
