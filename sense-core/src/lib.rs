//! sense-core: transaction model, batch state, orchestration pipeline,
//! summary analytics and export codecs for StatementSense

pub mod analytics;
pub mod batch;
pub mod document;
pub mod export;
pub mod pipeline;
pub mod transaction;

pub use analytics::{CashflowSplit, CategoryTotal, PieSlice, Summary};
pub use batch::{BatchState, FileEntry, FileStatus, PageProgress, ProcessingStatus, StateError};
pub use document::{DocumentKind, InputFile, PageImage};
pub use export::{ExportFormat, encode_csv, encode_json, export_filename, read_csv, write_export};
pub use pipeline::{
    BatchError, BatchEvent, BatchOrchestrator, BatchReport, FileOutcome, PageExtractor, PageOutcome,
    Rasterizer,
};
pub use transaction::{Transaction, UNCATEGORIZED, sort_newest_first};
