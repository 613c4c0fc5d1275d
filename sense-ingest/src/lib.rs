//! sense-ingest: turns statement files on disk into page images.

pub mod media;
pub mod render;

pub use media::{input_file_from_path, media_type_for_path};
pub use render::{PdftoppmRasterizer, RasterizeError, RenderOptions};
