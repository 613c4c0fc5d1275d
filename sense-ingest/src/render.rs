//! Page rendering via poppler's `pdftoppm`.
//!
//! PDFs are rendered into a scratch directory as JPEGs, read back in page
//! order and base64 encoded. Image files are passed through as one page.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use sense_core::{InputFile, PageImage, Rasterizer};
use std::path::{Path, PathBuf};
use tokio::process::Command;

const PAGE_PREFIX: &str = "page";
const PAGE_MEDIA_TYPE: &str = "image/jpeg";

#[derive(Debug, thiserror::Error)]
pub enum RasterizeError {
    #[error("`{program}` not found on PATH (install poppler-utils)")]
    ToolMissing { program: String },

    #[error("running {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{file}: no pages rendered")]
    NoPages { file: String },

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// 144 DPI is a 2x scale of the 72 DPI PDF user space
    pub dpi: u32,
    pub jpeg_quality: u8,
    /// Pages beyond this are dropped with a warning
    pub max_pages: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: 144,
            jpeg_quality: 85,
            max_pages: 200,
        }
    }
}

pub struct PdftoppmRasterizer {
    program: String,
    options: RenderOptions,
}

impl PdftoppmRasterizer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            program: "pdftoppm".to_string(),
            options,
        }
    }

    /// Use a different executable name or path instead of `pdftoppm`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    fn locate(&self) -> Result<PathBuf, RasterizeError> {
        which::which(&self.program).map_err(|_| RasterizeError::ToolMissing {
            program: self.program.clone(),
        })
    }

    async fn render_to(&self, tool: &Path, pdf: &Path, out_dir: &Path) -> Result<(), RasterizeError> {
        let output = Command::new(tool)
            .arg("-jpeg")
            .arg("-jpegopt")
            .arg(format!("quality={}", self.options.jpeg_quality))
            .arg("-r")
            .arg(self.options.dpi.to_string())
            .arg("-f")
            .arg("1")
            // one past the cap so truncation is detectable
            .arg("-l")
            .arg(self.options.max_pages.saturating_add(1).to_string())
            .arg(pdf)
            .arg(out_dir.join(PAGE_PREFIX))
            .output()
            .await
            .map_err(|source| RasterizeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RasterizeError::ToolFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

#[async_trait]
impl Rasterizer for PdftoppmRasterizer {
    #[tracing::instrument(skip_all, fields(file = %file.name))]
    async fn rasterize(&self, file: &InputFile) -> anyhow::Result<Vec<PageImage>> {
        let tool = self.locate()?;
        let scratch = tempfile::tempdir().map_err(|source| RasterizeError::Io {
            path: std::env::temp_dir(),
            source,
        })?;

        self.render_to(&tool, &file.path, scratch.path()).await?;

        let mut rendered = rendered_pages(scratch.path()).await?;
        if apply_page_limit(&mut rendered, self.options.max_pages) {
            tracing::warn!(
                file = %file.name,
                max_pages = self.options.max_pages,
                "page limit reached, remaining pages skipped"
            );
        }
        if rendered.is_empty() {
            return Err(RasterizeError::NoPages {
                file: file.name.clone(),
            }
            .into());
        }

        let mut pages = Vec::with_capacity(rendered.len());
        for (i, path) in rendered.iter().enumerate() {
            let bytes = read(path).await?;
            pages.push(PageImage::new(
                i + 1,
                PAGE_MEDIA_TYPE,
                general_purpose::STANDARD.encode(bytes),
            ));
        }

        tracing::debug!(pages = pages.len(), dpi = self.options.dpi, "pdf rasterized");
        Ok(pages)
    }

    async fn encode_image(&self, file: &InputFile) -> anyhow::Result<PageImage> {
        let bytes = read(&file.path).await?;
        Ok(PageImage::new(
            1,
            file.media_type.clone(),
            general_purpose::STANDARD.encode(bytes),
        ))
    }
}

async fn read(path: &Path) -> Result<Vec<u8>, RasterizeError> {
    tokio::fs::read(path).await.map_err(|source| RasterizeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// JPEGs written by pdftoppm in `dir`, ordered by page number.
async fn rendered_pages(dir: &Path) -> Result<Vec<PathBuf>, RasterizeError> {
    let io_err = |source: std::io::Error| RasterizeError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut numbered = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let name = entry.file_name();
        if let Some(n) = page_number(&name.to_string_lossy()) {
            numbered.push((n, entry.path()));
        }
    }

    numbered.sort_by_key(|(n, _)| *n);
    Ok(numbered.into_iter().map(|(_, p)| p).collect())
}

/// Keep at most `max_pages` paths. True when any were dropped.
fn apply_page_limit(rendered: &mut Vec<PathBuf>, max_pages: usize) -> bool {
    let truncated = rendered.len() > max_pages;
    rendered.truncate(max_pages);
    truncated
}

/// `page-7.jpg` and `page-007.jpg` are both page 7.
fn page_number(file_name: &str) -> Option<usize> {
    let stem = file_name.strip_suffix(".jpg")?;
    let digits = stem.strip_prefix(PAGE_PREFIX)?.strip_prefix('-')?;
    digits.parse().ok()
}
