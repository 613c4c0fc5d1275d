//! Input files and the page images derived from them

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A file as submitted for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    /// Display name (usually the file name)
    pub name: String,
    /// Declared media type, e.g. `application/pdf` or `image/png`
    pub media_type: String,
    pub path: PathBuf,
}

impl InputFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            path: path.into(),
        }
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_media_type(&self.media_type)
    }
}

/// How a file is turned into pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Rasterized page by page
    Pdf,
    /// Sent as a single page
    Image,
}

impl DocumentKind {
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type {
            "application/pdf" => Some(Self::Pdf),
            m if m.starts_with("image/") => Some(Self::Image),
            _ => None,
        }
    }
}

/// One rendered page, base64-encoded for transport to the extraction model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    /// 1-based page number within its file
    pub page_number: usize,
    pub media_type: String,
    /// Base64 (standard alphabet, padded)
    pub data: String,
}

impl PageImage {
    pub fn new(page_number: usize, media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            page_number,
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}
