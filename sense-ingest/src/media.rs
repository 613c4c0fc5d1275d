use anyhow::{Context, Result, bail};
use sense_core::InputFile;
use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Media type by file extension (case-insensitive).
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => OCTET_STREAM,
    }
}

/// Build an [`InputFile`] for a path given on the command line.
pub fn input_file_from_path(path: impl AsRef<Path>) -> Result<InputFile> {
    let path = path.as_ref();
    let meta = std::fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    if !meta.is_file() {
        bail!("not a file: {}", path.display());
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(InputFile::new(name, media_type_for_path(path), path))
}
