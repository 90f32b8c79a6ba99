//! Saving generated images and audio to local files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::api::{ApiClient, MediaRef};

/// Where a downloaded media file goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaDestination {
    /// Inside this directory under the server's file name; existing files
    /// are never overwritten.
    Dir(PathBuf),
    /// Exactly this path.
    File(PathBuf),
}

impl MediaDestination {
    /// An existing directory keeps the server's file name; anything else is
    /// taken as the target file.
    pub fn from_output(path: PathBuf) -> Self {
        if path.is_dir() {
            Self::Dir(path)
        } else {
            Self::File(path)
        }
    }

    fn resolve(&self, file_name: &str) -> PathBuf {
        match self {
            Self::Dir(dir) => unique_path(dir, file_name),
            Self::File(path) => path.clone(),
        }
    }
}

/// Downloads `media` and writes it to `dest`, returning the written path.
///
/// # Errors
/// Returns an error if the download fails or the file cannot be written.
pub async fn save_media(
    client: &ApiClient,
    media: &MediaRef,
    dest: &MediaDestination,
) -> Result<PathBuf> {
    let bytes = client.download_media(&media.chat_id, &media.file).await?;
    let path = dest.resolve(media.file_name());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write media to {}", path.display()))?;
    tracing::info!(path = %path.display(), size = bytes.len(), "media saved");
    Ok(path)
}

/// `dir/name`, or `dir/stem-N.ext` for the first N that is free.
fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    (1u32..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem}-{n}.{ext}")),
            None => dir.join(format!("{stem}-{n}")),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
