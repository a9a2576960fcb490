//! Cover image storage on the local filesystem
//!
//! Covers live under `<storage_dir>/covers/` and are referenced from the
//! `books.cover_image` column by their path relative to `storage_dir`.

use std::path::{Component, Path, PathBuf};

pub const COVERS_DIR: &str = "covers";

/// Resolve a stored relative path, refusing anything that could escape the root.
fn resolve(storage_dir: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    let safe = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !safe || relative.as_os_str().is_empty() {
        return None;
    }
    Some(storage_dir.join(relative))
}

/// Write `bytes` as `covers/<stem>.<extension>` and return that relative path.
pub async fn store_cover(
    storage_dir: &Path,
    stem: &str,
    extension: &str,
    bytes: &[u8],
) -> std::io::Result<String> {
    let dir = storage_dir.join(COVERS_DIR);
    tokio::fs::create_dir_all(&dir).await?;

    let filename = format!("{}.{}", stem, extension);
    tokio::fs::write(dir.join(&filename), bytes).await?;

    Ok(format!("{}/{}", COVERS_DIR, filename))
}

/// Best-effort removal of a stored cover. Missing files are not an error.
pub async fn remove_cover(storage_dir: &Path, relative: &str) {
    let Some(path) = resolve(storage_dir, relative) else {
        tracing::warn!("Refusing to delete cover outside storage: {}", relative);
        return;
    };

    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::info!("Deleted cover image {}", relative),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to delete cover image {}: {}", relative, e),
    }
}
