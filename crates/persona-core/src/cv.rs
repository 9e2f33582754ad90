//! Copies the bundled CV document to the visitor's download folder.

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

pub const DEFAULT_CV_FILE: &str = "owaisfarooq.pdf";

/// Where exported files land: the platform download dir, falling back to home.
pub fn download_dir() -> Result<PathBuf> {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow!("Could not determine download directory"))
}

/// Copy `source` unchanged into `dest_dir`, keeping its file name.
pub fn export(source: &Path, dest_dir: &Path) -> Result<PathBuf> {
    if !source.is_file() {
        return Err(anyhow!("CV not found at {}", source.display()));
    }
    let file_name = source
        .file_name()
        .ok_or_else(|| anyhow!("CV path has no file name: {}", source.display()))?;

    fs::create_dir_all(dest_dir)
        .with_context(|| format!("creating {}", dest_dir.display()))?;
    let dest = dest_dir.join(file_name);
    fs::copy(source, &dest)
        .with_context(|| format!("copying CV to {}", dest.display()))?;

    tracing::info!(dest = %dest.display(), "CV exported");
    Ok(dest)
}
