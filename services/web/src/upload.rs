//! Recipe image upload gate and storage

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use regex::Regex;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::OnceLock,
};
use thiserror::Error;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tracing::{info, warn};

/// Image extensions accepted for recipe pictures
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Numbered variants tried before an upload name is given up on
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Reason an uploaded file was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("You did not select a file")]
    MissingFile,

    #[error("Only png, jpg, jpeg and gif images can be uploaded")]
    DisallowedExtension,
}

/// Whether the file name carries an allowed image extension
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, extension)| ALLOWED_EXTENSIONS.contains(&extension.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Gate applied to the uploaded file name before anything is stored
pub fn check_image_name(filename: &str) -> Result<(), UploadError> {
    if filename.is_empty() {
        return Err(UploadError::MissingFile);
    }
    if !allowed_file(filename) {
        return Err(UploadError::DisallowedExtension);
    }
    Ok(())
}

/// Reduce a client supplied file name to a safe, flat ASCII name
///
/// Non-ASCII characters are dropped, path separators and whitespace runs turn
/// into single underscores, anything outside `[A-Za-z0-9_.-]` is removed and
/// leading or trailing dots and underscores are trimmed.
pub fn secure_filename(filename: &str) -> String {
    static UNSAFE_CHARS: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE_CHARS
        .get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("Failed to compile filename regex"));

    let ascii: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    unsafe_chars
        .replace_all(&joined, "")
        .trim_matches(|c: char| c == '.' || c == '_')
        .to_string()
}

/// Name under which an upload is stored: timestamp prefix, then sanitized
pub fn stored_file_name(original: &str, now: DateTime<Local>) -> String {
    secure_filename(&format!("{}_{}", now.format("%Y%m%d%H%M%S"), original))
}

/// Variant of a stored name for the given attempt: `name.png`, `name_1.png`, ...
fn numbered_file_name(file_name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, extension)) => format!("{stem}_{attempt}.{extension}"),
        None => format!("{file_name}_{attempt}"),
    }
}

/// Write an accepted upload into the upload directory
///
/// Existing files are never replaced: when the stored name is taken, a
/// numbered suffix is added before the extension. Returns the path of the
/// written file, which is what gets stored with the recipe.
pub async fn save_image(
    upload_dir: &Path,
    original: &str,
    data: &[u8],
    now: DateTime<Local>,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(upload_dir)
        .await
        .with_context(|| format!("create upload directory {}", upload_dir.display()))?;

    let file_name = stored_file_name(original, now);
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = upload_dir.join(numbered_file_name(&file_name, attempt));
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("create upload {}", path.display()));
            }
        };

        let written = async {
            file.write_all(data).await?;
            file.flush().await
        }
        .await;
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                warn!("Could not remove partial upload {}: {}", path.display(), cleanup);
            }
            return Err(e).with_context(|| format!("write upload {}", path.display()));
        }

        info!("Stored upload {} ({} bytes)", path.display(), data.len());
        return Ok(path);
    }

    anyhow::bail!(
        "no free name for upload {} in {}",
        file_name,
        upload_dir.display()
    )
}
