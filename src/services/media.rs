//! Media storage
//!
//! Uploaded article images live under the media root as
//! `articles/user_<owner id>/<unix time with milliseconds>_<file name>` and
//! are served back under `upload.url_prefix`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

use crate::config::UploadConfig;

/// Longest stored file name, extension included
const MAX_FILE_NAME_CHARS: usize = 100;

/// Longer suffixes are not treated as an extension when truncating
const MAX_EXTENSION_CHARS: usize = 10;

/// An uploaded image that passed form validation
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// File name as sent by the browser
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Writes uploaded files below the media root
pub struct MediaStorage {
    config: UploadConfig,
}

impl MediaStorage {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Media root directory
    pub fn root(&self) -> &Path {
        &self.config.path
    }

    /// Public URL of a stored file
    pub fn url(&self, relative_path: &str) -> String {
        self.config.url_for(relative_path)
    }

    /// Store an article image and return its path relative to the media root.
    ///
    /// An existing file with the same name is never overwritten; a random
    /// suffix is added instead.
    pub async fn save_article_image(&self, owner_id: i64, upload: &ImageUpload) -> Result<String> {
        let mut relative = article_image_path(owner_id, &upload.file_name, Utc::now());
        let mut target = self.root().join(&relative);

        if fs::try_exists(&target).await.unwrap_or(false) {
            relative = with_random_suffix(&relative);
            target = self.root().join(&relative);
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create upload dir: {:?}", parent))?;
        }

        fs::write(&target, &upload.data)
            .await
            .with_context(|| format!("Failed to save file: {:?}", target))?;

        tracing::debug!(path = %relative, size = upload.data.len(), "Stored article image");
        Ok(relative)
    }

    /// Remove a stored file; missing files are ignored
    pub async fn remove(&self, relative_path: &str) -> Result<()> {
        match fs::remove_file(self.root().join(relative_path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove file: {}", relative_path)),
        }
    }
}

/// Relative storage path of an article image uploaded at `now`
pub fn article_image_path(owner_id: i64, file_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "articles/user_{}/{}.{:03}_{}",
        owner_id,
        now.timestamp(),
        now.timestamp_subsec_millis(),
        sanitize_filename(file_name)
    )
}

/// Reduce a client-supplied file name to a safe single path component.
///
/// Directory parts are dropped, spaces become underscores and anything
/// other than letters, digits, `-`, `_` and `.` is removed.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .trim()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();

    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        return "image".to_string();
    }

    truncate_keeping_extension(&cleaned, MAX_FILE_NAME_CHARS)
}

fn truncate_keeping_extension(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }

    let (stem, ext) = split_extension(name);
    let (stem, ext) = if ext.chars().count() > MAX_EXTENSION_CHARS {
        (name, "")
    } else {
        (stem, ext)
    };
    let keep = max_chars.saturating_sub(ext.chars().count());
    let stem: String = stem.chars().take(keep).collect();
    format!("{}{}", stem, ext)
}

/// `("photo", ".png")`; names without a dot, or with only a leading one, have no extension
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

fn with_random_suffix(relative: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(7).collect();
    let (dir, file) = relative.rsplit_once('/').unwrap_or(("", relative));
    // The timestamp prefix contains a dot of its own; only the name part is split.
    let (stamp, name) = file.split_once('_').unwrap_or(("", file));
    let (stem, ext) = split_extension(name);
    let name = format!("{}_{}{}", stem, suffix, ext);
    let file = if stamp.is_empty() {
        name
    } else {
        format!("{}_{}", stamp, name)
    };
    if dir.is_empty() {
        file
    } else {
        format!("{}/{}", dir, file)
    }
}
