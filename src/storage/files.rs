//! Flat-directory file store
//!
//! Every stored file lives directly under one directory, named
//! `<unix-millis>-<original name>`. Nothing is cached: each query re-reads
//! the directory, so the listing always reflects what is on disk.

use chrono::Utc;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::core::error::{AppError, AppResult};

/// URL prefix the storage directory is served under
pub const URL_PREFIX: &str = "/uploads";

/// How many timestamps to try before giving up on a fresh storage name
const MAX_NAME_ATTEMPTS: u32 = 16;

const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "odt", "rtf", "txt", "md", "csv", "json", "xls", "xlsx", "ods", "ppt", "pptx", "odp", "jpg",
    "jpeg", "png", "gif", "webp", "svg", "zip", "rar", "7z", "tar", "gz", "mp3", "ogg", "wav", "m4a", "mp4", "mov",
    "webm",
];

const ALLOWED_MIME_PREFIXES: &[&str] = &["image/", "audio/", "video/", "text/", "application/vnd."];

const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/rtf",
    "application/json",
    "application/zip",
    "application/x-zip-compressed",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
    "application/x-tar",
    "application/gzip",
    "application/octet-stream",
];

/// A file held by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    /// On-disk name, including the timestamp prefix
    pub storage_name: String,
    /// Storage name with the timestamp prefix stripped
    pub display_name: String,
    /// File size in bytes, read fresh on every listing
    pub size_bytes: u64,
    /// Public download link
    pub download_url: String,
}

/// Lookup layer over the storage directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    public_base_url: String,
}

impl FileStore {
    /// Opens the store, creating the directory when it does not exist yet.
    ///
    /// # Arguments
    /// * `root` - Directory holding the files
    /// * `public_base_url` - Base used to build download links (no trailing slash needed)
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> AppResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Directory the store reads from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a stored file on disk
    pub fn path_of(&self, file: &StoredFile) -> PathBuf {
        self.root.join(&file.storage_name)
    }

    /// Public link for a storage name
    pub fn download_url(&self, storage_name: &str) -> String {
        format!(
            "{}{}/{}",
            self.public_base_url,
            URL_PREFIX,
            urlencoding::encode(storage_name)
        )
    }

    fn describe(&self, storage_name: String, size_bytes: u64) -> StoredFile {
        StoredFile {
            display_name: display_name_of(&storage_name).to_string(),
            download_url: self.download_url(&storage_name),
            storage_name,
            size_bytes,
        }
    }

    /// Lists every stored file, sorted by storage name.
    ///
    /// Hidden entries, directories and names that are not valid UTF-8 are skipped.
    /// Files removed between the directory read and the size lookup are skipped too.
    pub async fn list(&self) -> AppResult<Vec<StoredFile>> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                log::debug!("Skipping non UTF-8 entry in {}", self.root.display());
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            let metadata = match fs::metadata(entry.path()).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !metadata.is_file() {
                continue;
            }

            files.push(self.describe(name, metadata.len()));
        }

        files.sort_by(|a, b| a.storage_name.cmp(&b.storage_name));
        Ok(files)
    }

    /// Finds the first file whose storage or display name contains `fragment`
    /// (case-insensitive). Ties resolve to the lexicographically smallest
    /// storage name, i.e. the oldest upload of that name.
    pub async fn resolve(&self, fragment: &str) -> AppResult<Option<StoredFile>> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }

        Ok(self.list().await?.into_iter().find(|file| {
            file.storage_name.to_lowercase().contains(&needle) || file.display_name.to_lowercase().contains(&needle)
        }))
    }

    /// Returns every file whose storage name contains `keyword` (case-insensitive).
    pub async fn search(&self, keyword: &str) -> AppResult<Vec<StoredFile>> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|file| file.storage_name.to_lowercase().contains(&needle))
            .collect())
    }

    /// Writes `bytes` under a fresh timestamp-prefixed storage name.
    pub async fn store(&self, bytes: &[u8], original_name: &str) -> AppResult<StoredFile> {
        let mut upload = self.begin_upload(original_name).await?;
        upload.write_chunk(bytes).await?;
        upload.finish().await
    }

    /// Reserves a fresh storage name and opens it for chunked writes.
    ///
    /// Files are created exclusively; if two uploads of the same name land in
    /// the same millisecond the later one takes the next free timestamp.
    /// The file is removed again unless [`PendingUpload::finish`] is reached.
    pub async fn begin_upload(&self, original_name: &str) -> AppResult<PendingUpload> {
        let clean_name = sanitize_file_name(original_name);
        let mut stamp = Utc::now().timestamp_millis();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let storage_name = format!("{}-{}", stamp, clean_name);
            let path = self.root.join(&storage_name);

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => {
                    return Ok(PendingUpload {
                        file: Some(file),
                        path,
                        stored: self.describe(storage_name, 0),
                        committed: false,
                    })
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => stamp += 1,
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free storage name for {}", clean_name),
        )))
    }

    /// Removes the first file matching `fragment`. Returns the removed file,
    /// or `None` when nothing matched.
    pub async fn delete(&self, fragment: &str) -> AppResult<Option<StoredFile>> {
        let Some(file) = self.resolve(fragment).await? else {
            return Ok(None);
        };

        match fs::remove_file(self.path_of(&file)).await {
            Ok(()) => {
                log::info!("Deleted {}", file.storage_name);
                Ok(Some(file))
            }
            // Lost a race with another delete
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// A file being written into the store.
///
/// Dropping it before `finish` (an error, a rejected body or a client that
/// went away) deletes the partial file.
#[derive(Debug)]
pub struct PendingUpload {
    file: Option<fs::File>,
    path: PathBuf,
    stored: StoredFile,
    committed: bool,
}

impl PendingUpload {
    /// Storage name reserved for this upload
    pub fn storage_name(&self) -> &str {
        &self.stored.storage_name
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> AppResult<()> {
        let Some(file) = self.file.as_mut() else {
            return Err(AppError::Io(std::io::Error::other("upload already finished")));
        };
        file.write_all(chunk).await?;
        self.stored.size_bytes += chunk.len() as u64;
        Ok(())
    }

    /// Flushes the file to disk and hands back its description.
    pub async fn finish(mut self) -> AppResult<StoredFile> {
        let Some(mut file) = self.file.take() else {
            return Err(AppError::Io(std::io::Error::other("upload already finished")));
        };
        file.flush().await?;
        file.sync_all().await?;

        self.committed = true;
        let stored = self.stored.clone();
        log::info!("Stored {} ({} bytes)", stored.storage_name, stored.size_bytes);
        Ok(stored)
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        drop(self.file.take());
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("Failed to remove partial upload {}: {}", self.path.display(), e);
        } else {
            log::info!("Discarded partial upload {}", self.stored.storage_name);
        }
    }
}

/// Strips the `<digits>-` timestamp prefix from a storage name.
/// Names without such a prefix are returned unchanged.
pub fn display_name_of(storage_name: &str) -> &str {
    match storage_name.split_once('-') {
        Some((prefix, rest))
            if !prefix.is_empty() && !rest.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            rest
        }
        _ => storage_name,
    }
}

/// Makes a client-supplied file name safe to use as a path component.
///
/// Keeps only the last path segment, replaces characters that are reserved
/// on common filesystems, and trims leading/trailing dots and spaces.
pub fn sanitize_file_name(name: &str) -> String {
    let last_segment = name.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(name);

    let replaced: String = last_segment
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Upload allow-list check.
///
/// The extension must be on the list. When the client sends a MIME type it
/// must belong to an accepted family as well.
pub fn is_allowed_upload(file_name: &str, mime: Option<&str>) -> bool {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let extension_ok = extension
        .as_deref()
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext));
    if !extension_ok {
        return false;
    }

    match mime.map(|m| m.trim().to_ascii_lowercase()) {
        None => true,
        Some(m) if m.is_empty() => true,
        Some(m) => {
            ALLOWED_MIME_TYPES.contains(&m.as_str()) || ALLOWED_MIME_PREFIXES.iter().any(|prefix| m.starts_with(prefix))
        }
    }
}
