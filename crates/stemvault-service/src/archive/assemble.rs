//! Archive assembly: turn a subtree back into a zip.
//!
//! Assembly is planned once and written by one shared writer, so the
//! eager (background job) and streaming paths produce byte-identical
//! entry paths for the same subtree. Entry paths are relative to the
//! assembly root; hidden nodes never appear.

use std::io::{Cursor, Seek, Write};
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use stemvault_core::config::limits::LimitsConfig;
use stemvault_core::error::ErrorKind;
use stemvault_core::result::AppResult;
use stemvault_core::traits::blob::BlobStore;
use stemvault_core::types::{AssetId, BlobId, DownloadId, OwnerId};
use stemvault_core::AppError;
use stemvault_entity::asset::Asset;
use stemvault_entity::download::{Download, DownloadStatus};
use stemvault_store::{AssetStore, DownloadStore};

/// What one planned archive entry carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanContent {
    /// File content, referenced by blob.
    File(BlobId),
    /// A directory with no visible entries, preserved as a
    /// trailing-slash-only entry.
    EmptyDirectory,
}

/// One planned archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    /// Slash-joined path relative to the assembly root. Empty directories
    /// end with `/`.
    pub archive_path: String,
    /// The entry's content.
    pub content: PlanContent,
}

/// The planned output for a download request.
#[derive(Debug, Clone)]
pub enum AssemblyOutput {
    /// A childless file: its blob is served as-is, no archive is built.
    Direct {
        /// The file's content blob.
        blob: BlobId,
        /// The filename to serve.
        filename: String,
    },
    /// An archive to build from the planned entries.
    Archive {
        /// The archive filename to serve.
        filename: String,
        /// Entries in write order.
        entries: Vec<PlanEntry>,
    },
}

/// Service that plans and writes subtree archives.
#[derive(Debug)]
pub struct AssemblyService {
    assets: Arc<AssetStore>,
    downloads: Arc<DownloadStore>,
    blobs: Arc<dyn BlobStore>,
    limits: LimitsConfig,
}

impl AssemblyService {
    /// Create a new assembly service.
    pub fn new(
        assets: Arc<AssetStore>,
        downloads: Arc<DownloadStore>,
        blobs: Arc<dyn BlobStore>,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            assets,
            downloads,
            blobs,
            limits,
        }
    }

    /// Plan the output for an asset: a direct blob for a childless file,
    /// otherwise the ordered archive entry list for its visible subtree.
    ///
    /// Rejects with `CapacityExceeded` before anything is written when
    /// the subtree holds more files than the configured ceiling.
    pub fn plan(&self, owner: OwnerId, asset_id: AssetId) -> AppResult<AssemblyOutput> {
        let asset = self.assets.get(asset_id, owner)?;
        let children = self.assets.children(asset.id, owner, true);

        if !asset.is_directory && children.is_empty() {
            let blob = asset
                .blob
                .ok_or_else(|| AppError::assembly("Asset has no content"))?;
            return Ok(AssemblyOutput::Direct {
                blob,
                filename: asset.download_filename(),
            });
        }

        let mut entries = Vec::new();
        self.collect(owner, &asset, "", &mut entries);
        if entries.is_empty() {
            // A fully empty root still yields a valid archive with one
            // empty directory named after it.
            entries.push(PlanEntry {
                archive_path: format!("{}/", asset.display_name()),
                content: PlanContent::EmptyDirectory,
            });
        }

        let file_count = entries
            .iter()
            .filter(|e| matches!(e.content, PlanContent::File(_)))
            .count() as u64;
        if file_count > self.limits.max_assembly_files {
            return Err(AppError::capacity_exceeded(format!(
                "Subtree holds {} files, exceeding the archive limit of {}",
                file_count, self.limits.max_assembly_files
            )));
        }

        Ok(AssemblyOutput::Archive {
            filename: archive_filename(&asset),
            entries,
        })
    }

    /// Run one eager assembly behind a download tracking record.
    ///
    /// Transitions the record `pending -> processing -> ready`, bumping
    /// progress after every written entry; any error marks it `failed`
    /// with the reason.
    pub async fn assemble(&self, download_id: DownloadId) -> AppResult<()> {
        let download = self.downloads.get_unscoped(download_id)?;
        match self.run(&download).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let message = err.message.clone();
                self.downloads
                    .update(download_id, |d| {
                        d.status = DownloadStatus::Failed;
                        d.error_message = Some(message.clone());
                    })
                    .ok();
                Err(err)
            }
        }
    }

    async fn run(&self, download: &Download) -> AppResult<()> {
        let plan = self.plan(download.owner_id, download.asset_id)?;

        match plan {
            AssemblyOutput::Direct { blob, filename } => {
                // No archive to build: re-reference the file's own blob.
                self.blobs.retain(&blob).await?;
                self.downloads.update(download.id, |d| {
                    d.filename = filename.clone();
                    d.total = 1;
                    d.progress = 1;
                    d.archive_blob = Some(blob);
                    d.status = DownloadStatus::Ready;
                })?;
            }
            AssemblyOutput::Archive { filename, entries } => {
                // Progress counts files; empty directories cost nothing.
                let total = entries
                    .iter()
                    .filter(|e| matches!(e.content, PlanContent::File(_)))
                    .count() as u64;
                self.downloads.update(download.id, |d| {
                    d.filename = filename.clone();
                    d.total = total;
                    d.status = DownloadStatus::Processing;
                })?;

                let download_id = download.id;
                let downloads = Arc::clone(&self.downloads);
                let cursor = self
                    .write_entries(&entries, Cursor::new(Vec::new()), move |entry| {
                        if matches!(entry.content, PlanContent::File(_)) {
                            downloads.update(download_id, |d| d.progress += 1).ok();
                        }
                    })
                    .await?;

                let archive = Bytes::from(cursor.into_inner());
                info!(
                    download = %download.id,
                    entries = entries.len(),
                    bytes = archive.len(),
                    "Assembled archive"
                );
                let blob = self
                    .blobs
                    .put(archive, Some("application/zip".to_string()))
                    .await?;
                self.downloads.update(download.id, |d| {
                    d.archive_blob = Some(blob);
                    d.status = DownloadStatus::Ready;
                })?;
            }
        }
        Ok(())
    }

    /// Write planned entries to a zip over any seekable sink, invoking
    /// `on_entry` after each one. Both assembly modes funnel through
    /// here, which is what keeps their entry paths identical.
    pub async fn write_entries<W, F>(
        &self,
        entries: &[PlanEntry],
        sink: W,
        mut on_entry: F,
    ) -> AppResult<W>
    where
        W: Write + Seek + Send,
        F: FnMut(&PlanEntry) + Send,
    {
        let mut zip = ZipWriter::new(sink);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for entry in entries {
            match &entry.content {
                PlanContent::EmptyDirectory => {
                    zip.add_directory(entry.archive_path.trim_end_matches('/'), options)
                        .map_err(zip_error)?;
                }
                PlanContent::File(blob) => {
                    let data = self.blobs.get(blob).await?;
                    zip.start_file(&entry.archive_path, options)
                        .map_err(zip_error)?;
                    zip.write_all(&data).map_err(|err| {
                        AppError::with_source(
                            ErrorKind::Assembly,
                            format!("Failed to write entry: {}", entry.archive_path),
                            err,
                        )
                    })?;
                }
            }
            on_entry(entry);
        }

        zip.finish().map_err(zip_error)
    }

    /// Lazily resolve planned entries to their content, one at a time.
    /// Streaming consumers pull from this without buffering the archive.
    /// Empty directories yield `None` content.
    pub fn entry_stream(
        &self,
        entries: Vec<PlanEntry>,
    ) -> impl Stream<Item = AppResult<(String, Option<Bytes>)>> + Send + 'static {
        let blobs = Arc::clone(&self.blobs);
        stream::iter(entries).then(move |entry| {
            let blobs = Arc::clone(&blobs);
            async move {
                match entry.content {
                    PlanContent::File(blob) => {
                        let data = blobs.get(&blob).await?;
                        Ok((entry.archive_path, Some(data)))
                    }
                    PlanContent::EmptyDirectory => Ok((entry.archive_path, None)),
                }
            }
        })
    }

    /// Depth-first collection of visible entries under `node`.
    fn collect(&self, owner: OwnerId, node: &Asset, prefix: &str, entries: &mut Vec<PlanEntry>) {
        for child in self.assets.children(node.id, owner, true) {
            let path = if prefix.is_empty() {
                child.segment().to_string()
            } else {
                format!("{prefix}/{}", child.segment())
            };

            if child.is_directory {
                let before = entries.len();
                self.collect(owner, &child, &path, entries);
                if entries.len() == before {
                    entries.push(PlanEntry {
                        archive_path: format!("{path}/"),
                        content: PlanContent::EmptyDirectory,
                    });
                }
            } else if let Some(blob) = child.blob {
                entries.push(PlanEntry {
                    archive_path: path,
                    content: PlanContent::File(blob),
                });
            }
        }
    }
}

fn zip_error(err: zip::result::ZipError) -> AppError {
    AppError::with_source(ErrorKind::Assembly, "Failed to write archive", err)
}

/// The serve filename for an assembled archive. Extracted roots keep
/// their display name without doubling the `.zip` suffix.
fn archive_filename(asset: &Asset) -> String {
    let name = asset.display_name();
    let stem = name
        .strip_suffix(".zip")
        .or_else(|| name.strip_suffix(".ZIP"))
        .unwrap_or(name);
    format!("{stem}.zip")
}
