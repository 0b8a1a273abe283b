use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use chrono::Local;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::dispatch::main_queue::MainContext;
use crate::dispatch::post_if_alive;
use crate::dispatch::serial_queue::SerialQueue;
use crate::models::asset::StoredAsset;
use crate::models::config::StoreConfiguration;
use crate::models::error::CaptureError;
use crate::processing::photo;
use crate::storage::naming;

/// Asynchronous disk cache for captured photos.
///
/// Every file operation runs on the store's own serial write queue, separate
/// from the capture worker, so storage I/O never holds up the next shutter.
/// Completions always fire, on the main context, carrying success or failure.
///
/// ## Layout
///
/// ```text
/// <caches_root>/<directory_prefix>/<uuid>/   ← one per store, created on first write
///     2022_08_15_21_05_09.jpg
///     2022_08_15_21_05_09_1.jpg               ← second capture in the same second
/// ```
///
/// Files are staged in a temp file inside the directory and moved into place
/// with a no-clobber rename: a reader never sees a partial asset, and an
/// existing asset is never overwritten.
pub struct AssetStore {
    inner: Arc<StoreInner>,
    queue: SerialQueue,
    main: Arc<dyn MainContext>,
    alive: Arc<AtomicBool>,
}

struct StoreInner {
    directory: PathBuf,
    jpeg_quality: u8,
}

impl AssetStore {
    pub fn new(config: StoreConfiguration, main: Arc<dyn MainContext>) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::InvalidConfiguration)?;

        let directory = config
            .caches_root
            .join(&config.directory_prefix)
            .join(uuid::Uuid::new_v4().to_string());
        let queue = SerialQueue::new("asset-store-writes")?;

        log::debug!("Asset store directory {}", directory.display());

        Ok(Self {
            inner: Arc::new(StoreInner {
                directory,
                jpeg_quality: config.jpeg_quality,
            }),
            queue,
            main,
            alive: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Directory this store writes into. It may not exist before the first write.
    pub fn directory(&self) -> &Path {
        &self.inner.directory
    }

    /// Normalize, re-encode and persist `data`.
    pub fn create_asset<F>(&self, data: Vec<u8>, completion: F)
    where
        F: FnOnce(Result<StoredAsset, CaptureError>) + Send + 'static,
    {
        self.run_on_queue(completion, move |inner| {
            let result = inner.write_asset(&data);
            match &result {
                Ok(asset) => log::info!("Stored asset {} ({} bytes)", asset.path.display(), asset.byte_len),
                Err(e) => log::error!("Failed to store asset in {}: {}", inner.directory.display(), e),
            }
            result
        });
    }

    /// Remove a file previously produced by this store.
    pub fn delete_asset<F>(&self, path: PathBuf, completion: F)
    where
        F: FnOnce(Result<(), CaptureError>) + Send + 'static,
    {
        self.run_on_queue(completion, move |inner| {
            let result = inner.remove_asset(&path);
            if let Err(ref e) = result {
                log::error!("Failed to remove asset at {}: {}", path.display(), e);
            }
            result
        });
    }

    /// Remove the whole session directory and everything in it.
    pub fn clear<F>(&self, completion: F)
    where
        F: FnOnce(Result<(), CaptureError>) + Send + 'static,
    {
        self.run_on_queue(completion, |inner| {
            let result = inner.remove_directory();
            if let Err(ref e) = result {
                log::error!("Failed to clear {}: {}", inner.directory.display(), e);
            }
            result
        });
    }

    fn run_on_queue<T, F, W>(&self, completion: F, work: W)
    where
        T: Send + 'static,
        F: FnOnce(T) + Send + 'static,
        W: FnOnce(&StoreInner) -> T + Send + 'static,
    {
        let inner: Weak<StoreInner> = Arc::downgrade(&self.inner);
        let main = Arc::clone(&self.main);
        let alive = Arc::clone(&self.alive);

        self.queue.dispatch(move || {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            let result = work(&inner);
            post_if_alive(&main, &alive, move || completion(result));
        });
    }
}

impl Drop for AssetStore {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl StoreInner {
    fn write_asset(&self, data: &[u8]) -> Result<StoredAsset, CaptureError> {
        let encoded = photo::normalize_to_jpeg(data, self.jpeg_quality)?;
        self.ensure_directory()?;

        let created_at = Local::now();
        let stem = naming::timestamp_stem(&created_at);

        let mut staged = NamedTempFile::new_in(&self.directory)
            .map_err(|e| CaptureError::DiskWriteFailed(format!("failed to stage asset: {}", e)))?;
        staged
            .write_all(&encoded)
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|e| CaptureError::DiskWriteFailed(format!("write failed: {}", e)))?;

        for attempt in 0..naming::MAX_NAME_ATTEMPTS {
            let file_name = naming::asset_file_name(&stem, attempt);
            let path = self.directory.join(&file_name);
            match staged.persist_noclobber(&path) {
                Ok(_) => {
                    return Ok(StoredAsset {
                        path,
                        file_name,
                        byte_len: encoded.len() as u64,
                        checksum: hex_encode(&Sha256::digest(&encoded)),
                        created_at,
                    });
                }
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                    log::debug!("{} taken, trying next suffix", path.display());
                    staged = e.file;
                }
                Err(e) => {
                    return Err(CaptureError::DiskWriteFailed(format!(
                        "failed to persist {}: {}",
                        path.display(),
                        e.error
                    )));
                }
            }
        }

        Err(CaptureError::DiskWriteFailed(format!("no free file name for {}", stem)))
    }

    fn remove_asset(&self, path: &Path) -> Result<(), CaptureError> {
        if path.parent() != Some(self.directory.as_path()) {
            return Err(CaptureError::DiskDeleteFailed(format!(
                "{} is not in {}",
                path.display(),
                self.directory.display()
            )));
        }
        fs::remove_file(path).map_err(|e| CaptureError::DiskDeleteFailed(e.to_string()))
    }

    fn remove_directory(&self) -> Result<(), CaptureError> {
        match fs::remove_dir_all(&self.directory) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CaptureError::DiskDeleteFailed(e.to_string())),
        }
    }

    fn ensure_directory(&self) -> Result<(), CaptureError> {
        if self.directory.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.directory).map_err(|e| {
            CaptureError::DiskWriteFailed(format!(
                "failed to create cache directory {}: {}",
                self.directory.display(),
                e
            ))
        })
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
