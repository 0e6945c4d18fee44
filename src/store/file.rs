//! Directory-backed [`RequestTokenStore`] shared by several processes on one host.
//!
//! Each record lives in its own JSON file named after the base64url-encoded token, so two
//! handshakes never rewrite the same file. Writes land in a unique temporary file that is
//! then renamed over the target.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
	process,
	sync::atomic::{AtomicU64, Ordering},
};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{RequestTokenRecord, RequestTokenStore, StoreError, StoreFuture},
};

const RECORD_EXTENSION: &str = "json";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persists each request-token record to `<dir>/<base64url(token)>.json`.
#[derive(Clone, Debug)]
pub struct FileStore {
	dir: PathBuf,
}
impl FileStore {
	/// Opens (or creates) a store rooted at `dir`.
	pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let dir = dir.into();

		fs::create_dir_all(&dir).map_err(|e| StoreError::Backend {
			message: format!("Failed to create store directory {}: {e}", dir.display()),
		})?;

		Ok(Self { dir })
	}

	/// Directory holding the record files.
	pub fn dir(&self) -> &Path {
		&self.dir
	}

	fn record_path(&self, token: &str) -> PathBuf {
		self.dir.join(format!("{}.{RECORD_EXTENSION}", URL_SAFE_NO_PAD.encode(token)))
	}

	fn read_record(path: &Path) -> Result<Option<RequestTokenRecord>, StoreError> {
		let bytes = match fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) =>
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", path.display()),
				}),
		};
		let record = serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})?;

		Ok(Some(record))
	}

	fn write_record(&self, record: &RequestTokenRecord) -> Result<(), StoreError> {
		let path = self.record_path(&record.token);
		let serialized = serde_json::to_vec(record).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize record for {}: {e}", path.display()),
		})?;
		let tmp_path = path.with_extension(format!(
			"{}.{}.tmp",
			process::id(),
			TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
		));

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &path).map_err(|e| {
			let _ = fs::remove_file(&tmp_path);

			StoreError::Backend { message: format!("Failed to replace {}: {e}", path.display()) }
		})
	}

	fn remove_record(path: &Path) -> Result<bool, StoreError> {
		match fs::remove_file(path) {
			Ok(()) => Ok(true),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
			Err(e) => Err(StoreError::Backend {
				message: format!("Failed to remove {}: {e}", path.display()),
			}),
		}
	}

	fn get_now(
		&self,
		token: &str,
		now: OffsetDateTime,
	) -> Result<Option<TokenSecret>, StoreError> {
		let path = self.record_path(token);
		let Some(record) = Self::read_record(&path)? else {
			return Ok(None);
		};

		if record.is_expired(now) {
			Self::remove_record(&path)?;

			return Ok(None);
		}

		Ok(Some(record.token_secret))
	}

	fn purge_now(&self, now: OffsetDateTime) -> Result<usize, StoreError> {
		let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::Backend {
			message: format!("Failed to list {}: {e}", self.dir.display()),
		})?;
		let mut removed = 0;

		for entry in entries {
			let path = entry
				.map_err(|e| StoreError::Backend {
					message: format!("Failed to list {}: {e}", self.dir.display()),
				})?
				.path();

			if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
				continue;
			}

			let expired =
				Self::read_record(&path)?.is_some_and(|record| record.is_expired(now));

			if expired && Self::remove_record(&path)? {
				removed += 1;
			}
		}

		Ok(removed)
	}
}
impl RequestTokenStore for FileStore {
	fn put(&self, record: RequestTokenRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.write_record(&record) })
	}

	fn get<'a>(
		&'a self,
		token: &'a str,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<TokenSecret>> {
		Box::pin(async move { self.get_now(token, now) })
	}

	fn delete<'a>(&'a self, token: &'a str) -> StoreFuture<'a, bool> {
		Box::pin(async move { Self::remove_record(&self.record_path(token)) })
	}

	fn purge_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, usize> {
		Box::pin(async move { self.purge_now(now) })
	}
}
