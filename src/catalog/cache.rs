//! Case-normalized lookup cache for catalog searches.
//!
//! Entries never expire; a re-fetch overwrites the entry for the same key. A cache opened
//! with [`LookupCache::open`] keeps a JSON snapshot on disk so results survive restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{_prelude::*, catalog::CatalogListing, store::StoreError};

const KEY_SEPARATOR: char = '\u{1f}';

#[derive(Debug, Default)]
struct Entries {
	map: HashMap<String, CacheEntry>,
	generation: u64,
}

/// Cached search results for one (artist, track) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
	/// Normalized key (see [`LookupCache::key`]).
	pub key: String,
	/// Listings returned by the provider; may be empty.
	pub results: Vec<CatalogListing>,
	/// Instant the entry was written.
	#[serde(with = "time::serde::rfc3339")]
	pub stored_at: OffsetDateTime,
}

/// Thread-safe map from normalized (artist, track) keys to search results.
#[derive(Debug, Default)]
pub struct LookupCache {
	entries: RwLock<Entries>,
	path: Option<PathBuf>,
	// Generation of the newest snapshot on disk; held across the file write.
	written: Mutex<u64>,
}
impl LookupCache {
	/// Creates an in-memory cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Opens (or creates) a cache persisted at `path`, loading any existing snapshot.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create cache directory {}: {e}", parent.display()),
			})?;
		}

		let map = Self::load_snapshot(&path)?;

		Ok(Self {
			entries: RwLock::new(Entries { map, generation: 0 }),
			path: Some(path),
			written: Mutex::new(0),
		})
	}

	/// `lowercase(artist) + U+001F + lowercase(track)`.
	pub fn key(artist: &str, track: &str) -> String {
		format!("{}{KEY_SEPARATOR}{}", artist.to_lowercase(), track.to_lowercase())
	}

	/// Returns the entry for the pair, ignoring letter case.
	pub fn get(&self, artist: &str, track: &str) -> Option<CacheEntry> {
		self.entries.read().map.get(&Self::key(artist, track)).cloned()
	}

	/// Stores (or overwrites) results for the pair and persists the snapshot when backed by
	/// a file. The in-memory entry is updated even if persisting fails.
	///
	/// The snapshot is serialized under the map lock and written after releasing it, so
	/// readers never wait on disk I/O. A snapshot older than the one already on disk is
	/// discarded instead of written.
	pub fn put(
		&self,
		artist: &str,
		track: &str,
		results: Vec<CatalogListing>,
	) -> Result<CacheEntry, StoreError> {
		let entry = CacheEntry {
			key: Self::key(artist, track),
			results,
			stored_at: OffsetDateTime::now_utc(),
		};
		let pending = {
			let mut entries = self.entries.write();

			entries.map.insert(entry.key.clone(), entry.clone());
			entries.generation += 1;

			match &self.path {
				Some(_) => Some((entries.generation, Self::serialize(&entries.map)?)),
				None => None,
			}
		};

		if let (Some(path), Some((generation, bytes))) = (&self.path, pending) {
			let mut written = self.written.lock();

			if *written < generation {
				Self::write_snapshot(path, &bytes)?;

				*written = generation;
			}
		}

		Ok(entry)
	}

	/// Number of cached pairs.
	pub fn len(&self) -> usize {
		self.entries.read().map.len()
	}

	/// Returns true when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.entries.read().map.is_empty()
	}

	fn load_snapshot(path: &Path) -> Result<HashMap<String, CacheEntry>, StoreError> {
		if !path.exists() {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(HashMap::new());
		}

		let entries: Vec<CacheEntry> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(entries.into_iter().map(|entry| (entry.key.clone(), entry)).collect())
	}

	fn serialize(contents: &HashMap<String, CacheEntry>) -> Result<Vec<u8>, StoreError> {
		let snapshot = contents.values().collect::<Vec<_>>();

		serde_json::to_vec(&snapshot).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize cache snapshot: {e}"),
		})
	}

	fn write_snapshot(path: &Path, serialized: &[u8]) -> Result<(), StoreError> {
		let tmp_path = path.with_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", path.display()),
		})
	}
}
