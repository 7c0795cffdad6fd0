//! File-backed [`TokenStore`] so a cached bearer token survives process restarts, the way a
//! platform preferences file would.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{StoreError, StoreFuture, TokenStore},
};

type Entries = HashMap<String, String>;

/// Keeps entries in memory and rewrites a JSON object file after every mutation.
///
/// A mutation only becomes visible to readers once its snapshot has been written.
///
/// Writes go to a sibling `*.tmp` file that is renamed over the target, so readers of the file
/// only ever see a complete snapshot.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	entries: Arc<RwLock<Entries>>,
}
impl FileStore {
	/// Opens the store at `path`, loading any existing snapshot.
	///
	/// A missing or blank file yields an empty store; a file that is not a JSON object of
	/// strings is rejected with [`StoreError::Serialization`].
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		create_parent(&path)?;

		let entries = read_snapshot(&path)?;

		Ok(Self { path, entries: Arc::new(RwLock::new(entries)) })
	}

	/// Returns the snapshot path.
	pub fn path(&self) -> &Path {
		&self.path
	}
}
impl TokenStore for FileStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move { Ok(self.entries.read().get(key).cloned()) })
	}

	fn put<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut entries = self.entries.write();
			let mut next = entries.clone();

			next.insert(key.to_owned(), value);
			write_snapshot(&self.path, &next)?;
			*entries = next;

			Ok(())
		})
	}

	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move {
			let mut entries = self.entries.write();
			let mut next = entries.clone();
			let Some(previous) = next.remove(key) else {
				return Ok(None);
			};

			write_snapshot(&self.path, &next)?;
			*entries = next;

			Ok(Some(previous))
		})
	}
}

fn backend(action: &str, path: &Path, e: std::io::Error) -> StoreError {
	StoreError::Backend {
		message: format!("Could not {action} token snapshot {}: {e}", path.display()),
	}
}

fn create_parent(path: &Path) -> Result<(), StoreError> {
	match path.parent() {
		Some(dir) if !dir.as_os_str().is_empty() =>
			fs::create_dir_all(dir).map_err(|e| backend("create the directory of", path, e)),
		_ => Ok(()),
	}
}

fn read_snapshot(path: &Path) -> Result<Entries, StoreError> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
		Err(e) => return Err(backend("read", path, e)),
	};

	if raw.trim().is_empty() {
		return Ok(Entries::new());
	}

	serde_json::from_str(&raw).map_err(|e| StoreError::Serialization {
		message: format!("Token snapshot {} is not a JSON object of strings: {e}", path.display()),
	})
}

fn write_snapshot(path: &Path, entries: &Entries) -> Result<(), StoreError> {
	let bytes = serde_json::to_vec_pretty(entries).map_err(|e| StoreError::Serialization {
		message: format!("Could not encode token snapshot: {e}"),
	})?;
	let staging = path.with_extension("tmp");

	create_parent(path)?;

	let mut file = File::create(&staging).map_err(|e| backend("stage", path, e))?;

	file.write_all(&bytes)
		.and_then(|()| file.sync_all())
		.map_err(|e| backend("stage", path, e))?;
	drop(file);

	fs::rename(&staging, path).map_err(|e| backend("replace", path, e))
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	const KEY: &str = "oauth2_interceptor.spotify_token";

	struct Scratch(PathBuf);
	impl Scratch {
		fn new(label: &str) -> Self {
			Self(env::temp_dir().join(format!(
				"oauth2_interceptor_{label}_{}_{}.json",
				process::id(),
				OffsetDateTime::now_utc().unix_timestamp_nanos(),
			)))
		}
	}
	impl Drop for Scratch {
		fn drop(&mut self) {
			let _ = fs::remove_file(&self.0);
		}
	}

	#[tokio::test]
	async fn token_survives_reopen() {
		let scratch = Scratch::new("reopen");
		let store = FileStore::open(&scratch.0).expect("Snapshot should open.");

		store.put(KEY, "persisted".into()).await.expect("Token write should succeed.");
		drop(store);

		let reopened = FileStore::open(&scratch.0).expect("Snapshot should reopen.");

		assert_eq!(
			reopened.get(KEY).await.expect("Token read should succeed.").as_deref(),
			Some("persisted")
		);
		assert!(!scratch.0.with_extension("tmp").exists());
	}

	#[tokio::test]
	async fn removal_is_persisted() {
		let scratch = Scratch::new("remove");
		let store = FileStore::open(&scratch.0).expect("Snapshot should open.");

		store.put(KEY, "short-lived".into()).await.expect("Token write should succeed.");

		assert_eq!(
			store.remove(KEY).await.expect("Token removal should succeed.").as_deref(),
			Some("short-lived")
		);

		let reopened = FileStore::open(&scratch.0).expect("Snapshot should reopen.");

		assert!(reopened.get(KEY).await.expect("Token read should succeed.").is_none());
	}

	#[tokio::test]
	async fn failed_writes_leave_previous_value_visible() {
		let scratch = Scratch::new("failed_write");
		let store = FileStore::open(&scratch.0).expect("Snapshot should open.");

		store.put(KEY, "persisted".into()).await.expect("Token write should succeed.");

		let staging = scratch.0.with_extension("tmp");

		fs::create_dir(&staging).expect("Blocking directory should be created.");

		let err = store
			.put(KEY, "unpersisted".into())
			.await
			.expect_err("Writes should fail while the staging path is a directory.");

		assert!(matches!(err, StoreError::Backend { .. }));
		assert!(store.remove(KEY).await.is_err());
		assert_eq!(
			store.get(KEY).await.expect("Token read should succeed.").as_deref(),
			Some("persisted")
		);

		fs::remove_dir(&staging).expect("Blocking directory should be removed.");
	}

	#[test]
	fn blank_snapshots_open_empty_and_garbage_is_rejected() {
		let blank = Scratch::new("blank");

		fs::write(&blank.0, b"\n  \n").expect("Blank fixture should be written.");

		let store = FileStore::open(&blank.0).expect("Blank snapshots should open.");

		assert!(store.entries.read().is_empty());

		let garbage = Scratch::new("garbage");

		fs::write(&garbage.0, b"[\"not\", \"an object\"]").expect("Fixture should be written.");

		let err = FileStore::open(&garbage.0).expect_err("Non-object snapshots should fail.");

		assert!(matches!(err, StoreError::Serialization { .. }));
	}
}
