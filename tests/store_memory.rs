// std
use std::path::PathBuf;
// self
use oauth2_interceptor::{
	_preludet::*,
	store::{FileStore, MemoryStore, TokenStore},
};

const KEY: &str = "oauth2_interceptor.spotify_token";

async fn exercise(store: &dyn TokenStore) {
	assert!(store.get(KEY).await.expect("Failed to read missing key.").is_none());

	store.put(KEY, "first".into()).await.expect("Failed to save first token.");
	store.put(KEY, "second".into()).await.expect("Failed to overwrite token.");

	let fetched = store.get(KEY).await.expect("Failed to read token.");

	assert_eq!(fetched.as_deref(), Some("second"));
	assert!(store.get("other.key").await.expect("Failed to read unrelated key.").is_none());

	let removed = store.remove(KEY).await.expect("Failed to remove token.");

	assert_eq!(removed.as_deref(), Some("second"));
	assert!(store.remove(KEY).await.expect("Failed to remove absent token.").is_none());
}

fn temp_path() -> PathBuf {
	std::env::temp_dir().join(format!(
		"oauth2_interceptor_store_it_{}_{}.json",
		std::process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	))
}

#[tokio::test]
async fn memory_store_last_write_wins() {
	let store = MemoryStore::default();

	exercise(&store).await;

	assert!(store.is_empty());
}

#[tokio::test]
async fn memory_store_clones_share_state() {
	let store = MemoryStore::default();
	let clone = store.clone();

	store.put(KEY, "shared".into()).await.expect("Failed to save shared token.");

	assert_eq!(clone.len(), 1);
	assert_eq!(
		clone.get(KEY).await.expect("Failed to read shared token.").as_deref(),
		Some("shared")
	);
}

#[tokio::test]
async fn file_store_matches_memory_semantics() {
	let path = temp_path();
	let store = FileStore::open(&path).expect("Failed to open file store.");

	exercise(&store).await;

	assert_eq!(store.path(), path.as_path());

	std::fs::remove_file(&path).expect("Failed to remove temporary file store.");
}

#[tokio::test]
async fn concurrent_writers_leave_one_value() {
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let handles = (0..16)
		.map(|i| {
			let store = store.clone();

			tokio::spawn(async move { store.put(KEY, format!("token-{i}")).await })
		})
		.collect::<Vec<_>>();

	for handle in handles {
		handle.await.expect("Writer task should not panic.").expect("Write should succeed.");
	}

	let value = store
		.get(KEY)
		.await
		.expect("Failed to read token.")
		.expect("One of the writes should be visible.");

	assert!(value.starts_with("token-"));
}
