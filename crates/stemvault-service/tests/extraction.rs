//! End-to-end extraction flows over the in-memory wiring.

mod common;

use std::sync::Arc;

use common::{build_zip, Env, ObservingBlobStore, RecordingQueue};
use stemvault_core::config::limits::LimitsConfig;
use stemvault_core::error::ErrorKind;
use stemvault_core::traits::blob::BlobStore;
use stemvault_core::traits::queue::TaskQueue;
use stemvault_core::types::OwnerId;
use stemvault_entity::asset::{AssetKind, ProcessingStatus};
use stemvault_service::{AssetService, ExtractionService};
use stemvault_store::AssetStore;

#[tokio::test]
async fn test_upload_extract_builds_tree() {
    let env = Env::new();
    let owner = OwnerId::new();

    let archive = build_zip(
        &[
            ("Song/Song.als", b"project"),
            ("Song/Samples/Kick.wav", b"kick"),
            ("Song/Samples/Snare.wav", b"snare"),
        ],
        &[],
    );
    let root = env
        .asset_service
        .upload(owner, "Song.zip", "Song.zip", archive, false)
        .await
        .unwrap();
    assert!(!root.is_directory);
    assert_eq!(env.queue.kinds(), vec!["archive_extraction"]);

    env.extraction.extract(root.id).await.unwrap();

    let root = env.asset_service.get(owner, root.id).unwrap();
    assert!(root.is_directory);
    assert!(root.extracted);
    assert_eq!(root.kind, Some(AssetKind::Ableton));
    assert!(root.processing.status.is_idle());

    let top = env.assets.children(root.id, owner, true);
    assert_eq!(top.len(), 1);
    let wrapper = &top[0];
    assert!(wrapper.is_directory);
    assert_eq!(wrapper.path, "Song");

    let inside = env.assets.children(wrapper.id, owner, true);
    let names: Vec<&str> = inside.iter().map(|a| a.original_filename.as_str()).collect();
    assert_eq!(names, vec!["Samples", "Song.als"]);

    let samples = inside.iter().find(|a| a.is_directory).unwrap();
    let kick = env
        .assets
        .children(samples.id, owner, true)
        .into_iter()
        .find(|a| a.original_filename == "Kick.wav")
        .unwrap();
    assert_eq!(kick.path, "Song/Samples/Kick.wav");
    assert_eq!(kick.kind, Some(AssetKind::LosslessAudio));
    assert!(kick.blob.is_some());
    assert_eq!(
        env.blobs.get(&kick.blob.unwrap()).await.unwrap().as_ref(),
        b"kick"
    );
}

#[tokio::test]
async fn test_extraction_total_visible_while_running() {
    let assets = Arc::new(AssetStore::new());
    let blobs = Arc::new(ObservingBlobStore::new(Arc::clone(&assets)));
    let blob_store: Arc<dyn BlobStore> = Arc::clone(&blobs) as Arc<dyn BlobStore>;
    let queue: Arc<dyn TaskQueue> = Arc::new(RecordingQueue::default());
    let asset_service = AssetService::new(
        Arc::clone(&assets),
        Arc::clone(&blob_store),
        queue,
        u64::MAX,
    );
    let extraction = ExtractionService::new(
        Arc::clone(&assets),
        blob_store,
        LimitsConfig::default(),
    );
    let owner = OwnerId::new();

    let archive = build_zip(
        &[("Song/Kick.wav", b"kick"), ("Song/Snare.wav", b"snare")],
        &[],
    );
    let root = asset_service
        .upload(owner, "Song.zip", "Song.zip", archive, false)
        .await
        .unwrap();
    blobs.watch(root.id);

    extraction.extract(root.id).await.unwrap();

    // The denominator is set before the first file is stored and holds
    // for the whole run; progress trails by one at each store.
    let snapshots = blobs.snapshots();
    assert_eq!(snapshots.len(), 2, "one snapshot per stored file");
    assert!(snapshots
        .iter()
        .all(|p| p.status == ProcessingStatus::Extracting && p.total == 2));
    assert_eq!(snapshots[0].progress, 0);
    assert_eq!(snapshots[1].progress, 1);

    let root = assets.get_unscoped(root.id).unwrap();
    assert!(root.processing.status.is_idle());
    assert_eq!(root.processing.total, 0, "counters cleared on completion");
}

#[tokio::test]
async fn test_hidden_entries_persisted_but_invisible() {
    let env = Env::new();
    let owner = OwnerId::new();

    let archive = build_zip(
        &[
            ("Song/Kick.wav", b"kick"),
            ("Song/Kick.asd", b"sidecar"),
            ("__MACOSX/Song/._Kick.wav", b"junk"),
            ("Song/.DS_Store", b"junk"),
        ],
        &[],
    );
    let root = env
        .asset_service
        .upload(owner, "Song.zip", "Song.zip", archive, false)
        .await
        .unwrap();
    env.extraction.extract(root.id).await.unwrap();

    let visible_top = env.assets.children(root.id, owner, true);
    assert_eq!(visible_top.len(), 1, "only the Song folder is visible");

    let all_top = env.assets.children(root.id, owner, false);
    assert_eq!(all_top.len(), 2, "__MACOSX is persisted, hidden");
    let macosx = all_top
        .iter()
        .find(|a| a.original_filename == "__MACOSX")
        .unwrap();
    assert!(macosx.hidden);

    let song = visible_top.into_iter().next().unwrap();
    let visible = env.assets.children(song.id, owner, true);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].original_filename, "Kick.wav");
    let all = env.assets.children(song.id, owner, false);
    assert_eq!(all.len(), 3, "sidecar and .DS_Store persisted hidden");
}

#[tokio::test]
async fn test_browse_skips_single_wrapper_directory() {
    let env = Env::new();
    let owner = OwnerId::new();

    let archive = build_zip(&[("Wrap/a.wav", b"a"), ("Wrap/b.wav", b"b")], &[]);
    let root = env
        .asset_service
        .upload(owner, "Wrap.zip", "Wrap.zip", archive, false)
        .await
        .unwrap();
    env.extraction.extract(root.id).await.unwrap();

    let listing = env.asset_service.browse(owner, root.id, None).unwrap();
    let wrapper = listing.skipped_root.expect("wrapper directory skipped");
    assert_eq!(wrapper.original_filename, "Wrap");
    assert_eq!(listing.current.id, wrapper.id);
    assert_eq!(listing.entries.len(), 2);

    // Browsing the wrapper explicitly does not skip again.
    let explicit = env
        .asset_service
        .browse(owner, root.id, Some(wrapper.id))
        .unwrap();
    assert!(explicit.skipped_root.is_none());
    assert_eq!(explicit.entries.len(), 2);
}

#[tokio::test]
async fn test_flat_archive_does_not_skip() {
    let env = Env::new();
    let owner = OwnerId::new();

    let archive = build_zip(&[("a.wav", b"a"), ("b.wav", b"b")], &[]);
    let root = env
        .asset_service
        .upload(owner, "Flat.zip", "Flat.zip", archive, false)
        .await
        .unwrap();
    env.extraction.extract(root.id).await.unwrap();

    let listing = env.asset_service.browse(owner, root.id, None).unwrap();
    assert!(listing.skipped_root.is_none());
    assert_eq!(listing.entries.len(), 2);
    assert_eq!(listing.entries[0].path, "a.wav");
}

#[tokio::test]
async fn test_classification_marks_project_directories() {
    let env = Env::new();
    let owner = OwnerId::new();

    let archive = build_zip(
        &[
            ("Pack/Live/Set.als", b"als"),
            ("Pack/Loops/loop.wav", b"wav"),
        ],
        &[],
    );
    let root = env
        .asset_service
        .upload(owner, "Pack.zip", "Pack.zip", archive, false)
        .await
        .unwrap();
    env.extraction.extract(root.id).await.unwrap();

    let root = env.asset_service.get(owner, root.id).unwrap();
    assert_eq!(root.kind, Some(AssetKind::Ableton));

    let pack = env.assets.children(root.id, owner, true).remove(0);
    let dirs = env.assets.children(pack.id, owner, true);
    let live = dirs.iter().find(|d| d.original_filename == "Live").unwrap();
    let loops = dirs.iter().find(|d| d.original_filename == "Loops").unwrap();
    assert_eq!(live.kind, Some(AssetKind::Ableton));
    assert_eq!(loops.kind, Some(AssetKind::Folder));
}

#[tokio::test]
async fn test_reextraction_conflicts() {
    let env = Env::new();
    let owner = OwnerId::new();

    let archive = build_zip(&[("a.wav", b"a")], &[]);
    let root = env
        .asset_service
        .upload(owner, "A.zip", "A.zip", archive, false)
        .await
        .unwrap();
    env.extraction.extract(root.id).await.unwrap();

    let err = env.extraction.extract(root.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_entry_limit_rejected_before_any_node() {
    let mut limits = LimitsConfig::default();
    limits.max_archive_entries = 2;
    let env = Env::with_limits(limits);
    let owner = OwnerId::new();

    let archive = build_zip(&[("a.wav", b"a"), ("b.wav", b"b"), ("c.wav", b"c")], &[]);
    let root = env
        .asset_service
        .upload(owner, "Big.zip", "Big.zip", archive, false)
        .await
        .unwrap();

    let err = env.extraction.extract(root.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::CapacityExceeded);
    assert!(err.message.contains("limit of 2"), "states the limit: {}", err.message);

    assert_eq!(env.assets.count(), 1, "no child node was created");
    let root = env.asset_service.get(owner, root.id).unwrap();
    assert!(root.processing.status.is_idle(), "claim was released");
    assert!(!root.extracted);
}

#[tokio::test]
async fn test_byte_limit_rejected() {
    let mut limits = LimitsConfig::default();
    limits.max_archive_bytes = 4;
    let env = Env::with_limits(limits);
    let owner = OwnerId::new();

    let archive = build_zip(&[("a.wav", b"0123456789")], &[]);
    let root = env
        .asset_service
        .upload(owner, "A.zip", "A.zip", archive, false)
        .await
        .unwrap();

    let err = env.extraction.extract(root.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::CapacityExceeded);
}

#[tokio::test]
async fn test_directory_entries_materialize_empty_dirs() {
    let env = Env::new();
    let owner = OwnerId::new();

    let archive = build_zip(&[("Pack/a.wav", b"a")], &["Pack/Empty"]);
    let root = env
        .asset_service
        .upload(owner, "Pack.zip", "Pack.zip", archive, false)
        .await
        .unwrap();
    env.extraction.extract(root.id).await.unwrap();

    let pack = env.assets.children(root.id, owner, true).remove(0);
    let entries = env.assets.children(pack.id, owner, true);
    let empty = entries
        .iter()
        .find(|a| a.original_filename == "Empty")
        .expect("empty directory preserved");
    assert!(empty.is_directory);
    assert_eq!(empty.path, "Pack/Empty");
}
