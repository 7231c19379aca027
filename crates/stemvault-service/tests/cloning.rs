//! Duplication and cross-owner cloning over the in-memory wiring.

mod common;

use std::sync::Arc;

use common::{build_zip, Env, ObservingBlobStore, RecordingQueue};
use stemvault_core::error::ErrorKind;
use stemvault_core::traits::blob::BlobStore;
use stemvault_core::traits::queue::TaskQueue;
use stemvault_core::types::OwnerId;
use stemvault_entity::asset::{Asset, ProcessingStatus};
use stemvault_service::CloneService;
use stemvault_store::AssetStore;

#[tokio::test]
async fn test_duplicate_file_shares_blob() {
    let env = Env::new();
    let owner = OwnerId::new();

    let file = env
        .asset_service
        .upload(owner, "Kick.wav", "Kick.wav", bytes::Bytes::from_static(b"kick"), false)
        .await
        .unwrap();

    let copy = env.clones.duplicate(owner, file.id).await.unwrap();
    assert_eq!(copy.title, "Kick.wav (copy)");
    assert_eq!(copy.blob, file.blob, "content shared by reference");
    assert!(copy.processing.status.is_idle(), "no population needed");
    assert!(env.queue.kinds().is_empty());

    let meta = env.blobs.metadata(&file.blob.unwrap()).await.unwrap();
    assert_eq!(meta.ref_count, 2);

    let second = env.clones.duplicate(owner, file.id).await.unwrap();
    assert_eq!(second.title, "Kick.wav (copy 2)");
}

#[tokio::test]
async fn test_duplicate_directory_populates_with_progress() {
    let env = Env::new();
    let owner = OwnerId::new();

    let archive = build_zip(
        &[
            ("Pack/a.wav", b"a"),
            ("Pack/b.wav", b"b"),
            ("Pack/Sub/c.wav", b"c"),
        ],
        &[],
    );
    let root = env
        .asset_service
        .upload(owner, "Pack.zip", "Pack.zip", archive, false)
        .await
        .unwrap();
    env.extraction.extract(root.id).await.unwrap();

    let copy = env.clones.duplicate(owner, root.id).await.unwrap();
    assert_eq!(copy.processing.status, ProcessingStatus::Importing);
    assert!(env.queue.kinds().contains(&"populate_copy".to_string()));

    env.clones.populate(root.id, copy.id).await.unwrap();

    let copy = env.asset_service.get(owner, copy.id).unwrap();
    assert!(copy.processing.status.is_idle());
    assert_eq!(
        env.assets.descendants(copy.id).len(),
        env.assets.descendants(root.id).len()
    );

    // Counterpart files share blobs, with paths rebuilt under the copy.
    let source_kick = env
        .assets
        .descendants(root.id)
        .into_iter()
        .find(|a| a.original_filename == "c.wav")
        .unwrap();
    let copy_kick = env
        .assets
        .descendants(copy.id)
        .into_iter()
        .find(|a| a.original_filename == "c.wav")
        .unwrap();
    assert_eq!(copy_kick.blob, source_kick.blob);
    assert_eq!(copy_kick.path, source_kick.path);
}

#[tokio::test]
async fn test_clone_progress_counts_nodes_while_running() {
    let assets = Arc::new(AssetStore::new());
    let blobs = Arc::new(ObservingBlobStore::new(Arc::clone(&assets)));
    let blob_store: Arc<dyn BlobStore> = Arc::clone(&blobs) as Arc<dyn BlobStore>;
    let queue: Arc<dyn TaskQueue> = Arc::new(RecordingQueue::default());
    let clones = CloneService::new(Arc::clone(&assets), blob_store, queue);
    let owner = OwnerId::new();

    let root = assets.insert(Asset::new_root_folder(owner, "Pack"));
    for name in ["a.wav", "b.wav", "c.wav"] {
        let mut node = Asset::new_file(owner, &root, name);
        node.blob = Some(
            blobs
                .put(bytes::Bytes::from_static(b"x"), None)
                .await
                .unwrap(),
        );
        assets.insert(node);
    }

    let copy = clones.duplicate(owner, root.id).await.unwrap();
    blobs.watch(copy.id);
    clones.populate(root.id, copy.id).await.unwrap();

    // Progress counts nodes with the root included: a 3-file folder runs
    // to 4/4, and each shared blob sees the prior node already counted.
    let snapshots = blobs.snapshots();
    assert_eq!(snapshots.len(), 3, "one snapshot per shared blob");
    assert!(snapshots
        .iter()
        .all(|p| p.status == ProcessingStatus::Importing && p.total == 4));
    let progress: Vec<u64> = snapshots.iter().map(|p| p.progress).collect();
    assert_eq!(progress, vec![1, 2, 3], "root counted before the first file");

    let copy = assets.get_unscoped(copy.id).unwrap();
    assert!(copy.processing.status.is_idle());
    assert_eq!(assets.descendants(copy.id).len(), 3);
}

#[tokio::test]
async fn test_duplicate_non_root_rejected() {
    let env = Env::new();
    let owner = OwnerId::new();

    let archive = build_zip(&[("Pack/a.wav", b"a")], &[]);
    let root = env
        .asset_service
        .upload(owner, "Pack.zip", "Pack.zip", archive, false)
        .await
        .unwrap();
    env.extraction.extract(root.id).await.unwrap();

    let child = env.assets.children(root.id, owner, true).remove(0);
    let err = env.clones.duplicate(owner, child.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_clone_to_owner_survives_source_deletion() {
    let env = Env::new();
    let source_owner = OwnerId::new();
    let new_owner = OwnerId::new();

    let archive = build_zip(&[("Pack/a.wav", b"content-a")], &[]);
    let root = env
        .asset_service
        .upload(source_owner, "Pack.zip", "Pack.zip", archive, false)
        .await
        .unwrap();
    env.extraction.extract(root.id).await.unwrap();

    let placeholder = env
        .clones
        .clone_to_owner(source_owner, root.id, new_owner)
        .await
        .unwrap();
    assert_eq!(placeholder.owner_id, new_owner);
    assert_eq!(placeholder.cloned_from_owner, Some(source_owner));
    assert_eq!(placeholder.processing.status, ProcessingStatus::Importing);
    assert!(env.queue.kinds().contains(&"clone_to_owner".to_string()));

    env.clones.populate(root.id, placeholder.id).await.unwrap();

    // The source owner cannot see the clone and vice versa.
    assert!(env.asset_service.get(source_owner, placeholder.id).is_err());

    // Deleting the source leaves the clone's content intact.
    env.asset_service.delete(source_owner, root.id).await.unwrap();
    let cloned_file = env
        .assets
        .descendants(placeholder.id)
        .into_iter()
        .find(|a| !a.is_directory)
        .unwrap();
    let content = env.blobs.get(&cloned_file.blob.unwrap()).await.unwrap();
    assert_eq!(content.as_ref(), b"content-a");
}

#[tokio::test]
async fn test_move_then_assemble_uses_new_paths() {
    use stemvault_service::{AssemblyOutput, MoveTarget};

    let env = Env::new();
    let owner = OwnerId::new();

    let archive = build_zip(&[("Pack/Loose.wav", b"x"), ("Pack/Drums/Kick.wav", b"k")], &[]);
    let root = env
        .asset_service
        .upload(owner, "Pack.zip", "Pack.zip", archive, false)
        .await
        .unwrap();
    env.extraction.extract(root.id).await.unwrap();

    let pack = env.assets.children(root.id, owner, true).remove(0);
    let entries = env.assets.children(pack.id, owner, true);
    let drums = entries.iter().find(|a| a.is_directory).unwrap();
    let loose = entries.iter().find(|a| !a.is_directory).unwrap();

    let report = env
        .mutation
        .move_assets(owner, &[loose.id], MoveTarget::Directory(drums.id))
        .unwrap();
    assert!(report.is_complete());

    let AssemblyOutput::Archive { entries, .. } = env.assembly.plan(owner, root.id).unwrap()
    else {
        panic!("directory tree plans an archive");
    };
    let mut paths: Vec<&str> = entries.iter().map(|e| e.archive_path.as_str()).collect();
    paths.sort();
    assert_eq!(paths, vec!["Pack/Drums/Kick.wav", "Pack/Drums/Loose.wav"]);
}
