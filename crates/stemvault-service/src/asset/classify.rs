//! Post-extraction subtree classification.
//!
//! Runs once after a subtree is materialized. Classification is advisory
//! and is not recomputed when later mutations move project files around.

use stemvault_core::result::AppResult;
use stemvault_core::types::AssetId;
use stemvault_entity::asset::AssetKind;
use stemvault_store::AssetStore;

/// Classify a freshly materialized subtree.
///
/// Every directory that directly contains a DAW project file takes that
/// project's kind. The root takes the kind of any project file found in
/// the whole subtree (Ableton wins over Logic when both appear), falling
/// back to a plain folder.
pub(crate) fn classify_subtree(store: &AssetStore, root_id: AssetId) -> AppResult<()> {
    let descendants = store.descendants(root_id);

    let mut root_kind = AssetKind::Folder;
    let mut saw_logic = false;
    for node in &descendants {
        match AssetKind::project_marker(&node.original_filename) {
            Some(AssetKind::Ableton) => root_kind = AssetKind::Ableton,
            Some(AssetKind::Logic) => saw_logic = true,
            _ => {}
        }
    }
    if root_kind == AssetKind::Folder && saw_logic {
        root_kind = AssetKind::Logic;
    }
    store.update(root_id, |node| node.kind = Some(root_kind))?;

    for node in descendants.iter().filter(|n| n.is_directory) {
        let marker = store
            .children(node.id, node.owner_id, false)
            .iter()
            .find_map(|child| AssetKind::project_marker(&child.original_filename));
        let kind = marker.unwrap_or(AssetKind::Folder);
        store.update(node.id, |dir| dir.kind = Some(kind))?;
    }

    Ok(())
}
