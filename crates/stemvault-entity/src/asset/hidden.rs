//! Junk-entry detection.
//!
//! Hidden entries are persisted with `hidden = true` rather than omitted,
//! so a "show hidden" view stays possible; they never count toward
//! extraction progress.

/// Sidecar extensions that are hidden by default.
const HIDDEN_EXTENSIONS: &[&str] = &["asd", "ds_store"];

/// Platform sidecar folders that are hidden by default.
const HIDDEN_FOLDERS: &[&str] = &["Ableton Project Info", "__MACOSX"];

/// Check whether a file or folder name should be hidden in listings.
pub fn should_hide(filename: &str, is_directory: bool) -> bool {
    if is_directory && HIDDEN_FOLDERS.contains(&filename) {
        return true;
    }
    if filename.starts_with('.') {
        return true;
    }
    // macOS custom-icon resource files ("Icon\r")
    if filename.trim_end_matches('\r') == "Icon" && filename.ends_with('\r') {
        return true;
    }

    let extension = filename
        .rsplit('.')
        .next()
        .filter(|ext| *ext != filename)
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();
    HIDDEN_EXTENSIONS.contains(&extension.as_str())
}
