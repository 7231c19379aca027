//! Asset kind detection from filenames.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Detected project/audio/file type for an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Ableton Live project (`.als`).
    Ableton,
    /// Logic Pro project (`.logicx`).
    Logic,
    /// FL Studio project (`.flp`).
    FlStudio,
    /// Pro Tools session (`.ptx`).
    ProTools,
    /// Uncompressed/lossless audio (`.wav`, `.aif`, `.aiff`, `.flac`).
    LosslessAudio,
    /// Compressed audio (`.mp3`, `.m4a`, `.aac`, `.ogg`).
    CompressedAudio,
    /// MIDI data (`.mid`, `.midi`).
    Midi,
    /// A plain folder with no recognized project marker.
    Folder,
    /// Anything else.
    Other,
}

impl AssetKind {
    /// Detect the kind for a file from its lowercase extension.
    ///
    /// Returns `None` for archives, which are classified after extraction
    /// instead.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "als" => Some(Self::Ableton),
            "logicx" => Some(Self::Logic),
            "flp" => Some(Self::FlStudio),
            "ptx" => Some(Self::ProTools),
            "wav" | "aif" | "aiff" | "flac" => Some(Self::LosslessAudio),
            "mp3" | "m4a" | "aac" | "ogg" => Some(Self::CompressedAudio),
            "mid" | "midi" => Some(Self::Midi),
            "zip" => None,
            _ => Some(Self::Other),
        }
    }

    /// Detect a DAW project marker from a filename, for post-extraction
    /// classification. Only project files mark a tree or directory.
    pub fn project_marker(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".als") {
            Some(Self::Ableton)
        } else if lower.ends_with(".logicx") {
            Some(Self::Logic)
        } else {
            None
        }
    }

    /// Return the kind as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ableton => "ableton",
            Self::Logic => "logic",
            Self::FlStudio => "fl_studio",
            Self::ProTools => "pro_tools",
            Self::LosslessAudio => "lossless_audio",
            Self::CompressedAudio => "compressed_audio",
            Self::Midi => "midi",
            Self::Folder => "folder",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Map a filename to a content type for music-production formats.
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit('.')
        .next()
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "als" => "application/x-ableton-live-set",
        "asd" => "application/x-ableton-analysis",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "aif" | "aiff" => "audio/aiff",
        "flac" => "audio/flac",
        "mid" | "midi" => "audio/midi",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
