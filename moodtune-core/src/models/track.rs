//! Canonical track shape
//!
//! Every upstream field-name variant is folded into this one struct at the
//! recommendation client boundary; nothing downstream probes alternatives.

use serde::{Deserialize, Serialize};

/// A recommended track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub artist: String,
    /// Web page for the track
    #[serde(rename = "spotify_url", skip_serializing_if = "Option::is_none", default)]
    pub external_url: Option<String>,
    /// Embeddable player URL
    #[serde(rename = "embed_url", skip_serializing_if = "Option::is_none", default)]
    pub embeddable_url: Option<String>,
    /// Cover art
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_url: Option<String>,
    /// Short audio preview
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub preview_url: Option<String>,
}

impl Track {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            external_url: None,
            embeddable_url: None,
            image_url: None,
            preview_url: None,
        }
    }

    /// True if the presentation layer has anything to link or embed
    pub fn has_link(&self) -> bool {
        self.external_url.is_some() || self.embeddable_url.is_some()
    }

    /// "title artist", lowercased, for keyword matching
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.artist).to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_without_links() {
        let track = Track::new("Song", "Singer");
        assert!(!track.has_link());
        let json = serde_json::to_value(&track).unwrap();
        assert!(json.get("spotify_url").is_none());
        assert_eq!(json["title"], "Song");
    }

    #[test]
    fn test_search_text_lowercases() {
        let track = Track::new("Dance ALL Night", "The Band");
        assert_eq!(track.search_text(), "dance all night the band");
    }
}
