//! Artist and link entities plus JSON snapshot loading

use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;
use thiserror::Error;

/// A user-contributed descriptive label with a usage count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,

    #[serde(default)]
    pub count: u32,
}

/// An artist as supplied by the upstream data layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    /// Unique identifier.
    pub id: String,

    /// Display name. Not unique; see [`NameIndex`].
    pub name: String,

    /// Listener count. Absent counts as zero.
    #[serde(default)]
    pub listeners: Option<u64>,

    #[serde(default)]
    pub tags: Vec<Tag>,

    /// Genre id references.
    #[serde(default)]
    pub genres: Vec<String>,

    /// Similar artists by display *name*, not id.
    #[serde(default)]
    pub similar: Vec<String>,

    /// Free-text location, e.g. "Berlin, Germany".
    #[serde(default)]
    pub location: Option<String>,
}

impl Artist {
    /// Listener count with absent treated as zero.
    pub fn listener_count(&self) -> u64 {
        self.listeners.unwrap_or(0)
    }
}

/// A pre-computed similar-artist edge between two artist ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistLink {
    pub source: String,
    pub target: String,

    #[serde(default, rename = "linkType")]
    pub link_type: Option<String>,
}

/// Errors raised while loading a snapshot from disk.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate artist id '{id}' in snapshot")]
    DuplicateArtistId { id: String },
}

/// Load an artist list from a JSON array file.
pub fn load_artists(path: &Path) -> Result<Vec<Artist>, SnapshotError> {
    let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let artists: Vec<Artist> = serde_json::from_str(&text).map_err(|source| SnapshotError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    // Ids must be unique; everything downstream indexes by them
    let mut seen: HashMap<&str, ()> = HashMap::with_capacity(artists.len());
    for artist in &artists {
        if seen.insert(artist.id.as_str(), ()).is_some() {
            return Err(SnapshotError::DuplicateArtistId {
                id: artist.id.clone(),
            });
        }
    }

    log::info!("Loaded {} artists from {}", artists.len(), path.display());
    Ok(artists)
}

/// Load a link list from a JSON array file.
pub fn load_links(path: &Path) -> Result<Vec<ArtistLink>, SnapshotError> {
    let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let links: Vec<ArtistLink> = serde_json::from_str(&text).map_err(|source| SnapshotError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    log::info!("Loaded {} artist links from {}", links.len(), path.display());
    Ok(links)
}

/// Result of resolving a display name to an artist id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLookup<'a> {
    Found(&'a str),
    /// More than one artist carries this name. The first-seen id is
    /// retained internally for display lookups.
    Ambiguous,
    NotFound,
}

/// Display-name to artist-id index.
///
/// Artist names are not unique, so collisions are tracked explicitly
/// rather than silently resolved.
pub struct NameIndex {
    ids_by_name: HashMap<String, NameEntry>,
}

enum NameEntry {
    Unique(String),
    Ambiguous,
}

impl NameIndex {
    /// Build the index from an artist list, keeping the first-seen id per
    /// colliding name.
    pub fn build(artists: &[Artist]) -> Self {
        let mut ids_by_name: HashMap<String, NameEntry> = HashMap::with_capacity(artists.len());
        let mut collisions = 0usize;

        for artist in artists {
            match ids_by_name.entry(artist.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(NameEntry::Unique(artist.id.clone()));
                }
                Entry::Occupied(mut slot) => {
                    collisions += 1;
                    slot.insert(NameEntry::Ambiguous);
                }
            }
        }

        if collisions > 0 {
            log::warn!(
                "{} artist name collisions; colliding names resolve as ambiguous",
                collisions
            );
        }

        Self { ids_by_name }
    }

    /// Resolve a display name to an artist id.
    pub fn resolve(&self, name: &str) -> NameLookup<'_> {
        match self.ids_by_name.get(name) {
            Some(NameEntry::Unique(id)) => NameLookup::Found(id),
            Some(NameEntry::Ambiguous) => NameLookup::Ambiguous,
            None => NameLookup::NotFound,
        }
    }
}
