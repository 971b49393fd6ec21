//! Input entities and snapshot loading

pub mod artists;
pub mod location;

pub use artists::{Artist, ArtistLink, NameIndex, NameLookup, Tag};
