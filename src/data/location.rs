//! Geographic location normalization and pairwise similarity
//!
//! Free-text locations ("Berlin, Germany", "Bristol", "NYC") are reduced to
//! an ISO-ish country code via table lookup, and countries are grouped into
//! coarse regions. Pairwise similarity is same-country 1.0, same-region 0.5,
//! different-region 0.0; unknown locations yield no score at all so they are
//! never treated as far away.

use std::collections::HashMap;

use crate::data::Artist;

/// Coarse geographic region used for the mid-tier similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    NorthAmerica,
    SouthAmerica,
    Europe,
    Asia,
    Africa,
    Oceania,
}

/// Country name/alias -> country code.
const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("united states", "us"),
    ("usa", "us"),
    ("us", "us"),
    ("america", "us"),
    ("canada", "ca"),
    ("mexico", "mx"),
    ("brazil", "br"),
    ("argentina", "ar"),
    ("chile", "cl"),
    ("colombia", "co"),
    ("united kingdom", "gb"),
    ("uk", "gb"),
    ("england", "gb"),
    ("scotland", "gb"),
    ("wales", "gb"),
    ("ireland", "ie"),
    ("france", "fr"),
    ("germany", "de"),
    ("netherlands", "nl"),
    ("belgium", "be"),
    ("spain", "es"),
    ("portugal", "pt"),
    ("italy", "it"),
    ("switzerland", "ch"),
    ("austria", "at"),
    ("sweden", "se"),
    ("norway", "no"),
    ("denmark", "dk"),
    ("finland", "fi"),
    ("iceland", "is"),
    ("poland", "pl"),
    ("czech republic", "cz"),
    ("czechia", "cz"),
    ("greece", "gr"),
    ("russia", "ru"),
    ("ukraine", "ua"),
    ("turkey", "tr"),
    ("japan", "jp"),
    ("south korea", "kr"),
    ("korea", "kr"),
    ("china", "cn"),
    ("india", "in"),
    ("indonesia", "id"),
    ("thailand", "th"),
    ("israel", "il"),
    ("south africa", "za"),
    ("nigeria", "ng"),
    ("egypt", "eg"),
    ("morocco", "ma"),
    ("australia", "au"),
    ("new zealand", "nz"),
];

/// Well-known music cities -> country code, for single-segment locations.
const CITY_ALIASES: &[(&str, &str)] = &[
    ("new york", "us"),
    ("nyc", "us"),
    ("brooklyn", "us"),
    ("los angeles", "us"),
    ("chicago", "us"),
    ("detroit", "us"),
    ("seattle", "us"),
    ("atlanta", "us"),
    ("nashville", "us"),
    ("austin", "us"),
    ("toronto", "ca"),
    ("montreal", "ca"),
    ("vancouver", "ca"),
    ("london", "gb"),
    ("manchester", "gb"),
    ("bristol", "gb"),
    ("glasgow", "gb"),
    ("sheffield", "gb"),
    ("dublin", "ie"),
    ("paris", "fr"),
    ("berlin", "de"),
    ("hamburg", "de"),
    ("cologne", "de"),
    ("munich", "de"),
    ("amsterdam", "nl"),
    ("rotterdam", "nl"),
    ("brussels", "be"),
    ("barcelona", "es"),
    ("madrid", "es"),
    ("lisbon", "pt"),
    ("milan", "it"),
    ("rome", "it"),
    ("vienna", "at"),
    ("zurich", "ch"),
    ("stockholm", "se"),
    ("gothenburg", "se"),
    ("oslo", "no"),
    ("copenhagen", "dk"),
    ("helsinki", "fi"),
    ("reykjavik", "is"),
    ("warsaw", "pl"),
    ("prague", "cz"),
    ("athens", "gr"),
    ("moscow", "ru"),
    ("kyiv", "ua"),
    ("istanbul", "tr"),
    ("tokyo", "jp"),
    ("osaka", "jp"),
    ("seoul", "kr"),
    ("mumbai", "in"),
    ("tel aviv", "il"),
    ("sao paulo", "br"),
    ("buenos aires", "ar"),
    ("mexico city", "mx"),
    ("johannesburg", "za"),
    ("cape town", "za"),
    ("lagos", "ng"),
    ("sydney", "au"),
    ("melbourne", "au"),
    ("auckland", "nz"),
];

/// Country code -> region.
pub fn region_of(country: &str) -> Option<Region> {
    let region = match country {
        "us" | "ca" | "mx" => Region::NorthAmerica,
        "br" | "ar" | "cl" | "co" => Region::SouthAmerica,
        "gb" | "ie" | "fr" | "de" | "nl" | "be" | "es" | "pt" | "it" | "ch" | "at" | "se"
        | "no" | "dk" | "fi" | "is" | "pl" | "cz" | "gr" | "ru" | "ua" | "tr" => Region::Europe,
        "jp" | "kr" | "cn" | "in" | "id" | "th" | "il" => Region::Asia,
        "za" | "ng" | "eg" | "ma" => Region::Africa,
        "au" | "nz" => Region::Oceania,
        _ => return None,
    };
    Some(region)
}

/// Normalize a free-text location to a country code.
///
/// Tries the last comma-separated segment as a country first (the common
/// "City, Country" shape), then falls back to matching any segment against
/// the city table.
pub fn normalize_location(location: &str) -> Option<&'static str> {
    let segments: Vec<String> = location
        .split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return None;
    }

    if let Some(last) = segments.last() {
        if let Some(&(_, code)) = COUNTRY_ALIASES.iter().find(|(alias, _)| alias == last) {
            return Some(code);
        }
    }

    for segment in &segments {
        if let Some(&(_, code)) = COUNTRY_ALIASES.iter().find(|(alias, _)| alias == segment) {
            return Some(code);
        }
        if let Some(&(_, code)) = CITY_ALIASES.iter().find(|(alias, _)| alias == segment) {
            return Some(code);
        }
    }

    None
}

/// Build artist-id -> normalized country for every artist with a
/// recognizable location.
pub fn build_normalized_location_map(artists: &[Artist]) -> HashMap<String, &'static str> {
    let mut map = HashMap::new();
    for artist in artists {
        if let Some(location) = &artist.location {
            if let Some(country) = normalize_location(location) {
                map.insert(artist.id.clone(), country);
            }
        }
    }
    log::debug!(
        "Normalized locations for {} of {} artists",
        map.len(),
        artists.len()
    );
    map
}

/// Pairwise location similarity between two normalized countries.
///
/// Same country 1.0, same region 0.5, otherwise 0.0.
pub fn calculate_location_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    match (region_of(a), region_of(b)) {
        (Some(ra), Some(rb)) if ra == rb => 0.5,
        _ => 0.0,
    }
}
