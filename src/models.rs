//! Data structures for the TVmaze catalog
//!
//! Records mirror the upstream JSON shape (camelCase fields, `_links`).
//! Nullable upstream fields are `Option`; fields that are occasionally
//! missing altogether fall back to their defaults instead of failing the
//! whole payload.
//!
//! - **Shows**: `Show`, schedule, rating, network/web channel
//! - **Listings**: `Season`, `Episode`
//! - **People**: `CastMember`, `CrewMember`, `Person`, `Character`
//! - **Search**: `SearchHit`

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Shared Records
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Country {
    pub name: String,
    pub code: String,
    pub timezone: String,
}

/// Poster/still URLs. Either size may be missing on partial records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub medium: Option<String>,
    pub original: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Href {
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: Option<Href>,
    #[serde(rename = "previousepisode", skip_serializing_if = "Option::is_none")]
    pub previous_episode: Option<Href>,
    #[serde(rename = "nextepisode", skip_serializing_if = "Option::is_none")]
    pub next_episode: Option<Href>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<Href>,
}

/// Broadcast network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Network {
    pub id: u64,
    pub name: String,
    pub country: Option<Country>,
    pub official_site: Option<String>,
}

/// Streaming/web channel (same shape as a network)
pub type WebChannel = Network;

// =============================================================================
// Show
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    pub time: String,
    pub days: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Externals {
    pub tvrage: Option<u64>,
    pub thetvdb: Option<u64>,
    pub imdb: Option<String>,
}

/// TV show record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Show {
    pub id: u64,
    pub url: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub language: Option<String>,
    pub genres: Vec<String>,
    pub status: String,
    pub runtime: Option<u32>,
    pub average_runtime: Option<u32>,
    pub premiered: Option<String>,
    pub ended: Option<String>,
    pub official_site: Option<String>,
    pub schedule: Schedule,
    pub rating: Rating,
    pub weight: u32,
    pub network: Option<Network>,
    pub web_channel: Option<WebChannel>,
    pub dvd_country: Option<Country>,
    pub externals: Externals,
    pub image: Option<Image>,
    pub summary: Option<String>,
    pub updated: u64,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl Show {
    /// Rating used for ranking: the average, or 0 when unrated
    pub fn score(&self) -> f64 {
        self.rating.average.unwrap_or(0.0)
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }

    /// Premiere year parsed from `premiered` ("2008-01-20" -> 2008)
    pub fn year(&self) -> Option<u16> {
        self.premiered.as_deref().and_then(extract_year)
    }

    /// Network name, falling back to the web channel
    pub fn channel_name(&self) -> Option<&str> {
        self.network
            .as_ref()
            .or(self.web_channel.as_ref())
            .map(|n| n.name.as_str())
    }
}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year = self.year().map(|y| format!(" ({})", y)).unwrap_or_default();
        match self.rating.average {
            Some(r) => write!(f, "{}{} - ⭐ {:.1}", self.name, year, r),
            None => write!(f, "{}{}", self.name, year),
        }
    }
}

/// One hit from `/search/shows`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub score: f64,
    pub show: Show,
}

impl fmt::Display for SearchHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}] {}", self.score, self.show)
    }
}

// =============================================================================
// Seasons & Episodes
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Season {
    pub id: u64,
    pub url: String,
    pub number: u32,
    pub name: Option<String>,
    pub episode_order: Option<u32>,
    pub premiere_date: Option<String>,
    pub end_date: Option<String>,
    pub network: Option<Network>,
    pub web_channel: Option<WebChannel>,
    pub image: Option<Image>,
    pub summary: Option<String>,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("Season");
        match self.episode_order {
            Some(n) => write!(f, "{} {} ({} episodes)", name, self.number, n),
            None => write!(f, "{} {}", name, self.number),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Episode {
    pub id: u64,
    pub url: String,
    pub name: String,
    pub season: u32,
    pub number: Option<u32>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub airdate: Option<String>,
    pub airtime: Option<String>,
    pub airstamp: Option<String>,
    pub runtime: Option<u32>,
    pub rating: Rating,
    pub image: Option<Image>,
    pub summary: Option<String>,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.number {
            Some(n) => write!(f, "S{:02}E{:02} - {}", self.season, n, self.name),
            None => write!(f, "S{:02} Special - {}", self.season, self.name),
        }
    }
}

// =============================================================================
// People
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    pub id: u64,
    pub url: String,
    pub name: String,
    pub country: Option<Country>,
    pub birthday: Option<String>,
    pub deathday: Option<String>,
    pub gender: Option<String>,
    pub image: Option<Image>,
    pub updated: u64,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
    pub id: u64,
    pub url: String,
    pub name: String,
    pub image: Option<Image>,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CastMember {
    pub person: Person,
    pub character: Character,
    #[serde(rename = "self")]
    pub as_self: bool,
    pub voice: bool,
}

impl fmt::Display for CastMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as {}", self.person.name, self.character.name)?;
        if self.voice {
            write!(f, " (voice)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewMember {
    #[serde(rename = "type")]
    pub kind: String,
    pub person: Person,
}

impl fmt::Display for CrewMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.kind, self.person.name)
    }
}

// =============================================================================
// Genres
// =============================================================================

/// Genre names used by TVmaze (https://www.tvmaze.com/shows)
pub const SHOW_GENRES: &[&str] = &[
    "Action",
    "Adult",
    "Adventure",
    "Anime",
    "Children",
    "Comedy",
    "Crime",
    "DIY",
    "Drama",
    "Espionage",
    "Family",
    "Fantasy",
    "Food",
    "History",
    "Horror",
    "Legal",
    "Medical",
    "Music",
    "Mystery",
    "Nature",
    "Romance",
    "Science-Fiction",
    "Sports",
    "Supernatural",
    "Thriller",
    "Travel",
    "War",
    "Western",
];

/// Extract year from a date string like "2022-03-04"
fn extract_year(date: &str) -> Option<u16> {
    date.get(..4).and_then(|y| y.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year("2022-03-04"), Some(2022));
        assert_eq!(extract_year(""), None);
        assert_eq!(extract_year("abc"), None);
    }

    #[test]
    fn test_show_deserializes_upstream_shape() {
        let json = r#"{
            "id": 169,
            "url": "https://www.tvmaze.com/shows/169/breaking-bad",
            "name": "Breaking Bad",
            "type": "Scripted",
            "language": "English",
            "genres": ["Drama", "Crime", "Thriller"],
            "status": "Ended",
            "runtime": 60,
            "averageRuntime": 60,
            "premiered": "2008-01-20",
            "ended": "2013-09-29",
            "officialSite": "http://www.amc.com/shows/breaking-bad",
            "schedule": {"time": "22:00", "days": ["Sunday"]},
            "rating": {"average": 9.2},
            "weight": 98,
            "network": {
                "id": 20,
                "name": "AMC",
                "country": {"name": "United States", "code": "US", "timezone": "America/New_York"},
                "officialSite": null
            },
            "webChannel": null,
            "dvdCountry": null,
            "externals": {"tvrage": 18164, "thetvdb": 81189, "imdb": "tt0903747"},
            "image": {"medium": "https://example.org/m.jpg", "original": "https://example.org/o.jpg"},
            "summary": "<p>A chemistry teacher...</p>",
            "updated": 1704794122,
            "_links": {
                "self": {"href": "https://api.tvmaze.com/shows/169"},
                "previousepisode": {"href": "https://api.tvmaze.com/episodes/12253", "name": "Felina"}
            }
        }"#;

        let show: Show = serde_json::from_str(json).unwrap();
        assert_eq!(show.id, 169);
        assert_eq!(show.kind, "Scripted");
        assert_eq!(show.average_runtime, Some(60));
        assert_eq!(show.score(), 9.2);
        assert_eq!(show.year(), Some(2008));
        assert_eq!(show.channel_name(), Some("AMC"));
        assert!(show.has_genre("Crime"));
        assert_eq!(
            show.links.previous_episode.as_ref().and_then(|h| h.name.as_deref()),
            Some("Felina")
        );
        assert_eq!(show.to_string(), "Breaking Bad (2008) - ⭐ 9.2");
    }

    #[test]
    fn test_sparse_show_uses_defaults() {
        let show: Show = serde_json::from_str(r#"{"id": 1, "name": "X", "rating": {"average": null}}"#).unwrap();
        assert_eq!(show.score(), 0.0);
        assert!(show.genres.is_empty());
        assert!(show.image.is_none());
        assert_eq!(show.to_string(), "X");
    }

    #[test]
    fn test_cast_member_self_flag() {
        let json = r#"{
            "person": {"id": 1, "name": "Bryan Cranston"},
            "character": {"id": 2, "name": "Walter White"},
            "self": false,
            "voice": false
        }"#;
        let member: CastMember = serde_json::from_str(json).unwrap();
        assert!(!member.as_self);
        assert_eq!(member.to_string(), "Bryan Cranston as Walter White");
    }

    #[test]
    fn test_episode_display() {
        let ep = Episode {
            name: "Pilot".into(),
            season: 1,
            number: Some(1),
            ..Default::default()
        };
        assert_eq!(ep.to_string(), "S01E01 - Pilot");
    }

    #[test]
    fn test_genre_list() {
        assert_eq!(SHOW_GENRES.len(), 28);
        assert!(SHOW_GENRES.contains(&"Science-Fiction"));
    }
}
