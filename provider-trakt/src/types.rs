//! Tracking API data transfer objects
//!
//! Shapes mirror the API's JSON responses; unknown fields are ignored so
//! server-side additions do not break decoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cross-database identifiers for a show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowIds {
    pub trakt: u64,
    pub slug: Option<String>,
    pub tvdb: Option<u64>,
    pub imdb: Option<String>,
    pub tmdb: Option<u64>,
}

/// A TV show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub title: String,
    pub year: Option<i32>,
    pub ids: ShowIds,
    /// Present with `extended=full`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// Cross-database identifiers for an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeIds {
    pub trakt: u64,
    pub tvdb: Option<u64>,
    pub imdb: Option<String>,
    pub tmdb: Option<u64>,
}

/// A single episode of a show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub season: u32,
    pub number: u32,
    pub title: Option<String>,
    pub ids: EpisodeIds,
}

/// One airing in the user's calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub first_aired: DateTime<Utc>,
    pub episode: Episode,
    pub show: Show,
}

/// One show on the user's watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub listed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    pub show: Show,
}

/// Watch history aggregate for one show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedEntry {
    pub plays: u32,
    pub last_watched_at: Option<DateTime<Utc>>,
    pub show: Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALENDAR_JSON: &str = r#"[
        {
            "first_aired": "2026-08-06T01:00:00.000Z",
            "episode": {
                "season": 2,
                "number": 5,
                "title": "Chapter Five",
                "ids": { "trakt": 74102, "tvdb": 5210753, "imdb": null, "tmdb": 1045921 }
            },
            "show": {
                "title": "Example Show",
                "year": 2024,
                "ids": {
                    "trakt": 1390,
                    "slug": "example-show",
                    "tvdb": 121361,
                    "imdb": "tt0944947",
                    "tmdb": 1399
                }
            }
        }
    ]"#;

    #[test]
    fn test_calendar_entry_decoding() {
        let entries: Vec<CalendarEntry> = serde_json::from_str(CALENDAR_JSON).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.episode.season, 2);
        assert_eq!(entry.episode.number, 5);
        assert_eq!(entry.episode.title.as_deref(), Some("Chapter Five"));
        assert_eq!(entry.show.title, "Example Show");
        assert_eq!(entry.show.ids.trakt, 1390);
        assert_eq!(entry.show.ids.slug.as_deref(), Some("example-show"));
        assert_eq!(entry.first_aired.timestamp(), 1_785_978_000);
    }

    #[test]
    fn test_show_decoding_with_extended_fields() {
        let json = r#"{
            "title": "Example Show",
            "year": 2024,
            "ids": { "trakt": 1390, "slug": "example-show", "tvdb": null, "imdb": null, "tmdb": null },
            "overview": "An example.",
            "status": "returning series",
            "network": "HBO",
            "runtime": 55,
            "rating": 9.1,
            "some_future_field": true
        }"#;

        let show: Show = serde_json::from_str(json).unwrap();
        assert_eq!(show.overview.as_deref(), Some("An example."));
        assert_eq!(show.network.as_deref(), Some("HBO"));
        assert_eq!(show.runtime, Some(55));
    }

    #[test]
    fn test_show_decoding_without_extended_fields() {
        let json = r#"{
            "title": "Example Show",
            "year": null,
            "ids": { "trakt": 1, "slug": null, "tvdb": null, "imdb": null, "tmdb": null }
        }"#;

        let show: Show = serde_json::from_str(json).unwrap();
        assert!(show.overview.is_none());
        assert!(show.year.is_none());
    }

    #[test]
    fn test_watched_entry_decoding() {
        let json = r#"[{
            "plays": 12,
            "last_watched_at": "2026-01-15T20:30:00.000Z",
            "show": {
                "title": "Example Show",
                "year": 2024,
                "ids": { "trakt": 1, "slug": null, "tvdb": null, "imdb": null, "tmdb": null }
            }
        }]"#;

        let entries: Vec<WatchedEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].plays, 12);
        assert!(entries[0].last_watched_at.is_some());
    }
}
