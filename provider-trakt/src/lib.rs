//! Tracking API client
//!
//! Typed client for the show-tracking API, built on the authenticated HTTP
//! facade from `core-auth`. Authentication challenges, token refresh, and
//! resubmission are handled below this layer; this crate only shapes
//! requests and decodes responses.

pub mod client;
pub mod error;
pub mod types;

pub use client::TraktClient;
pub use error::{Result, TraktError};
pub use types::{CalendarEntry, Episode, EpisodeIds, Show, ShowIds, WatchedEntry, WatchlistEntry};
