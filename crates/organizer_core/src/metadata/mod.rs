//! Game catalog lookup.
//!
//! # Responsibility
//! - Define the provider seam used to prefill games from a public catalog.
//! - Keep HTTP details inside provider implementations.
//!
//! # Invariants
//! - Queries shorter than [`MIN_QUERY_CHARS`] never reach the network.
//! - Lookup failures never touch stored data.

pub mod rawg;

use crate::model::game::GameMetadata;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use rawg::RawgClient;

pub const MIN_QUERY_CHARS: usize = 3;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const DEFAULT_POPULAR_LIMIT: usize = 10;

pub type MetadataResult<T> = Result<T, MetadataError>;

#[derive(Debug)]
pub enum MetadataError {
    /// No API key configured for the catalog.
    MissingApiKey,
    Network(String),
    /// Non-success HTTP status.
    Http(u16),
    Parse(String),
}

impl Display for MetadataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "catalog API key is not configured"),
            Self::Network(message) => write!(f, "catalog request failed: {message}"),
            Self::Http(status) => write!(f, "catalog answered with HTTP {status}"),
            Self::Parse(message) => write!(f, "catalog response is malformed: {message}"),
        }
    }
}

impl Error for MetadataError {}

/// A searchable game catalog.
pub trait GameMetadataProvider {
    /// Best-rated matches for `query`; empty when the query is too short.
    fn search(&self, query: &str, limit: usize) -> MetadataResult<Vec<GameMetadata>>;

    fn details(&self, id: u64) -> MetadataResult<GameMetadata>;

    fn popular(&self, limit: usize) -> MetadataResult<Vec<GameMetadata>>;
}

/// Whether `query` is long enough to be sent to a provider.
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_CHARS
}
