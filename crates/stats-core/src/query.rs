//! Statistics query identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of one fixed, parameterless statistics query.
///
/// The set is closed: anything that is not one of these variants is rejected
/// at parse time, so every `QueryId` in hand has a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryId {
    /// Earliest and latest publication dates in the archive.
    DateRange,
    /// Number of distinct articles.
    TotalArticles,
    /// Number of distinct authors.
    UniqueAuthors,
    /// Authors ranked by article count.
    TopAuthors,
    /// Number of distinct content locations.
    UniqueLocations,
    /// Locations ranked by article count.
    TopLocations,
    /// Number of distinct people mentioned.
    TotalPeople,
    /// People ranked by mention count.
    TopPeople,
}

/// Shape of the bindings a query produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// A single binding with a `count` variable.
    Count,
    /// A single binding with `earliest` and `latest` variables.
    Range,
    /// Up to ten bindings with `name` and `count` variables.
    Ranking,
}

impl QueryId {
    /// Every query in the catalog, in dashboard order.
    pub const ALL: [QueryId; 8] = [
        Self::DateRange,
        Self::TotalArticles,
        Self::UniqueAuthors,
        Self::TopAuthors,
        Self::UniqueLocations,
        Self::TopLocations,
        Self::TotalPeople,
        Self::TopPeople,
    ];

    /// Wire token for this query (as used in URLs and JSON).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DateRange => "dateRange",
            Self::TotalArticles => "totalArticles",
            Self::UniqueAuthors => "uniqueAuthors",
            Self::TopAuthors => "topAuthors",
            Self::UniqueLocations => "uniqueLocations",
            Self::TopLocations => "topLocations",
            Self::TotalPeople => "totalPeople",
            Self::TopPeople => "topPeople",
        }
    }

    /// Binding shape of this query's results.
    pub fn kind(&self) -> QueryKind {
        match self {
            Self::DateRange => QueryKind::Range,
            Self::TotalArticles | Self::UniqueAuthors | Self::UniqueLocations | Self::TotalPeople => {
                QueryKind::Count
            }
            Self::TopAuthors | Self::TopLocations | Self::TopPeople => QueryKind::Ranking,
        }
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a token is not a known query id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown query id: {0}")]
pub struct UnknownQueryId(pub String);

impl FromStr for QueryId {
    type Err = UnknownQueryId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownQueryId(s.to_string()))
    }
}
