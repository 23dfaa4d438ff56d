//! Releases, tables and formats published by the Pan-STARRS catalog API.
//!
//! The API only serves a handful of (release, table) combinations:
//!
//! | Release | Tables |
//! |---------|--------|
//! | `dr1` | `mean`, `stack` |
//! | `dr2` | `mean`, `stack`, `detection`, `forced_mean` |
//!
//! [`check_legal`] enforces this before any request is built.

use serde::{Deserialize, Serialize};
use skyquery_core::{QueryError, QueryResult};
use std::fmt;
use std::str::FromStr;

/// Pan-STARRS data release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Release {
    Dr1,
    Dr2,
}

const RELEASE_NAMES: &[&str] = &["dr1", "dr2"];

impl Release {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dr1 => "dr1",
            Self::Dr2 => "dr2",
        }
    }

    /// Tables this release publishes.
    pub fn tables(self) -> &'static [CatalogTable] {
        match self {
            Self::Dr1 => &[CatalogTable::Mean, CatalogTable::Stack],
            Self::Dr2 => &[
                CatalogTable::Mean,
                CatalogTable::Stack,
                CatalogTable::Detection,
                CatalogTable::ForcedMean,
            ],
        }
    }

    fn table_names(self) -> Vec<&'static str> {
        self.tables().iter().map(|t| t.as_str()).collect()
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Release {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dr1" => Ok(Self::Dr1),
            "dr2" => Ok(Self::Dr2),
            _ => Err(QueryError::invalid_release(s, RELEASE_NAMES)),
        }
    }
}

/// Granularity of the photometric measurements in a catalog table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogTable {
    /// Multi-epoch averages, one row per object.
    Mean,
    /// Measurements on the stacked images.
    Stack,
    /// Single-epoch detections (DR2 only).
    Detection,
    /// Forced photometry averages (DR2 only).
    ForcedMean,
}

impl CatalogTable {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Stack => "stack",
            Self::Detection => "detection",
            Self::ForcedMean => "forced_mean",
        }
    }

    fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Some(Self::Mean),
            "stack" => Some(Self::Stack),
            "detection" => Some(Self::Detection),
            "forced_mean" => Some(Self::ForcedMean),
            _ => None,
        }
    }
}

impl fmt::Display for CatalogTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload encoding requested from the catalog API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Csv,
    Votable,
    Json,
}

const FORMAT_NAMES: &[&str] = &["csv", "votable", "json"];

impl Format {
    /// File extension used in the endpoint path.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Votable => "votable",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "votable" => Ok(Self::Votable),
            "json" => Ok(Self::Json),
            _ => Err(QueryError::invalid_format(s, FORMAT_NAMES)),
        }
    }
}

/// Reject a table that `release` does not publish.
pub fn check_legal(table: CatalogTable, release: Release) -> QueryResult<()> {
    if release.tables().contains(&table) {
        Ok(())
    } else {
        log::debug!("rejected table {} for release {}", table, release);
        Err(QueryError::invalid_table(
            table.as_str(),
            release.as_str(),
            &release.table_names(),
        ))
    }
}

/// Parse and validate a (table, release) pair given as strings.
///
/// The release is checked first, so an unknown release is reported even when
/// the table name is also wrong.
pub fn parse_legal(table: &str, release: &str) -> QueryResult<(CatalogTable, Release)> {
    let release: Release = release.parse()?;
    let table = CatalogTable::from_name(table).ok_or_else(|| {
        QueryError::invalid_table(table, release.as_str(), &release.table_names())
    })?;
    check_legal(table, release)?;
    Ok((table, release))
}
