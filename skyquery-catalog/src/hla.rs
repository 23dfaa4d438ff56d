//! Hubble Legacy Archive source lists.
//!
//! `HLAcat.aspx` returns the DAOPhot or SExtractor source list of one HLA
//! image. Flagged sources are removed unless asked for.

use crate::http::build_url;
use crate::ArchiveClient;
use reqwest::Url;
use skyquery_core::{QueryError, QueryResult, Table};
use std::fmt;
use std::str::FromStr;

/// Source extraction the list comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HlaCatalog {
    #[default]
    Dao,
    Sex,
}

impl HlaCatalog {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dao => "DAO",
            Self::Sex => "SEX",
        }
    }
}

impl fmt::Display for HlaCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HlaCatalog {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAO" | "DAOPHOT" => Ok(Self::Dao),
            "SEX" | "SEXTRACTOR" => Ok(Self::Sex),
            _ => Err(QueryError::invalid_parameter(
                "catalog",
                &format!("'{}' must be one of DAO, SEX", s),
            )),
        }
    }
}

/// Encoding of the returned source list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HlaFormat {
    #[default]
    Text,
    Votable,
    Tsv,
    Csv,
    Html,
    Kml,
    Json,
}

impl HlaFormat {
    pub const ALL: [HlaFormat; 7] = [
        Self::Text,
        Self::Votable,
        Self::Tsv,
        Self::Csv,
        Self::Html,
        Self::Kml,
        Self::Json,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Votable => "votable",
            Self::Tsv => "tsv",
            Self::Csv => "csv",
            Self::Html => "html",
            Self::Kml => "kml",
            Self::Json => "json",
        }
    }

    /// Whether [`Table`] can decode this encoding.
    pub fn is_tabular(self) -> bool {
        matches!(self, Self::Votable | Self::Tsv | Self::Csv | Self::Json)
    }
}

impl fmt::Display for HlaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HlaFormat {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == lower)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|f| f.as_str()).collect();
                QueryError::invalid_format(s, &allowed)
            })
    }
}

/// URL of the source list for `image`.
///
/// `trimmed = false` adds `IGNOREFLAG=T`, which keeps flagged sources.
pub fn source_list_url(
    base: &str,
    image: &str,
    catalog: HlaCatalog,
    format: HlaFormat,
    trimmed: bool,
) -> QueryResult<Url> {
    let image = image.trim();
    if image.is_empty() {
        return Err(QueryError::invalid_parameter("image", "image name is empty"));
    }
    let mut params = vec![
        ("CATALOG", catalog.as_str()),
        ("FORMAT", format.as_str()),
        ("IMAGE", image),
    ];
    if !trimmed {
        params.push(("IGNOREFLAG", "T"));
    }
    build_url(base, &params)
}

impl ArchiveClient {
    /// Fetch the source list of an HLA image as text.
    pub fn source_list(
        &self,
        image: &str,
        catalog: HlaCatalog,
        format: HlaFormat,
        trimmed: bool,
    ) -> QueryResult<String> {
        let url = source_list_url(&self.config().hla_catalog_url, image, catalog, format, trimmed)?;
        self.get_text(&url)
    }

    /// Fetch a source list and decode it.
    ///
    /// # Errors
    /// [`QueryError::InvalidFormat`] for encodings that are not tables
    /// (`text`, `html`, `kml`); nothing is sent in that case.
    pub fn source_list_table(
        &self,
        image: &str,
        catalog: HlaCatalog,
        format: HlaFormat,
        trimmed: bool,
    ) -> QueryResult<Table> {
        if !format.is_tabular() {
            return Err(QueryError::invalid_format(
                format.as_str(),
                &["votable", "tsv", "csv", "json"],
            ));
        }
        let text = self.source_list(image, catalog, format, trimmed)?;
        decode_source_list(format, &text)
    }
}

fn decode_source_list(format: HlaFormat, text: &str) -> QueryResult<Table> {
    match format {
        HlaFormat::Csv => Table::from_csv(text),
        HlaFormat::Tsv => Table::from_delimited(text, b'\t'),
        HlaFormat::Votable => Table::from_votable(text),
        HlaFormat::Json => {
            let value = serde_json::from_str(text)
                .map_err(|e| QueryError::parse("json", &e.to_string()))?;
            Table::from_json(&value)
        }
        other => Err(QueryError::invalid_format(
            other.as_str(),
            &["votable", "tsv", "csv", "json"],
        )),
    }
}
