//! Query construction for the Pan-STARRS catalog API.
//!
//! A [`Ps1Query`] is assembled with builder methods and checked in two
//! stages. [`Ps1Query::validate`] needs nothing but the query itself and runs
//! before any request is made. Column names are then checked against the
//! table schema, which has to be fetched from the service; see
//! [`ArchiveClient::query_url`](crate::ArchiveClient::query_url).

use super::legal::{check_legal, parse_legal, CatalogTable, Format, Release};
use crate::http::build_url;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use skyquery_core::{Cone, QueryError, QueryResult, Table};
use std::collections::HashSet;
use std::fmt;

/// One column of a published table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type", default)]
    pub datatype: String,
    #[serde(default)]
    pub description: String,
}

/// A catalog search: which table, which columns, and key/value constraints.
///
/// Constraint keys are passed through verbatim, so everything the API
/// understands works, e.g. `nDetections.gt`, `objID`, `pagesize`, `sort_by`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ps1Query {
    pub table: CatalogTable,
    pub release: Release,
    pub format: Format,
    pub columns: Option<Vec<String>>,
    pub constraints: Vec<(String, String)>,
}

impl Ps1Query {
    /// A CSV query on `table` of `release` with no constraints yet.
    pub fn new(table: CatalogTable, release: Release) -> Self {
        Self {
            table,
            release,
            format: Format::Csv,
            columns: None,
            constraints: Vec::new(),
        }
    }

    /// Build from string names, rejecting illegal combinations immediately.
    pub fn parse(table: &str, release: &str) -> QueryResult<Self> {
        let (table, release) = parse_legal(table, release)?;
        Ok(Self::new(table, release))
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Restrict the output to these columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Add a constraint, replacing any earlier value for the same key.
    pub fn constraint(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.constraints.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.constraints.push((key, value)),
        }
        self
    }

    /// Constrain to a cone: sets `ra`, `dec` and `radius` (degrees).
    pub fn cone(self, cone: &Cone) -> Self {
        self.constraint("ra", cone.center.ra_deg)
            .constraint("dec", cone.center.dec_deg)
            .constraint("radius", cone.radius_deg)
    }

    /// Checks that need no schema: legal table/release, at least one
    /// constraint, no blank column names.
    pub fn validate(&self) -> QueryResult<()> {
        check_legal(self.table, self.release)?;
        if self.constraints.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        if let Some(columns) = &self.columns {
            if columns.is_empty() {
                return Err(QueryError::invalid_parameter(
                    "columns",
                    "column list is empty",
                ));
            }
            if columns.iter().any(|c| c.trim().is_empty()) {
                return Err(QueryError::invalid_parameter(
                    "columns",
                    "column names cannot be blank",
                ));
            }
        }
        Ok(())
    }

    /// `<base>/<release>/<table>.<format>`
    pub fn endpoint(&self, base: &str) -> String {
        format!(
            "{}/{}/{}.{}",
            base.trim_end_matches('/'),
            self.release,
            self.table,
            self.format
        )
    }

    /// Assemble the request URL.
    ///
    /// When the query names columns, `schema` must be the table's published
    /// schema; every requested column is checked against it.
    pub fn url(&self, base: &str, schema: Option<&[ColumnInfo]>) -> QueryResult<Url> {
        self.validate()?;

        let mut params: Vec<(String, String)> = self
            .constraints
            .iter()
            .filter(|(k, _)| self.columns.is_none() || k != "columns")
            .cloned()
            .collect();

        if let Some(columns) = &self.columns {
            let schema = schema.ok_or_else(|| {
                QueryError::invalid_parameter("columns", "schema required to check column names")
            })?;
            validate_columns(columns, schema)?;
            let names: Vec<&str> = columns.iter().map(|c| c.trim()).collect();
            params.push(("columns".to_string(), format!("[{}]", names.join(","))));
        }

        build_url(&self.endpoint(base), &params)
    }
}

impl fmt::Display for Ps1Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}", self.release, self.table, self.format)?;
        for (k, v) in &self.constraints {
            write!(f, " {}={}", k, v)?;
        }
        Ok(())
    }
}

/// Check requested column names against a schema.
///
/// Matching ignores case and surrounding whitespace.
///
/// # Errors
/// [`QueryError::UnknownColumns`] listing every name that is not in the schema,
/// in the order requested.
pub fn validate_columns(requested: &[String], schema: &[ColumnInfo]) -> QueryResult<()> {
    let known: HashSet<String> = schema.iter().map(|c| c.name.to_lowercase()).collect();
    let bad: Vec<&str> = requested
        .iter()
        .filter(|c| !known.contains(&c.trim().to_lowercase()))
        .map(String::as_str)
        .collect();
    if bad.is_empty() {
        Ok(())
    } else {
        log::debug!("unknown columns: {}", bad.join(", "));
        Err(QueryError::unknown_columns(&bad))
    }
}

/// Body of a catalog response.
///
/// CSV and VOTable come back as text; JSON is parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Csv(String),
    Votable(String),
    Json(Value),
}

impl Payload {
    pub(crate) fn decode(format: Format, body: String) -> QueryResult<Self> {
        Ok(match format {
            Format::Csv => Self::Csv(body),
            Format::Votable => Self::Votable(body),
            Format::Json => Self::Json(
                serde_json::from_str(&body).map_err(|e| QueryError::parse("json", &e.to_string()))?,
            ),
        })
    }

    pub fn format(&self) -> Format {
        match self {
            Self::Csv(_) => Format::Csv,
            Self::Votable(_) => Format::Votable,
            Self::Json(_) => Format::Json,
        }
    }

    /// Text form of the payload (JSON is re-serialized).
    pub fn as_text(&self) -> String {
        match self {
            Self::Csv(text) | Self::Votable(text) => text.clone(),
            Self::Json(value) => value.to_string(),
        }
    }

    /// Decode into a [`Table`].
    pub fn to_table(&self) -> QueryResult<Table> {
        match self {
            Self::Csv(text) => Table::from_csv(text),
            Self::Votable(text) => Table::from_votable(text),
            Self::Json(value) => Table::from_json(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://catalogs.mast.stsci.edu/api/v0.1/panstarrs";

    fn schema() -> Vec<ColumnInfo> {
        ["objID", "raMean", "decMean", "nDetections", "gMeanPSFMag"]
            .iter()
            .map(|n| ColumnInfo {
                name: n.to_string(),
                datatype: "float".to_string(),
                description: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_cone_url() {
        let query = Ps1Query::new(CatalogTable::Mean, Release::Dr2)
            .cone(&Cone::new(187.706, 12.391, 0.05))
            .constraint("nDetections.gt", 1);
        let url = query.url(BASE, None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://catalogs.mast.stsci.edu/api/v0.1/panstarrs/dr2/mean.csv\
             ?ra=187.706&dec=12.391&radius=0.05&nDetections.gt=1"
        );
    }

    #[test]
    fn test_columns_are_bracketed() {
        let query = Ps1Query::new(CatalogTable::Mean, Release::Dr1)
            .format(Format::Json)
            .columns(["objID", " raMean "])
            .constraint("objID", "122851876967613962");
        let url = query.url(BASE, Some(schema().as_slice())).unwrap();
        assert!(url.as_str().contains("/dr1/mean.json?"));
        let columns = url
            .query_pairs()
            .find(|(k, _)| k == "columns")
            .map(|(_, v)| v.into_owned());
        assert_eq!(columns.as_deref(), Some("[objID,raMean]"));
    }

    #[test]
    fn test_constraint_replaces_existing_key() {
        let query = Ps1Query::new(CatalogTable::Mean, Release::Dr2)
            .constraint("pagesize", 10)
            .constraint("pagesize", 50);
        assert_eq!(query.constraints, vec![("pagesize".to_string(), "50".to_string())]);
    }

    #[test]
    fn test_illegal_combination_fails_validation() {
        let query = Ps1Query::new(CatalogTable::Detection, Release::Dr1).constraint("objID", 1);
        assert!(matches!(query.validate(), Err(QueryError::InvalidTable { .. })));
        assert!(query.url(BASE, None).is_err());
    }

    #[test]
    fn test_parse_rejects_before_building() {
        assert!(Ps1Query::parse("forced_mean", "dr1").is_err());
        assert!(Ps1Query::parse("mean", "dr0").is_err());
        assert!(Ps1Query::parse("detection", "dr2").is_ok());
    }

    #[test]
    fn test_empty_query_rejected() {
        let query = Ps1Query::new(CatalogTable::Mean, Release::Dr2);
        let err = query.validate().unwrap_err();
        assert_eq!(err.to_string(), "You must specify some parameters for search");
    }

    #[test]
    fn test_blank_column_rejected() {
        let query = Ps1Query::new(CatalogTable::Mean, Release::Dr2)
            .columns(["objID", "  "])
            .constraint("objID", 1);
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_columns_need_schema() {
        let query = Ps1Query::new(CatalogTable::Mean, Release::Dr2)
            .columns(["objID"])
            .constraint("objID", 1);
        assert!(query.url(BASE, None).is_err());
    }

    #[test]
    fn test_validate_columns_names_every_bad_column() {
        let requested: Vec<String> = ["objid", "fooMean", "RAMEAN", "bar"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        match validate_columns(&requested, &schema()) {
            Err(QueryError::UnknownColumns { columns }) => {
                assert_eq!(columns, vec!["fooMean".to_string(), "bar".to_string()]);
            }
            other => panic!("expected UnknownColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        let query = Ps1Query::new(CatalogTable::Stack, Release::Dr2).constraint("objID", 7);
        assert_eq!(query.to_string(), "dr2/stack.csv objID=7");
    }

    #[test]
    fn test_payload_decode() {
        let payload = Payload::decode(Format::Json, r#"[{"objID": 1}]"#.to_string()).unwrap();
        assert_eq!(payload.format(), Format::Json);
        assert_eq!(payload.to_table().unwrap().num_rows(), 1);

        assert!(Payload::decode(Format::Json, "not json".to_string()).is_err());

        let payload = Payload::decode(Format::Csv, "a\n1\n2\n".to_string()).unwrap();
        assert_eq!(payload.as_text(), "a\n1\n2\n");
        assert_eq!(payload.to_table().unwrap().num_rows(), 2);
    }
}
