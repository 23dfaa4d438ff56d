//! Catalog API calls on [`ArchiveClient`].

use super::legal::{check_legal, CatalogTable, Release};
use super::query::{ColumnInfo, Payload, Ps1Query};
use crate::http::build_url;
use crate::ArchiveClient;
use reqwest::Url;
use skyquery_core::{Cone, QueryResult, Table};

impl ArchiveClient {
    /// Fetch the published schema of a table.
    ///
    /// The (table, release) pair is validated before the request is sent.
    pub fn metadata(&self, table: CatalogTable, release: Release) -> QueryResult<Vec<ColumnInfo>> {
        check_legal(table, release)?;
        let url = build_url::<&str, &str>(
            &format!(
                "{}/{}/{}/metadata",
                self.config().catalogs_url.trim_end_matches('/'),
                release,
                table
            ),
            &[],
        )?;
        self.get_json(&url)
    }

    /// Validate `query` and build its URL.
    ///
    /// Validation that needs no schema happens first; if it fails nothing is
    /// sent. When the query names columns the table schema is fetched and the
    /// names are checked against it.
    pub fn query_url(&self, query: &Ps1Query) -> QueryResult<Url> {
        query.validate()?;
        let schema = match &query.columns {
            Some(_) => Some(self.metadata(query.table, query.release)?),
            None => None,
        };
        query.url(&self.config().catalogs_url, schema.as_deref())
    }

    /// Run a catalog search and return the response body.
    pub fn search(&self, query: &Ps1Query) -> QueryResult<Payload> {
        let url = self.query_url(query)?;
        let body = self.get_text(&url)?;
        Payload::decode(query.format, body)
    }

    /// Cone search: `query` plus `ra`, `dec`, `radius` from `cone`.
    pub fn cone(&self, cone: &Cone, query: Ps1Query) -> QueryResult<Payload> {
        self.search(&query.cone(cone))
    }

    /// Run a search and decode the result into a [`Table`].
    pub fn search_table(&self, query: &Ps1Query) -> QueryResult<Table> {
        self.search(query)?.to_table()
    }
}
