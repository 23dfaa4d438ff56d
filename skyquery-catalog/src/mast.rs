//! MAST portal service requests and name resolution.
//!
//! The portal API takes a JSON request document, posted as the form field
//! `request`, and answers with JSON:
//!
//! ```text
//! {"status": "COMPLETE", "msg": "", "fields": [{"name": .., "type": ..}, ..],
//!  "data": [{..}, ..], "paging": {"page": 1, "pageSize": 50, "rows": 12, ..}}
//! ```
//!
//! [`ArchiveClient::invoke`] returns that body as text,
//! [`ArchiveClient::invoke_table`] decodes it into a [`Table`], and
//! [`ArchiveClient::resolve`] wraps the `Mast.Name.Lookup` service.

use crate::ArchiveClient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use skyquery_core::{Cone, QueryError, QueryResult, Table};

pub const NAME_LOOKUP_SERVICE: &str = "Mast.Name.Lookup";
pub const CAOM_CONE_SERVICE: &str = "Mast.Caom.Cone";

/// A portal service request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MastRequest {
    pub service: String,
    pub params: Map<String, Value>,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagesize: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removenullcolumns: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
}

impl MastRequest {
    /// A JSON-format request for `service` with no parameters.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            params: Map::new(),
            format: "json".to_string(),
            pagesize: None,
            page: None,
            removenullcolumns: None,
            timeout: None,
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn page(mut self, page: u32, pagesize: u32) -> Self {
        self.page = Some(page);
        self.pagesize = Some(pagesize);
        self
    }

    pub fn remove_null_columns(mut self, remove: bool) -> Self {
        self.removenullcolumns = Some(remove);
        self
    }

    /// `Mast.Name.Lookup` for `name`.
    pub fn name_lookup(name: &str) -> Self {
        Self::new(NAME_LOOKUP_SERVICE)
            .param("input", name)
            .param("format", "json")
    }

    /// `Mast.Caom.Cone`: observations overlapping a cone.
    pub fn caom_cone(cone: &Cone) -> Self {
        Self::new(CAOM_CONE_SERVICE)
            .param("ra", cone.center.ra_deg)
            .param("dec", cone.center.dec_deg)
            .param("radius", cone.radius_deg)
    }
}

/// Paging block of a portal response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub pages_filtered: u32,
    #[serde(default)]
    pub rows: u64,
    #[serde(default)]
    pub rows_filtered: u64,
    #[serde(default)]
    pub rows_total: u64,
}

/// A decoded portal response.
#[derive(Debug, Clone, PartialEq)]
pub struct MastResult {
    pub status: String,
    pub table: Table,
    pub paging: Option<Paging>,
}

/// One candidate returned by the name resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedObject {
    #[serde(rename = "canonicalName", default)]
    pub canonical_name: String,
    pub ra: f64,
    #[serde(rename = "decl")]
    pub dec: f64,
    #[serde(default)]
    pub resolver: String,
    #[serde(rename = "objectType", default)]
    pub object_type: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(rename = "resolvedCoordinate", default)]
    resolved_coordinate: Vec<ResolvedObject>,
}

impl ArchiveClient {
    /// Post a portal request and return the raw response body.
    pub fn invoke(&self, request: &MastRequest) -> QueryResult<String> {
        let encoded = serde_json::to_string(request)
            .map_err(|e| QueryError::parse("json", &format!("cannot encode request: {}", e)))?;
        log::debug!("MAST service {}", request.service);
        self.post_form_text(&self.config().invoke_url, &[("request", encoded.as_str())])
    }

    /// Post a portal request and decode the response into a table.
    ///
    /// # Errors
    /// An `ERROR` status is reported as [`QueryError::Parse`] with the service
    /// message. A request still `EXECUTING` is a recoverable
    /// [`QueryError::Transport`]: issuing it again collects the result.
    pub fn invoke_table(&self, request: &MastRequest) -> QueryResult<MastResult> {
        let body = self.invoke(request)?;
        decode_mast_response(&self.config().invoke_url, &body)
    }

    /// Resolve an object name to `(ra, dec)` in degrees.
    ///
    /// Only the first candidate is used.
    pub fn resolve(&self, name: &str) -> QueryResult<(f64, f64)> {
        let object = self.resolve_object(name)?;
        Ok((object.ra, object.dec))
    }

    /// Resolve an object name, keeping the resolver's details.
    ///
    /// # Errors
    /// [`QueryError::UnknownObject`] when the resolver has no candidates.
    pub fn resolve_object(&self, name: &str) -> QueryResult<ResolvedObject> {
        let body = self.invoke(&MastRequest::name_lookup(name))?;
        let response: LookupResponse = serde_json::from_str(&body)
            .map_err(|e| QueryError::parse("json", &format!("name lookup response: {}", e)))?;
        let object = response
            .resolved_coordinate
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::unknown_object(name))?;
        log::debug!(
            "resolved '{}' to {} ({}, {}) via {}",
            name,
            object.canonical_name,
            object.ra,
            object.dec,
            object.resolver
        );
        Ok(object)
    }
}

fn decode_mast_response(url: &str, body: &str) -> QueryResult<MastResult> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| QueryError::parse("json", &format!("MAST response: {}", e)))?;

    let status = value
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("COMPLETE")
        .to_string();
    let msg = value.get("msg").and_then(Value::as_str).unwrap_or("");

    match status.as_str() {
        "ERROR" => return Err(QueryError::parse("mast", &format!("service error: {}", msg))),
        "EXECUTING" => {
            return Err(QueryError::transport(
                url,
                "request still EXECUTING; issue it again to collect the result",
            ))
        }
        _ => {}
    }

    let paging = value
        .get("paging")
        .map(|p| serde_json::from_value::<Paging>(p.clone()))
        .transpose()
        .map_err(|e| QueryError::parse("json", &format!("paging block: {}", e)))?;

    let table = if value.get("data").is_some() {
        Table::from_json(&value)?
    } else {
        Table::default()
    };

    Ok(MastResult {
        status,
        table,
        paging,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_lookup_request_shape() {
        let request = MastRequest::name_lookup("M87");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "service": "Mast.Name.Lookup",
                "params": {"input": "M87", "format": "json"},
                "format": "json"
            })
        );
    }

    #[test]
    fn test_paged_request_shape() {
        let request = MastRequest::caom_cone(&Cone::new(10.68, 41.27, 0.2))
            .page(2, 100)
            .remove_null_columns(true);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["params"]["radius"], json!(0.2));
        assert_eq!(value["pagesize"], json!(100));
        assert_eq!(value["page"], json!(2));
        assert_eq!(value["removenullcolumns"], json!(true));
        assert!(value.get("timeout").is_none());
    }

    #[test]
    fn test_decode_complete_response() {
        let body = json!({
            "status": "COMPLETE",
            "msg": "",
            "fields": [{"name": "obs_id", "type": "string"}, {"name": "t_exptime", "type": "float"}],
            "data": [
                {"obs_id": "hst_8992_52_acs_wfc_f606w", "t_exptime": 500.0},
                {"obs_id": "hst_8992_52_acs_wfc_f814w", "t_exptime": null}
            ],
            "paging": {"page": 1, "pageSize": 2, "pagesFiltered": 1, "rows": 2, "rowsFiltered": 2, "rowsTotal": 2}
        })
        .to_string();
        let result = decode_mast_response("u", &body).unwrap();
        assert_eq!(result.status, "COMPLETE");
        assert_eq!(result.table.num_rows(), 2);
        assert_eq!(result.table.column_f64("t_exptime").unwrap(), vec![Some(500.0), None]);
        assert_eq!(result.paging.unwrap().rows_total, 2);
    }

    #[test]
    fn test_decode_error_status() {
        let body = json!({"status": "ERROR", "msg": "Unknown service", "data": []}).to_string();
        let err = decode_mast_response("u", &body).unwrap_err();
        assert!(err.to_string().contains("Unknown service"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_decode_executing_is_recoverable() {
        let body = json!({"status": "EXECUTING", "msg": "", "data": []}).to_string();
        assert!(decode_mast_response("u", &body).unwrap_err().is_recoverable());
    }

    #[test]
    fn test_resolved_object_deserialize() {
        let object: ResolvedObject = serde_json::from_value(json!({
            "canonicalName": "MESSIER 087",
            "ra": 187.70593,
            "decl": 12.39112,
            "objectType": "G",
            "resolver": "NED",
            "radius": 0.1
        }))
        .unwrap();
        assert_eq!(object.canonical_name, "MESSIER 087");
        assert!((object.dec - 12.39112).abs() < 1e-9);
    }
}
