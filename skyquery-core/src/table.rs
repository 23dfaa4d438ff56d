//! In-memory tables decoded from archive payloads.
//!
//! Every service hands back rows and columns in one of a few text encodings.
//! [`Table`] is the common landing spot: column metadata plus rows of string
//! cells, with typed accessors applied on demand. Cells keep their original
//! text so nothing is lost to an early conversion.
//!
//! | Constructor | Payload |
//! |-------------|---------|
//! | [`Table::from_csv`] | CSV with a header line (catalog API, CasJobs, HLA `csv`) |
//! | [`Table::from_delimited`] | Any single-byte delimiter (HLA `tsv`) |
//! | [`Table::from_votable`] | First `<TABLE>` of a VOTable document |
//! | [`Table::from_json`] | MAST-style JSON (records, or `data` plus a field list) |
//! | [`Table::from_whitespace`] | Whitespace-aligned ASCII (PS1 filename service) |

use crate::errors::{QueryError, QueryResult};
use crate::position::{angular_separation_deg, Position};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Column name plus the datatype the service declared, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub datatype: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datatype: None,
        }
    }

    pub fn typed(name: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datatype: Some(datatype.into()),
        }
    }
}

/// Rows of string cells under a fixed set of columns.
///
/// Every row has exactly `columns().len()` cells. Deserializing checks
/// this too, so a ragged document is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct RawTable {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl TryFrom<RawTable> for Table {
    type Error = QueryError;

    fn try_from(raw: RawTable) -> QueryResult<Self> {
        let mut table = Table::new(raw.columns);
        for row in raw.rows {
            table.push_row(row)?;
        }
        Ok(table)
    }
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row.
    ///
    /// # Errors
    /// Returns [`QueryError::Parse`] if the row width does not match the columns.
    pub fn push_row(&mut self, row: Vec<String>) -> QueryResult<()> {
        if row.len() != self.columns.len() {
            return Err(QueryError::parse(
                "table",
                &format!(
                    "row {} has {} cells, expected {}",
                    self.rows.len() + 1,
                    row.len(),
                    self.columns.len()
                ),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parse CSV text whose first record is the header.
    ///
    /// Blank lines are skipped, so the row count equals the number of
    /// non-empty lines after the header (quoted newlines aside).
    pub fn from_csv(text: &str) -> QueryResult<Self> {
        Self::from_delimited(text, b',')
    }

    /// Parse delimiter-separated text whose first record is the header.
    pub fn from_delimited(text: &str, delimiter: u8) -> QueryResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| QueryError::parse("csv", &e.to_string()))?;
        let mut table = Self::new(headers.iter().map(|h| Column::new(h.trim())).collect());

        for record in reader.records() {
            let record = record.map_err(|e| QueryError::parse("csv", &e.to_string()))?;
            table.rows.push(record.iter().map(str::to_string).collect());
        }

        log::trace!(
            "decoded csv: {} columns, {} rows",
            table.num_columns(),
            table.num_rows()
        );
        Ok(table)
    }

    /// Parse whitespace-separated ASCII with a header line.
    ///
    /// A leading `#` on the header line is ignored. Cells cannot contain spaces.
    pub fn from_whitespace(text: &str) -> QueryResult<Self> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        let header = match lines.next() {
            Some(h) => h.trim_start_matches('#'),
            None => return Ok(Self::default()),
        };
        let mut table = Self::new(header.split_whitespace().map(Column::new).collect());

        for line in lines {
            if line.starts_with('#') {
                continue;
            }
            table
                .push_row(line.split_whitespace().map(str::to_string).collect())
                .map_err(|e| QueryError::parse("ascii", &e.to_string()))?;
        }
        Ok(table)
    }

    /// Parse the first `<TABLE>` of a VOTable document.
    ///
    /// Column names and datatypes come from `<FIELD>` elements; cells from
    /// `<TD>`. A `QUERY_STATUS` of `ERROR` is reported as a parse failure
    /// carrying the service's message.
    pub fn from_votable(xml: &str) -> QueryResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut columns = Vec::new();
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut current_row: Option<Vec<String>> = None;
        let mut current_cell: Option<String> = None;
        let mut error_info: Option<String> = None;
        let mut in_error_info = false;
        let mut seen_table = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"TABLE" => {
                        if seen_table {
                            break;
                        }
                        seen_table = true;
                    }
                    b"FIELD" if seen_table => columns.push(parse_field(e)?),
                    b"TR" => current_row = Some(Vec::new()),
                    b"TD" => current_cell = Some(String::new()),
                    b"INFO" if is_error_status(e)? => {
                        in_error_info = true;
                        error_info = Some(String::new());
                    }
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                    b"FIELD" if seen_table => columns.push(parse_field(e)?),
                    b"TD" => {
                        if let Some(row) = current_row.as_mut() {
                            row.push(String::new());
                        }
                    }
                    b"INFO" if is_error_status(e)? => error_info = Some(String::new()),
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| QueryError::parse("votable", &e.to_string()))?;
                    if let Some(cell) = current_cell.as_mut() {
                        cell.push_str(&text);
                    } else if in_error_info {
                        if let Some(info) = error_info.as_mut() {
                            info.push_str(&text);
                        }
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(cell) = current_cell.as_mut() {
                        cell.push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                    b"TD" => {
                        if let (Some(row), Some(cell)) = (current_row.as_mut(), current_cell.take())
                        {
                            row.push(cell);
                        }
                    }
                    b"TR" => {
                        if let Some(row) = current_row.take() {
                            rows.push(row);
                        }
                    }
                    b"INFO" => in_error_info = false,
                    b"TABLE" => break,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(QueryError::parse("votable", &e.to_string())),
                _ => {}
            }
        }

        if let Some(message) = error_info {
            return Err(QueryError::parse(
                "votable",
                &format!("service reported QUERY_STATUS=ERROR: {}", message.trim()),
            ));
        }

        let mut table = Self::new(columns);
        for row in rows {
            table
                .push_row(row)
                .map_err(|e| QueryError::parse("votable", &e.to_string()))?;
        }
        Ok(table)
    }

    /// Decode a JSON payload into a table.
    ///
    /// Accepted shapes:
    ///
    /// - an array of objects (one object per row);
    /// - an object with a `data` array of objects or arrays, plus an optional
    ///   column list under `fields` or `info` (`name` and `type`/`datatype`).
    ///
    /// Without a column list, columns appear in first-seen order. JSON `null`
    /// becomes an empty cell.
    pub fn from_json(value: &Value) -> QueryResult<Self> {
        let (data, declared) = match value {
            Value::Array(rows) => (rows.as_slice(), None),
            Value::Object(map) => {
                let data = map
                    .get("data")
                    .and_then(Value::as_array)
                    .ok_or_else(|| QueryError::parse("json", "missing 'data' array"))?;
                let declared = map
                    .get("fields")
                    .or_else(|| map.get("info"))
                    .and_then(Value::as_array)
                    .map(|fields| parse_json_fields(fields))
                    .transpose()?;
                (data.as_slice(), declared)
            }
            _ => return Err(QueryError::parse("json", "expected an array or object")),
        };

        let columns = match declared {
            Some(columns) => columns,
            None => infer_json_columns(data),
        };
        let mut table = Self::new(columns);

        for (i, row) in data.iter().enumerate() {
            let cells: Vec<String> = match row {
                Value::Object(obj) => table
                    .columns
                    .iter()
                    .map(|c| obj.get(&c.name).map(json_cell).unwrap_or_default())
                    .collect(),
                Value::Array(values) => values.iter().map(json_cell).collect(),
                other => {
                    return Err(QueryError::parse(
                        "json",
                        &format!("row {} is not an object or array: {}", i + 1, other),
                    ))
                }
            };
            table
                .push_row(cells)
                .map_err(|e| QueryError::parse("json", &e.to_string()))?;
        }
        Ok(table)
    }

    /// Rename CasJobs-style headers `[name]:type` to `name`.
    ///
    /// The text after the closing bracket (minus a leading `:`) becomes the
    /// column datatype.
    ///
    /// # Errors
    /// Returns [`QueryError::Parse`] naming the first header that does not
    /// start with a bracketed name. The table is left untouched in that case.
    pub fn fix_column_names(&mut self) -> QueryResult<()> {
        let mut renamed = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let caps = BRACKETED_NAME.captures(&column.name).ok_or_else(|| {
                QueryError::parse(
                    "column name",
                    &format!("Unable to parse column name '{}'", column.name),
                )
            })?;
            let datatype = caps
                .name("rest")
                .map(|m| m.as_str().trim_start_matches(':').trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .or_else(|| column.datatype.clone());
            renamed.push(Column {
                name: caps["name"].to_string(),
                datatype,
            });
        }
        self.columns = renamed;
        Ok(())
    }

    /// Index of a column, preferring an exact match over a case-insensitive one.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(name))
            })
    }

    fn require_column(&self, name: &str) -> QueryResult<usize> {
        self.column_index(name)
            .ok_or_else(|| QueryError::unknown_columns(&[name]))
    }

    /// All cells of one column.
    pub fn column_str(&self, name: &str) -> QueryResult<Vec<&str>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// One column as numbers.
    ///
    /// Empty, `nan`, `null`, `none` and `--` cells are `None`.
    ///
    /// # Errors
    /// Unknown column, or a cell that is neither missing nor numeric.
    pub fn column_f64(&self, name: &str) -> QueryResult<Vec<Option<f64>>> {
        let idx = self.require_column(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(i, r)| {
                parse_cell_f64(&r[idx]).map_err(|_| {
                    QueryError::parse(
                        "table",
                        &format!("column {} row {}: '{}' is not numeric", name, i + 1, r[idx]),
                    )
                })
            })
            .collect()
    }

    /// Look up a single cell.
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }

    /// Append a column with one value per row.
    ///
    /// # Errors
    /// Returns [`QueryError::Parse`] if `values` does not have one entry per row.
    pub fn add_column(&mut self, column: Column, values: Vec<String>) -> QueryResult<()> {
        if values.len() != self.rows.len() {
            return Err(QueryError::parse(
                "table",
                &format!(
                    "column {} has {} values for {} rows",
                    column.name,
                    values.len(),
                    self.rows.len()
                ),
            ));
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        self.columns.push(column);
        Ok(())
    }

    /// Keep only rows for which `keep` returns true.
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[String]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Keep a subset of columns, in the order given.
    pub fn select(&self, names: &[&str]) -> QueryResult<Table> {
        let indices = names
            .iter()
            .map(|n| self.require_column(n))
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(Table {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        })
    }

    /// Stable sort on a numeric column, ascending; missing values sort last.
    pub fn sort_by_f64(&mut self, name: &str) -> QueryResult<()> {
        let idx = self.require_column(name)?;
        self.rows.sort_by(|a, b| {
            match (parse_cell_f64(&a[idx]).ok().flatten(), parse_cell_f64(&b[idx]).ok().flatten()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
        Ok(())
    }

    /// Add a `distance` column (degrees from `center`) and sort on it.
    ///
    /// Rows with a missing RA or Dec get an empty distance and sort last.
    /// An existing `distance` column is overwritten.
    pub fn sort_by_separation(&mut self, ra: &str, dec: &str, center: &Position) -> QueryResult<()> {
        let ras = self.column_f64(ra)?;
        let decs = self.column_f64(dec)?;
        let distances: Vec<String> = ras
            .into_iter()
            .zip(decs)
            .map(|pair| match pair {
                (Some(r), Some(d)) => {
                    format!("{:.8}", angular_separation_deg(center.ra_deg, center.dec_deg, r, d))
                }
                _ => String::new(),
            })
            .collect();

        match self.column_index(DISTANCE_COLUMN) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(distances) {
                    row[idx] = value;
                }
            }
            None => self.add_column(Column::typed(DISTANCE_COLUMN, "double"), distances)?,
        }
        self.sort_by_f64(DISTANCE_COLUMN)
    }

    /// Serialize back to CSV.
    pub fn to_csv(&self) -> QueryResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(self.columns.iter().map(|c| c.name.as_str()))
            .map_err(|e| QueryError::parse("csv", &e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| QueryError::parse("csv", &e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| QueryError::parse("csv", &e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| QueryError::parse("csv", &e.to_string()))
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_json_records(&self) -> Value {
        Value::Array(
            self.rows
                .iter()
                .map(|r| {
                    Value::Object(
                        self.columns
                            .iter()
                            .zip(r)
                            .map(|(c, v)| (c.name.clone(), Value::String(v.clone())))
                            .collect(),
                    )
                })
                .collect(),
        )
    }
}

/// Column appended by [`Table::sort_by_separation`].
pub const DISTANCE_COLUMN: &str = "distance";

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // widths count chars, matching how `{:>w$}` pads
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.name.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:>w$}", c.name, w = w))
            .collect();
        writeln!(f, "{}", header.join(" "))?;

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write!(f, "{}", rule.join(" "))?;

        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{:>w$}", v, w = w))
                .collect();
            write!(f, "\n{}", cells.join(" "))?;
        }
        Ok(())
    }
}

static BRACKETED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(?P<name>[^\[\]]+)\](?P<rest>.*)$").unwrap());

fn parse_cell_f64(cell: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let cell = cell.trim();
    if cell.is_empty()
        || cell == "--"
        || cell.eq_ignore_ascii_case("nan")
        || cell.eq_ignore_ascii_case("null")
        || cell.eq_ignore_ascii_case("none")
    {
        return Ok(None);
    }
    cell.parse::<f64>().map(Some)
}

fn json_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_json_fields(fields: &[Value]) -> QueryResult<Vec<Column>> {
    fields
        .iter()
        .map(|f| -> QueryResult<Column> {
            let name = f
                .get("name")
                .or_else(|| f.get("column_name"))
                .and_then(Value::as_str)
                .ok_or_else(|| QueryError::parse("json", &format!("field without a name: {}", f)))?;
            let datatype = f
                .get("type")
                .or_else(|| f.get("datatype"))
                .or_else(|| f.get("db_type"))
                .and_then(Value::as_str)
                .map(str::to_string);
            Ok(Column {
                name: name.to_string(),
                datatype,
            })
        })
        .collect()
}

fn infer_json_columns(data: &[Value]) -> Vec<Column> {
    let mut columns: Vec<Column> = Vec::new();
    for row in data {
        if let Value::Object(obj) = row {
            for key in obj.keys() {
                if !columns.iter().any(|c| &c.name == key) {
                    columns.push(Column::new(key.as_str()));
                }
            }
        }
    }
    columns
}

fn parse_field(element: &BytesStart) -> QueryResult<Column> {
    let mut name = None;
    let mut id = None;
    let mut datatype = None;
    for attr in element.attributes() {
        let attr = attr.map_err(|e| QueryError::parse("votable", &e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| QueryError::parse("votable", &e.to_string()))?
            .to_string();
        match attr.key.as_ref() {
            b"name" => name = Some(value),
            b"ID" => id = Some(value),
            b"datatype" => datatype = Some(value),
            _ => {}
        }
    }
    let name = name
        .or(id)
        .ok_or_else(|| QueryError::parse("votable", "FIELD without name or ID"))?;
    Ok(Column { name, datatype })
}

fn is_error_status(element: &BytesStart) -> QueryResult<bool> {
    let mut is_status = false;
    let mut is_error = false;
    for attr in element.attributes() {
        let attr = attr.map_err(|e| QueryError::parse("votable", &e.to_string()))?;
        match (attr.key.as_ref(), attr.value.as_ref()) {
            (b"name", b"QUERY_STATUS") => is_status = true,
            (b"value", b"ERROR") => is_error = true,
            _ => {}
        }
    }
    Ok(is_status && is_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MEAN_CSV: &str = "objID,raMean,decMean,nDetections,gMeanPSFMag\n\
        122851876967613962,187.7060,12.3911,35,15.3279\n\
        122851876978374213,187.7073,12.3914,2,-999.0\n\
        122851876962524137,187.7043,12.3902,12,\n";

    #[test]
    fn test_csv_row_count_matches_records() {
        let table = Table::from_csv(MEAN_CSV).unwrap();
        let records = MEAN_CSV.lines().filter(|l| !l.is_empty()).count() - 1;
        assert_eq!(table.num_rows(), records);
        assert_eq!(table.num_columns(), 5);
        assert_eq!(table.column_names()[1], "raMean");
    }

    #[test]
    fn test_csv_header_only() {
        let table = Table::from_csv("objID,raMean\n").unwrap();
        assert_eq!(table.num_rows(), 0);
        assert_eq!(table.num_columns(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_csv_ragged_row_fails() {
        let err = Table::from_csv("a,b\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, QueryError::Parse { .. }));
    }

    #[test]
    fn test_column_f64_missing_values() {
        let table = Table::from_csv(MEAN_CSV).unwrap();
        let mags = table.column_f64("gMeanPSFMag").unwrap();
        assert_eq!(mags, vec![Some(15.3279), Some(-999.0), None]);
    }

    #[test]
    fn test_column_lookup_case_insensitive() {
        let table = Table::from_csv(MEAN_CSV).unwrap();
        assert_eq!(table.column_index("RAMEAN"), Some(1));
        assert!(table.column_str("nosuch").is_err());
    }

    #[test]
    fn test_column_f64_rejects_text() {
        let table = Table::from_csv("name,mag\nM87,abc\n").unwrap();
        assert!(table.column_f64("mag").is_err());
    }

    #[test]
    fn test_filter_and_sort() {
        let mut table = Table::from_csv(MEAN_CSV).unwrap();
        table.sort_by_f64("nDetections").unwrap();
        assert_eq!(table.cell(0, "nDetections"), Some("2"));
        assert_eq!(table.cell(2, "nDetections"), Some("35"));

        let idx = table.column_index("nDetections").unwrap();
        let many = table.filter_rows(|r| r[idx].parse::<i64>().unwrap_or(0) > 5);
        assert_eq!(many.num_rows(), 2);
    }

    #[test]
    fn test_sort_missing_last() {
        let mut table = Table::from_csv("v\n\n3\nnan\n1\n").unwrap();
        table.sort_by_f64("v").unwrap();
        assert_eq!(table.column_str("v").unwrap(), vec!["1", "3", "nan"]);
    }

    #[test]
    fn test_select() {
        let table = Table::from_csv(MEAN_CSV).unwrap();
        let sub = table.select(&["decMean", "objID"]).unwrap();
        assert_eq!(sub.column_names(), vec!["decMean", "objID"]);
        assert_eq!(sub.cell(0, "decMean"), Some("12.3911"));
    }

    #[test]
    fn test_to_csv_preserves_content() {
        let table = Table::from_csv(MEAN_CSV).unwrap();
        let again = Table::from_csv(&table.to_csv().unwrap()).unwrap();
        assert_eq!(table, again);
    }

    #[test]
    fn test_fix_column_names() {
        let mut table =
            Table::from_csv("[objID]:bigint,[raMean]:float,[filter]\n1,2.5,g\n").unwrap();
        table.fix_column_names().unwrap();
        assert_eq!(table.column_names(), vec!["objID", "raMean", "filter"]);
        assert_eq!(table.columns()[0].datatype.as_deref(), Some("bigint"));
        assert_eq!(table.columns()[2].datatype, None);
    }

    #[test]
    fn test_fix_column_names_rejects_plain_header() {
        let mut table = Table::from_csv("[objID]:bigint,raMean\n1,2\n").unwrap();
        let err = table.fix_column_names().unwrap_err();
        assert!(err.to_string().contains("raMean"));
        assert_eq!(table.column_names(), vec!["[objID]:bigint", "raMean"]);
    }

    #[test]
    fn test_whitespace_table() {
        let text = "projcell subcell ra dec filter mjd type filename shortname badflag\n\
            1519 42 187.706 12.391 g 0 stack /rings.v3.skycell/1519/042/rings.v3.skycell.1519.042.stk.g.unconv.fits rings.v3.skycell.1519.042.stk.g.unconv.fits 0\n\
            1519 42 187.706 12.391 r 0 stack /rings.v3.skycell/1519/042/rings.v3.skycell.1519.042.stk.r.unconv.fits rings.v3.skycell.1519.042.stk.r.unconv.fits 0\n";
        let table = Table::from_whitespace(text).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.cell(1, "filter"), Some("r"));
    }

    #[test]
    fn test_whitespace_table_hash_header() {
        let table = Table::from_whitespace("# a b\n1 2\n\n3 4\n").unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.num_rows(), 2);
    }

    const VOTABLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<VOTABLE version="1.3" xmlns="http://www.ivoa.net/xml/VOTable/v1.3">
  <RESOURCE type="results">
    <INFO name="QUERY_STATUS" value="OK"/>
    <TABLE>
      <FIELD name="objID" datatype="long"/>
      <FIELD name="raMean" datatype="double" unit="deg"/>
      <FIELD name="note" datatype="char" arraysize="*"/>
      <DATA>
        <TABLEDATA>
          <TR><TD>122851876967613962</TD><TD>187.706</TD><TD>a &amp; b</TD></TR>
          <TR><TD>122851876978374213</TD><TD>187.707</TD><TD/></TR>
        </TABLEDATA>
      </DATA>
    </TABLE>
    <TABLE>
      <FIELD name="ignored" datatype="int"/>
      <DATA><TABLEDATA><TR><TD>1</TD></TR></TABLEDATA></DATA>
    </TABLE>
  </RESOURCE>
</VOTABLE>"#;

    #[test]
    fn test_votable_first_table() {
        let table = Table::from_votable(VOTABLE).unwrap();
        assert_eq!(table.column_names(), vec!["objID", "raMean", "note"]);
        assert_eq!(table.columns()[1].datatype.as_deref(), Some("double"));
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.cell(0, "note"), Some("a & b"));
        assert_eq!(table.cell(1, "note"), Some(""));
    }

    #[test]
    fn test_votable_error_status() {
        let xml = r#"<VOTABLE><RESOURCE type="results">
            <INFO name="QUERY_STATUS" value="ERROR">Column raMeen does not exist</INFO>
            </RESOURCE></VOTABLE>"#;
        let err = Table::from_votable(xml).unwrap_err();
        assert!(err.to_string().contains("raMeen"));
    }

    #[test]
    fn test_json_records() {
        let value = json!([
            {"ra": 187.7, "dec": 12.39, "name": "M87"},
            {"ra": 10.68, "dec": 41.27, "name": null, "extra": true}
        ]);
        let table = Table::from_json(&value).unwrap();
        assert_eq!(table.column_names(), vec!["ra", "dec", "name", "extra"]);
        assert_eq!(table.cell(1, "name"), Some(""));
        assert_eq!(table.cell(1, "extra"), Some("true"));
        assert_eq!(table.cell(0, "extra"), Some(""));
    }

    #[test]
    fn test_deserialize_checks_row_width() {
        let ragged = json!({
            "columns": [{"name": "a", "datatype": null}, {"name": "b", "datatype": null}],
            "rows": [["1", "2"], ["3"]]
        });
        assert!(serde_json::from_value::<Table>(ragged).is_err());

        let table = Table::from_csv(MEAN_CSV).unwrap();
        let back: Table = serde_json::from_value(serde_json::to_value(&table).unwrap()).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_sort_by_separation() {
        let mut table = Table::from_csv(
            "objID,raMean,decMean\n\
             far,187.8000,12.3911\n\
             blank,,\n\
             near,187.7061,12.3911\n\
             mid,187.7200,12.3911\n",
        )
        .unwrap();
        let center = Position::new(187.7060, 12.3911);
        table.sort_by_separation("raMean", "decMean", &center).unwrap();

        assert_eq!(table.column_names().last(), Some(&DISTANCE_COLUMN));
        assert_eq!(table.column_str("objID").unwrap(), vec!["near", "mid", "far", "blank"]);
        assert_eq!(table.cell(3, DISTANCE_COLUMN), Some(""));

        let d = table.column_f64(DISTANCE_COLUMN).unwrap();
        let near = d[0].unwrap();
        assert!((near - 0.0001 * 12.3911_f64.to_radians().cos()).abs() < 1e-7);
        assert!(d[0] < d[1] && d[1] < d[2]);

        // a second sort reuses the column
        let width = table.num_columns();
        table.sort_by_separation("raMean", "decMean", &Position::new(187.8, 12.3911)).unwrap();
        assert_eq!(table.num_columns(), width);
        assert_eq!(table.cell(0, "objID"), Some("far"));
    }

    #[test]
    fn test_sort_by_separation_unknown_column() {
        let mut table = Table::from_csv(MEAN_CSV).unwrap();
        assert!(table
            .sort_by_separation("ra", "decMean", &Position::new(0.0, 0.0))
            .is_err());
    }

    #[test]
    fn test_display_aligns_non_ascii_cells() {
        let table = Table::from_csv("name,mag\nMélotte 111,4.2\nM44,3.7\n").unwrap();
        let text = table.to_string();
        let widths: Vec<usize> = text.lines().map(|l| l.chars().count()).collect();
        assert_eq!(widths.len(), 4);
        assert!(widths.iter().all(|&w| w == widths[0]), "{:?}", widths);
        assert!(text.lines().nth(2).unwrap().starts_with("Mélotte 111"));
    }

    #[test]
    fn test_json_records_keep_payload_column_order() {
        let text = r#"[{"raMean": 187.7, "decMean": 12.39, "objID": 1},
                       {"raMean": 187.8, "decMean": 12.40, "objID": 2}]"#;
        let value: Value = serde_json::from_str(text).unwrap();
        let table = Table::from_json(&value).unwrap();
        assert_eq!(table.column_names(), vec!["raMean", "decMean", "objID"]);
        assert_eq!(table.cell(1, "objID"), Some("2"));
    }

    #[test]
    fn test_json_with_fields() {
        let value = json!({
            "status": "COMPLETE",
            "fields": [{"name": "obsid", "type": "string"}, {"name": "t_exptime", "type": "float"}],
            "data": [{"obsid": "2003520266", "t_exptime": 1200.0}]
        });
        let table = Table::from_json(&value).unwrap();
        assert_eq!(table.column_names(), vec!["obsid", "t_exptime"]);
        assert_eq!(table.columns()[1].datatype.as_deref(), Some("float"));
        assert_eq!(table.column_f64("t_exptime").unwrap(), vec![Some(1200.0)]);
    }

    #[test]
    fn test_json_array_rows_with_info() {
        let value = json!({
            "info": [{"name": "objID", "datatype": "long"}, {"name": "raMean", "datatype": "double"}],
            "data": [[1, 187.7], [2, null]]
        });
        let table = Table::from_json(&value).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column_f64("raMean").unwrap(), vec![Some(187.7), None]);
    }

    #[test]
    fn test_json_rejects_scalar() {
        assert!(Table::from_json(&json!(42)).is_err());
        assert!(Table::from_json(&json!({"rows": []})).is_err());
    }

    #[test]
    fn test_display_aligns_columns() {
        let table = Table::from_csv("a,long_name\n12345,x\n").unwrap();
        let text = table.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), lines[2].len());
    }

    #[test]
    fn test_add_column() {
        let mut table = Table::from_csv("obsTime,filterID
55000.1,1
55001.2,3
").unwrap();
        table
            .add_column(Column::new("filter"), vec!["g".into(), "i".into()])
            .unwrap();
        assert_eq!(table.column_names(), vec!["obsTime", "filterID", "filter"]);
        assert_eq!(table.cell(1, "filter"), Some("i"));

        let err = table.add_column(Column::new("extra"), vec![]).unwrap_err();
        assert!(err.to_string().contains("extra"));
        assert_eq!(table.num_columns(), 3);
    }
}
