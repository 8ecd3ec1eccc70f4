// src/table.rs
//! Tabular reader: comma-delimited text with a header row → `Row`s.
//!
//! - Parsed with the `csv` crate: quoted fields may hold commas, `""` is a
//!   literal quote, and every field is trimmed.
//! - Blank and whitespace-only lines are skipped.
//! - Header names are matched case-insensitively against the required set.
//! - A short line yields empty strings for the missing columns, never an error.
//! - Rows whose first required field is empty are dropped.
//!
//! The only hard failure is a header that lacks a required column.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Optional columns passed through when present in the header.
pub const OPTIONAL_FIELDS: &[&str] = &["art_url"];

/// One dataset row: the required fields plus the optional `art_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    id: String,
    fields: BTreeMap<String, String>,
    pub art_url: Option<String>,
}

impl Row {
    /// Build a row directly. `id_field` names the identifying column and must be
    /// one of the keys in `fields`.
    pub fn new<I, K, V>(id_field: &str, fields: I, art_url: Option<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields: BTreeMap<String, String> = fields
            .into_iter()
            .map(|(k, v)| {
                let (k, v): (String, String) = (k.into(), v.into());
                (k.to_lowercase(), v.trim().to_string())
            })
            .collect();
        let id = fields
            .get(&id_field.to_lowercase())
            .cloned()
            .unwrap_or_default();
        let art_url = art_url
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self {
            id,
            fields,
            art_url,
        }
    }

    /// Value of the identifying (first required) field, e.g. the genus.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Case-insensitive field lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

/// Result of parsing a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedTable {
    pub ok: bool,
    pub rows: Vec<Row>,
    /// Lower-cased header; empty when `ok` is false.
    pub header: Vec<String>,
    /// Required fields absent from the header (empty when `ok`).
    pub missing: Vec<String>,
}

/// Non-empty records of `text`, fields trimmed. RFC 4180 quoting applies:
/// commas inside quotes do not split and `""` decodes to `"`. Records may be
/// ragged; undecodable ones are skipped.
fn records(text: &str) -> impl Iterator<Item = Vec<String>> + '_ {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes())
        .into_records()
        .filter_map(|rec| match rec {
            Ok(rec) => Some(rec.iter().map(str::to_string).collect::<Vec<_>>()),
            Err(e) => {
                tracing::debug!(error = %e, "skipping undecodable record");
                None
            }
        })
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
}

/// Parse `text` into rows, requiring every name in `required` (case-insensitive)
/// to be present in the header. The first required field identifies the row.
pub fn read_table<S: AsRef<str>>(text: &str, required: &[S]) -> ParsedTable {
    let required: Vec<String> = required
        .iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .collect();

    let mut recs = records(text);
    let Some(header_cells) = recs.next() else {
        return ParsedTable {
            missing: required,
            ..ParsedTable::default()
        };
    };

    let header: Vec<String> = header_cells
        .into_iter()
        .map(|h| h.to_lowercase())
        .collect();

    let missing: Vec<String> = required
        .iter()
        .filter(|r| !header.contains(r))
        .cloned()
        .collect();
    if required.is_empty() || !missing.is_empty() {
        tracing::debug!(?missing, "table header check failed");
        return ParsedTable {
            missing,
            ..ParsedTable::default()
        };
    }

    // Last occurrence wins for duplicated header names.
    let idx: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();
    let id_field = required[0].as_str();

    let rows = recs
        .filter_map(|cells| {
            let cell = |name: &str| {
                idx.get(name)
                    .and_then(|&i| cells.get(i))
                    .cloned()
                    .unwrap_or_default()
            };
            let fields: Vec<(String, String)> =
                required.iter().map(|h| (h.clone(), cell(h))).collect();
            let art_url = OPTIONAL_FIELDS
                .iter()
                .find(|opt| idx.contains_key(**opt))
                .map(|opt| cell(opt));

            let row = Row::new(id_field, fields, art_url);
            (!row.id().is_empty()).then_some(row)
        })
        .collect();

    ParsedTable {
        ok: true,
        rows,
        header,
        missing: Vec::new(),
    }
}

/// Read a table from disk. A missing required column becomes an error here.
pub fn load_table<S: AsRef<str>>(path: &Path, required: &[S]) -> Result<ParsedTable> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading table {}", path.display()))?;
    let table = read_table(&text, required);
    if !table.ok {
        bail!(
            "{}: header lacks required column(s): {}",
            path.display(),
            table.missing.join(", ")
        );
    }
    Ok(table)
}
