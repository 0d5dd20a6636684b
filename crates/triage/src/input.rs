// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading documents from CSV and JSON-lines files.
//!
//! One column holds the message text. An `id` column, when present, becomes
//! the document id; otherwise ids are generated from the row number. A
//! `timestamp` column in RFC 3339 form is parsed. Every other column is
//! carried through to the output record untouched.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use triage_core::Document;

const ID_COLUMN: &str = "id";
const TIMESTAMP_COLUMN: &str = "timestamp";

/// Input file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Csv,
    Jsonl,
}

impl InputFormat {
    /// Guesses the format from the file extension; anything that is not
    /// `.jsonl`/`.ndjson` is read as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson") => {
                InputFormat::Jsonl
            }
            _ => InputFormat::Csv,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: invalid JSON: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },

    #[error("line {line}: expected a JSON object")]
    NotAnObject { line: usize },

    #[error("column `{column}` not found (available: {available})")]
    MissingColumn { column: String, available: String },

    #[error("line {line}: missing text field `{column}`")]
    MissingText { line: usize, column: String },
}

/// Reads every document in `path`.
pub fn read_documents(
    path: &Path,
    format: InputFormat,
    text_column: &str,
) -> Result<Vec<Document>, InputError> {
    let file = std::fs::File::open(path)?;
    match format {
        InputFormat::Csv => read_csv(file, text_column),
        InputFormat::Jsonl => read_jsonl(BufReader::new(file), text_column),
    }
}

pub fn read_csv(reader: impl Read, text_column: &str) -> Result<Vec<Document>, InputError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();

    let text_index = headers
        .iter()
        .position(|h| h == text_column)
        .ok_or_else(|| InputError::MissingColumn {
            column: text_column.to_string(),
            available: headers.iter().collect::<Vec<_>>().join(", "),
        })?;

    let mut documents = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let mut fields: BTreeMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(i, _)| *i != text_index)
            .map(|(_, (h, v))| (h.to_string(), v.to_string()))
            .collect();
        let text = record.get(text_index).unwrap_or_default();
        documents.push(build_document(row, text, &mut fields));
    }
    Ok(documents)
}

pub fn read_jsonl(reader: impl BufRead, text_column: &str) -> Result<Vec<Document>, InputError> {
    let mut documents = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value =
            serde_json::from_str(&line).map_err(|source| InputError::Json {
                line: n + 1,
                source,
            })?;
        let serde_json::Value::Object(object) = value else {
            return Err(InputError::NotAnObject { line: n + 1 });
        };

        let mut text = None;
        let mut fields = BTreeMap::new();
        for (key, value) in object {
            let value = match value {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            if key == text_column {
                text = Some(value);
            } else {
                fields.insert(key, value);
            }
        }
        let text = text.ok_or_else(|| InputError::MissingText {
            line: n + 1,
            column: text_column.to_string(),
        })?;
        documents.push(build_document(documents.len(), &text, &mut fields));
    }
    Ok(documents)
}

fn build_document(row: usize, text: &str, fields: &mut BTreeMap<String, String>) -> Document {
    let id = match fields.remove(ID_COLUMN) {
        Some(id) if !id.trim().is_empty() => id,
        _ => format!("doc-{}", row + 1),
    };
    let mut document = Document::new(id, text);

    let timestamp = fields
        .get(TIMESTAMP_COLUMN)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|ts| ts.with_timezone(&Utc));
    if timestamp.is_some() {
        fields.remove(TIMESTAMP_COLUMN);
        document.timestamp = timestamp;
    }

    document.passthrough = std::mem::take(fields);
    document
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_uses_id_column_and_passes_other_columns_through() {
        let data = "id,text,author\n42,coupure internet depuis hier,@alice\n";
        let docs = read_csv(data.as_bytes(), "text").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "42");
        assert_eq!(docs[0].raw_text, "coupure internet depuis hier");
        assert_eq!(docs[0].passthrough.get("author").map(String::as_str), Some("@alice"));
        assert!(!docs[0].passthrough.contains_key("id"));
    }

    #[test]
    fn csv_generates_ids_when_column_absent() {
        let data = "full_text\nfirst\nsecond\n";
        let docs = read_csv(data.as_bytes(), "full_text").unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["doc-1", "doc-2"]);
    }

    #[test]
    fn csv_missing_text_column_lists_available_columns() {
        let data = "id,body\n1,hello\n";
        let err = read_csv(data.as_bytes(), "text").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("`text`"), "{message}");
        assert!(message.contains("id, body"), "{message}");
    }

    #[test]
    fn csv_parses_rfc3339_timestamp() {
        let data = "text,timestamp\nhello,2024-03-01T10:00:00Z\nworld,yesterday\n";
        let docs = read_csv(data.as_bytes(), "text").unwrap();
        assert!(docs[0].timestamp.is_some());
        assert!(!docs[0].passthrough.contains_key("timestamp"));
        // Unparseable timestamps stay in the passthrough columns.
        assert!(docs[1].timestamp.is_none());
        assert_eq!(
            docs[1].passthrough.get("timestamp").map(String::as_str),
            Some("yesterday")
        );
    }

    #[test]
    fn jsonl_reads_objects_and_skips_blank_lines() {
        let data = r#"{"id": 7, "text": "merci pour la réparation", "likes": 3}

{"text": "box en panne", "channel": null}
"#;
        let docs = read_jsonl(data.as_bytes(), "text").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "7");
        assert_eq!(docs[0].passthrough.get("likes").map(String::as_str), Some("3"));
        assert_eq!(docs[1].id, "doc-2");
        assert!(docs[1].passthrough.is_empty());
    }

    #[test]
    fn jsonl_reports_line_of_bad_input() {
        let data = "{\"text\": \"ok\"}\n{not json}\n";
        let err = read_jsonl(data.as_bytes(), "text").unwrap_err();
        assert!(matches!(err, InputError::Json { line: 2, .. }));

        let data = "{\"body\": \"ok\"}\n";
        let err = read_jsonl(data.as_bytes(), "text").unwrap_err();
        assert!(matches!(err, InputError::MissingText { line: 1, .. }));

        let err = read_jsonl("[1, 2]\n".as_bytes(), "text").unwrap_err();
        assert!(matches!(err, InputError::NotAnObject { line: 1 }));
    }

    #[test]
    fn format_is_guessed_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a.jsonl")), InputFormat::Jsonl);
        assert_eq!(InputFormat::from_path(Path::new("a.NDJSON")), InputFormat::Jsonl);
        assert_eq!(InputFormat::from_path(Path::new("a.csv")), InputFormat::Csv);
        assert_eq!(InputFormat::from_path(Path::new("a")), InputFormat::Csv);
    }
}
