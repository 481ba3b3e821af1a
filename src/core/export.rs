//! CSV export of list pages
//!
//! String-like values (text, timestamps) are double-quoted with embedded
//! quotes doubled; numbers and booleans are written bare; absent or null
//! values are empty. Lines end with `\n`.

use crate::core::field::FieldValue;
use crate::core::record::Record;
use chrono::NaiveDate;

/// `<resource>_<YYYY-MM-DD>.csv`
pub fn export_filename(resource: &str, date: NaiveDate) -> String {
    format!("{}_{}.csv", resource, date.format("%Y-%m-%d"))
}

/// Render records with the record type's own column list
pub fn to_csv<R: Record>(records: &[R]) -> String {
    to_csv_with_columns(records, R::field_names())
}

/// Render records with an explicit column list
pub fn to_csv_with_columns<R: Record, S: AsRef<str>>(records: &[R], columns: &[S]) -> String {
    let mut out = String::new();

    let header: Vec<String> = columns.iter().map(|c| quote(c.as_ref())).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|c| cell(record.field_value(c.as_ref()).as_ref()))
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

fn cell(value: Option<&FieldValue>) -> String {
    match value {
        None | Some(FieldValue::Null) => String::new(),
        Some(v @ (FieldValue::Integer(_) | FieldValue::Float(_) | FieldValue::Boolean(_))) => {
            v.to_text()
        }
        Some(v) => quote(&v.to_text()),
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}
