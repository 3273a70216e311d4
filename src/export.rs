//! CSV export.
//!
//! One serializer for the one artifact: header
//! `Group Name,Member Name,Phone Number,Is Admin`, every field quoted with
//! embedded quotes doubled, admin rendered `Yes`/`No`. The parser exists so
//! exports can be verified by round-trip.

use crate::error::{Error, Result};
use crate::extract::types::{ExtractionResult, MemberRecord, UNKNOWN_GROUP};
use std::mem::take;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CSV_HEADER: &str = "Group Name,Member Name,Phone Number,Is Admin";

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Serialize a result to CSV text.
pub fn to_csv(result: &ExtractionResult) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for member in &result.members {
        let row = [
            quote(&result.group_name),
            quote(&member.name),
            quote(&member.phone),
            quote(if member.is_admin { "Yes" } else { "No" }),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Filename derived from the group name: non-alphanumerics become `_`,
/// suffixed `_members.csv`.
pub fn csv_filename(group_name: &str) -> String {
    let stem: String = group_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{stem}_members.csv")
}

/// Write the CSV into `dir` and return the full path.
pub fn write_csv(dir: &Path, result: &ExtractionResult) -> Result<PathBuf> {
    let path = dir.join(csv_filename(&result.group_name));
    std::fs::write(&path, to_csv(result))?;
    info!(path = %path.display(), members = result.members.len(), "csv written");
    Ok(path)
}

/// Export gate: zero members means no artifact at all.
pub fn write_csv_if_any(dir: &Path, result: &ExtractionResult) -> Result<Option<PathBuf>> {
    if result.members.is_empty() {
        warn!(group = %result.group_name, "no members extracted; skipping export");
        return Ok(None);
    }
    write_csv(dir, result).map(Some)
}

/// Minimal quote-aware row splitter (CRLF tolerant).
fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => row.push(take(&mut field)),
            '\r' | '\n' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if row.len() > 1 || !row[0].is_empty() {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

/// Parse an exported file back into a result.
pub fn parse_csv(text: &str) -> Result<ExtractionResult> {
    let mut rows = parse_rows(text).into_iter();
    let header = rows.next().ok_or_else(|| Error::Parse("empty file".into()))?;
    if header.join(",") != CSV_HEADER {
        return Err(Error::Parse(format!(
            "unexpected header: {}",
            header.join(",")
        )));
    }

    let mut group_name = None;
    let mut members = Vec::new();
    for (i, row) in rows.enumerate() {
        let [group, name, phone, admin] = row.as_slice() else {
            return Err(Error::Parse(format!(
                "row {} has {} fields, expected 4",
                i + 2,
                row.len()
            )));
        };
        group_name.get_or_insert_with(|| group.clone());
        members.push(MemberRecord {
            name: name.clone(),
            phone: phone.clone(),
            is_admin: admin.as_str() == "Yes",
        });
    }

    Ok(ExtractionResult {
        group_name: group_name.unwrap_or_else(|| UNKNOWN_GROUP.to_string()),
        members,
    })
}
