//! Per-row field extraction.

use crate::dom::{Dom, NodeId};
use crate::error::Result;
use crate::extract::types::MemberRecord;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Candidate member rows inside the roster container.
pub const ROW_SELECTOR: &str = r#"div[role="listitem"], div.x1016tqk.xh8yej3.x1g42fcv"#;

/// Name-bearing descendants, checked in document order.
const NAME_CANDIDATES: &str = r#"span[dir="auto"], div[title], div[aria-label], span"#;

/// Broader sweep for a phone number.
const PHONE_CANDIDATES: &str = "span, div";

/// Admin badge: icon data-attribute or an "admin" title, case-insensitive.
const ADMIN_BADGE: &str =
    r#"span[data-icon="admin"], div[title*="admin" i], span[title*="admin" i]"#;

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+?\d{5,}$").unwrap());

/// Optional leading `+` followed by five or more digits.
pub fn looks_like_phone(text: &str) -> bool {
    PHONE_RE.is_match(text)
}

/// Name filter: long enough, not the roster's own "N members" label, and not
/// phone-shaped. Keeps the name and phone fields from bleeding into each
/// other.
fn acceptable_name(text: &str) -> bool {
    text.chars().count() > 2 && !text.contains("member") && !looks_like_phone(text)
}

/// Extract one member row.
///
/// Returns `None` when no name candidate survives the filters or the
/// (name, phone) identity is already in `seen`. On success the identity key
/// is recorded in `seen`.
pub async fn extract_row(
    dom: &dyn Dom,
    row: &NodeId,
    seen: &mut HashSet<String>,
) -> Result<Option<MemberRecord>> {
    let mut name = String::new();
    for el in dom.query_all(Some(row), NAME_CANDIDATES).await? {
        let mut candidate = dom.text(&el).await?;
        if candidate.is_empty() {
            candidate = dom.attr(&el, "title").await?.unwrap_or_default();
        }
        if candidate.is_empty() {
            candidate = dom.attr(&el, "aria-label").await?.unwrap_or_default();
        }
        if !candidate.is_empty() && acceptable_name(&candidate) {
            name = candidate;
            break;
        }
    }
    if name.is_empty() {
        return Ok(None);
    }

    let mut phone = String::new();
    for el in dom.query_all(Some(row), PHONE_CANDIDATES).await? {
        let text = dom.text(&el).await?;
        if !text.is_empty() && text != name && looks_like_phone(&text) {
            phone = text;
            break;
        }
    }

    let is_admin = dom.query(Some(row), ADMIN_BADGE).await?.is_some();

    let record = MemberRecord {
        name,
        phone,
        is_admin,
    };
    if !seen.insert(record.key()) {
        return Ok(None);
    }
    Ok(Some(record))
}
