//! Records produced by an extraction run.

use serde::{Deserialize, Serialize};

/// Group name reported when every resolution rule misses.
pub const UNKNOWN_GROUP: &str = "Unknown Group";

/// Group name reported when the run fails outright (e.g. panel wait timeout).
pub const ERROR_GROUP: &str = "Error";

/// One roster participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    /// Display name, never empty.
    pub name: String,
    /// Digits with an optional leading `+`; empty when undetectable.
    pub phone: String,
    pub is_admin: bool,
}

impl MemberRecord {
    /// Identity key: plain concatenation of name and phone. Ambiguous across
    /// boundary splits ("A1"+"" vs "A"+"1"); kept as-is pending a decision on
    /// the intended uniqueness semantics.
    pub fn key(&self) -> String {
        format!("{}{}", self.name, self.phone)
    }
}

/// Outcome of one extraction run. Member order is first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub group_name: String,
    pub members: Vec<MemberRecord>,
}

impl ExtractionResult {
    /// Empty result tagged with `group_name`.
    pub fn empty(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            members: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_plain_concatenation() {
        let a = MemberRecord {
            name: "A1".into(),
            phone: String::new(),
            is_admin: false,
        };
        let b = MemberRecord {
            name: "A".into(),
            phone: "1".into(),
            is_admin: false,
        };
        // Known collision, kept by design.
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn wire_format_uses_camel_case() {
        let record = MemberRecord {
            name: "Alice".into(),
            phone: "+15550001111".into(),
            is_admin: true,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["isAdmin"], true);
        let result = ExtractionResult {
            group_name: "Team".into(),
            members: vec![record],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["groupName"], "Team");
    }
}
