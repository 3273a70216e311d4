//! Group name resolution.
//!
//! The page has no stable structured name field, so the name is taken from
//! an ordered list of fallback rules; the first rule producing a non-empty,
//! filtered value wins and nothing after it runs. The rules are kept as data
//! so each can be exercised on its own.

use crate::dom::{Dom, NodeId};
use crate::error::Result;
use crate::extract::types::UNKNOWN_GROUP;
use regex::Regex;
use std::sync::LazyLock;

/// Name quoted inside the panel's accessibility label: `... for "Team"`.
static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"for "(.+?)""#).unwrap());

/// Name as a suffix of the label: `Group info for Team`.
static SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)group info for (.+)").unwrap());

/// Labelled children carrying the displayed group title.
const LABELLED_CHILD: &str = r#"span[dir="auto"], div[title], div[aria-label]"#;

/// Last-resort lookups under the conversation-info header.
const HEADER_CHILD_SELECTORS: &[&str] = &[
    r#"div[data-testid="conversation-info-header"] span[dir="auto"]"#,
    r#"div[data-testid="conversation-info-header"] div[title]"#,
    r#"div[data-testid="conversation-info-header"] div[aria-label]"#,
];

/// One fallback rule, evaluated in [`name_rules`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameRule {
    /// Regex extraction from the panel's `aria-label`.
    AriaLabelPattern,
    /// The panel's `title` attribute, unless it is a member-count label.
    TitleAttr,
    /// Text of the first labelled child element.
    LabelledChildText,
    /// Fixed child-selector lookups.
    ChildSelectors(&'static [&'static str]),
}

/// The priority order. First match wins.
pub fn name_rules() -> Vec<NameRule> {
    vec![
        NameRule::AriaLabelPattern,
        NameRule::TitleAttr,
        NameRule::LabelledChildText,
        NameRule::ChildSelectors(HEADER_CHILD_SELECTORS),
    ]
}

/// Member-count labels masquerade as titles; never accept them as a name.
fn filtered(text: String) -> Option<String> {
    if text.is_empty() || text.contains("member") {
        None
    } else {
        Some(text)
    }
}

/// Evaluate one rule against the group-info panel.
pub async fn apply(rule: &NameRule, dom: &dyn Dom, panel: &NodeId) -> Result<Option<String>> {
    match rule {
        NameRule::AriaLabelPattern => {
            let label = dom.attr(panel, "aria-label").await?.unwrap_or_default();
            if label.is_empty() {
                return Ok(None);
            }
            let captured = QUOTED_RE
                .captures(&label)
                .or_else(|| SUFFIX_RE.captures(&label))
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
            Ok(captured)
        }
        NameRule::TitleAttr => {
            let title = dom.attr(panel, "title").await?.unwrap_or_default();
            Ok(filtered(title))
        }
        NameRule::LabelledChildText => {
            let Some(child) = dom.query(Some(panel), LABELLED_CHILD).await? else {
                return Ok(None);
            };
            Ok(filtered(dom.text(&child).await?))
        }
        NameRule::ChildSelectors(selectors) => {
            for selector in *selectors {
                if let Some(el) = dom.query(Some(panel), selector).await? {
                    if let Some(name) = filtered(dom.text(&el).await?) {
                        return Ok(Some(name));
                    }
                }
            }
            Ok(None)
        }
    }
}

/// Run the rules in order; fall back to [`UNKNOWN_GROUP`].
pub async fn resolve(dom: &dyn Dom, panel: &NodeId) -> Result<String> {
    for rule in name_rules() {
        if let Some(name) = apply(&rule, dom, panel).await? {
            return Ok(name);
        }
    }
    Ok(UNKNOWN_GROUP.to_string())
}
