//! Locate the control that discloses the full member roster.
//!
//! Pure phrase matching over generic elements; fragile against wording and
//! localization changes, which is an accepted limitation of targeting one
//! page layout.

use crate::dom::{Dom, NodeId};
use crate::error::Result;

/// Phrases that mark the disclosure control, matched against lower-cased
/// element text.
pub const TRIGGER_PHRASES: &[&str] = &["view all", "see all", "more", "members"];

const CANDIDATES: &str = "div, button, span";

/// Does this element text look like the disclosure control?
pub fn matches_trigger(text: &str) -> bool {
    let text = text.to_lowercase();
    TRIGGER_PHRASES.iter().any(|phrase| text.contains(phrase))
}

/// First matching element in document order, unclicked. `None` means the
/// roster cannot be disclosed and the run should end with an empty result.
pub async fn find_control(dom: &dyn Dom) -> Result<Option<NodeId>> {
    for el in dom.query_all(None, CANDIDATES).await? {
        if matches_trigger(&dom.text(&el).await?) {
            return Ok(Some(el));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fake::FakeDom;

    #[test]
    fn trigger_phrases_match_case_insensitively() {
        assert!(matches_trigger("View All"));
        assert!(matches_trigger("See all 52 others"));
        assert!(matches_trigger("34 MEMBERS"));
        assert!(!matches_trigger("Settings"));
        assert!(!matches_trigger(""));
    }

    #[tokio::test]
    async fn first_match_in_document_order_wins() {
        let dom = FakeDom::new(
            r#"<span>Settings</span>
               <button id="first">View all</button>
               <button>See all</button>"#,
        );
        let control = find_control(&dom).await.unwrap().unwrap();
        assert_eq!(
            dom.attr(&control, "id").await.unwrap().as_deref(),
            Some("first")
        );
    }

    #[tokio::test]
    async fn absent_control_yields_none() {
        let dom = FakeDom::new("<div>Chat</div><span>Settings</span>");
        assert!(find_control(&dom).await.unwrap().is_none());
    }
}
