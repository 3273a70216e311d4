//! Extraction worker.
//!
//! Top-level procedure: locate the group-info panel, resolve the group name,
//! activate the disclosure control, wait for the roster dialog, then observe
//! the member container for the configured window. The steps are strictly
//! sequential; there is no reentrancy guard and no cancellation beyond the
//! compiled-in timeouts.

pub mod disclosure;
pub mod group_name;
pub mod roster;
pub mod row;
pub mod types;

use crate::config::Config;
use crate::dom::wait::wait_for;
use crate::dom::{Dom, NodeId};
use crate::error::Result;
use crate::extract::types::{ExtractionResult, ERROR_GROUP};
use tracing::{debug, info, warn};

/// Union of known shapes of the group-info panel.
pub const PANEL_SELECTOR: &str = concat!(
    r#"div[aria-label*="Group info"], "#,
    r#"div[aria-label*="group info"], "#,
    r#"header[aria-label*="Group"], "#,
    r#"header[aria-label*="group"], "#,
    r#"div[data-testid="conversation-info-header"]"#
);

/// The roster dialog that opens after the disclosure control is clicked.
pub const DIALOG_SELECTOR: &str = r#"div[role="dialog"], div[aria-modal="true"]"#;

const CONTAINER_SELECTOR: &str =
    r#"div[role="list"], div.x1y332i5, div[aria-label*="members" i]"#;

/// A div qualifies as the fallback container when it holds list items.
const CONTAINER_PROBE: &str = r#"div[role="listitem"], div.x1016tqk"#;

/// Run one extraction. Never fails: every error degrades to a result tagged
/// with the sentinel group name and an empty member list.
pub async fn extract_group_members(dom: &dyn Dom, config: &Config) -> ExtractionResult {
    match run(dom, config).await {
        Ok(result) => result,
        Err(e) => {
            warn!("extraction failed: {e}");
            ExtractionResult::empty(ERROR_GROUP)
        }
    }
}

async fn run(dom: &dyn Dom, config: &Config) -> Result<ExtractionResult> {
    info!("starting extraction");

    let panel = wait_for(dom, None, PANEL_SELECTOR, config.panel_timeout).await?;
    let group_name = group_name::resolve(dom, &panel).await?;
    info!(group = %group_name, "resolved group name");

    let Some(control) = disclosure::find_control(dom).await? else {
        warn!("no disclosure control found");
        return Ok(ExtractionResult::empty(group_name));
    };
    dom.click(&control).await?;

    let dialog = wait_for(dom, None, DIALOG_SELECTOR, config.dialog_timeout).await?;
    let Some(container) = locate_container(dom, &dialog).await? else {
        warn!("member list container not found");
        return Ok(ExtractionResult::empty(group_name));
    };

    let members = roster::observe_roster(dom, &container, config.observe_window).await?;
    info!(count = members.len(), "extraction finished");
    Ok(ExtractionResult {
        group_name,
        members,
    })
}

/// The known container selectors first; failing that, probe every dialog div
/// for one that already holds list items.
async fn locate_container(dom: &dyn Dom, dialog: &NodeId) -> Result<Option<NodeId>> {
    if let Some(container) = dom.query(Some(dialog), CONTAINER_SELECTOR).await? {
        return Ok(Some(container));
    }
    debug!("primary container selector missed, probing dialog divs");
    for div in dom.query_all(Some(dialog), "div").await? {
        if dom.query(Some(&div), CONTAINER_PROBE).await?.is_some() {
            return Ok(Some(div));
        }
    }
    Ok(None)
}
