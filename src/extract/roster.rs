//! Incremental roster collection over a fixed observation window.

use crate::dom::{Dom, NodeId};
use crate::error::Result;
use crate::extract::row::{extract_row, ROW_SELECTOR};
use crate::extract::types::MemberRecord;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

/// Collect member rows from `container` for exactly `window`.
///
/// The page renders rows lazily while the operator scrolls, so this prompts
/// the operator, then re-scans the whole container on every mutation batch:
/// diffing against re-renders is not worth it at group-roster sizes, and a
/// full scan is immune to the page reordering rows. New identities append in
/// first-seen order. The loop stops at the window deadline no matter how
/// busy the mutation stream is.
pub async fn observe_roster(
    dom: &dyn Dom,
    container: &NodeId,
    window: Duration,
) -> Result<Vec<MemberRecord>> {
    dom.notify_operator(&format!(
        "Please scroll to the bottom of the member list to load all members. \
         Extraction will run for {} seconds.",
        window.as_secs()
    ))
    .await?;

    let mut mutations = dom.observe(Some(container)).await?;
    let mut seen = HashSet::new();
    let mut members = Vec::new();

    let deadline = tokio::time::sleep(window);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = mutations.changed() => {
                // Mutation source gone: no further rows can appear.
                if changed.is_err() {
                    break;
                }
                scan(dom, container, &mut seen, &mut members).await?;
            }
        }
    }

    info!(count = members.len(), "observation window closed");
    Ok(members)
}

/// Re-scan the entire container and append records with new identities.
async fn scan(
    dom: &dyn Dom,
    container: &NodeId,
    seen: &mut HashSet<String>,
    members: &mut Vec<MemberRecord>,
) -> Result<()> {
    let rows = dom.query_all(Some(container), ROW_SELECTOR).await?;
    debug!(rows = rows.len(), "rescanning container");
    for row in &rows {
        if let Some(record) = extract_row(dom, row, seen).await? {
            members.push(record);
        }
    }
    Ok(())
}
