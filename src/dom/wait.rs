//! Element wait primitive.

use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

/// Resolve the first element matching `selector`, waiting up to `timeout`.
///
/// Checks the document immediately; if nothing matches, re-checks on every
/// mutation batch until the deadline. One outstanding wait per call — the
/// extraction procedure only ever waits sequentially.
pub async fn wait_for(
    dom: &dyn Dom,
    scope: Option<&NodeId>,
    selector: &str,
    timeout: Duration,
) -> Result<NodeId> {
    if let Some(node) = dom.query(scope, selector).await? {
        return Ok(node);
    }

    let deadline = Instant::now() + timeout;
    let mut mutations = dom.observe(scope).await?;

    // The element may have rendered between the initial miss and the
    // subscription being installed (the live backend does both as separate
    // round-trips); re-check once before waiting on mutations.
    if let Some(node) = dom.query(scope, selector).await? {
        return Ok(node);
    }

    loop {
        match timeout_at(deadline, mutations.changed()).await {
            Err(_) => {
                debug!(selector, "wait deadline elapsed");
                return Err(Error::WaitTimeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            // Mutation source gone: nothing further can appear, so treat it
            // like a timeout rather than hanging until the deadline.
            Ok(Err(_)) => {
                return Err(Error::WaitTimeout {
                    selector: selector.to_string(),
                    timeout,
                })
            }
            Ok(Ok(())) => {
                if let Some(node) = dom.query(scope, selector).await? {
                    return Ok(node);
                }
            }
        }
    }
}
