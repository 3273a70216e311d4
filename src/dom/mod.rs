//! Page capability interface.
//!
//! The extraction worker never touches a browser directly; it talks to a
//! [`Dom`] implementation. The live backend drives a Chrome page over CDP
//! ([`cdp`]), the test backend replays scripted HTML snapshots ([`fake`]).
//! Keeping the page behind this seam is what makes the heuristics and the
//! timed observation loop deterministic under test.

pub mod cdp;
pub mod fake;
pub mod wait;

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::watch;

/// Opaque handle to an element inside a backend's current document.
///
/// Handles are only meaningful to the backend that issued them and may go
/// stale when the page re-renders; stale handles resolve to
/// [`Error::StaleNode`](crate::error::Error::StaleNode).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u64);

/// Capability interface over one loaded page.
///
/// `query`/`query_all` take an optional scope node; `None` means the whole
/// document. Selector strings are standard CSS, including comma-separated
/// unions evaluated in document order.
#[async_trait]
pub trait Dom: Send + Sync {
    /// First element matching `selector`, in document order.
    async fn query(&self, scope: Option<&NodeId>, selector: &str) -> Result<Option<NodeId>>;

    /// All elements matching `selector`, in document order.
    async fn query_all(&self, scope: Option<&NodeId>, selector: &str) -> Result<Vec<NodeId>>;

    /// Trimmed text content of the element (empty string when none).
    async fn text(&self, node: &NodeId) -> Result<String>;

    /// Attribute value, if present.
    async fn attr(&self, node: &NodeId, name: &str) -> Result<Option<String>>;

    /// Activate the element (a click).
    async fn click(&self, node: &NodeId) -> Result<()>;

    /// Subscribe to subtree mutations under `scope` (`None` = whole
    /// document). The receiver observes a generation counter that bumps on
    /// every mutation batch; the payload carries no delta, subscribers are
    /// expected to re-scan.
    async fn observe(&self, scope: Option<&NodeId>) -> Result<watch::Receiver<u64>>;

    /// Show a notice to the human operator (the scroll prompt).
    ///
    /// Implementations surface the message prominently but must return
    /// without waiting for it to be dismissed; the observation window
    /// starts immediately after.
    async fn notify_operator(&self, message: &str) -> Result<()>;
}
