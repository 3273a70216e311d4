//! roster-scrape — extract a chat group's member roster from a live page
//! DOM and export it as CSV.
//!
//! The page is reached through the [`dom::Dom`] capability trait: the CLI
//! wires in the CDP-backed live implementation, tests wire in a scripted
//! fake, and the extraction pipeline in [`extract`] cannot tell the
//! difference. Timing (element waits, the fixed observation window) runs on
//! tokio's clock, so tests execute the 30-second protocol instantly under
//! paused time.

pub mod config;
pub mod dom;
pub mod error;
pub mod export;
pub mod extract;
pub mod relay;

pub use config::Config;
pub use error::{Error, Result};
pub use extract::extract_group_members;
pub use extract::types::{ExtractionResult, MemberRecord};
pub use relay::{Command, Relay, Response};
