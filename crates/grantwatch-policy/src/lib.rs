//! Grantwatch alert decisions
//!
//! Decides whether a Common Fate audit event touching a watched AWS Identity
//! Center permission set should raise an alert:
//!
//! - `grant.activated` on the permission set raises a breakglass alert
//! - `grant.requested` on the permission set raises a review alert while the
//!   grant is still pending, which needs a grants service lookup
//!
//! Dispatching the resulting [`AlertDecision`] is left to the caller.

pub mod decision;
pub mod error;
pub mod grants;
pub mod matcher;
pub mod pipeline;

pub use decision::{AlertDecision, GrantLookup, PendingReviewAlert, Verdict, decide};
pub use error::{AlertError, GrantsError};
pub use grants::{GrantStatus, GrantStatusResolver, GrantsClient};
pub use matcher::{TargetMatch, match_targets};
pub use pipeline::AlertPipeline;
