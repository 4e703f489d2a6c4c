//! # grantwatch-audit
//!
//! Typed model of Common Fate audit log events and a strict decoder for
//! webhook payloads.
//!
//! ## Decoding
//!
//! - `action`, `occurred_at` and `actor` are required
//! - unknown fields are ignored
//! - unknown actions decode to [`Action::Unknown`]
//!
//! ## Example Usage
//!
//! ```rust
//! use grantwatch_audit::{decode, Action};
//!
//! let body = br#"{
//!     "action": "grant.activated",
//!     "actor": {"type": "CF::User", "id": "usr_1"},
//!     "targets": [{"type": "AWS::IDC::PermissionSet", "id": "ps-1"}],
//!     "occurred_at": "2024-03-01T10:15:30Z"
//! }"#;
//!
//! let log = decode(body).unwrap();
//! assert_eq!(log.action, Action::GrantActivated);
//! ```

pub mod decoder;
pub mod error;
pub mod event;

pub use decoder::decode;
pub use error::DecodeError;
pub use event::{
    Action, Actor, AuditLog, AuthzContext, Context, Entity, IdentityLink, Justification,
    Principal, ProxySessionContext, RequestContext, entity_types,
};
