//! Validation, conflict detection and NGINX directive generation for
//! attached policies.
//!
//! Every supported policy kind is a variant of [`Policy`]. Validators and
//! generators match on it exhaustively, so a policy can never be handed to
//! the wrong kind's logic.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod authentication_filter;
pub mod generator;
pub mod merge;
mod policy;
pub mod proxy_settings;
pub mod rate_limit;
pub mod snippets;
mod validator;


pub use self::{
    generator::{Generate, Generators},
    merge::{mark_conflicts, Attachment, MergeOrder},
    policy::{Policy, PolicyKind, Role},
    validator::{GlobalSettings, Validate, Validator},
};
pub use nginx_policy_engine_core::{Condition, GeneratedFile, NginxContext};
