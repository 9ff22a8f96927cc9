#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use nginx_policy_engine_core as core;
pub use nginx_policy_engine_k8s_api as k8s;
pub use nginx_policy_engine_k8s_resolver as resolver;
pub use nginx_policy_engine_policies as policies;

mod args;
mod log;
mod manifest;
mod render;

pub use self::{
    args::{Args, LogFormat},
    manifest::Manifests,
    render::{Render, Rendered, Target},
};
