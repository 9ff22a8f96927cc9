#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod policy;
mod size;

pub use self::size::{Rate, Size};
pub use k8s_gateway_api::ParentReference;
pub use k8s_openapi::{
    api::core::v1::{ConfigMap, Secret},
    apimachinery::pkg::apis::meta::v1::{Condition, Time},
    ByteString,
};
pub use kube::core::{ObjectMeta, Resource, ResourceExt};
