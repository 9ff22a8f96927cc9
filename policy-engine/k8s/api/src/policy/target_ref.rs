use std::fmt;

pub const GATEWAY_API_GROUP: &str = "gateway.networking.k8s.io";

/// Identifies a Gateway API resource in the policy's own namespace.
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    PartialOrd,
    Ord,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
)]
pub struct LocalPolicyTargetReference {
    #[serde(default)]
    pub group: String,
    pub kind: String,
    pub name: String,
}

/// The resource kinds a policy may attach to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TargetKind {
    Gateway,
    HttpRoute,
    GrpcRoute,
}

// === impl LocalPolicyTargetReference ===

impl LocalPolicyTargetReference {
    pub fn new(kind: TargetKind, name: impl ToString) -> Self {
        Self {
            group: GATEWAY_API_GROUP.to_string(),
            kind: kind.as_str().to_string(),
            name: name.to_string(),
        }
    }

    /// Checks whether the target references the given resource type
    pub fn targets_kind<T>(&self) -> bool
    where
        T: kube::Resource,
        T::DynamicType: Default,
    {
        let dt = Default::default();

        let mut group = &*T::group(&dt);
        if group.is_empty() {
            group = "core";
        }

        let ref_group = match self.group.as_str() {
            "" => "core",
            g => g,
        };
        ref_group == group && *self.kind == *T::kind(&dt)
    }

    /// Returns the kind of the referenced resource, if it's one policies can
    /// attach to.
    pub fn target_kind(&self) -> Option<TargetKind> {
        if self.targets_kind::<k8s_gateway_api::Gateway>() {
            Some(TargetKind::Gateway)
        } else if self.targets_kind::<k8s_gateway_api::HttpRoute>() {
            Some(TargetKind::HttpRoute)
        } else if self.targets_kind::<k8s_gateway_api::GrpcRoute>() {
            Some(TargetKind::GrpcRoute)
        } else {
            None
        }
    }

    #[inline]
    pub fn targets_route(&self) -> bool {
        matches!(
            self.target_kind(),
            Some(TargetKind::HttpRoute | TargetKind::GrpcRoute)
        )
    }
}

// === impl TargetKind ===

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gateway => "Gateway",
            Self::HttpRoute => "HTTPRoute",
            Self::GrpcRoute => "GRPCRoute",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_api_kinds() {
        for kind in [
            TargetKind::Gateway,
            TargetKind::HttpRoute,
            TargetKind::GrpcRoute,
        ] {
            let tgt = LocalPolicyTargetReference::new(kind, "web");
            assert_eq!(tgt.target_kind(), Some(kind), "{tgt:?}");
        }

        let gw = LocalPolicyTargetReference::new(TargetKind::Gateway, "gw");
        assert!(gw.targets_kind::<k8s_gateway_api::Gateway>());
        assert!(!gw.targets_kind::<k8s_gateway_api::HttpRoute>());
        assert!(!gw.targets_route());

        let route = LocalPolicyTargetReference::new(TargetKind::GrpcRoute, "grpc");
        assert!(route.targets_route());
    }

    #[test]
    fn other_groups_and_kinds() {
        let svc = LocalPolicyTargetReference {
            group: String::new(),
            kind: "Service".to_string(),
            name: "web".to_string(),
        };
        assert_eq!(svc.target_kind(), None);
        assert!(svc.targets_kind::<k8s_openapi::api::core::v1::Service>());

        let wrong_group = LocalPolicyTargetReference {
            group: "example.com".to_string(),
            kind: "Gateway".to_string(),
            name: "gw".to_string(),
        };
        assert_eq!(wrong_group.target_kind(), None);
    }
}
