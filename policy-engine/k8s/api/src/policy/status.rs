use k8s_gateway_api::ParentReference;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition, Time};

/// The status shared by all attached policies: one entry per ancestor
/// (Gateway) the policy affects, per controller.
#[derive(
    Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatus {
    #[serde(default)]
    pub ancestors: Vec<PolicyAncestorStatus>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyAncestorStatus {
    pub ancestor_ref: ParentReference,
    pub controller_name: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

// === impl PolicyAncestorStatus ===

impl PolicyAncestorStatus {
    /// Reports `conditions` for one ancestor, stamped with the policy's
    /// generation and the time they were computed.
    pub fn new<'c>(
        ancestor_ref: ParentReference,
        controller_name: impl ToString,
        conditions: impl IntoIterator<Item = &'c nginx_policy_engine_core::Condition>,
        observed_generation: Option<i64>,
        transition_time: Time,
    ) -> Self {
        let conditions = conditions
            .into_iter()
            .map(|c| Condition {
                type_: c.type_.as_str().to_string(),
                status: c.status.as_str().to_string(),
                reason: c.reason.as_str().to_string(),
                message: c.message.clone(),
                observed_generation,
                last_transition_time: transition_time.clone(),
            })
            .collect();
        Self {
            ancestor_ref,
            controller_name: controller_name.to_string(),
            conditions,
        }
    }
}
