//! Decides which of the policies attached to one target take effect.

use crate::{GlobalSettings, Policy, Validate, Validator};
use nginx_policy_engine_core::Condition;
use std::cmp::Ordering;

/// The precedence used when two policies conflict.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MergeOrder {
    /// The oldest policy wins. Policies with a creation timestamp take
    /// precedence over those without one; ties are broken by
    /// `namespace/name`.
    #[default]
    CreationTimestamp,

    /// Policies take precedence in the order they were listed.
    Listed,
}

/// A policy and the conditions it was given at a target.
#[derive(Clone, Debug, PartialEq)]
pub struct Attachment {
    pub policy: Policy,
    pub conditions: Vec<Condition>,
}

// === impl Attachment ===

impl Attachment {
    /// An attachment without conditions is accepted.
    #[inline]
    pub fn is_accepted(&self) -> bool {
        self.conditions.is_empty()
    }

    /// The condition to report in the policy's status.
    pub fn status(&self) -> Condition {
        self.conditions
            .first()
            .cloned()
            .unwrap_or_else(Condition::accepted)
    }
}

/// Validates the policies attached to a single target and marks every policy
/// that conflicts with one of higher precedence.
///
/// Invalid policies are reported as such and never take part in conflict
/// detection. Attachments are returned in precedence order.
pub fn mark_conflicts(
    validator: &Validator,
    globals: &GlobalSettings,
    policies: impl IntoIterator<Item = Policy>,
    order: MergeOrder,
) -> Vec<Attachment> {
    let mut attachments = policies
        .into_iter()
        .map(|policy| {
            let mut conditions = validator.validate(&policy);
            if conditions.is_empty() {
                conditions = validator.validate_global_settings(&policy, globals);
            }
            Attachment { policy, conditions }
        })
        .collect::<Vec<_>>();

    if order == MergeOrder::CreationTimestamp {
        attachments.sort_by(|a, b| timestamp_then_name(&a.policy, &b.policy));
    }

    for i in 0..attachments.len() {
        if !attachments[i].is_accepted() {
            continue;
        }

        let (accepted, rest) = attachments.split_at_mut(i);
        let candidate = &mut rest[0];
        let winner = accepted
            .iter()
            .filter(|a| a.is_accepted())
            .find(|a| validator.conflicts(&a.policy, &candidate.policy));
        if let Some(winner) = winner {
            tracing::info!(policy = %candidate.policy, winner = %winner.policy, "Conflicted");
            candidate.conditions.push(Condition::policy_conflicted(format!(
                "Conflicts with {}",
                winner.policy
            )));
        }
    }

    attachments
}

fn timestamp_then_name(left: &Policy, right: &Policy) -> Ordering {
    let by_ts = match (&left.creation_timestamp(), &right.creation_timestamp()) {
        (Some(left_ts), Some(right_ts)) => left_ts.0.cmp(&right_ts.0),
        (None, None) => Ordering::Equal,
        // Policies with timestamps are preferred over policies without.
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
    };

    by_ts
        .then_with(|| left.namespace().cmp(&right.namespace()))
        .then_with(|| left.name().cmp(&right.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{gateway_ref, mk_proxy_settings, mk_rate_limit, mk_snippets, with_created};
    use nginx_policy_engine_core::ConditionReason;
    use nginx_policy_engine_k8s_api::{
        policy::{LocalRateLimit, ProxyBuffering, RateLimit, RateLimitRule},
        Size,
    };
    use pretty_assertions::assert_eq;

    fn buffer_size(name: &str, size: &str) -> Policy {
        mk_proxy_settings(
            "default",
            name,
            Some(ProxyBuffering {
                buffer_size: Some(Size::from(size)),
                ..ProxyBuffering::default()
            }),
        )
        .into()
    }

    fn summary(attachments: &[Attachment]) -> Vec<(String, Option<ConditionReason>)> {
        attachments
            .iter()
            .map(|a| (a.policy.name(), a.conditions.first().map(|c| c.reason)))
            .collect()
    }

    #[test]
    fn oldest_policy_wins() {
        let policies = vec![
            with_created(buffer_size("newer", "8k"), Some(20)),
            with_created(buffer_size("untimestamped", "8k"), None),
            with_created(buffer_size("older", "16k"), Some(10)),
        ];
        let attachments = mark_conflicts(
            &Validator::default(),
            &GlobalSettings::default(),
            policies,
            MergeOrder::CreationTimestamp,
        );

        assert_eq!(
            summary(&attachments),
            [
                ("older".to_string(), None),
                ("newer".to_string(), Some(ConditionReason::Conflicted)),
                ("untimestamped".to_string(), Some(ConditionReason::Conflicted)),
            ]
        );
        assert_eq!(
            attachments[1].status(),
            Condition::policy_conflicted("Conflicts with ProxySettingsPolicy default/older")
        );
        assert_eq!(attachments[0].status(), Condition::accepted());
    }

    #[test]
    fn ties_are_broken_by_name() {
        let policies = vec![
            with_created(buffer_size("b", "8k"), Some(10)),
            with_created(buffer_size("a", "8k"), Some(10)),
        ];
        let attachments = mark_conflicts(
            &Validator::default(),
            &GlobalSettings::default(),
            policies,
            MergeOrder::CreationTimestamp,
        );
        assert_eq!(
            summary(&attachments),
            [
                ("a".to_string(), None),
                ("b".to_string(), Some(ConditionReason::Conflicted)),
            ]
        );
    }

    #[test]
    fn listed_order_wins() {
        let policies = vec![
            with_created(buffer_size("newer", "8k"), Some(20)),
            with_created(buffer_size("older", "8k"), Some(10)),
        ];
        let attachments = mark_conflicts(
            &Validator::default(),
            &GlobalSettings::default(),
            policies,
            MergeOrder::Listed,
        );
        assert_eq!(
            summary(&attachments),
            [
                ("newer".to_string(), None),
                ("older".to_string(), Some(ConditionReason::Conflicted)),
            ]
        );
    }

    #[test]
    fn invalid_policies_do_not_conflict() {
        let policies = vec![
            buffer_size("invalid", "8x"),
            buffer_size("valid", "8k"),
        ];
        let attachments = mark_conflicts(
            &Validator::default(),
            &GlobalSettings::default(),
            policies,
            MergeOrder::Listed,
        );
        assert_eq!(
            summary(&attachments),
            [
                ("invalid".to_string(), Some(ConditionReason::Invalid)),
                ("valid".to_string(), None),
            ]
        );
    }

    #[test]
    fn disjoint_and_mixed_kinds_coexist() {
        let rate_limit = |name: &str| -> Policy {
            mk_rate_limit(
                "default",
                name,
                vec![gateway_ref("gw")],
                RateLimit {
                    local: Some(LocalRateLimit {
                        rules: vec![RateLimitRule::default()],
                    }),
                    dry_run: Some(true),
                    ..RateLimit::default()
                },
            )
            .into()
        };
        let policies = vec![
            buffer_size("psp", "8k"),
            rate_limit("rl-a"),
            mk_snippets("default", "sp-a", vec![gateway_ref("gw")], vec![]).into(),
            mk_snippets("default", "sp-b", vec![gateway_ref("gw")], vec![]).into(),
            rate_limit("rl-b"),
        ];
        let attachments = mark_conflicts(
            &Validator::default(),
            &GlobalSettings::default(),
            policies,
            MergeOrder::Listed,
        );
        let accepted = attachments
            .iter()
            .filter(|a| a.is_accepted())
            .map(|a| a.policy.name())
            .collect::<Vec<_>>();
        assert_eq!(accepted, ["psp", "rl-a", "sp-a", "sp-b"]);
    }
}
