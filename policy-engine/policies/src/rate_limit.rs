//! RateLimitPolicy: `limit_req_zone` declarations and `limit_req` limits.
//!
//! Zones must be declared in the http context, but limits may be applied
//! per route. A Gateway-targeted policy renders both into the http context.
//! A route-targeted policy renders its limits into locations and relies on a
//! [`Role::ZoneShadow`] copy to declare its zones in the http context.

use crate::{validator::validate_target_ref, Generate, Policy, Role, Validate, Validator};
use nginx_policy_engine_core::{
    validation, Condition, FieldError, FieldErrors, FieldPath, GeneratedFile,
};
use nginx_policy_engine_k8s_api::{
    policy::{RateLimit, RateLimitPolicy, RateLimitPolicySpec, RateLimitRule, TargetKind},
    ResourceExt,
};

pub const DEFAULT_ZONE_SIZE: &str = "10m";
pub const DEFAULT_RATE: &str = "100r/s";
pub const DEFAULT_KEY: &str = "$binary_remote_addr";

const SUPPORTED_TARGETS: &[TargetKind] = &[
    TargetKind::Gateway,
    TargetKind::HttpRoute,
    TargetKind::GrpcRoute,
];

#[derive(Copy, Clone, Debug, Default)]
pub struct Generator(());

/// The NGINX block a file is rendered for. Also names the file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Block {
    Gateway,
    Route,
}

impl Validate<RateLimitPolicy> for Validator {
    fn validate(&self, policy: &RateLimitPolicy) -> Vec<Condition> {
        match validate_spec(&policy.spec).into_result() {
            Ok(()) => Vec::new(),
            Err(errors) => vec![Condition::policy_invalid(errors.to_string())],
        }
    }

    fn conflicts(&self, a: &RateLimitPolicy, b: &RateLimitPolicy) -> bool {
        let (Some(a), Some(b)) = (&a.spec.rate_limit, &b.spec.rate_limit) else {
            return false;
        };
        (a.dry_run.is_some() && b.dry_run.is_some())
            || (a.log_level.is_some() && b.log_level.is_some())
            || (a.reject_code.is_some() && b.reject_code.is_some())
    }
}

fn validate_spec(spec: &RateLimitPolicySpec) -> FieldErrors {
    let mut errors = FieldErrors::default();
    let path = FieldPath::new("spec");

    let refs = path.child("targetRefs");
    for (i, target_ref) in spec.target_refs.iter().enumerate() {
        if let Err(error) = validate_target_ref(refs.index(i), target_ref, SUPPORTED_TARGETS) {
            errors.push(error);
        }
    }

    let Some(local) = spec.rate_limit.as_ref().and_then(|rl| rl.local.as_ref()) else {
        return errors;
    };
    let rules = path.child("rateLimit").child("local").child("rules");
    for (i, rule) in local.rules.iter().enumerate() {
        let path = rules.index(i);

        if let Some(size) = &rule.zone_size {
            if let Err(error) = validation::validate_nginx_size(size.as_str()) {
                errors.push(FieldError::invalid(path.child("zoneSize"), size.as_str(), error));
            }
        }

        if let Some(rate) = rule.rate.as_ref().filter(|r| !r.is_empty()) {
            if let Err(error) = validation::validate_rate(rate.as_str()) {
                errors.push(FieldError::invalid(path.child("rate"), rate.as_str(), error));
            }
        }

        if let Some(key) = rule.key.as_deref().filter(|k| !k.is_empty()) {
            if let Err(error) = validation::validate_limit_req_key(key) {
                errors.push(FieldError::invalid(path.child("key"), key, error));
            }
        }
    }

    errors
}

// === impl Generator ===

impl Generator {
    fn generate(&self, policies: &[Policy], block: Block) -> Vec<GeneratedFile> {
        policies
            .iter()
            .filter_map(|policy| match policy {
                Policy::RateLimit { policy, role } => render(policy, *role, block),
                _ => None,
            })
            .collect()
    }
}

impl Generate for Generator {
    fn generate_for_http(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generate(policies, Block::Gateway)
    }

    fn generate_for_location(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generate(policies, Block::Route)
    }
}

struct Zone<'r> {
    name: String,
    rule: &'r RateLimitRule,
}

fn render(policy: &RateLimitPolicy, role: Role, block: Block) -> Option<GeneratedFile> {
    let ns = policy.namespace().unwrap_or_default();
    let name = policy.name_any();

    let zones = policy
        .spec
        .rate_limit
        .iter()
        .flat_map(|rl| rl.local.iter())
        .flat_map(|local| local.rules.iter())
        .enumerate()
        .map(|(i, rule)| Zone {
            name: format!("{ns}_rl_{name}_rule{i}"),
            rule,
        })
        .collect::<Vec<_>>();

    let mut directives = Vec::new();
    let file = match (block, role) {
        (Block::Gateway, Role::ZoneShadow) => {
            directives.extend(zones.iter().map(limit_req_zone));
            format!("RateLimitPolicy_{ns}_{name}_internal_http.conf")
        }
        (Block::Gateway, Role::UserDefined) => {
            for zone in &zones {
                directives.push(limit_req_zone(zone));
                directives.push(limit_req(zone));
            }
            directives.extend(settings(policy.spec.rate_limit.as_ref()));
            format!("RateLimitPolicy_{ns}_{name}_gateway.conf")
        }
        (Block::Route, Role::UserDefined) => {
            directives.extend(zones.iter().map(limit_req));
            directives.extend(settings(policy.spec.rate_limit.as_ref()));
            format!("RateLimitPolicy_{ns}_{name}_route.conf")
        }
        // Shadows only exist to declare zones in the http context.
        (Block::Route, Role::ZoneShadow) => return None,
    };

    tracing::debug!(name = %file, ?role, "Generated");
    Some(GeneratedFile::new(file, crate::generator::lines(directives)))
}

fn limit_req_zone(zone: &Zone<'_>) -> String {
    let size = zone
        .rule
        .zone_size
        .as_ref()
        .map_or(DEFAULT_ZONE_SIZE, |s| s.as_str());
    let rate = zone
        .rule
        .rate
        .as_ref()
        .filter(|r| !r.is_empty())
        .map_or(DEFAULT_RATE, |r| r.as_str());
    let key = zone
        .rule
        .key
        .as_deref()
        .filter(|k| !k.is_empty())
        .unwrap_or(DEFAULT_KEY);
    format!("limit_req_zone {key} zone={}:{size} rate={rate};", zone.name)
}

fn limit_req(zone: &Zone<'_>) -> String {
    let mut directive = format!("limit_req zone={}", zone.name);
    if let Some(burst) = zone.rule.burst.filter(|b| *b != 0) {
        directive.push_str(&format!(" burst={burst}"));
    }
    if zone.rule.no_delay == Some(true) {
        directive.push_str(" nodelay");
    }
    if let Some(delay) = zone.rule.delay.filter(|d| *d != 0) {
        directive.push_str(&format!(" delay={delay}"));
    }
    directive.push(';');
    directive
}

fn settings(rate_limit: Option<&RateLimit>) -> Vec<String> {
    let Some(rl) = rate_limit else {
        return Vec::new();
    };

    let mut directives = Vec::new();
    if let Some(level) = rl.log_level {
        directives.push(format!("limit_req_log_level {level};"));
    }
    if let Some(code) = rl.reject_code.filter(|c| *c != 0) {
        directives.push(format!("limit_req_status {code};"));
    }
    if rl.dry_run == Some(true) {
        directives.push("limit_req_dry_run on;".to_string());
    }
    directives
}
