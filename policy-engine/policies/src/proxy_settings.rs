//! ProxySettingsPolicy: `proxy_buffering` and related buffer directives.

use crate::{validator::validate_target_ref, Generate, Policy, Validate, Validator};
use nginx_policy_engine_core::{
    validation, Condition, FieldError, FieldErrors, FieldPath, GeneratedFile,
};
use nginx_policy_engine_k8s_api::{
    policy::{ProxyBuffering, ProxySettingsPolicy, ProxySettingsPolicySpec, TargetKind},
    ResourceExt,
};

const SUPPORTED_TARGETS: &[TargetKind] = &[
    TargetKind::Gateway,
    TargetKind::HttpRoute,
    TargetKind::GrpcRoute,
];

/// Renders ProxySettingsPolicies into http, location and internal location
/// blocks.
#[derive(Copy, Clone, Debug, Default)]
pub struct Generator(());

impl Validate<ProxySettingsPolicy> for Validator {
    fn validate(&self, policy: &ProxySettingsPolicy) -> Vec<Condition> {
        match validate_spec(&policy.spec).into_result() {
            Ok(()) => Vec::new(),
            Err(errors) => vec![Condition::policy_invalid(errors.to_string())],
        }
    }

    fn conflicts(&self, a: &ProxySettingsPolicy, b: &ProxySettingsPolicy) -> bool {
        let (Some(a), Some(b)) = (&a.spec.buffering, &b.spec.buffering) else {
            return false;
        };
        (a.disable.is_some() && b.disable.is_some())
            || (a.buffer_size.is_some() && b.buffer_size.is_some())
            || (a.buffers.is_some() && b.buffers.is_some())
            || (a.busy_buffers_size.is_some() && b.busy_buffers_size.is_some())
    }
}

fn validate_spec(spec: &ProxySettingsPolicySpec) -> FieldErrors {
    let mut errors = FieldErrors::default();
    let path = FieldPath::new("spec");

    let refs = path.child("targetRefs");
    for (i, target_ref) in spec.target_refs.iter().enumerate() {
        if let Err(error) = validate_target_ref(refs.index(i), target_ref, SUPPORTED_TARGETS) {
            errors.push(error);
        }
    }

    if let Some(buffering) = &spec.buffering {
        let path = path.child("buffering");
        validate_sizes(buffering, &path, &mut errors);
        validate_busy_buffers_size(buffering, &path, &mut errors);
    }

    errors
}

fn validate_sizes(buffering: &ProxyBuffering, path: &FieldPath, errors: &mut FieldErrors) {
    let sizes = [
        (path.child("bufferSize"), buffering.buffer_size.as_ref()),
        (
            path.child("buffers").child("size"),
            buffering.buffers.as_ref().map(|b| &b.size),
        ),
        (
            path.child("busyBuffersSize"),
            buffering.busy_buffers_size.as_ref(),
        ),
    ];
    for (path, size) in sizes {
        let Some(size) = size else { continue };
        if let Err(error) = validation::validate_nginx_size(size.as_str()) {
            errors.push(FieldError::invalid(path, size.as_str(), error));
        }
    }
}

/// NGINX refuses to start unless `proxy_busy_buffers_size` is larger than
/// `proxy_buffer_size` and smaller than all `proxy_buffers` minus one. The
/// CRD schema can't compare sizes with units, so it's checked here. Sizes
/// that don't parse are reported by [`validate_sizes`] and skipped.
fn validate_busy_buffers_size(
    buffering: &ProxyBuffering,
    path: &FieldPath,
    errors: &mut FieldErrors,
) {
    let Some(busy) = &buffering.busy_buffers_size else {
        return;
    };
    let Ok(busy_bytes) = busy.bytes() else {
        return;
    };
    let path = path.child("busyBuffersSize");

    if let Some(Ok(buffer_size)) = buffering.buffer_size.as_ref().map(|s| s.bytes()) {
        if busy_bytes <= buffer_size {
            errors.push(FieldError::invalid(
                path.clone(),
                busy.as_str(),
                "must be larger than bufferSize",
            ));
        }
    }

    if let Some(buffers) = &buffering.buffers {
        if let Ok(size) = buffers.size.bytes() {
            let max = size
                .saturating_mul(i64::from(buffers.number))
                .saturating_sub(size);
            if busy_bytes >= max {
                errors.push(FieldError::invalid(
                    path,
                    busy.as_str(),
                    "must be less than the size of all proxy_buffers minus one buffer",
                ));
            }
        }
    }
}

// === impl Generator ===

impl Generator {
    fn generate(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        policies
            .iter()
            .filter_map(|policy| match policy {
                Policy::ProxySettings(p) => Some(render(p)),
                _ => None,
            })
            .collect()
    }
}

impl Generate for Generator {
    fn generate_for_http(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generate(policies)
    }

    fn generate_for_location(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generate(policies)
    }

    fn generate_for_internal_location(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generate(policies)
    }
}

fn render(policy: &ProxySettingsPolicy) -> GeneratedFile {
    let mut directives = Vec::new();
    if let Some(buffering) = &policy.spec.buffering {
        if let Some(disable) = buffering.disable {
            let value = if disable { "off" } else { "on" };
            directives.push(format!("proxy_buffering {value};"));
        }
        if let Some(size) = &buffering.buffer_size {
            directives.push(format!("proxy_buffer_size {size};"));
        }
        if let Some(buffers) = &buffering.buffers {
            directives.push(format!("proxy_buffers {} {};", buffers.number, buffers.size));
        }
        if let Some(size) = &buffering.busy_buffers_size {
            directives.push(format!("proxy_busy_buffers_size {size};"));
        }
    }

    let name = format!(
        "ProxySettingsPolicy_{}_{}.conf",
        policy.namespace().unwrap_or_default(),
        policy.name_any()
    );
    tracing::debug!(%name, "Generated");
    GeneratedFile::new(name, crate::generator::lines(directives))
}
