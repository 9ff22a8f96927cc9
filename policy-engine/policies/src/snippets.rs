//! SnippetsPolicy: raw NGINX configuration inserted into Gateway contexts.

use crate::{validator::validate_target_ref, Generate, Policy, Validate, Validator};
use nginx_policy_engine_core::{Condition, FieldPath, GeneratedFile};
use nginx_policy_engine_k8s_api::{
    policy::{SnippetContext, SnippetsPolicy, TargetKind},
    ResourceExt,
};
use std::collections::HashSet;

#[derive(Copy, Clone, Debug, Default)]
pub struct Generator(());

impl Validate<SnippetsPolicy> for Validator {
    /// Stops at the first problem found.
    fn validate(&self, policy: &SnippetsPolicy) -> Vec<Condition> {
        match validate(policy) {
            Ok(()) => Vec::new(),
            Err(message) => vec![Condition::policy_invalid(message)],
        }
    }

    /// Snippets are applied together in order, so they never conflict. A
    /// snippet that clashes with another is caught when NGINX loads the
    /// configuration.
    fn conflicts(&self, _: &SnippetsPolicy, _: &SnippetsPolicy) -> bool {
        false
    }
}

fn validate(policy: &SnippetsPolicy) -> Result<(), String> {
    let refs = FieldPath::new("spec").child("targetRefs");
    let mut names = HashSet::new();
    for (i, target_ref) in policy.spec.target_refs.iter().enumerate() {
        validate_target_ref(refs.index(i), target_ref, &[TargetKind::Gateway])
            .map_err(|e| e.to_string())?;
        if !names.insert(&target_ref.name) {
            return Err(format!("duplicate targetRef name {:?}", target_ref.name));
        }
    }

    let mut contexts = HashSet::new();
    for snippet in &policy.spec.snippets {
        if !contexts.insert(snippet.context) {
            return Err(format!("duplicate context {:?}", snippet.context.as_str()));
        }
    }

    Ok(())
}

// === impl Generator ===

impl Generator {
    fn generate(&self, policies: &[Policy], context: SnippetContext) -> Vec<GeneratedFile> {
        let mut files = Vec::new();
        for policy in policies {
            let Policy::Snippets(sp) = policy else {
                continue;
            };
            let ns = sp.namespace().unwrap_or_default();
            let name = sp.name_any();
            let block = block_name(context);

            for snippet in sp.spec.snippets.iter().filter(|s| s.context == context) {
                let file = format!("SnippetsPolicy_{ns}_{name}_{block}.conf");
                tracing::debug!(name = %file, "Generated");
                files.push(GeneratedFile::new(
                    file,
                    format!("\n# SnippetsPolicy {ns}/{name} {block} context\n{}\n", snippet.value),
                ));
            }
        }
        files
    }
}

impl Generate for Generator {
    fn generate_for_main(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generate(policies, SnippetContext::Main)
    }

    fn generate_for_http(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generate(policies, SnippetContext::Http)
    }

    fn generate_for_server(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generate(policies, SnippetContext::HttpServer)
    }

    fn generate_for_location(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generate(policies, SnippetContext::HttpServerLocation)
    }

    fn generate_for_internal_location(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generate(policies, SnippetContext::HttpServerLocation)
    }
}

fn block_name(context: SnippetContext) -> &'static str {
    match context {
        SnippetContext::Main => "main",
        SnippetContext::Http => "http",
        SnippetContext::HttpServer => "server",
        SnippetContext::HttpServerLocation => "location",
    }
}
