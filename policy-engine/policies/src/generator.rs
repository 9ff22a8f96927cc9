use crate::{proxy_settings, rate_limit, snippets, Policy};
use nginx_policy_engine_core::{GeneratedFile, NginxContext};

/// Renders policies into NGINX configuration fragments, one entry point per
/// NGINX context.
///
/// Each method receives every policy that applies at that point in the
/// configuration; generators only render the kinds they own. Contexts a
/// generator doesn't support produce no files.
pub trait Generate {
    fn generate_for_main(&self, _policies: &[Policy]) -> Vec<GeneratedFile> {
        Vec::new()
    }

    fn generate_for_http(&self, _policies: &[Policy]) -> Vec<GeneratedFile> {
        Vec::new()
    }

    fn generate_for_server(&self, _policies: &[Policy]) -> Vec<GeneratedFile> {
        Vec::new()
    }

    fn generate_for_location(&self, _policies: &[Policy]) -> Vec<GeneratedFile> {
        Vec::new()
    }

    fn generate_for_internal_location(&self, _policies: &[Policy]) -> Vec<GeneratedFile> {
        Vec::new()
    }

    fn generate(&self, context: NginxContext, policies: &[Policy]) -> Vec<GeneratedFile> {
        match context {
            NginxContext::Main => self.generate_for_main(policies),
            NginxContext::Http => self.generate_for_http(policies),
            NginxContext::Server => self.generate_for_server(policies),
            NginxContext::Location => self.generate_for_location(policies),
            NginxContext::InternalLocation => self.generate_for_internal_location(policies),
        }
    }
}

/// Fans a list of policies out to the generators of every policy kind.
pub struct Generators {
    generators: Vec<Box<dyn Generate + Send + Sync>>,
}

// === impl Generators ===

impl Default for Generators {
    fn default() -> Self {
        let generators: Vec<Box<dyn Generate + Send + Sync>> = vec![
            Box::new(proxy_settings::Generator::default()),
            Box::new(rate_limit::Generator::default()),
            Box::new(snippets::Generator::default()),
        ];
        Self { generators }
    }
}

impl std::fmt::Debug for Generators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generators")
            .field("generators", &self.generators.len())
            .finish()
    }
}

impl Generate for Generators {
    fn generate(&self, context: NginxContext, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generators
            .iter()
            .flat_map(|g| g.generate(context, policies))
            .collect()
    }

    fn generate_for_main(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generate(NginxContext::Main, policies)
    }

    fn generate_for_http(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generate(NginxContext::Http, policies)
    }

    fn generate_for_server(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generate(NginxContext::Server, policies)
    }

    fn generate_for_location(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generate(NginxContext::Location, policies)
    }

    fn generate_for_internal_location(&self, policies: &[Policy]) -> Vec<GeneratedFile> {
        self.generate(NginxContext::InternalLocation, policies)
    }
}

/// Joins directives into file content, one per line.
pub(crate) fn lines(directives: impl IntoIterator<Item = String>) -> String {
    directives.into_iter().fold(String::new(), |mut out, line| {
        out.push_str(&line);
        out.push('\n');
        out
    })
}
