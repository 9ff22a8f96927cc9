use crate::{Validate, Validator};
use nginx_policy_engine_core::{validation, Condition, FieldError, FieldErrors, FieldPath};
use nginx_policy_engine_k8s_api::{
    policy::{AuthType, AuthenticationFilter},
    ResourceExt,
};
use nginx_policy_engine_k8s_resolver::{NamespacedName, ResourceType};

const REALM_EXAMPLES: &[&str] = &["Restricted", "my-realm"];

impl Validate<AuthenticationFilter> for Validator {
    /// The referenced htpasswd Secret is resolved in the filter's namespace.
    fn validate(&self, filter: &AuthenticationFilter) -> Vec<Condition> {
        let mut errors = FieldErrors::default();
        let path = FieldPath::new("spec");

        match filter.spec.type_ {
            AuthType::Basic => match &filter.spec.basic {
                None => errors.push(FieldError::invalid(
                    path.child("basic"),
                    "",
                    "basic settings are required for Basic authentication",
                )),
                Some(basic) => {
                    let secret = NamespacedName::new(
                        filter.namespace().unwrap_or_default(),
                        &basic.secret_ref.name,
                    );
                    if let Err(error) = self.resolver.resolve(ResourceType::Secret, secret) {
                        errors.push(FieldError::invalid(
                            path.child("basic").child("secretRef"),
                            &basic.secret_ref.name,
                            error,
                        ));
                    }

                    if let Err(error) =
                        validation::validate_escaped_string(&basic.realm, REALM_EXAMPLES)
                    {
                        errors.push(FieldError::invalid(
                            path.child("basic").child("realm"),
                            &basic.realm,
                            error,
                        ));
                    }
                }
            },
        }

        match errors.into_result() {
            Ok(()) => Vec::new(),
            Err(errors) => {
                tracing::info!(filter = %filter.name_any(), %errors, "Invalid AuthenticationFilter");
                vec![Condition::authentication_filter_invalid(errors.to_string())]
            }
        }
    }

    /// Filters are referenced by name from routes; any number of them may
    /// coexist.
    fn conflicts(&self, _: &AuthenticationFilter, _: &AuthenticationFilter) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mk_secret;
    use maplit::btreemap;
    use nginx_policy_engine_k8s_api::{
        policy::{AuthenticationFilterSpec, BasicAuth, LocalObjectReference},
        Secret,
    };
    use nginx_policy_engine_k8s_resolver::{Object, ResourceResolver};
    use std::sync::Arc;

    fn mk_filter(ns: &str, secret: &str, realm: &str) -> AuthenticationFilter {
        let mut filter = AuthenticationFilter::new(
            "auth",
            AuthenticationFilterSpec {
                type_: AuthType::Basic,
                basic: Some(BasicAuth {
                    secret_ref: LocalObjectReference {
                        name: secret.to_string(),
                    },
                    realm: realm.to_string(),
                }),
            },
        );
        filter.metadata.namespace = Some(ns.to_string());
        filter
    }

    fn validator(secrets: Vec<Secret>) -> Validator {
        Validator::new(Arc::new(ResourceResolver::new(
            secrets.into_iter().map(Object::from),
        )))
    }

    #[test]
    fn valid_basic_auth() {
        let v = validator(vec![mk_secret(
            "test",
            "htpasswd",
            "nginx.org/htpasswd",
            btreemap! { "auth" => "user:$apr1$salt$hash" },
        )]);
        assert!(v.validate(&mk_filter("test", "htpasswd", "Restricted")).is_empty());
    }

    #[test]
    fn unresolvable_secrets() {
        let v = validator(vec![
            mk_secret("test", "empty", "nginx.org/htpasswd", btreemap! {}),
            mk_secret("test", "tls", "kubernetes.io/dockercfg", btreemap! {}),
            // Secrets are only looked up in the filter's namespace.
            mk_secret(
                "other",
                "htpasswd",
                "nginx.org/htpasswd",
                btreemap! { "auth" => "user:pass" },
            ),
        ]);

        for (secret, detail) in [
            ("missing", "Secret test/missing does not exist"),
            ("htpasswd", "Secret test/htpasswd does not exist"),
            (
                "empty",
                r#"missing required key "auth" in secret type "nginx.org/htpasswd""#,
            ),
            ("tls", r#"unsupported secret type "kubernetes.io/dockercfg""#),
        ] {
            assert_eq!(
                v.validate(&mk_filter("test", secret, "Restricted")),
                vec![Condition::authentication_filter_invalid(format!(
                    r#"spec.basic.secretRef: Invalid value: "{secret}": {detail}"#
                ))]
            );
        }
    }

    #[test]
    fn unescaped_realm() {
        let v = validator(vec![mk_secret(
            "test",
            "htpasswd",
            "nginx.org/htpasswd",
            btreemap! { "auth" => "user:pass" },
        )]);
        let conditions = v.validate(&mk_filter("test", "htpasswd", r#"my "realm""#));
        assert_eq!(conditions.len(), 1);
        assert!(
            conditions[0]
                .message
                .starts_with(r#"spec.basic.realm: Invalid value: "my \"realm\"": "#),
            "{}",
            conditions[0].message
        );
    }

    #[test]
    fn missing_basic_settings() {
        let mut filter = mk_filter("test", "htpasswd", "Restricted");
        filter.spec.basic = None;
        assert_eq!(
            Validator::default().validate(&filter),
            vec![Condition::authentication_filter_invalid(
                r#"spec.basic: Invalid value: "": basic settings are required for Basic authentication"#
            )]
        );
    }
}
