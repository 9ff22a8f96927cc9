use crate::{
    certificate::{self, Certificate, CA_KEY},
    CertificateBundle, NamespacedName, Object, ResolveError, ResolvedEntry, ResourceType,
};
use nginx_policy_engine_k8s_api::Secret;

pub(crate) const TLS_TYPE: &str = "kubernetes.io/tls";
pub(crate) const HTPASSWD_TYPE: &str = "nginx.org/htpasswd";

const TLS_CERT_KEY: &str = "tls.crt";
const TLS_PRIVATE_KEY_KEY: &str = "tls.key";
const AUTH_KEY: &str = "auth";

pub(crate) fn validate(name: &NamespacedName, secret: Secret) -> ResolvedEntry {
    let mut bundle = None;
    let mut error = None;

    match secret.type_.as_deref().unwrap_or_default() {
        TLS_TYPE => {
            let cert = Certificate {
                tls_cert: data(&secret, TLS_CERT_KEY),
                tls_private_key: data(&secret, TLS_PRIVATE_KEY_KEY),
                ca_cert: data(&secret, CA_KEY),
            };

            let tls = certificate::validate_tls(
                cert.tls_cert.as_deref().unwrap_or_default(),
                cert.tls_private_key.as_deref().unwrap_or_default(),
            );
            error = tls.err().map(ResolveError::InvalidTls);

            // An invalid CA takes precedence over an invalid key pair.
            if let Some(ca) = cert.ca_cert.as_deref() {
                if let Err(e) = certificate::validate_ca(ca) {
                    error = Some(e.into());
                }
            }

            bundle = Some(CertificateBundle {
                name: name.clone(),
                kind: ResourceType::Secret,
                cert,
            });
        }

        HTPASSWD_TYPE => {
            if data(&secret, AUTH_KEY).map_or(true, |auth| auth.is_empty()) {
                error = Some(ResolveError::MissingKey {
                    key: AUTH_KEY,
                    secret_type: HTPASSWD_TYPE,
                });
            }
        }

        other => error = Some(ResolveError::UnsupportedSecretType(other.to_string())),
    }

    ResolvedEntry {
        source: Some(Object::Secret(secret)),
        bundle,
        error,
    }
}

/// Reads a data key, falling back to `stringData` for manifests that haven't
/// been through the API server.
fn data(secret: &Secret, key: &str) -> Option<Vec<u8>> {
    if let Some(value) = secret.data.as_ref().and_then(|d| d.get(key)) {
        return Some(value.0.clone());
    }
    secret
        .string_data
        .as_ref()
        .and_then(|d| d.get(key))
        .map(|value| value.as_bytes().to_vec())
}
