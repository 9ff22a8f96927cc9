use crate::{
    certificate::{self, Certificate, CA_KEY},
    CertificateBundle, NamespacedName, Object, ResolveError, ResolvedEntry, ResourceType,
};
use nginx_policy_engine_k8s_api::ConfigMap;

/// Only the CA entry of a ConfigMap is meaningful. `binaryData` wins when both
/// fields hold one.
pub(crate) fn validate(name: &NamespacedName, cm: ConfigMap) -> ResolvedEntry {
    let ca = cm
        .binary_data
        .as_ref()
        .and_then(|d| d.get(CA_KEY))
        .map(|ca| ca.0.clone())
        .or_else(|| {
            cm.data
                .as_ref()
                .and_then(|d| d.get(CA_KEY))
                .map(|ca| ca.as_bytes().to_vec())
        })
        .filter(|ca| !ca.is_empty());

    let error = match ca.as_deref() {
        None => Some(ResolveError::MissingCa),
        Some(ca) => certificate::validate_ca(ca).err().map(Into::into),
    };

    ResolvedEntry {
        bundle: Some(CertificateBundle {
            name: name.clone(),
            kind: ResourceType::ConfigMap,
            cert: Certificate {
                ca_cert: ca,
                ..Certificate::default()
            },
        }),
        source: Some(Object::ConfigMap(cm)),
        error,
    }
}
