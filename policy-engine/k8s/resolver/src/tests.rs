use super::*;
use crate::certificate::tests::self_signed;
use maplit::btreemap;
use nginx_policy_engine_k8s_api::{ByteString, ObjectMeta};
use pretty_assertions::assert_eq;

fn mk_secret(ns: &str, name: &str, type_: &str, data: BTreeMap<&str, &str>) -> Secret {
    Secret {
        metadata: ObjectMeta {
            namespace: Some(ns.to_string()),
            name: Some(name.to_string()),
            ..ObjectMeta::default()
        },
        type_: Some(type_.to_string()),
        data: Some(
            data.into_iter()
                .map(|(k, v)| (k.to_string(), ByteString(v.as_bytes().to_vec())))
                .collect(),
        ),
        ..Secret::default()
    }
}

fn mk_config_map(ns: &str, name: &str, data: BTreeMap<&str, &str>) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            namespace: Some(ns.to_string()),
            name: Some(name.to_string()),
            ..ObjectMeta::default()
        },
        data: Some(
            data.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ),
        ..ConfigMap::default()
    }
}

fn secret_name(name: &str) -> NamespacedName {
    NamespacedName::new("test", name)
}

fn resolve_secret(resolver: &ResourceResolver, name: &str) -> Result<(), String> {
    resolver
        .resolve(ResourceType::Secret, secret_name(name))
        .map_err(|e| e.to_string())
}

#[test]
fn resolves_secrets() {
    let tc = self_signed("example.com");
    let other = self_signed("other.example.com");

    let resolver = ResourceResolver::new(vec![
        Object::from(mk_secret(
            "test",
            "tls",
            secret::TLS_TYPE,
            btreemap! { "tls.crt" => tc.cert_pem.as_str(), "tls.key" => tc.key_pem.as_str() },
        )),
        mk_secret(
            "test",
            "tls-with-ca",
            secret::TLS_TYPE,
            btreemap! {
                "tls.crt" => tc.cert_pem.as_str(),
                "tls.key" => tc.key_pem.as_str(),
                "ca.crt" => other.cert_pem.as_str(),
            },
        )
        .into(),
        mk_secret(
            "test",
            "htpasswd",
            secret::HTPASSWD_TYPE,
            btreemap! { "auth" => "user:$apr1$abc$def" },
        )
        .into(),
        mk_secret("test", "htpasswd-no-auth", secret::HTPASSWD_TYPE, btreemap! {}).into(),
        mk_secret(
            "test",
            "dockercfg",
            "kubernetes.io/dockercfg",
            btreemap! { ".dockercfg" => "{}" },
        )
        .into(),
        mk_secret(
            "test",
            "mismatched",
            secret::TLS_TYPE,
            btreemap! { "tls.crt" => tc.cert_pem.as_str(), "tls.key" => other.key_pem.as_str() },
        )
        .into(),
        mk_secret(
            "test",
            "mismatched-with-ca",
            secret::TLS_TYPE,
            btreemap! {
                "tls.crt" => tc.cert_pem.as_str(),
                "tls.key" => other.key_pem.as_str(),
                "ca.crt" => other.cert_pem.as_str(),
            },
        )
        .into(),
        mk_secret(
            "test",
            "bad-ca",
            secret::TLS_TYPE,
            btreemap! {
                "tls.crt" => tc.cert_pem.as_str(),
                "tls.key" => tc.key_pem.as_str(),
                "ca.crt" => tc.key_pem.as_str(),
            },
        )
        .into(),
    ]);

    assert_eq!(resolve_secret(&resolver, "tls"), Ok(()));
    assert_eq!(resolve_secret(&resolver, "tls-with-ca"), Ok(()));
    assert_eq!(resolve_secret(&resolver, "htpasswd"), Ok(()));
    assert_eq!(
        resolve_secret(&resolver, "htpasswd-no-auth"),
        Err(r#"missing required key "auth" in secret type "nginx.org/htpasswd""#.to_string())
    );
    assert_eq!(
        resolve_secret(&resolver, "dockercfg"),
        Err(r#"unsupported secret type "kubernetes.io/dockercfg""#.to_string())
    );
    assert_eq!(
        resolve_secret(&resolver, "mismatched"),
        Err("tls secret is invalid: tls: private key does not match public key".to_string())
    );
    // A valid CA doesn't excuse an invalid key pair.
    assert_eq!(
        resolve_secret(&resolver, "mismatched-with-ca"),
        Err("tls secret is invalid: tls: private key does not match public key".to_string())
    );
    assert_eq!(
        resolve_secret(&resolver, "bad-ca"),
        Err(
            r#"the data field "ca.crt" must hold a valid CERTIFICATE PEM block, but got "PRIVATE KEY""#
                .to_string()
        )
    );
    assert_eq!(
        resolve_secret(&resolver, "not-exist"),
        Err("Secret test/not-exist does not exist".to_string())
    );

    let secrets = resolver.resolved_secrets();
    assert_eq!(secrets.len(), 9);
    assert!(resolver.resolved_config_maps().is_empty());

    let tls = &secrets[&secret_name("tls-with-ca")];
    let bundle = tls.bundle.as_ref().expect("tls secrets have a bundle");
    assert_eq!(bundle.kind, ResourceType::Secret);
    assert_eq!(bundle.name, secret_name("tls-with-ca"));
    assert_eq!(
        bundle.cert.ca_cert.as_deref(),
        Some(other.cert_pem.as_bytes())
    );

    // Invalid secrets keep their source and bundle.
    let mismatched = &secrets[&secret_name("mismatched")];
    assert!(mismatched.source.is_some());
    assert!(mismatched.bundle.is_some());
    assert!(mismatched.error.is_some());

    let htpasswd = &secrets[&secret_name("htpasswd")];
    assert!(htpasswd.bundle.is_none());
    assert!(htpasswd.error.is_none());

    let missing = &secrets[&secret_name("not-exist")];
    assert_eq!(missing.source, None);
}

#[test]
fn resolves_config_maps() {
    let tc = self_signed("ca.example.com");
    let resolver = ResourceResolver::new(vec![
        Object::from(mk_config_map(
            "test",
            "ca",
            btreemap! { "ca.crt" => tc.cert_pem.as_str() },
        )),
        mk_config_map("test", "empty", btreemap! { "other" => "value" }).into(),
        mk_config_map("test", "bad", btreemap! { "ca.crt" => "not a cert" }).into(),
        ConfigMap {
            metadata: ObjectMeta {
                namespace: Some("test".to_string()),
                name: Some("binary".to_string()),
                ..ObjectMeta::default()
            },
            binary_data: Some(btreemap! {
                "ca.crt".to_string() => ByteString(tc.cert_pem.as_bytes().to_vec()),
            }),
            ..ConfigMap::default()
        }
        .into(),
    ]);

    let resolve = |name: &str| {
        resolver
            .resolve(ResourceType::ConfigMap, NamespacedName::new("test", name))
            .map_err(|e| e.to_string())
    };
    assert_eq!(resolve("ca"), Ok(()));
    assert_eq!(resolve("binary"), Ok(()));
    assert_eq!(
        resolve("empty"),
        Err("ConfigMap does not have the data or binaryData field ca.crt".to_string())
    );
    assert_eq!(
        resolve("bad"),
        Err(r#"the data field "ca.crt" must hold a valid CERTIFICATE PEM block"#.to_string())
    );
    assert_eq!(
        resolve("missing"),
        Err("ConfigMap test/missing does not exist".to_string())
    );

    let cms = resolver.resolved_config_maps();
    assert_eq!(cms.len(), 5);
    let bundle = cms[&NamespacedName::new("test", "binary")]
        .bundle
        .clone()
        .expect("config maps have a bundle");
    assert_eq!(bundle.kind, ResourceType::ConfigMap);
    assert_eq!(bundle.cert.ca_cert, Some(tc.cert_pem.into_bytes()));
    assert_eq!(bundle.cert.tls_cert, None);
}

#[test]
fn outcomes_are_memoized() {
    let resolver = ResourceResolver::new(vec![Object::from(mk_secret(
        "test",
        "dockercfg",
        "kubernetes.io/dockercfg",
        btreemap! {},
    ))]);
    let key = ResourceKey::secret("test", "dockercfg");

    let first = resolver.resolve(ResourceType::Secret, secret_name("dockercfg"));
    let entry = resolver.resolved()[&key].clone();
    let second = resolver.resolve(ResourceType::Secret, secret_name("dockercfg"));
    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&entry, &resolver.resolved()[&key]));

    // Replacing the object drops the stored outcome.
    resolver.apply(mk_secret(
        "test",
        "dockercfg",
        secret::HTPASSWD_TYPE,
        btreemap! { "auth" => "user:pass" },
    ));
    assert!(resolver.resolved().is_empty());
    assert_eq!(
        resolver.resolve(ResourceType::Secret, secret_name("dockercfg")),
        Ok(())
    );

    resolver.delete(&key);
    assert_eq!(
        resolver.resolve(ResourceType::Secret, secret_name("dockercfg")),
        Err(ResolveError::NotFound(
            ResourceType::Secret,
            secret_name("dockercfg")
        ))
    );
}

#[test]
fn concurrent_resolution_shares_one_entry() {
    let tc = self_signed("example.com");
    let resolver = ResourceResolver::new(vec![Object::from(mk_secret(
        "test",
        "tls",
        secret::TLS_TYPE,
        btreemap! { "tls.crt" => tc.cert_pem.as_str(), "tls.key" => tc.key_pem.as_str() },
    ))]);

    let entries = std::thread::scope(|s| {
        let handles = (0..8)
            .map(|i| {
                let resolver = &resolver;
                s.spawn(move || {
                    // Interleave an unrelated key so distinct keys are resolved
                    // concurrently as well.
                    let other = format!("missing-{i}");
                    assert!(resolver
                        .resolve(ResourceType::Secret, secret_name(&other))
                        .is_err());
                    assert_eq!(
                        resolver.resolve(ResourceType::Secret, secret_name("tls")),
                        Ok(())
                    );
                    resolver.resolved()[&ResourceKey::secret("test", "tls")].clone()
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|h| h.join().expect("resolver thread must not panic"))
            .collect::<Vec<_>>()
    });

    for entry in &entries[1..] {
        assert!(Arc::ptr_eq(&entries[0], entry));
    }
    assert_eq!(resolver.resolved().len(), 9);
}
