//! Authentication policy: JWT providers/rules and the external-authorization
//! filter configuration.

use crate::matcher;
use crate::types::{
    ApiVersion, CheckSettings, DataSource, Duration, EnvoyGrpc, ExtAuthz, ExtAuthzPerRoute,
    GrpcService, HttpUri, JwksConfig, JwtProvider, JwtRequirement, RemoteJwks, RequirementRule,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Serialize;
use std::collections::BTreeMap;
use xds_controller_core::{Authenticator, JwksSource};

/// Upstream cluster carrying external-authorization checks.
pub const EXT_AUTHZ_CLUSTER: &str = "ext-authz";

/// Upstream cluster used for proxy-side remote JWKS fetches.
pub const REMOTE_JWKS_CLUSTER: &str = "jwks";

const EXT_AUTHZ_TIMEOUT: Duration = Duration::from_secs(3);
const REMOTE_JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(60);
const REMOTE_JWKS_CACHE_DURATION: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("authenticator {0}: secret holds no key material")]
    EmptySecret(String),
}

/// A single symmetric JSON Web Key, inlined into a provider's key set.
#[derive(Serialize)]
struct Jwk<'a> {
    kty: &'static str,
    kid: &'a str,
    alg: &'static str,
    k: String,
}

#[derive(Serialize)]
struct JwkSet<'a> {
    keys: Vec<Jwk<'a>>,
}

/// Builds one token-validation provider per authenticator, keyed by name.
///
/// A malformed key source is a compile failure for the whole reload; a
/// provider with broken keys would silently stop authenticating.
pub fn build_providers(
    authenticators: &[Authenticator],
) -> Result<BTreeMap<String, JwtProvider>, KeyError> {
    let mut providers = BTreeMap::new();
    for a in authenticators {
        providers.insert(
            a.name.clone(),
            JwtProvider {
                issuer: a.issuer.clone(),
                audiences: a.audiences.clone(),
                forward: a.forward,
                jwks: jwks_config(a)?,
            },
        );
    }
    Ok(providers)
}

/// Builds the requirement rules selecting a provider per match predicate,
/// ordered by authenticator name so emission is reproducible.
pub fn build_rules(authenticators: &[Authenticator]) -> Vec<RequirementRule> {
    let mut sorted: Vec<&Authenticator> = authenticators.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    sorted
        .into_iter()
        .map(|a| RequirementRule {
            matcher: matcher::build_match(&a.matches),
            requires: JwtRequirement {
                provider_name: a.name.clone(),
            },
        })
        .collect()
}

/// The per-route external-authorization override payload.
///
/// Every route gets one: disabled unless the route opted in, in which case
/// the route's name travels as a context extension for per-route decisions
/// in the authorizer.
pub fn ext_authz_override(route_name: &str, enabled: bool) -> ExtAuthzPerRoute {
    if !enabled {
        return ExtAuthzPerRoute::Disabled(true);
    }

    let mut context_extensions = BTreeMap::new();
    context_extensions.insert("route".to_string(), route_name.to_string());
    ExtAuthzPerRoute::CheckSettings(CheckSettings { context_extensions })
}

/// The process-wide external-authorization filter config, identical for
/// every listener. Authorization-service unavailability blocks requests.
pub fn ext_authz_http_filter() -> ExtAuthz {
    ExtAuthz {
        grpc_service: GrpcService {
            envoy_grpc: EnvoyGrpc {
                cluster_name: EXT_AUTHZ_CLUSTER.to_string(),
            },
            timeout: Some(EXT_AUTHZ_TIMEOUT),
        },
        failure_mode_allow: false,
        transport_api_version: ApiVersion::V3,
    }
}

fn jwks_config(a: &Authenticator) -> Result<JwksConfig, KeyError> {
    match &a.keys {
        JwksSource::Local { secret } => {
            if secret.is_empty() {
                return Err(KeyError::EmptySecret(a.name.clone()));
            }
            let set = JwkSet {
                keys: vec![Jwk {
                    kty: "oct",
                    kid: &a.name,
                    alg: "HS256",
                    k: URL_SAFE_NO_PAD.encode(secret.as_bytes()),
                }],
            };
            let inline = serde_json::to_string(&set).expect("JWK set serializes");
            Ok(JwksConfig::LocalJwks(DataSource::InlineString(inline)))
        }

        JwksSource::Remote { url } => Ok(JwksConfig::RemoteJwks(RemoteJwks {
            http_uri: HttpUri {
                uri: url.clone(),
                cluster: REMOTE_JWKS_CLUSTER.to_string(),
                timeout: REMOTE_JWKS_FETCH_TIMEOUT,
            },
            cache_duration: REMOTE_JWKS_CACHE_DURATION,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PathSpecifier;
    use xds_controller_core::RequestMatch;

    fn authenticator(name: &str, keys: JwksSource) -> Authenticator {
        Authenticator {
            name: name.to_string(),
            issuer: format!("https://{name}.example.com"),
            audiences: vec!["edge".to_string()],
            forward: true,
            keys,
            matches: RequestMatch {
                prefix: Some(format!("/{name}/")),
                path: None,
                headers: vec![],
            },
        }
    }

    #[test]
    fn local_provider_inlines_symmetric_key_set() {
        let auths = vec![authenticator(
            "partners",
            JwksSource::Local {
                secret: "super-secret".to_string(),
            },
        )];

        let providers = build_providers(&auths).unwrap();
        let provider = &providers["partners"];
        assert_eq!(provider.issuer, "https://partners.example.com");
        assert!(provider.forward);

        let JwksConfig::LocalJwks(DataSource::InlineString(inline)) = &provider.jwks else {
            panic!("expected an inline key set");
        };
        let set: serde_json::Value = serde_json::from_str(inline).unwrap();
        let key = &set["keys"][0];
        assert_eq!(key["kty"], "oct");
        assert_eq!(key["kid"], "partners");
        assert_eq!(key["alg"], "HS256");
        assert_eq!(key["k"], URL_SAFE_NO_PAD.encode(b"super-secret"));
    }

    #[test]
    fn empty_secret_is_a_key_error() {
        let auths = vec![authenticator(
            "partners",
            JwksSource::Local {
                secret: String::new(),
            },
        )];
        assert!(matches!(
            build_providers(&auths),
            Err(KeyError::EmptySecret(name)) if name == "partners"
        ));
    }

    #[test]
    fn remote_provider_carries_fetch_timeouts() {
        let auths = vec![authenticator(
            "partners",
            JwksSource::Remote {
                url: "https://keys.example.com/jwks".to_string(),
            },
        )];

        let providers = build_providers(&auths).unwrap();
        let JwksConfig::RemoteJwks(remote) = &providers["partners"].jwks else {
            panic!("expected a remote key set");
        };
        assert_eq!(remote.http_uri.uri, "https://keys.example.com/jwks");
        assert_eq!(remote.http_uri.cluster, REMOTE_JWKS_CLUSTER);
        assert_eq!(remote.http_uri.timeout, Duration::from_secs(60));
        assert_eq!(remote.cache_duration, Duration::from_secs(1));
    }

    #[test]
    fn rules_sort_by_authenticator_name() {
        let secret = |name: &str| {
            authenticator(
                name,
                JwksSource::Local {
                    secret: "k".to_string(),
                },
            )
        };
        let rules = build_rules(&[secret("zeta"), secret("alpha"), secret("mid")]);
        let order: Vec<&str> = rules
            .iter()
            .map(|r| r.requires.provider_name.as_str())
            .collect();
        assert_eq!(order, vec!["alpha", "mid", "zeta"]);
        assert_eq!(
            rules[0].matcher.path,
            Some(PathSpecifier::Prefix("/alpha/".to_string()))
        );
    }

    #[test]
    fn override_defaults_to_disabled() {
        assert_eq!(
            ext_authz_override("r1", false),
            ExtAuthzPerRoute::Disabled(true)
        );

        let ExtAuthzPerRoute::CheckSettings(settings) = ext_authz_override("r1", true) else {
            panic!("expected check settings");
        };
        assert_eq!(settings.context_extensions["route"], "r1");
    }

    #[test]
    fn ext_authz_filter_denies_on_failure() {
        let filter = ext_authz_http_filter();
        assert!(!filter.failure_mode_allow);
        assert_eq!(filter.grpc_service.envoy_grpc.cluster_name, "ext-authz");
        assert_eq!(filter.grpc_service.timeout, Some(Duration::from_secs(3)));
    }
}
