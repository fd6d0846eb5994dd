//! Listener resource construction: the filter chain embedding the HTTP
//! connection manager.

use crate::auth;
use crate::cluster::socket_address;
use crate::types::{
    AccessLog, ApiConfigSource, ApiType, ApiVersion, CodecType, ConfigSource, Cors, Duration,
    EnvoyGrpc, FilterChain, GrpcService, GrpcWeb, HttpConnectionManager, HttpFilter,
    HttpFilterConfig, JwtAuthentication, Listener, NetworkFilter, NetworkFilterConfig, Rds, Router,
    StdoutAccessLog,
};
use xds_controller_core as model;

/// Upstream cluster over which proxies reach this control plane for RDS.
pub const XDS_CLUSTER: &str = "xds_cluster";

const HTTP_CONNECTION_MANAGER: &str = "envoy.filters.network.http_connection_manager";
const CORS_FILTER: &str = "envoy.filters.http.cors";
const GRPC_WEB_FILTER: &str = "envoy.filters.http.grpc_web";
const EXT_AUTHZ_FILTER: &str = "envoy.filters.http.ext_authz";
const JWT_AUTHN_FILTER: &str = "envoy.filters.http.jwt_authn";
const ROUTER_FILTER: &str = "envoy.filters.http.router";
const STDOUT_ACCESS_LOG: &str = "envoy.access_loggers.stdout";

const STAT_PREFIX: &str = "http";

/// Builds a listener whose single filter chain runs the HTTP connection
/// manager, referencing `route_config_name` through RDS.
///
/// The same token-validation config applies to every listener; auth policy
/// is global, not listener-scoped.
pub fn make_listener(
    listener: &model::Listener,
    route_config_name: &str,
    with_access_log: bool,
    jwt: &JwtAuthentication,
) -> Listener {
    Listener {
        name: listener.name.clone(),
        address: socket_address(&listener.address, listener.port),
        filter_chains: vec![FilterChain {
            filters: vec![NetworkFilter {
                name: HTTP_CONNECTION_MANAGER,
                typed_config: NetworkFilterConfig::HttpConnectionManager(
                    http_connection_manager(route_config_name, with_access_log, jwt),
                ),
            }],
        }],
    }
}

fn http_connection_manager(
    route_config_name: &str,
    with_access_log: bool,
    jwt: &JwtAuthentication,
) -> HttpConnectionManager {
    // Order matters: ext-authz runs before token validation so authorization
    // context is available to it, and the router terminates the chain.
    let http_filters = vec![
        HttpFilter {
            name: CORS_FILTER,
            typed_config: HttpFilterConfig::Cors(Cors::default()),
        },
        HttpFilter {
            name: GRPC_WEB_FILTER,
            typed_config: HttpFilterConfig::GrpcWeb(GrpcWeb::default()),
        },
        HttpFilter {
            name: EXT_AUTHZ_FILTER,
            typed_config: HttpFilterConfig::ExtAuthz(auth::ext_authz_http_filter()),
        },
        HttpFilter {
            name: JWT_AUTHN_FILTER,
            typed_config: HttpFilterConfig::JwtAuthn(jwt.clone()),
        },
        HttpFilter {
            name: ROUTER_FILTER,
            typed_config: HttpFilterConfig::Router(Router::default()),
        },
    ];

    let access_log = if with_access_log {
        vec![AccessLog {
            name: STDOUT_ACCESS_LOG,
            typed_config: StdoutAccessLog::default(),
        }]
    } else {
        vec![]
    };

    HttpConnectionManager {
        codec_type: CodecType::Auto,
        stat_prefix: STAT_PREFIX.to_string(),
        stream_idle_timeout: Duration::from_secs(0),
        rds: Rds {
            config_source: config_source(),
            route_config_name: route_config_name.to_string(),
        },
        http_filters,
        access_log,
    }
}

fn config_source() -> ConfigSource {
    ConfigSource {
        resource_api_version: ApiVersion::V3,
        api_config_source: ApiConfigSource {
            api_type: ApiType::Grpc,
            transport_api_version: ApiVersion::V3,
            set_node_on_first_message_only: true,
            grpc_services: vec![GrpcService {
                envoy_grpc: EnvoyGrpc {
                    cluster_name: XDS_CLUSTER.to_string(),
                },
                timeout: None,
            }],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener() -> model::Listener {
        model::Listener {
            name: "l1".to_string(),
            address: "0.0.0.0".to_string(),
            port: 10000,
            route_names: vec!["r1".to_string()],
        }
    }

    fn manager(l: &Listener) -> &HttpConnectionManager {
        let NetworkFilterConfig::HttpConnectionManager(hcm) =
            &l.filter_chains[0].filters[0].typed_config;
        hcm
    }

    #[test]
    fn filter_order_is_significant() {
        let l = make_listener(&listener(), "local_routes", false, &Default::default());
        assert_eq!(l.filter_chains.len(), 1);

        let names: Vec<&str> = manager(&l).http_filters.iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                CORS_FILTER,
                GRPC_WEB_FILTER,
                EXT_AUTHZ_FILTER,
                JWT_AUTHN_FILTER,
                ROUTER_FILTER,
            ]
        );
    }

    #[test]
    fn rds_references_the_route_config_by_name() {
        let l = make_listener(&listener(), "local_routes", false, &Default::default());
        let hcm = manager(&l);
        assert_eq!(hcm.rds.route_config_name, "local_routes");
        assert_eq!(
            hcm.rds.config_source.api_config_source.grpc_services[0]
                .envoy_grpc
                .cluster_name,
            XDS_CLUSTER
        );
        assert_eq!(hcm.stream_idle_timeout, Duration::from_secs(0));
    }

    #[test]
    fn access_log_is_attached_on_request() {
        let without = make_listener(&listener(), "local_routes", false, &Default::default());
        assert!(manager(&without).access_log.is_empty());

        let with = make_listener(&listener(), "local_routes", true, &Default::default());
        assert_eq!(manager(&with).access_log.len(), 1);
        assert_eq!(manager(&with).access_log[0].name, STDOUT_ACCESS_LOG);
    }

    #[test]
    fn listener_binds_the_configured_address() {
        let l = make_listener(&listener(), "local_routes", false, &Default::default());
        let socket = &l.address.socket_address;
        assert_eq!(socket.address, "0.0.0.0");
        assert_eq!(socket.port_value, 10000);
    }
}
