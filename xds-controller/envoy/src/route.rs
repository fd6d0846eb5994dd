//! Route-configuration resource construction.

use crate::types::{
    CorsPolicy, Duration, MaxStreamDuration, RouteAction, RouteConfiguration, RouteEntry,
    RouteOverrides, StringMatcher, VirtualHost, VirtualHostOverrides,
};
use crate::{auth, matcher};
use xds_controller_core as model;

/// The well-known name of the aggregated route configuration. Every
/// listener's connection manager references it through RDS.
pub const ROUTE_CONFIG_NAME: &str = "local_routes";

const VIRTUAL_HOST_NAME: &str = "local_service";

const CORS_ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";
const CORS_ALLOW_HEADERS: &str = "keep-alive,user-agent,cache-control,content-type,\
     content-transfer-encoding,custom-header-1,x-accept-content-transfer-encoding,\
     x-accept-response-streaming,x-user-agent,x-grpc-web,grpc-timeout,apikey";
const CORS_MAX_AGE: &str = "1728000";
const CORS_EXPOSE_HEADERS: &str = "custom-header-1,grpc-status,grpc-message";

/// Builds the single route configuration aggregating all routes, in the
/// order provided by the caller, under one wildcard virtual host.
pub fn make_route_config(routes: &[&model::Route]) -> RouteConfiguration {
    RouteConfiguration {
        name: ROUTE_CONFIG_NAME.to_string(),
        virtual_hosts: vec![VirtualHost {
            name: VIRTUAL_HOST_NAME.to_string(),
            domains: vec!["*".to_string()],
            routes: routes.iter().map(|r| make_sub_route(r)).collect(),
            typed_per_filter_config: VirtualHostOverrides {
                cors: cors_policy(),
            },
        }],
    }
}

fn make_sub_route(route: &model::Route) -> RouteEntry {
    // gRPC routes defer deadlines to the grpc-timeout header rather than
    // imposing a proxy-side timeout.
    let (timeout, max_stream_duration) = if route.is_grpc {
        (
            Some(Duration::from_secs(0)),
            Some(MaxStreamDuration {
                grpc_timeout_header_max: Duration::from_secs(0),
            }),
        )
    } else {
        (None, None)
    };

    RouteEntry {
        matcher: matcher::build_match(&route.matches),
        route: RouteAction {
            cluster: route.cluster.clone(),
            timeout,
            max_stream_duration,
            prefix_rewrite: route.rewrite.as_ref().and_then(|rw| rw.prefix.clone()),
        },
        typed_per_filter_config: RouteOverrides {
            ext_authz: auth::ext_authz_override(&route.name, route.external_auth),
        },
    }
}

/// The fixed virtual-host CORS policy. Not per-route configurable.
fn cors_policy() -> CorsPolicy {
    CorsPolicy {
        allow_origin_string_match: vec![StringMatcher::Prefix("*".to_string())],
        allow_methods: CORS_ALLOW_METHODS.to_string(),
        allow_headers: CORS_ALLOW_HEADERS.to_string(),
        max_age: CORS_MAX_AGE.to_string(),
        expose_headers: CORS_EXPOSE_HEADERS.to_string(),
    }
}
