//! Typed subset of the Envoy v3 configuration surface this control plane
//! emits. Field names follow the proto JSON layout so serialized resources
//! read like Envoy configuration.

use serde::Serialize;
use std::collections::BTreeMap;

/// A protobuf-JSON duration, rendered as `"5s"` / `"0s"`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Duration {
    secs: u64,
}

// === impl Duration ===

impl Duration {
    pub const fn from_secs(secs: u64) -> Self {
        Self { secs }
    }
}

impl Serialize for Duration {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{}s", self.secs))
    }
}

// === addresses ===

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Address {
    pub socket_address: SocketAddress,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SocketAddress {
    pub protocol: SocketProtocol,
    pub address: String,
    pub port_value: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SocketProtocol {
    Tcp,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiVersion {
    V3,
}

// === clusters ===

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Cluster {
    pub name: String,
    pub connect_timeout: Duration,
    #[serde(rename = "type")]
    pub discovery_type: DiscoveryType,
    pub lb_policy: LbPolicy,
    pub dns_lookup_family: DnsLookupFamily,
    pub load_assignment: ClusterLoadAssignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typed_extension_protocol_options: Option<UpstreamProtocolOptions>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscoveryType {
    LogicalDns,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LbPolicy {
    RoundRobin,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DnsLookupFamily {
    V4Only,
}

/// Upstream protocol options attached to gRPC clusters: explicit HTTP/2 and
/// a disabled TCP idle timeout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpstreamProtocolOptions {
    #[serde(rename = "envoy.extensions.upstreams.http.v3.HttpProtocolOptions")]
    pub http: HttpUpstreamOptions,
    #[serde(rename = "envoy.extensions.upstreams.tcp.v3.TcpProtocolOptions")]
    pub tcp: TcpUpstreamOptions,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HttpUpstreamOptions {
    pub explicit_http_config: ExplicitHttpConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExplicitHttpConfig {
    pub http2_protocol_options: Http2ProtocolOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Http2ProtocolOptions {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TcpUpstreamOptions {
    pub idle_timeout: Duration,
}

// === endpoints ===

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClusterLoadAssignment {
    pub cluster_name: String,
    pub endpoints: Vec<LocalityLbEndpoints>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LocalityLbEndpoints {
    pub lb_endpoints: Vec<LbEndpoint>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LbEndpoint {
    pub endpoint: UpstreamEndpoint,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpstreamEndpoint {
    pub address: Address,
}

// === route configuration ===

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteConfiguration {
    pub name: String,
    pub virtual_hosts: Vec<VirtualHost>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VirtualHost {
    pub name: String,
    pub domains: Vec<String>,
    pub routes: Vec<RouteEntry>,
    pub typed_per_filter_config: VirtualHostOverrides,
}

/// Per-virtual-host filter overrides. CORS is the only filter configured at
/// this level; the policy is fixed, not per-route configurable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VirtualHostOverrides {
    #[serde(rename = "envoy.filters.http.cors")]
    pub cors: CorsPolicy,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CorsPolicy {
    pub allow_origin_string_match: Vec<StringMatcher>,
    pub allow_methods: String,
    pub allow_headers: String,
    pub max_age: String,
    pub expose_headers: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StringMatcher {
    Prefix(String),
    Exact(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    #[serde(rename = "match")]
    pub matcher: RouteMatch,
    pub route: RouteAction,
    pub typed_per_filter_config: RouteOverrides,
}

/// Per-route filter overrides. External authorization is the only filter
/// overridden per route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteOverrides {
    #[serde(rename = "envoy.filters.http.ext_authz")]
    pub ext_authz: ExtAuthzPerRoute,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtAuthzPerRoute {
    Disabled(bool),
    CheckSettings(CheckSettings),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckSettings {
    pub context_extensions: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteAction {
    pub cluster: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stream_duration: Option<MaxStreamDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_rewrite: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MaxStreamDuration {
    pub grpc_timeout_header_max: Duration,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    #[serde(flatten)]
    pub path: Option<PathSpecifier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<HeaderMatcher>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSpecifier {
    Prefix(String),
    Path(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HeaderMatcher {
    pub name: String,
    pub string_match: StringMatcher,
}

// === listeners ===

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Listener {
    pub name: String,
    pub address: Address,
    pub filter_chains: Vec<FilterChain>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FilterChain {
    pub filters: Vec<NetworkFilter>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NetworkFilter {
    pub name: &'static str,
    pub typed_config: NetworkFilterConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NetworkFilterConfig {
    HttpConnectionManager(HttpConnectionManager),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HttpConnectionManager {
    pub codec_type: CodecType,
    pub stat_prefix: String,
    pub stream_idle_timeout: Duration,
    pub rds: Rds,
    pub http_filters: Vec<HttpFilter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub access_log: Vec<AccessLog>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodecType {
    Auto,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rds {
    pub config_source: ConfigSource,
    pub route_config_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfigSource {
    pub resource_api_version: ApiVersion,
    pub api_config_source: ApiConfigSource,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApiConfigSource {
    pub api_type: ApiType,
    pub transport_api_version: ApiVersion,
    pub set_node_on_first_message_only: bool,
    pub grpc_services: Vec<GrpcService>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiType {
    Grpc,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GrpcService {
    pub envoy_grpc: EnvoyGrpc,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnvoyGrpc {
    pub cluster_name: String,
}

// === HTTP filters ===

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HttpFilter {
    pub name: &'static str,
    pub typed_config: HttpFilterConfig,
}

/// The closed set of HTTP filter configurations this control plane emits.
/// Serializes as the bare filter config, like a resolved `typed_config`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HttpFilterConfig {
    Cors(Cors),
    GrpcWeb(GrpcWeb),
    ExtAuthz(ExtAuthz),
    JwtAuthn(JwtAuthentication),
    Router(Router),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Cors {}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GrpcWeb {}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Router {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExtAuthz {
    pub grpc_service: GrpcService,
    pub failure_mode_allow: bool,
    pub transport_api_version: ApiVersion,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccessLog {
    pub name: &'static str,
    pub typed_config: StdoutAccessLog,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StdoutAccessLog {}

// === JWT authentication ===

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct JwtAuthentication {
    pub providers: BTreeMap<String, JwtProvider>,
    pub rules: Vec<RequirementRule>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JwtProvider {
    pub issuer: String,
    pub audiences: Vec<String>,
    pub forward: bool,
    #[serde(flatten)]
    pub jwks: JwksConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JwksConfig {
    LocalJwks(DataSource),
    RemoteJwks(RemoteJwks),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    InlineString(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RemoteJwks {
    pub http_uri: HttpUri,
    pub cache_duration: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HttpUri {
    pub uri: String,
    pub cluster: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RequirementRule {
    #[serde(rename = "match")]
    pub matcher: RouteMatch,
    pub requires: JwtRequirement,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JwtRequirement {
    pub provider_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_render_as_proto_json() {
        assert_eq!(
            serde_json::to_string(&Duration::from_secs(5)).unwrap(),
            "\"5s\""
        );
        assert_eq!(
            serde_json::to_string(&Duration::from_secs(0)).unwrap(),
            "\"0s\""
        );
    }

    #[test]
    fn route_match_flattens_path_specifier() {
        let m = RouteMatch {
            path: Some(PathSpecifier::Prefix("/api/".to_string())),
            headers: vec![],
        };
        assert_eq!(
            serde_json::to_value(&m).unwrap(),
            serde_json::json!({"prefix": "/api/"})
        );

        let empty = RouteMatch::default();
        assert_eq!(serde_json::to_value(&empty).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn filter_configs_serialize_untagged() {
        let cfg = HttpFilterConfig::Router(Router::default());
        assert_eq!(serde_json::to_value(&cfg).unwrap(), serde_json::json!({}));

        let per_route = ExtAuthzPerRoute::Disabled(true);
        assert_eq!(
            serde_json::to_value(&per_route).unwrap(),
            serde_json::json!({"disabled": true})
        );
    }
}
