//! Cluster and load-assignment resource construction.

use crate::types::{
    Address, Cluster, ClusterLoadAssignment, DiscoveryType, DnsLookupFamily, Duration,
    ExplicitHttpConfig, Http2ProtocolOptions, HttpUpstreamOptions, LbEndpoint, LbPolicy,
    LocalityLbEndpoints, SocketAddress, SocketProtocol, TcpUpstreamOptions, UpstreamEndpoint,
    UpstreamProtocolOptions,
};
use xds_controller_core as model;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn make_cluster(cluster: &model::Cluster) -> Cluster {
    Cluster {
        name: cluster.name.clone(),
        connect_timeout: CONNECT_TIMEOUT,
        discovery_type: DiscoveryType::LogicalDns,
        lb_policy: LbPolicy::RoundRobin,
        dns_lookup_family: DnsLookupFamily::V4Only,
        load_assignment: make_load_assignment(&cluster.name, &cluster.endpoints),
        typed_extension_protocol_options: cluster.is_grpc.then(grpc_protocol_options),
    }
}

pub fn make_load_assignment(
    cluster_name: &str,
    endpoints: &[model::Endpoint],
) -> ClusterLoadAssignment {
    let lb_endpoints = endpoints
        .iter()
        .map(|ep| LbEndpoint {
            endpoint: UpstreamEndpoint {
                address: socket_address(&ep.host, ep.port),
            },
        })
        .collect();

    ClusterLoadAssignment {
        cluster_name: cluster_name.to_string(),
        endpoints: vec![LocalityLbEndpoints { lb_endpoints }],
    }
}

pub(crate) fn socket_address(address: &str, port: u32) -> Address {
    Address {
        socket_address: SocketAddress {
            protocol: SocketProtocol::Tcp,
            address: address.to_string(),
            port_value: port,
        },
    }
}

fn grpc_protocol_options() -> UpstreamProtocolOptions {
    UpstreamProtocolOptions {
        http: HttpUpstreamOptions {
            explicit_http_config: ExplicitHttpConfig {
                http2_protocol_options: Http2ProtocolOptions::default(),
            },
        },
        tcp: TcpUpstreamOptions {
            idle_timeout: Duration::from_secs(0),
        },
    }
}
