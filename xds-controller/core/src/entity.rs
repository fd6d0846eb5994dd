use crate::RequestMatch;

/// A proxy listener: a bind address serving a set of routes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listener {
    pub name: String,
    pub address: String,
    pub port: u32,

    /// Names of the routes this listener serves, in configuration order.
    /// Every name must resolve to a [`Route`] at compile time.
    pub route_names: Vec<String>,
}

/// A single routing rule: a request match directed at one upstream cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    pub matches: RequestMatch,

    /// Target cluster. Must resolve to a [`Cluster`] at compile time.
    pub cluster: String,

    pub is_grpc: bool,
    pub rewrite: Option<crate::Rewrite>,

    /// Whether the external-authorization filter runs for this route.
    /// Disabled unless explicitly enabled in configuration.
    pub external_auth: bool,
}

/// An upstream cluster and its endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cluster {
    pub name: String,
    pub is_grpc: bool,
    pub endpoints: Vec<Endpoint>,
}

/// A single upstream host:port within a cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u32,
}

/// A JWT authentication policy: which requests require a token, who must have
/// issued it, and where the validation keys come from.
///
/// The authenticator's name doubles as the token-provider identifier and as
/// the key id of locally derived key material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authenticator {
    pub name: String,
    pub issuer: String,
    pub audiences: Vec<String>,

    /// Forward the validated token to the upstream service.
    pub forward: bool,

    pub keys: JwksSource,

    /// Selects the requests that must satisfy this authenticator.
    pub matches: RequestMatch,
}

/// Where an authenticator's validation keys come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JwksSource {
    /// A symmetric secret inlined into the provider as a single-entry JSON
    /// Web Key Set.
    Local { secret: String },

    /// A JWKS endpoint the proxy fetches keys from itself.
    Remote { url: String },
}

/// A complete parsed configuration: the whole entity set replaced on each
/// reload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntitySet {
    pub listeners: Vec<Listener>,
    pub routes: Vec<Route>,
    pub clusters: Vec<Cluster>,
    pub authenticators: Vec<Authenticator>,
}
