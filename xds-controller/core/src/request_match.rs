use serde::Deserialize;

/// A boolean test over an incoming request's path and headers.
///
/// Used both for routing and for selecting which authentication policy
/// applies. When both `prefix` and `path` are set, the prefix predicate takes
/// precedence. Header constraints are AND-combined with the path predicate.
///
/// An empty match (no prefix, no path, no headers) matches every request;
/// callers attaching authenticators should treat that as suspicious.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestMatch {
    pub prefix: Option<String>,
    pub path: Option<String>,
    #[serde(default)]
    pub headers: Vec<HeaderMatch>,
}

/// An exact-value constraint on a single request header.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderMatch {
    pub name: String,
    pub value: String,
}

/// A path rewrite applied before the request is forwarded upstream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rewrite {
    pub prefix: Option<String>,
}

// === impl RequestMatch ===

impl RequestMatch {
    /// Returns true if this match constrains nothing, i.e. matches all
    /// requests.
    pub fn is_unconstrained(&self) -> bool {
        self.prefix.is_none() && self.path.is_none() && self.headers.is_empty()
    }
}
