//! Translates the abstract request-match specification into Envoy route
//! match predicates.

use crate::types::{HeaderMatcher, PathSpecifier, RouteMatch, StringMatcher};
use xds_controller_core::RequestMatch;

/// Builds the Envoy match predicate for a request-match specification.
///
/// A configured prefix takes precedence over an exact path when both are
/// set. Header constraints combine with the path predicate by implicit AND.
/// An empty specification yields a predicate that matches every request.
pub fn build_match(spec: &RequestMatch) -> RouteMatch {
    let path = match (&spec.prefix, &spec.path) {
        (Some(prefix), _) => Some(PathSpecifier::Prefix(prefix.clone())),
        (None, Some(path)) => Some(PathSpecifier::Path(path.clone())),
        (None, None) => None,
    };

    let headers = spec
        .headers
        .iter()
        .map(|h| HeaderMatcher {
            name: h.name.clone(),
            string_match: StringMatcher::Exact(h.value.clone()),
        })
        .collect();

    RouteMatch { path, headers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xds_controller_core::HeaderMatch;

    #[test]
    fn prefix_wins_over_exact_path() {
        let spec = RequestMatch {
            prefix: Some("/api/".to_string()),
            path: Some("/api/users".to_string()),
            headers: vec![],
        };
        assert_eq!(
            build_match(&spec).path,
            Some(PathSpecifier::Prefix("/api/".to_string()))
        );
    }

    #[test]
    fn exact_path_used_when_no_prefix() {
        let spec = RequestMatch {
            prefix: None,
            path: Some("/healthz".to_string()),
            headers: vec![],
        };
        assert_eq!(
            build_match(&spec).path,
            Some(PathSpecifier::Path("/healthz".to_string()))
        );
    }

    #[test]
    fn headers_become_exact_matchers() {
        let spec = RequestMatch {
            prefix: Some("/".to_string()),
            path: None,
            headers: vec![
                HeaderMatch {
                    name: "x-tenant".to_string(),
                    value: "acme".to_string(),
                },
                HeaderMatch {
                    name: "x-canary".to_string(),
                    value: "true".to_string(),
                },
            ],
        };

        let m = build_match(&spec);
        assert_eq!(m.headers.len(), 2);
        assert_eq!(
            m.headers[0].string_match,
            StringMatcher::Exact("acme".to_string())
        );
    }

    #[test]
    fn empty_spec_matches_everything() {
        let m = build_match(&RequestMatch::default());
        assert_eq!(m, RouteMatch::default());
    }
}
