use std::collections::BTreeMap;

use serde::Serialize;

use super::routes::{LinkRoute, LinkingConfig, ScreenName, Segment};

/// A deep link that matched a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLink {
    pub screen: ScreenName,
    pub params: BTreeMap<String, String>,
}

/// Outcome of resolving a URI. `Unmatched` is terminal and non-fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LinkResolution {
    Matched(ResolvedLink),
    Unmatched,
}

/// Maps incoming URIs to screens using a [`LinkingConfig`].
#[derive(Debug, Clone)]
pub struct LinkResolver {
    config: LinkingConfig,
}

impl LinkResolver {
    pub fn new(config: LinkingConfig) -> Self {
        Self { config }
    }

    /// Resolve a URI against the route table.
    ///
    /// Routes are tried in table order and the first match wins. Query pairs
    /// are merged into the params without overriding path parameters.
    pub fn resolve(&self, uri: &str) -> LinkResolution {
        let Some(rest) = strip_registered_prefix(&self.config.prefixes, uri) else {
            tracing::debug!("No registered prefix for {}", uri);
            return LinkResolution::Unmatched;
        };

        let rest = rest.strip_prefix('/').unwrap_or(rest);
        let rest = rest.split('#').next().unwrap_or_default();
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        let path = path.trim_end_matches('/');
        if path.is_empty() {
            return LinkResolution::Unmatched;
        }
        let segments: Vec<&str> = path.split('/').collect();

        for route in &self.config.routes {
            if let Some(mut params) = match_route(route, &segments) {
                if let Some(query) = query {
                    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                        params.entry(key.into_owned()).or_insert(value.into_owned());
                    }
                }
                tracing::debug!("Resolved {} to {}", uri, route.screen);
                return LinkResolution::Matched(ResolvedLink {
                    screen: route.screen,
                    params,
                });
            }
        }

        tracing::debug!("No route matches {}", uri);
        LinkResolution::Unmatched
    }
}

/// Strip the first registered prefix the URI starts with.
///
/// Comparison is ASCII case-insensitive. A prefix that does not end in a
/// separator only matches on a path boundary.
fn strip_registered_prefix<'a>(prefixes: &[String], uri: &'a str) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| {
        let head = uri.get(..prefix.len())?;
        if !head.eq_ignore_ascii_case(prefix) {
            return None;
        }
        let rest = &uri[prefix.len()..];
        let at_boundary = prefix.ends_with('/')
            || rest.is_empty()
            || rest.starts_with(['/', '?', '#']);
        at_boundary.then_some(rest)
    })
}

fn match_route(route: &LinkRoute, segments: &[&str]) -> Option<BTreeMap<String, String>> {
    let template = &route.pattern.segments;
    if template.len() != segments.len() {
        return None;
    }

    let mut params = BTreeMap::new();
    for (expected, actual) in template.iter().zip(segments) {
        match expected {
            Segment::Literal(literal) if literal.as_str() == *actual => {}
            Segment::Literal(_) => return None,
            Segment::Param(_) if actual.is_empty() => return None,
            Segment::Param(name) => {
                params.insert(name.clone(), (route.param_parser)(actual));
            }
        }
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linking::DEFAULT_PREFIXES;
    use proptest::prelude::*;

    fn resolver() -> LinkResolver {
        let mut prefixes: Vec<String> = DEFAULT_PREFIXES
            .iter()
            .map(|p| p.to_string())
            .collect();
        prefixes.push("https://ignitegym.app".to_string());
        LinkResolver::new(LinkingConfig::with_prefixes(prefixes).unwrap())
    }

    fn matched(screen: ScreenName, params: &[(&str, &str)]) -> LinkResolution {
        LinkResolution::Matched(ResolvedLink {
            screen,
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    #[test]
    fn test_exercise_link_resolves_with_id() {
        assert_eq!(
            resolver().resolve("igniteGym://exercise/42"),
            matched(ScreenName::Exercise, &[("exerciseId", "42")])
        );
    }

    #[test]
    fn test_unknown_path_is_unmatched() {
        assert_eq!(
            resolver().resolve("igniteGym://unknown/path"),
            LinkResolution::Unmatched
        );
    }

    #[test]
    fn test_unregistered_scheme_is_unmatched() {
        assert_eq!(
            resolver().resolve("otherApp://exercise/42"),
            LinkResolution::Unmatched
        );
    }

    #[test]
    fn test_id_is_not_validated() {
        assert_eq!(
            resolver().resolve("igniteGym://exercise/not-a-number"),
            matched(ScreenName::Exercise, &[("exerciseId", "not-a-number")])
        );
    }

    #[test]
    fn test_each_prefix_resolves() {
        let resolver = resolver();
        for uri in [
            "com.rocketseat.igniteGym://history",
            "exp+ignitegym://history",
            "https://ignitegym.app/history",
            "IGNITEGYM://history",
        ] {
            assert_eq!(resolver.resolve(uri), matched(ScreenName::History, &[]), "{}", uri);
        }
    }

    #[test]
    fn test_universal_link_requires_path_boundary() {
        assert_eq!(
            resolver().resolve("https://ignitegym.application/history"),
            LinkResolution::Unmatched
        );
    }

    #[test]
    fn test_leading_and_trailing_separators() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve("igniteGym:///profile/"),
            matched(ScreenName::Profile, &[])
        );
        assert_eq!(resolver.resolve("igniteGym://"), LinkResolution::Unmatched);
    }

    #[test]
    fn test_query_merges_without_overriding_path_params() {
        assert_eq!(
            resolver().resolve("igniteGym://exercise/42?exerciseId=7&from=push#top"),
            matched(
                ScreenName::Exercise,
                &[("exerciseId", "42"), ("from", "push")]
            )
        );
    }

    #[test]
    fn test_first_match_wins() {
        let mut config = LinkingConfig::with_prefixes(vec!["igniteGym://".to_string()]).unwrap();
        config.routes.insert(
            0,
            LinkRoute::new("exercise/:slug", ScreenName::Home).unwrap(),
        );
        let resolver = LinkResolver::new(config);

        assert_eq!(
            resolver.resolve("igniteGym://exercise/42"),
            matched(ScreenName::Home, &[("slug", "42")])
        );
    }

    proptest! {
        #[test]
        fn prop_resolve_never_panics(uri in "\\PC{0,64}") {
            let _ = resolver().resolve(&uri);
        }

        #[test]
        fn prop_any_exercise_id_passes_through(id in "[A-Za-z0-9_-]{1,24}") {
            let uri = format!("igniteGym://exercise/{}", id);
            prop_assert_eq!(
                resolver().resolve(&uri),
                matched(ScreenName::Exercise, &[("exerciseId", id.as_str())])
            );
        }
    }
}
