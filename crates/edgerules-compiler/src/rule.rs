//! The edge rule model.
//!
//! A [`Rule`] pairs match criteria with a list of actions. The engine that
//! executes these rules composes overlapping matches: every rule whose
//! criteria match a request contributes its actions, with later rules
//! overriding earlier ones per action kind. The compiler relies on that
//! property when it layers bulk static rules over the default catch-all.

use edgerules_manifest::ConditionKind;
use serde::Serialize;

/// One year in seconds; the "effectively immutable" edge TTL.
pub const ONE_YEAR: u64 = 365 * 24 * 60 * 60;

/// One day in seconds.
pub const ONE_DAY: u64 = 24 * 60 * 60;

/// One hour in seconds.
pub const ONE_HOUR: u64 = 60 * 60;

/// HTTP methods a rule can be restricted to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
}

/// Path matching strategies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PathMatch {
    /// A single colon-syntax pattern.
    Pattern(String),
    /// Set membership over explicit paths; one rule instead of N.
    AnyOf(Vec<String>),
    /// Pattern match with explicit exclusions (negated set-membership).
    PatternExcept {
        pattern: String,
        except: Vec<String>,
    },
    /// Raw regex, for matches the colon syntax cannot express.
    Regex(String),
}

/// A request predicate evaluated by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Condition {
    /// Value source.
    pub kind: ConditionKind,
    /// Header/cookie/query-parameter name.
    pub key: String,
    /// Value regex; `None` tests for presence only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Invert the predicate.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub negate: bool,
}

/// Match criteria for one rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MatchCriteria {
    pub path: PathMatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<Method>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl MatchCriteria {
    /// Criteria matching a single pattern.
    #[must_use]
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            path: PathMatch::Pattern(pattern.into()),
            methods: None,
            conditions: Vec::new(),
        }
    }

    /// Criteria matching any path in a set.
    #[must_use]
    pub fn any_of(paths: Vec<String>) -> Self {
        Self {
            path: PathMatch::AnyOf(paths),
            methods: None,
            conditions: Vec::new(),
        }
    }

    /// Criteria matching a pattern minus explicit exclusions.
    #[must_use]
    pub fn pattern_except(pattern: impl Into<String>, except: Vec<String>) -> Self {
        Self {
            path: PathMatch::PatternExcept {
                pattern: pattern.into(),
                except,
            },
            methods: None,
            conditions: Vec::new(),
        }
    }

    /// Criteria matching a raw regex.
    #[must_use]
    pub fn regex(source: impl Into<String>) -> Self {
        Self {
            path: PathMatch::Regex(source.into()),
            methods: None,
            conditions: Vec::new(),
        }
    }

    /// Restrict to the given methods.
    #[must_use]
    pub fn with_methods(mut self, methods: Vec<Method>) -> Self {
        self.methods = Some(methods);
        self
    }

    /// Add a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// Cache policy attached by [`Action::SetCachePolicy`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachePolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_ttl: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_ttl: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cacheable_status_codes: Vec<u16>,
}

/// One action contributed by a matching rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    /// Serve a deployed asset. `rewrite_source` maps the request path into
    /// the asset namespace when the two differ.
    ServeStatic {
        path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        rewrite_source: Option<String>,
    },
    /// Proxy the request to a named origin, optionally through a
    /// request-transform hook.
    ProxyToOrigin {
        origin: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        transform: Option<String>,
    },
    /// Attach a cache policy.
    SetCachePolicy(CachePolicy),
    /// Force the response status code.
    SetResponseCode(u16),
    /// Set a request header before forwarding.
    SetRequestHeader { name: String, value: String },
    /// Redirect to a destination with a status code.
    Redirect { destination: String, status: u16 },
    /// Rewrite the request path.
    Rewrite { source: String, destination: String },
}

/// One compiled routing rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub criteria: MatchCriteria,
    pub actions: Vec<Action>,
}

impl Rule {
    /// Create a rule from criteria and actions.
    #[must_use]
    pub fn new(criteria: MatchCriteria, actions: Vec<Action>) -> Self {
        Self { criteria, actions }
    }

    /// The edge TTL this rule imposes, if any of its actions set one.
    #[must_use]
    pub fn imposed_edge_ttl(&self) -> Option<u64> {
        self.actions.iter().find_map(|action| match action {
            Action::SetCachePolicy(policy) => policy.edge_ttl,
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_criteria_builders() {
        let criteria = MatchCriteria::pattern("/blog/:slug")
            .with_methods(vec![Method::Get, Method::Head])
            .with_condition(Condition {
                kind: ConditionKind::Cookie,
                key: "__preview_token".to_owned(),
                value: None,
                negate: true,
            });

        assert_eq!(
            criteria.path,
            PathMatch::Pattern("/blog/:slug".to_owned())
        );
        assert_eq!(criteria.methods, Some(vec![Method::Get, Method::Head]));
        assert_eq!(criteria.conditions.len(), 1);
        assert!(criteria.conditions[0].negate);
    }

    #[test]
    fn test_imposed_edge_ttl() {
        let rule = Rule::new(
            MatchCriteria::pattern("/a"),
            vec![
                Action::SetResponseCode(200),
                Action::SetCachePolicy(CachePolicy {
                    edge_ttl: Some(ONE_YEAR),
                    ..CachePolicy::default()
                }),
            ],
        );

        assert_eq!(rule.imposed_edge_ttl(), Some(ONE_YEAR));
    }

    #[test]
    fn test_no_imposed_ttl_for_proxy_rule() {
        let rule = Rule::new(
            MatchCriteria::pattern("/a"),
            vec![Action::ProxyToOrigin {
                origin: "origin".to_owned(),
                transform: None,
            }],
        );

        assert_eq!(rule.imposed_edge_ttl(), None);
    }

    #[test]
    fn test_rule_serialization_shape() {
        let rule = Rule::new(
            MatchCriteria::any_of(vec!["/a".to_owned(), "/b".to_owned()]),
            vec![Action::ServeStatic {
                path: "pages/:path.html".to_owned(),
                rewrite_source: None,
            }],
        );

        let json = serde_json::to_value(&rule).unwrap();

        assert_eq!(json["criteria"]["path"]["anyOf"][0], "/a");
        assert_eq!(
            json["actions"][0]["serveStatic"]["path"],
            "pages/:path.html"
        );
        assert!(json["criteria"].get("methods").is_none());
    }

    #[test]
    fn test_condition_negate_skipped_when_false() {
        let condition = Condition {
            kind: ConditionKind::Header,
            key: "x-beta".to_owned(),
            value: Some("on".to_owned()),
            negate: false,
        };

        let json = serde_json::to_value(&condition).unwrap();

        assert!(json.get("negate").is_none());
    }
}
