//! The route compiler.
//!
//! Emits rules in the strict order the consuming engine expects. The engine
//! composes overlapping matches, so later steps deliberately layer more
//! specific rules (bulk static sets, 404 exclusions) over the broad
//! catch-all and per-page proxy rules emitted first.

use std::collections::BTreeSet;

use edgerules_manifest::{BuildManifests, ConditionKind, RouteCondition};
use edgerules_pages::{FallbackPolicy, PageDescriptor, PageType, build_descriptors};
use edgerules_paths::{DATA_ROUTE_PREFIX, has_named_capture, pattern_to_regex};
use regex::Regex;
use serde::Serialize;

use crate::error::CompileError;
use crate::options::CompilerOptions;
use crate::rule::{
    Action, CachePolicy, Condition, MatchCriteria, Method, ONE_DAY, ONE_HOUR, ONE_YEAR, Rule,
};

/// Named origin for the application server.
const ORIGIN: &str = "origin";
/// Named origin for standalone-server builds.
const STANDALONE_ORIGIN: &str = "standalone";
/// Named origin handled by the remote-image proxy component.
const IMAGE_PROXY_ORIGIN: &str = "image-proxy";

/// Request path routed to the remote-image proxy.
const IMAGE_PROXY_PATH: &str = "/__edge__/image";
/// Request path of the service worker.
const SERVICE_WORKER_PATH: &str = "/service-worker.js";
/// Pre-baked not-found asset served by fallback-disabled rules.
const NOT_FOUND_ASSET: &str = "pages/404.html";
/// Cookie presented by preview-mode sessions.
const PREVIEW_COOKIE: &str = "__preview_token";

/// Redirect status when the declaration does not carry one.
const DEFAULT_REDIRECT_STATUS: u16 = 307;

/// Result of one compilation pass.
#[derive(Clone, Debug, Serialize)]
pub struct CompiledRoutes {
    /// Ordered rule list.
    pub rules: Vec<Rule>,
    /// Concrete paths to pre-fetch after deploy; HTML paths first, then
    /// data paths, each sorted.
    pub warmup: Vec<String>,
    /// Build identifier the pass was compiled against.
    pub build_id: Option<String>,
    pages: Vec<PageDescriptor>,
}

/// Diagnostic classification of one page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub page_type: PageType,
    pub fallback: Option<FallbackPolicy>,
}

impl CompiledRoutes {
    /// The descriptors this pass was compiled from.
    #[must_use]
    pub fn pages(&self) -> &[PageDescriptor] {
        &self.pages
    }

    /// Classification query for diagnostics: page name → type and fallback.
    #[must_use]
    pub fn classification(&self, name: &str) -> Option<Classification> {
        self.pages.iter().find(|p| p.name == name).map(|p| Classification {
            page_type: p.page_type,
            fallback: p.fallback,
        })
    }
}

/// Compile one rule set from loaded manifests.
///
/// Pure with respect to its inputs: the same manifests and options always
/// produce the identical rule list.
///
/// # Errors
///
/// Returns [`CompileError`] for conditions the engine cannot express or for
/// route patterns that fail to compile.
pub fn compile(
    manifests: &BuildManifests,
    options: &CompilerOptions,
) -> Result<CompiledRoutes, CompileError> {
    let pages = build_descriptors(manifests)?;
    let forced = middleware_forced(&pages, manifests);

    let compiler = RouteCompiler {
        manifests,
        options,
        pages: &pages,
        forced,
    };
    let (rules, warmup) = compiler.run()?;

    Ok(CompiledRoutes {
        rules,
        warmup,
        build_id: manifests.build_id.clone(),
        pages,
    })
}

struct RouteCompiler<'a> {
    manifests: &'a BuildManifests,
    options: &'a CompilerOptions,
    pages: &'a [PageDescriptor],
    /// Pages a middleware matcher covers; these always proxy.
    forced: BTreeSet<String>,
}

impl RouteCompiler<'_> {
    fn run(&self) -> Result<(Vec<Rule>, Vec<String>), CompileError> {
        let mut rules = Vec::new();

        // 1. Default catch-all.
        if self.options.default_catch_all {
            rules.push(Rule::new(
                MatchCriteria::pattern(self.with_base("/:path*")),
                self.proxy_actions(),
            ));
        }

        // 2. Per-page rules for origin-authoritative pages.
        self.emit_origin_pages(&mut rules);

        // 3. 404 rules for fallback-disabled dynamic pages.
        self.emit_not_found_rules(&mut rules);

        // 4./5. Bulk static sets.
        let (html_canonical, html_with_variants) = self.bulk_html_paths();
        if !html_with_variants.is_empty() {
            rules.push(self.bulk_html_rule(html_with_variants));
        }
        let data_paths = self.bulk_data_paths();
        if self.options.data_routes && !data_paths.is_empty() {
            rules.push(self.bulk_data_rule(data_paths.clone()));
        }

        // 6. Placeholder patterns that cannot join the bulk set.
        self.emit_placeholder_fallbacks(&mut rules);

        // 7. Static assets.
        self.emit_asset_rules(&mut rules);

        // 8. Remote-image proxy.
        rules.push(Rule::new(
            MatchCriteria::pattern(self.with_base(IMAGE_PROXY_PATH)),
            vec![
                Action::ProxyToOrigin {
                    origin: IMAGE_PROXY_ORIGIN.to_owned(),
                    transform: None,
                },
                Action::SetCachePolicy(CachePolicy {
                    edge_ttl: Some(ONE_DAY),
                    ..CachePolicy::default()
                }),
            ],
        ));

        // 9. Redirects and rewrites.
        self.emit_redirects(&mut rules)?;
        self.emit_rewrites(&mut rules)?;

        // 10. Service worker.
        if self.options.service_worker {
            rules.push(Rule::new(
                MatchCriteria::pattern(self.with_base(SERVICE_WORKER_PATH)),
                vec![
                    Action::ServeStatic {
                        path: "static/service-worker.js".to_owned(),
                        rewrite_source: None,
                    },
                    Action::SetCachePolicy(CachePolicy {
                        edge_ttl: Some(ONE_DAY),
                        ..CachePolicy::default()
                    }),
                ],
            ));
        }

        // 11. Warm-up list: side channel, not a rule.
        let mut warmup = html_canonical;
        if self.options.data_routes {
            warmup.extend(data_paths);
        }
        warmup.dedup();

        Ok((rules, warmup))
    }

    /// Prefix a path with the configured base path.
    ///
    /// The bare root is rewritten to the base path itself, never to an
    /// empty string.
    fn with_base(&self, path: &str) -> String {
        let base = self.manifests.routes.base_path.trim_end_matches('/');
        if base.is_empty() {
            path.to_owned()
        } else if path == "/" {
            base.to_owned()
        } else {
            format!("{base}{path}")
        }
    }

    fn proxy_actions(&self) -> Vec<Action> {
        if self.options.standalone_server {
            vec![
                Action::ProxyToOrigin {
                    origin: STANDALONE_ORIGIN.to_owned(),
                    transform: None,
                },
                Action::SetRequestHeader {
                    name: "x-forwarded-host".to_owned(),
                    value: "$host".to_owned(),
                },
            ]
        } else {
            vec![Action::ProxyToOrigin {
                origin: ORIGIN.to_owned(),
                transform: None,
            }]
        }
    }

    /// True if request freshness for this page is decided by the origin.
    ///
    /// Such pages never receive a compiler-imposed edge TTL: the origin's
    /// own freshness header must pass through untouched.
    fn is_origin_serving(&self, page: &PageDescriptor) -> bool {
        match page.page_type {
            PageType::Template => false,
            PageType::Ssr | PageType::Api | PageType::Isr => true,
            PageType::Ssg | PageType::Isg => self.forced.contains(&page.name),
        }
    }

    /// Step 2: SSR, API, and revalidating ISR pages proxy per page, HTML
    /// and data route each. Middleware-covered pages join this group.
    fn emit_origin_pages(&self, rules: &mut Vec<Rule>) {
        for page in self.pages {
            if page.page_type == PageType::Template || !self.is_origin_serving(page) {
                continue;
            }

            rules.push(Rule::new(
                MatchCriteria::pattern(self.with_base(&page.localized_route)),
                self.proxy_actions(),
            ));

            if self.options.data_routes
                && let Some(data_route) = &page.localized_data_route
            {
                rules.push(Rule::new(
                    MatchCriteria::pattern(self.with_base(data_route)),
                    self.proxy_actions(),
                ));
            }
        }
    }

    /// Step 3: a fallback-disabled dynamic page matches its abstract
    /// pattern minus every enumerated instance and serves the pre-baked
    /// 404 asset.
    fn emit_not_found_rules(&self, rules: &mut Vec<Rule>) {
        for page in self.pages {
            if page.fallback != Some(FallbackPolicy::NotFound)
                || self.forced.contains(&page.name)
            {
                continue;
            }

            let mut except = BTreeSet::new();
            for entry in &page.prerendered_routes {
                let path = self.with_base(&entry.route);
                if path != "/" {
                    except.insert(format!("{path}/"));
                }
                except.insert(path);
            }

            rules.push(Rule::new(
                MatchCriteria::pattern_except(
                    self.with_base(&page.localized_route),
                    except.into_iter().collect(),
                ),
                vec![
                    Action::ServeStatic {
                        path: NOT_FOUND_ASSET.to_owned(),
                        rewrite_source: None,
                    },
                    Action::SetResponseCode(404),
                    Action::SetCachePolicy(CachePolicy {
                        edge_ttl: Some(ONE_DAY),
                        browser_ttl: None,
                        cacheable_status_codes: vec![404],
                    }),
                ],
            ));
        }
    }

    /// Pages whose never-checked instances may be served from pre-baked
    /// artifacts without consulting the origin.
    fn static_family(&self) -> impl Iterator<Item = &PageDescriptor> {
        self.pages.iter().filter(|page| {
            matches!(
                page.page_type,
                PageType::Ssg | PageType::Isg | PageType::Isr
            ) && !self.forced.contains(&page.name)
        })
    }

    /// Step 4 input: canonical bulk HTML paths and the same set with
    /// trailing-slash variants (except the root).
    fn bulk_html_paths(&self) -> (Vec<String>, Vec<String>) {
        let mut canonical = BTreeSet::new();
        for page in self.static_family() {
            for entry in &page.prerendered_routes {
                if entry.is_never_checked() {
                    canonical.insert(self.with_base(&entry.route));
                }
            }
        }

        let mut with_variants = BTreeSet::new();
        for path in &canonical {
            if path != "/" {
                with_variants.insert(format!("{path}/"));
            }
            with_variants.insert(path.clone());
        }

        (
            canonical.into_iter().collect(),
            with_variants.into_iter().collect(),
        )
    }

    /// Step 5 input: data paths corresponding to the bulk HTML set.
    fn bulk_data_paths(&self) -> Vec<String> {
        let mut paths = BTreeSet::new();
        for page in self.static_family() {
            for entry in &page.prerendered_routes {
                if entry.is_never_checked()
                    && let Some(data_route) = &entry.data_route
                {
                    paths.insert(self.with_base(data_route));
                }
            }
        }
        paths.into_iter().collect()
    }

    /// Step 4: one set-membership rule over all concrete HTML paths.
    fn bulk_html_rule(&self, paths: Vec<String>) -> Rule {
        let mut criteria = MatchCriteria::any_of(paths);
        if let Some(condition) = self.preview_bypass() {
            criteria = criteria.with_condition(condition);
        }

        Rule::new(
            criteria,
            vec![
                Action::ServeStatic {
                    path: "pages/:path.html".to_owned(),
                    rewrite_source: None,
                },
                Action::SetResponseCode(200),
                Action::SetCachePolicy(CachePolicy {
                    edge_ttl: Some(ONE_YEAR),
                    browser_ttl: None,
                    cacheable_status_codes: Vec::new(),
                }),
            ],
        )
    }

    /// Step 5: the data-route counterpart, served from the cross-deploy
    /// permanent namespace. Browser caching is safe forever because every
    /// path embeds a build id.
    fn bulk_data_rule(&self, paths: Vec<String>) -> Rule {
        let mut criteria = MatchCriteria::any_of(paths);
        if let Some(condition) = self.preview_bypass() {
            criteria = criteria.with_condition(condition);
        }

        Rule::new(
            criteria,
            vec![
                Action::ServeStatic {
                    path: "data/:path*".to_owned(),
                    rewrite_source: Some(self.with_base(&format!("{DATA_ROUTE_PREFIX}/:path*"))),
                },
                Action::SetCachePolicy(CachePolicy {
                    edge_ttl: Some(ONE_YEAR),
                    browser_ttl: Some(ONE_YEAR),
                    cacheable_status_codes: Vec::new(),
                }),
            ],
        )
    }

    /// Step 6: a placeholder-fallback dynamic page with no data route gets
    /// its own pattern rule, guarded to GET/HEAD so it never intercepts
    /// same-path POST actions.
    fn emit_placeholder_fallbacks(&self, rules: &mut Vec<Rule>) {
        for page in self.pages {
            if page.fallback != Some(FallbackPolicy::Placeholder)
                || page.data_route.is_some()
                || self.is_origin_serving(page)
            {
                continue;
            }

            let asset = page
                .fallback_page
                .as_ref()
                .map_or_else(|| "pages/:path.html".to_owned(), |p| format!("pages{p}"));

            rules.push(Rule::new(
                MatchCriteria::pattern(self.with_base(&page.localized_route))
                    .with_methods(vec![Method::Get, Method::Head]),
                vec![
                    Action::ServeStatic {
                        path: asset,
                        rewrite_source: None,
                    },
                    Action::SetCachePolicy(CachePolicy {
                        edge_ttl: Some(ONE_DAY),
                        ..CachePolicy::default()
                    }),
                ],
            ));
        }
    }

    /// Step 7: hashed build assets are immutable; public assets get a
    /// short browser TTL so edits show up without a deploy-scoped name.
    fn emit_asset_rules(&self, rules: &mut Vec<Rule>) {
        rules.push(Rule::new(
            MatchCriteria::pattern(self.with_base("/static/:path*")),
            vec![
                Action::ServeStatic {
                    path: "static/:path*".to_owned(),
                    rewrite_source: None,
                },
                Action::SetCachePolicy(CachePolicy {
                    edge_ttl: Some(ONE_YEAR),
                    browser_ttl: Some(ONE_YEAR),
                    cacheable_status_codes: Vec::new(),
                }),
            ],
        ));

        if !self.manifests.public_assets.is_empty() {
            let paths = self
                .manifests
                .public_assets
                .iter()
                .map(|p| self.with_base(p))
                .collect();
            rules.push(Rule::new(
                MatchCriteria::any_of(paths),
                vec![
                    Action::ServeStatic {
                        path: "public/:path*".to_owned(),
                        rewrite_source: None,
                    },
                    Action::SetCachePolicy(CachePolicy {
                        edge_ttl: Some(ONE_DAY),
                        browser_ttl: Some(ONE_HOUR),
                        cacheable_status_codes: Vec::new(),
                    }),
                ],
            ));
        }
    }

    /// Step 9a: redirects. Ordinary declarations compile to a redirect
    /// action; framework-internal trailing-slash normalization compiles to
    /// a raw-regex redirect plus a canceling identity rewrite, so the
    /// engine's own slash normalization cannot loop against it.
    fn emit_redirects(&self, rules: &mut Vec<Rule>) -> Result<(), CompileError> {
        for redirect in &self.manifests.routes.redirects {
            let conditions = convert_conditions(&redirect.conditions)?;
            let status = redirect.status_code.unwrap_or(DEFAULT_REDIRECT_STATUS);
            let redirect_action = Action::Redirect {
                destination: redirect.destination.clone(),
                status,
            };

            if redirect.internal {
                let mut criteria = MatchCriteria::regex(raw_regex(&redirect.source)?);
                criteria.conditions = conditions;
                rules.push(Rule::new(criteria, vec![redirect_action]));

                rules.push(Rule::new(
                    MatchCriteria::pattern(redirect.source.clone()),
                    vec![Action::Rewrite {
                        source: redirect.source.clone(),
                        destination: redirect.source.clone(),
                    }],
                ));
            } else {
                let mut criteria = MatchCriteria::pattern(redirect.source.clone());
                criteria.conditions = conditions;
                rules.push(Rule::new(criteria, vec![redirect_action]));
            }
        }
        Ok(())
    }

    /// Step 9b: rewrites. A rewrite whose destination matches no compiled
    /// route is skipped with a warning; the rest of the pass continues.
    fn emit_rewrites(&self, rules: &mut Vec<Rule>) -> Result<(), CompileError> {
        let rewrites = self.manifests.routes.rewrites();
        if rewrites.is_empty() {
            return Ok(());
        }

        let route_regexes = self.compiled_route_regexes()?;

        for rewrite in rewrites {
            let conditions = convert_conditions(&rewrite.conditions)?;

            if !self.destination_resolves(&rewrite.destination, &route_regexes) {
                tracing::warn!(
                    source = %rewrite.source,
                    destination = %rewrite.destination,
                    "rewrite destination matches no compiled route, skipping"
                );
                continue;
            }

            let mut criteria = MatchCriteria::pattern(rewrite.source.clone());
            criteria.conditions = conditions;
            rules.push(Rule::new(
                criteria,
                vec![Action::Rewrite {
                    source: rewrite.source,
                    destination: rewrite.destination,
                }],
            ));
        }
        Ok(())
    }

    fn compiled_route_regexes(&self) -> Result<Vec<Regex>, CompileError> {
        let mut regexes = Vec::new();
        for page in self.pages {
            if page.page_type == PageType::Template {
                continue;
            }
            regexes.push(pattern_to_regex(&self.with_base(&page.localized_route))?);
            if let Some(data_route) = &page.localized_data_route {
                regexes.push(pattern_to_regex(&self.with_base(data_route))?);
            }
        }
        Ok(regexes)
    }

    fn destination_resolves(&self, destination: &str, route_regexes: &[Regex]) -> bool {
        let path = destination.split('?').next().unwrap_or(destination);
        // Parameterized destinations resolve per request.
        if path.contains(':') {
            return true;
        }
        route_regexes.iter().any(|r| r.is_match(path))
            || self.manifests.public_assets.iter().any(|p| p == path)
            || path.starts_with("/static/")
    }

    /// Preview sessions bypass every bulk static rule so editors always
    /// reach the origin.
    fn preview_bypass(&self) -> Option<Condition> {
        self.manifests
            .prerender
            .preview_mode_token
            .as_ref()
            .map(|_| Condition {
                kind: ConditionKind::Cookie,
                key: PREVIEW_COOKIE.to_owned(),
                value: None,
                negate: true,
            })
    }
}

/// Convert registry conditions, rejecting capture syntax the engine's
/// pattern language cannot express.
fn convert_conditions(conditions: &[RouteCondition]) -> Result<Vec<Condition>, CompileError> {
    conditions
        .iter()
        .map(|c| {
            if let Some(value) = &c.value
                && has_named_capture(value)
            {
                return Err(CompileError::UnsupportedCondition {
                    key: c.key.clone(),
                    value: value.clone(),
                });
            }
            Ok(Condition {
                kind: c.kind,
                key: c.key.clone(),
                value: c.value.clone(),
                negate: false,
            })
        })
        .collect()
}

/// Convert a colon pattern into a raw regex, preserving a significant
/// trailing slash (the defining feature of internal slash-normalization
/// redirect sources).
fn raw_regex(source: &str) -> Result<String, CompileError> {
    let trailing_slash = source.len() > 1 && source.ends_with('/');
    let trimmed = if trailing_slash {
        &source[..source.len() - 1]
    } else {
        source
    };

    let regex = pattern_to_regex(trimmed)?;
    let body = regex
        .as_str()
        .trim_start_matches('^')
        .trim_end_matches('$')
        .to_owned();

    Ok(if trailing_slash {
        format!("^{body}/$")
    } else {
        format!("^{body}$")
    })
}

/// Page names covered by a middleware matcher.
///
/// Request-time code may rewrite these, so they always proxy and never
/// enter a bulk static set. Coverage is decided against concrete paths: a
/// page is covered when its name or any prerendered instance matches.
fn middleware_forced(pages: &[PageDescriptor], manifests: &BuildManifests) -> BTreeSet<String> {
    let mut forced = BTreeSet::new();
    for matcher in &manifests.middleware.matchers {
        let regex = match Regex::new(&matcher.regexp) {
            Ok(regex) => regex,
            Err(error) => {
                tracing::warn!(
                    regexp = %matcher.regexp,
                    error = %error,
                    "ignoring unparsable middleware matcher"
                );
                continue;
            }
        };

        for page in pages {
            if page.page_type == PageType::Template {
                continue;
            }
            let covered = regex.is_match(&page.name)
                || page
                    .prerendered_routes
                    .iter()
                    .any(|e| regex.is_match(&e.concrete_path));
            if covered {
                forced.insert(page.name.clone());
            }
        }
    }
    forced
}
