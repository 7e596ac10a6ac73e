use serde::Serialize;

use crate::config::GateConfig;

/// Canonical form of a raw request path, used for every gate decision.
///
/// Percent-decodes once, collapses repeated `/`, drops `.` segments and
/// resolves `..` without climbing above the root. Invalid UTF-8 is replaced
/// rather than rejected so the result still classifies.
pub fn canonical_path(raw: &str) -> String {
    let decoded = urlencoding::decode_binary(raw.as_bytes());
    let decoded = String::from_utf8_lossy(&decoded);

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Normalize a request path: no trailing slash except for the root
fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Segment-aware prefix test: `/programs` covers `/programs/12` but not `/programsx`
fn has_prefix(path: &str, prefix: &str) -> bool {
    let path = normalize(path);
    let prefix = normalize(prefix);

    if prefix == "/" {
        return true;
    }

    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PrefixRule {
    prefix: String,
    include: bool,
}

/// Ordered prefix list; the first matching rule decides membership
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixList {
    rules: Vec<PrefixRule>,
}

impl PrefixList {
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Self {
        let rules = entries
            .iter()
            .map(|entry| entry.as_ref().trim())
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.strip_prefix('!') {
                Some(prefix) => PrefixRule { prefix: prefix.to_string(), include: false },
                None => PrefixRule { prefix: entry.to_string(), include: true },
            })
            .collect();

        Self { rules }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.rules
            .iter()
            .find(|rule| has_prefix(path, &rule.prefix))
            .is_some_and(|rule| rule.include)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteClass {
    pub protected: bool,
    pub billable: bool,
}

/// Path classification plus the gate's fixed destinations
#[derive(Debug, Clone)]
pub struct GatePolicy {
    protected: PrefixList,
    billable: PrefixList,
    login_path: String,
    dashboard_path: String,
    billing_path: String,
}

impl GatePolicy {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            protected: PrefixList::parse(&config.protected_prefixes),
            billable: PrefixList::parse(&config.billable_prefixes),
            login_path: normalize(&config.login_path).to_string(),
            dashboard_path: normalize(&config.dashboard_path).to_string(),
            billing_path: normalize(&config.billing_path).to_string(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn dashboard_path(&self) -> &str {
        &self.dashboard_path
    }

    pub fn billing_path(&self) -> &str {
        &self.billing_path
    }

    pub fn is_login(&self, path: &str) -> bool {
        normalize(path) == self.login_path
    }

    /// The login page is never protected, whatever the prefix list says
    pub fn is_protected(&self, path: &str) -> bool {
        !self.is_login(path) && self.protected.contains(path)
    }

    /// Nothing under the billing page is billable, whatever the prefix list says
    pub fn is_billable(&self, path: &str) -> bool {
        !has_prefix(path, &self.billing_path) && self.billable.contains(path)
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        RouteClass {
            protected: self.is_protected(path),
            billable: self.is_billable(path),
        }
    }

    /// Whether `decide` can use organization state for this request; lets the
    /// caller skip the lookup entirely otherwise.
    pub fn needs_organization_state(&self, path: &str, authenticated: bool) -> bool {
        authenticated && self.is_billable(path)
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::from_config(&GateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(protected: &[&str], billable: &[&str]) -> GatePolicy {
        GatePolicy::from_config(&GateConfig {
            protected_prefixes: protected.iter().map(|s| s.to_string()).collect(),
            billable_prefixes: billable.iter().map(|s| s.to_string()).collect(),
            ..GateConfig::default()
        })
    }

    #[test]
    fn prefix_match_respects_segments() {
        assert!(has_prefix("/programs", "/programs"));
        assert!(has_prefix("/programs/42/edit", "/programs"));
        assert!(has_prefix("/programs/", "/programs/"));
        assert!(!has_prefix("/programsx", "/programs"));
        assert!(has_prefix("/anything", "/"));
    }

    #[test]
    fn canonical_path_undoes_encoding_tricks() {
        assert_eq!(canonical_path("/programs"), "/programs");
        assert_eq!(canonical_path("//programs"), "/programs");
        assert_eq!(canonical_path("/%70rograms/3"), "/programs/3");
        assert_eq!(canonical_path("/./clients//7/"), "/clients/7");
        assert_eq!(canonical_path("/pricing/../dashboard"), "/dashboard");
        assert_eq!(canonical_path("/../../settings"), "/settings");
        assert_eq!(canonical_path("/"), "/");
        assert_eq!(canonical_path(""), "/");

        let policy = GatePolicy::default();
        assert!(policy.is_protected(&canonical_path("//programs")));
        assert!(policy.is_protected(&canonical_path("/%70rograms")));
    }

    #[test]
    fn first_match_wins_with_exclusions() {
        let list = PrefixList::parse(&["!/clients/public", "/clients"]);
        assert!(list.contains("/clients/7"));
        assert!(!list.contains("/clients/public/card"));

        let shadowed = PrefixList::parse(&["/clients", "!/clients/public"]);
        assert!(shadowed.contains("/clients/public/card"));
    }

    #[test]
    fn unmatched_is_public_and_not_billable() {
        let policy = GatePolicy::default();
        assert_eq!(
            policy.classify("/pricing"),
            RouteClass { protected: false, billable: false }
        );
        assert_eq!(
            policy.classify("/programs/3"),
            RouteClass { protected: true, billable: true }
        );
    }

    #[test]
    fn login_never_protected_even_under_catch_all() {
        let policy = policy(&["/"], &[]);
        assert!(!policy.is_protected("/login"));
        assert!(!policy.is_protected("/login/"));
        assert!(policy.is_protected("/dashboard"));
    }

    #[test]
    fn billing_never_billable_even_under_catch_all() {
        let policy = policy(&["/"], &["/"]);
        assert!(!policy.is_billable("/billing"));
        assert!(!policy.is_billable("/billing/invoices"));
        assert!(policy.is_protected("/billing"));
        assert!(policy.is_billable("/programs"));
    }

    #[test]
    fn organization_state_only_for_authenticated_billable() {
        let policy = GatePolicy::default();
        assert!(policy.needs_organization_state("/programs", true));
        assert!(!policy.needs_organization_state("/programs", false));
        assert!(!policy.needs_organization_state("/billing", true));
    }
}
