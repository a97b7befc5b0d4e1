//! Version resolution against remote references
//!
//! Maps a dependency's version constraint and the tags/branches a remote
//! offers to one concrete reference.
//!
//! Constraint grammar: exact `1.2.3`, `^`/`~` ranges, `>`, `>=`, `<`, `<=`,
//! space-separated AND, `||` OR, npm hyphen ranges (`1.0.0 - 2.0.0`),
//! `x`/`X`/`*` wildcards and the sentinel `>0.0.0`. A leading `v` before a
//! digit is ignored on both constraints and reference names.
//!
//! Among matching references the greatest version wins. Ties between
//! references naming the same version are broken by, in order: tags before
//! branches, `v`-prefixed names before bare ones, then the lexicographically
//! smallest name.

use crate::error::{BossError, BossResult};
use crate::lock::LockedDependency;
use semver::{Op, Version, VersionReq};
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, warn};

/// Kind of git reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Tag,
    Branch,
}

/// A tag or branch offered by a remote, by short name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub name: String,
    pub kind: ReferenceKind,
}

impl Reference {
    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ReferenceKind::Tag,
        }
    }

    pub fn branch(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ReferenceKind::Branch,
        }
    }

    pub fn is_tag(&self) -> bool {
        self.kind == ReferenceKind::Tag
    }

    /// Semantic version named by this reference, if any
    pub fn version(&self) -> Option<Version> {
        parse_version(&self.name)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Strip a leading `v`/`V` when it is followed by a digit
pub fn strip_v_prefix(name: &str) -> &str {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some('v' | 'V'), Some(c)) if c.is_ascii_digit() => &name[1..],
        _ => name,
    }
}

/// Parse a reference or locked version name as semver
pub fn parse_version(name: &str) -> Option<Version> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }
    Version::parse(strip_v_prefix(trimmed)).ok()
}

/// A parsed version constraint: any alternative may match
#[derive(Debug, Clone)]
pub struct Constraint {
    alternatives: Vec<VersionReq>,
}

impl Constraint {
    /// Parse a constraint, rewriting npm-isms when the strict form fails
    pub fn parse(spec: &str) -> BossResult<Self> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(BossError::InvalidConstraint {
                spec: spec.to_string(),
                reason: "empty constraint".to_string(),
            });
        }

        let alternatives = trimmed
            .split("||")
            .map(|part| {
                parse_alternative(part).ok_or_else(|| BossError::InvalidConstraint {
                    spec: spec.to_string(),
                    reason: format!("cannot parse '{}'", part.trim()),
                })
            })
            .collect::<BossResult<Vec<_>>>()?;

        Ok(Self { alternatives })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// Whether the named version satisfies the constraint
    pub fn matches_name(&self, name: &str) -> bool {
        parse_version(name).is_some_and(|v| self.matches(&v))
    }

    /// Smallest version any alternative could accept
    ///
    /// Upper-bound-only alternatives (`<2.0.0`) bound nothing and yield 0.0.0.
    pub fn lower_bound(&self) -> Version {
        self.alternatives
            .iter()
            .map(req_lower_bound)
            .min()
            .unwrap_or_else(|| Version::new(0, 0, 0))
    }
}

fn req_lower_bound(req: &VersionReq) -> Version {
    req.comparators
        .iter()
        .filter(|c| !matches!(c.op, Op::Less | Op::LessEq))
        .map(|c| {
            let mut version = Version::new(c.major, c.minor.unwrap_or(0), c.patch.unwrap_or(0));
            version.pre = c.pre.clone();
            version
        })
        .max()
        .unwrap_or_else(|| Version::new(0, 0, 0))
}

fn parse_alternative(part: &str) -> Option<VersionReq> {
    let part = part.trim();
    if part.is_empty() {
        return None;
    }
    to_version_req(part).or_else(|| to_version_req(&rewrite_npm(part)))
}

/// Translate space-separated comparators into a semver requirement
///
/// Bare versions are exact matches, as in npm, not cargo's implicit caret.
fn to_version_req(part: &str) -> Option<VersionReq> {
    let mut comparators: Vec<String> = Vec::new();
    let mut pending_op = String::new();

    for token in part.split([' ', ',', '\t']).filter(|t| !t.is_empty()) {
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '^' | '~')) {
            pending_op.push_str(token);
            continue;
        }
        let op_len = token
            .find(|c: char| !matches!(c, '<' | '>' | '=' | '^' | '~'))
            .unwrap_or(token.len());
        let (op, version) = token.split_at(op_len);
        let op = format!("{}{}", pending_op, op);
        pending_op.clear();

        let version = strip_v_prefix(version);
        let starts_numeric = version.starts_with(|c: char| c.is_ascii_digit());
        if op.is_empty() && starts_numeric && !version.contains(['*', 'x', 'X']) {
            comparators.push(format!("={}", version));
        } else {
            comparators.push(format!("{}{}", op, version));
        }
    }

    if !pending_op.is_empty() || comparators.is_empty() {
        return None;
    }
    VersionReq::parse(&comparators.join(", ")).ok()
}

/// Rewrite npm hyphen ranges and `x` wildcards into comparator syntax
fn rewrite_npm(part: &str) -> String {
    let hyphenated = match part.split_once(" - ") {
        Some((low, high)) => format!(">={} <={}", low.trim(), high.trim()),
        None => part.to_string(),
    };

    hyphenated
        .split(' ')
        .map(|token| {
            token
                .split('.')
                .map(|segment| match segment {
                    "x" | "X" => "*",
                    other => other,
                })
                .collect::<Vec<_>>()
                .join(".")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pick the reference a dependency should be checked out at
///
/// With `use_locked_version`, a locked version that names an existing tag
/// and still satisfies `spec` is returned as is. Otherwise the greatest
/// reference matching `spec` wins; when `spec` is not a constraint it is
/// matched literally against reference names. `None` means the caller falls
/// back to the default branch.
pub fn resolve(
    spec: &str,
    refs: &[Reference],
    locked: Option<&LockedDependency>,
    use_locked_version: bool,
) -> Option<Reference> {
    let constraint = match Constraint::parse(spec) {
        Ok(constraint) => Some(constraint),
        Err(e) => {
            warn!("{}, falling back to exact reference match", e);
            None
        }
    };

    if use_locked_version {
        if let Some(locked) = locked.filter(|l| !l.version.is_empty()) {
            let still_allowed = constraint
                .as_ref()
                .is_none_or(|c| c.matches_name(&locked.version));
            if still_allowed {
                if let Some(tag) = refs.iter().find(|r| r.is_tag() && r.name == locked.version) {
                    debug!("Using locked version {}", tag.name);
                    return Some(tag.clone());
                }
            }
        }
    }

    match constraint {
        Some(constraint) => best_match(&constraint, refs),
        None => refs.iter().find(|r| r.name == spec.trim()).cloned(),
    }
}

/// Greatest matching reference, ties broken as documented at module level
pub fn best_match(constraint: &Constraint, refs: &[Reference]) -> Option<Reference> {
    refs.iter()
        .filter_map(|r| r.version().map(|v| (v, r)))
        .filter(|(v, _)| constraint.matches(v))
        .max_by(|(va, a), (vb, b)| va.cmp(vb).then_with(|| tie_break(a, b)))
        .map(|(_, r)| r.clone())
}

/// `Greater` means `a` is preferred
fn tie_break(a: &Reference, b: &Reference) -> Ordering {
    let kind_rank = |r: &Reference| r.is_tag() as u8;
    let prefixed = |r: &Reference| (strip_v_prefix(&r.name).len() != r.name.len()) as u8;

    kind_rank(a)
        .cmp(&kind_rank(b))
        .then_with(|| prefixed(a).cmp(&prefixed(b)))
        .then_with(|| b.name.cmp(&a.name))
}

/// Constraint written back to the manifest after resolving the sentinel
pub fn pinned_constraint(reference: &Reference) -> String {
    format!("^{}", reference.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<Reference> {
        names.iter().map(|n| Reference::tag(*n)).collect()
    }

    fn resolve_name(spec: &str, refs: &[Reference]) -> Option<String> {
        resolve(spec, refs, None, false).map(|r| r.name)
    }

    #[test]
    fn strips_v_only_before_digit() {
        assert_eq!(strip_v_prefix("v1.2.3"), "1.2.3");
        assert_eq!(strip_v_prefix("V2.0.0"), "2.0.0");
        assert_eq!(strip_v_prefix("vnext"), "vnext");
        assert_eq!(strip_v_prefix("1.0.0"), "1.0.0");
        assert_eq!(parse_version("v1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(parse_version("main"), None);
    }

    #[test]
    fn caret_picks_greatest_compatible() {
        let refs = tags(&["1.0.0", "1.4.2", "1.10.0", "2.0.0"]);
        assert_eq!(resolve_name("^1.0.0", &refs).as_deref(), Some("1.10.0"));
    }

    #[test]
    fn tilde_and_comparisons() {
        let refs = tags(&["1.2.0", "1.2.9", "1.3.0", "2.5.0"]);
        assert_eq!(resolve_name("~1.2.0", &refs).as_deref(), Some("1.2.9"));
        assert_eq!(resolve_name(">=1.2.0 <2.0.0", &refs).as_deref(), Some("1.3.0"));
        assert_eq!(resolve_name("< 1.3.0", &refs).as_deref(), Some("1.2.9"));
    }

    #[test]
    fn bare_version_is_exact() {
        let refs = tags(&["1.2.0", "1.3.0"]);
        assert_eq!(resolve_name("1.2.0", &refs).as_deref(), Some("1.2.0"));
        assert_eq!(resolve_name("v1.2.0", &refs).as_deref(), Some("1.2.0"));
    }

    #[test]
    fn or_alternatives() {
        let refs = tags(&["1.5.0", "2.1.0", "3.0.0"]);
        assert_eq!(resolve_name("^1.0.0 || ^2.0.0", &refs).as_deref(), Some("2.1.0"));
    }

    #[test]
    fn npm_hyphen_range_and_wildcards() {
        let refs = tags(&["1.0.0", "1.9.0", "2.0.0", "2.0.1"]);
        assert_eq!(resolve_name("1.0.0 - 2.0.0", &refs).as_deref(), Some("2.0.0"));
        assert_eq!(resolve_name("1.x", &refs).as_deref(), Some("1.9.0"));
        assert_eq!(resolve_name("2.0.X", &refs).as_deref(), Some("2.0.1"));
        assert_eq!(resolve_name("x", &refs).as_deref(), Some("2.0.1"));
    }

    #[test]
    fn sentinel_takes_latest_and_ignores_branches() {
        let refs = vec![
            Reference::tag("v0.9.0"),
            Reference::tag("v1.1.0"),
            Reference::branch("main"),
        ];
        assert_eq!(resolve_name(">0.0.0", &refs).as_deref(), Some("v1.1.0"));
    }

    #[test]
    fn v_prefixed_constraint() {
        let refs = tags(&["v3.0.0", "v3.1.2"]);
        assert_eq!(resolve_name("^v3.0.0", &refs).as_deref(), Some("v3.1.2"));
    }

    #[test]
    fn no_match_returns_none() {
        let refs = tags(&["1.0.0"]);
        assert!(resolve_name("^2.0.0", &refs).is_none());
        assert!(resolve_name("^1.0.0", &[]).is_none());
    }

    #[test]
    fn unparsable_spec_matches_reference_literally() {
        let refs = vec![Reference::tag("1.0.0"), Reference::branch("develop")];
        let resolved = resolve("develop", &refs, None, false).unwrap();
        assert_eq!(resolved, Reference::branch("develop"));
        assert!(resolve("feature/x", &refs, None, false).is_none());
    }

    #[test]
    fn tie_prefers_v_prefixed_tag() {
        let refs = tags(&["v1.2.0", "1.2.0", "v1.0.0"]);
        assert_eq!(resolve_name("^1.0.0", &refs).as_deref(), Some("v1.2.0"));

        let reversed = tags(&["v1.0.0", "1.2.0", "v1.2.0"]);
        assert_eq!(resolve_name("^1.0.0", &reversed).as_deref(), Some("v1.2.0"));
    }

    #[test]
    fn tie_prefers_tag_then_smallest_name() {
        let refs = vec![Reference::branch("v1.2.0"), Reference::tag("1.2.0")];
        assert_eq!(resolve("^1.0.0", &refs, None, false), Some(Reference::tag("1.2.0")));

        let refs = tags(&["v1.2.0", "V1.2.0"]);
        assert_eq!(resolve_name("^1.0.0", &refs).as_deref(), Some("V1.2.0"));
    }

    #[test]
    fn locked_version_fast_path() {
        let refs = tags(&["v1.0.0", "v1.1.0", "v1.2.0"]);
        let locked = LockedDependency {
            version: "v1.1.0".to_string(),
            ..LockedDependency::default()
        };

        let pinned = resolve("^1.0.0", &refs, Some(&locked), true).unwrap();
        assert_eq!(pinned.name, "v1.1.0");

        let fresh = resolve("^1.0.0", &refs, Some(&locked), false).unwrap();
        assert_eq!(fresh.name, "v1.2.0");
    }

    #[test]
    fn locked_version_ignored_when_constraint_moved() {
        let refs = tags(&["v1.1.0", "v2.0.0"]);
        let locked = LockedDependency {
            version: "v1.1.0".to_string(),
            ..LockedDependency::default()
        };
        let resolved = resolve("^2.0.0", &refs, Some(&locked), true).unwrap();
        assert_eq!(resolved.name, "v2.0.0");
    }

    #[test]
    fn invalid_constraint_reports_spec() {
        let err = Constraint::parse(">= ").unwrap_err();
        assert!(err.to_string().contains(">="));
        assert!(Constraint::parse("").is_err());
    }

    #[test]
    fn pinning_uses_caret_of_short_name() {
        assert_eq!(pinned_constraint(&Reference::tag("v3.1.0")), "^v3.1.0");
    }

    #[test]
    fn lower_bound_of_constraints() {
        let bound = |spec: &str| Constraint::parse(spec).unwrap().lower_bound().to_string();
        assert_eq!(bound("^1.2"), "1.2.0");
        assert_eq!(bound(">=1.0.0 <2.0.0"), "1.0.0");
        assert_eq!(bound("<2.0.0"), "0.0.0");
        assert_eq!(bound("^2.0.0 || ~1.4.1"), "1.4.1");
        assert_eq!(bound("v3.x"), "3.0.0");
    }
}
