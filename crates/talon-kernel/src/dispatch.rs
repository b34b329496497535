//! Ensemble dispatch: mapping a possibly-abbreviated sub-command name to
//! its handler.
//!
//! Resolution runs in two passes:
//!
//! 1. case-sensitive whole match — always wins immediately
//! 2. prefix scan — collect every entry the input is a prefix of; a
//!    folded whole match (when case folding is requested) joins the
//!    candidates and ends the scan, but resolves like any other prefix
//!    candidate, never as exact. An empty input matches only an entry
//!    registered under the empty name.
//!
//! A visibility filter, when supplied, narrows the prefix candidates. When
//! that leaves nothing in strict mode, the same filter is re-applied to the
//! *full* entry set so the diagnostic lists only sub-commands the caller
//! may actually use. Exactly one survivor resolves; several are ambiguous;
//! zero in non-strict mode yields [`Resolved::Unhandled`] so the caller
//! can fall back to a default.

use crate::errors::KernelError;

/// Narrows a candidate index list; receives the ensemble for context.
///
/// An `Err` from the filter is a hard failure and aborts resolution — it
/// is not the same as narrowing to zero candidates.
pub type EnsembleFilter<'a, H> =
    &'a dyn Fn(&Ensemble<H>, &[usize]) -> Result<Vec<usize>, KernelError>;

/// A named table of sub-commands with prefix resolution.
pub struct Ensemble<H> {
    kind: &'static str,
    entries: Vec<(String, H)>,
}

/// The outcome of a successful (non-error) resolution.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolved<'e, H> {
    /// One entry matched.
    Match {
        /// The entry's full registered name.
        name: &'e str,
        /// The entry's handler.
        handler: &'e H,
        /// True for a whole-name match, false for a unique prefix.
        exact: bool,
    },
    /// Nothing matched and the caller did not insist (non-strict mode).
    Unhandled,
}

impl<H> Ensemble<H> {
    /// Create an empty ensemble. `kind` is the noun diagnostics use,
    /// usually `"option"`.
    pub fn new(kind: &'static str) -> Self {
        Ensemble {
            kind,
            entries: Vec::new(),
        }
    }

    /// Register a sub-command. Registration order is the scan order.
    pub fn add(&mut self, name: impl Into<String>, handler: H) -> &mut Self {
        self.entries.push((name.into(), handler));
        self
    }

    /// The diagnostic noun this ensemble was created with.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Number of registered sub-commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no sub-commands are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The registered name at an index, for filters building diagnostics.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(name, _)| name.as_str())
    }

    /// The handler registered under exactly this name.
    pub fn get(&self, name: &str) -> Option<&H> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, handler)| handler)
    }

    /// Resolve a possibly-abbreviated sub-command name.
    ///
    /// `strict` turns a zero-candidate outcome into an error instead of
    /// [`Resolved::Unhandled`]; `no_case` adds ASCII case folding to the
    /// exact and prefix comparisons; `filter` narrows which entries are
    /// visible to this caller.
    pub fn resolve(
        &self,
        name: &str,
        strict: bool,
        no_case: bool,
        filter: Option<EnsembleFilter<'_, H>>,
    ) -> Result<Resolved<'_, H>, KernelError> {
        // Pass 1: case-sensitive whole match.
        for (entry, handler) in &self.entries {
            if entry == name {
                return Ok(Resolved::Match {
                    name: entry,
                    handler,
                    exact: true,
                });
            }
        }

        // Pass 2: prefix scan. A folded whole match is one more candidate
        // and ends the scan; zero-length inputs never prefix-match.
        let mut matched: Vec<usize> = Vec::new();
        for (i, (entry, _)) in self.entries.iter().enumerate() {
            if no_case && entry.eq_ignore_ascii_case(name) {
                matched.push(i);
                break;
            }
            if !name.is_empty() && is_prefix(name, entry, no_case) {
                matched.push(i);
            }
        }

        let candidates = match filter {
            Some(filter) => filter(self, &matched)?,
            None => matched,
        };

        match candidates.as_slice() {
            [single] => {
                let (entry, handler) = &self.entries[*single];
                Ok(Resolved::Match {
                    name: entry,
                    handler,
                    exact: false,
                })
            }
            [] => {
                if !strict {
                    return Ok(Resolved::Unhandled);
                }
                // Diagnostic lists the sub-commands this caller may use,
                // so the filter applies to the full set here.
                let all: Vec<usize> = (0..self.entries.len()).collect();
                let visible = match filter {
                    Some(filter) => filter(self, &all)?,
                    None => all,
                };
                Err(KernelError::NotFound {
                    kind: self.kind,
                    name: name.to_owned(),
                    candidates: self.sorted_names(&visible),
                })
            }
            _ => Err(KernelError::AmbiguousMatch {
                kind: self.kind,
                name: name.to_owned(),
                candidates: self.sorted_names(&candidates),
            }),
        }
    }

    fn sorted_names(&self, indexes: &[usize]) -> Vec<String> {
        let mut names: Vec<String> = indexes
            .iter()
            .filter_map(|&i| self.entries.get(i))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort_unstable();
        names
    }
}

/// Prefix test on char boundaries, with optional ASCII folding.
fn is_prefix(needle: &str, haystack: &str, no_case: bool) -> bool {
    match haystack.get(..needle.len()) {
        Some(head) if no_case => head.eq_ignore_ascii_case(needle),
        Some(head) => head == needle,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Ensemble<u32> {
        let mut ensemble = Ensemble::new("option");
        ensemble.add("get", 1).add("getall", 2).add("set", 3);
        ensemble
    }

    fn expect_match<'e>(resolved: Resolved<'e, u32>) -> (&'e str, u32, bool) {
        match resolved {
            Resolved::Match {
                name,
                handler,
                exact,
            } => (name, *handler, exact),
            Resolved::Unhandled => panic!("expected a match"),
        }
    }

    #[test]
    fn exact_match_wins_over_longer_entries() {
        let ensemble = sample();
        let (name, handler, exact) =
            expect_match(ensemble.resolve("get", true, false, None).unwrap());
        assert_eq!((name, handler, exact), ("get", 1, true));
    }

    #[test]
    fn unique_prefix_resolves_inexactly() {
        let ensemble = sample();
        let (name, handler, exact) =
            expect_match(ensemble.resolve("s", true, false, None).unwrap());
        assert_eq!((name, handler, exact), ("set", 3, false));
    }

    #[test]
    fn ambiguous_prefix_lists_all_matches() {
        let ensemble = sample();
        let err = ensemble.resolve("g", true, false, None).unwrap_err();
        assert_eq!(err.to_string(), "ambiguous option \"g\": must be get or getall");
    }

    #[test]
    fn strict_miss_lists_every_candidate() {
        let ensemble = sample();
        let err = ensemble.resolve("frob", true, false, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bad option \"frob\": must be get, getall, or set"
        );
    }

    #[test]
    fn non_strict_miss_is_unhandled() {
        let ensemble = sample();
        let resolved = ensemble.resolve("frob", false, false, None).unwrap();
        assert_eq!(resolved, Resolved::Unhandled);
    }

    #[test]
    fn case_folding_applies_to_whole_and_prefix_matches() {
        let ensemble = sample();
        // a folded whole match resolves, but never as exact
        let (name, _, exact) =
            expect_match(ensemble.resolve("GET", true, true, None).unwrap());
        assert_eq!((name, exact), ("get", false));
        let (name, _, exact) =
            expect_match(ensemble.resolve("S", true, true, None).unwrap());
        assert_eq!((name, exact), ("set", false));
        assert!(ensemble.resolve("GET", true, false, None).is_err());
    }

    #[test]
    fn folded_whole_match_is_just_another_candidate() {
        let mut ensemble = Ensemble::new("option");
        ensemble.add("getall", 1).add("Get", 2);
        // "get" whole-matches "Get" only under folding, and "getall" by
        // prefix; neither wins outright
        let err = ensemble.resolve("get", true, true, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ambiguous option \"get\": must be Get or getall"
        );
        // a case-sensitive whole match still short-circuits
        ensemble.add("get", 3);
        let (name, handler, exact) =
            expect_match(ensemble.resolve("get", true, true, None).unwrap());
        assert_eq!((name, handler, exact), ("get", 3, true));
    }

    #[test]
    fn empty_name_matches_only_an_empty_key() {
        let mut ensemble = Ensemble::new("option");
        ensemble.add("get", 1).add("set", 2);
        let err = ensemble.resolve("", true, false, None).unwrap_err();
        assert_eq!(err.to_string(), "bad option \"\": must be get or set");
        assert_eq!(ensemble.resolve("", false, false, None).unwrap(), Resolved::Unhandled);

        ensemble.add("", 3);
        let (name, handler, exact) =
            expect_match(ensemble.resolve("", true, false, None).unwrap());
        assert_eq!((name, handler, exact), ("", 3, true));
    }

    #[test]
    fn filter_narrows_candidates_to_a_unique_match() {
        let ensemble = sample();
        let only_getall: EnsembleFilter<'_, u32> = &|ensemble, matched| {
            Ok(matched
                .iter()
                .copied()
                .filter(|&i| ensemble.name_at(i) == Some("getall"))
                .collect())
        };
        let (name, handler, _) = expect_match(
            ensemble.resolve("g", true, false, Some(only_getall)).unwrap(),
        );
        assert_eq!((name, handler), ("getall", 2));
    }

    #[test]
    fn filtered_strict_miss_lists_only_visible_candidates() {
        let ensemble = sample();
        let hide_set: EnsembleFilter<'_, u32> = &|ensemble, matched| {
            Ok(matched
                .iter()
                .copied()
                .filter(|&i| ensemble.name_at(i) != Some("set"))
                .collect())
        };
        let err = ensemble.resolve("se", true, false, Some(hide_set)).unwrap_err();
        assert_eq!(err.to_string(), "bad option \"se\": must be get or getall");
    }

    #[test]
    fn filter_failure_aborts_resolution() {
        let ensemble = sample();
        let failing: EnsembleFilter<'_, u32> = &|_, _| {
            Err(KernelError::InvalidArgument {
                what: "sub-command filter".into(),
            })
        };
        let err = ensemble.resolve("se", true, false, Some(failing)).unwrap_err();
        assert_eq!(err.to_string(), "invalid sub-command filter");
    }

    #[test]
    fn multibyte_input_does_not_panic() {
        let ensemble = sample();
        assert!(ensemble.resolve("gét", true, false, None).is_err());
    }
}
