//! Pairing of methods between two versions of a file.
//!
//! Methods whose full text is unchanged are set aside first. The rest go
//! through three ordered passes; a fragment consumed by one pass is invisible
//! to the later ones:
//!
//! 1. exact signature (name + parameter list) -> paired
//! 2. same name, different parameters -> paired unless the body text is
//!    identical, in which case both are consumed without a comparison
//! 3. different name and parameters with identical body text -> consumed as a
//!    rename
//!
//! Whatever remains is a whole-method deletion (old side) or addition (new side).

use std::collections::HashSet;

use tracing::debug;

use crate::models::MethodFragment;

/// Which pass produced a [`MethodPair`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairingRule {
    ExactSignature,
    SameName,
}

/// Two fragments considered the same method across versions.
#[derive(Clone, Copy, Debug)]
pub struct MethodPair<'a> {
    pub old: &'a MethodFragment,
    pub new: &'a MethodFragment,
    pub rule: PairingRule,
}

/// Outcome of matching the methods of two file versions.
#[derive(Debug, Default)]
pub struct MethodMatching<'a> {
    pub pairs: Vec<MethodPair<'a>>,
    /// Fragments consumed without comparison: parameter-only changes with an
    /// identical body, and body-identical renames.
    pub untouched: Vec<(&'a MethodFragment, &'a MethodFragment)>,
    pub only_old: Vec<&'a MethodFragment>,
    pub only_new: Vec<&'a MethodFragment>,
}

/// Match the methods of an old and a new file version.
pub fn match_methods<'a>(old: &'a [MethodFragment], new: &'a [MethodFragment]) -> MethodMatching<'a> {
    let old_sources: HashSet<&str> = old.iter().map(|m| m.source.as_str()).collect();
    let new_sources: HashSet<&str> = new.iter().map(|m| m.source.as_str()).collect();

    let changed_old: Vec<&MethodFragment> = old
        .iter()
        .filter(|m| !new_sources.contains(m.source.as_str()))
        .collect();
    let changed_new: Vec<&MethodFragment> = new
        .iter()
        .filter(|m| !old_sources.contains(m.source.as_str()))
        .collect();

    let mut visited_old: HashSet<usize> = HashSet::new();
    let mut visited_new: HashSet<usize> = HashSet::new();
    let mut matching = MethodMatching::default();

    exact_signature_pass(
        &changed_old,
        &changed_new,
        &mut visited_old,
        &mut visited_new,
        &mut matching,
    );
    same_name_pass(
        &changed_old,
        &changed_new,
        &mut visited_old,
        &mut visited_new,
        &mut matching,
    );
    rename_pass(
        &changed_old,
        &changed_new,
        &mut visited_old,
        &mut visited_new,
        &mut matching,
    );

    matching.only_old = changed_old
        .iter()
        .enumerate()
        .filter(|(i, _)| !visited_old.contains(i))
        .map(|(_, m)| *m)
        .collect();
    matching.only_new = changed_new
        .iter()
        .enumerate()
        .filter(|(i, _)| !visited_new.contains(i))
        .map(|(_, m)| *m)
        .collect();

    matching
}

fn exact_signature_pass<'a>(
    old: &[&'a MethodFragment],
    new: &[&'a MethodFragment],
    visited_old: &mut HashSet<usize>,
    visited_new: &mut HashSet<usize>,
    matching: &mut MethodMatching<'a>,
) {
    for (i, old_method) in old.iter().copied().enumerate() {
        let old_sig = old_method.signature();
        let found = new
            .iter()
            .copied()
            .enumerate()
            .find(|(j, m)| !visited_new.contains(j) && m.signature() == old_sig);
        if let Some((j, new_method)) = found {
            visited_old.insert(i);
            visited_new.insert(j);
            matching.pairs.push(MethodPair {
                old: old_method,
                new: new_method,
                rule: PairingRule::ExactSignature,
            });
        }
    }
}

fn same_name_pass<'a>(
    old: &[&'a MethodFragment],
    new: &[&'a MethodFragment],
    visited_old: &mut HashSet<usize>,
    visited_new: &mut HashSet<usize>,
    matching: &mut MethodMatching<'a>,
) {
    for (i, old_method) in old.iter().copied().enumerate() {
        if visited_old.contains(&i) {
            continue;
        }
        let old_sig = old_method.signature();
        for (j, new_method) in new.iter().copied().enumerate() {
            if visited_new.contains(&j) {
                continue;
            }
            let new_sig = new_method.signature();
            if old_sig.name != new_sig.name || old_sig.parameters == new_sig.parameters {
                continue;
            }
            visited_old.insert(i);
            visited_new.insert(j);
            if old_method.body_source == new_method.body_source {
                debug!(
                    "parameter-only change of {}: {} -> {}",
                    old_sig.name, old_sig.parameters, new_sig.parameters
                );
                matching.untouched.push((old_method, new_method));
            } else {
                matching.pairs.push(MethodPair {
                    old: old_method,
                    new: new_method,
                    rule: PairingRule::SameName,
                });
            }
            break;
        }
    }
}

fn rename_pass<'a>(
    old: &[&'a MethodFragment],
    new: &[&'a MethodFragment],
    visited_old: &mut HashSet<usize>,
    visited_new: &mut HashSet<usize>,
    matching: &mut MethodMatching<'a>,
) {
    for (i, old_method) in old.iter().copied().enumerate() {
        if visited_old.contains(&i) {
            continue;
        }
        let old_sig = old_method.signature();
        for (j, new_method) in new.iter().copied().enumerate() {
            if visited_new.contains(&j) {
                continue;
            }
            let new_sig = new_method.signature();
            if old_sig.name == new_sig.name || old_sig.parameters == new_sig.parameters {
                continue;
            }
            if old_method.body_source == new_method.body_source {
                debug!("body-identical rename: {} -> {}", old_sig.name, new_sig.name);
                visited_old.insert(i);
                visited_new.insert(j);
                matching.untouched.push((old_method, new_method));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, params: &[&str], body: &str) -> MethodFragment {
        let source = format!("void {}({}) {}", name, params.join(", "), body);
        MethodFragment::new(
            name,
            params.iter().map(|p| p.to_string()).collect(),
            source,
            body,
            vec![],
        )
    }

    fn names(methods: &[&MethodFragment]) -> Vec<String> {
        methods.iter().map(|m| m.full_signature()).collect()
    }

    #[test]
    fn test_unchanged_methods_are_set_aside() {
        let old = vec![method("a", &[], "{ x(); }")];
        let new = vec![method("a", &[], "{ x(); }")];
        let matching = match_methods(&old, &new);
        assert!(matching.pairs.is_empty());
        assert!(matching.only_old.is_empty());
        assert!(matching.only_new.is_empty());
    }

    #[test]
    fn test_exact_signature_pairs() {
        let old = vec![method("a", &["int"], "{ x(); }")];
        let new = vec![method("a", &["int"], "{ y(); }")];
        let matching = match_methods(&old, &new);
        assert_eq!(matching.pairs.len(), 1);
        assert_eq!(matching.pairs[0].rule, PairingRule::ExactSignature);
    }

    #[test]
    fn test_same_name_with_changed_body_pairs() {
        let old = vec![method("a", &["int"], "{ x(); }")];
        let new = vec![method("a", &["long"], "{ y(); }")];
        let matching = match_methods(&old, &new);
        assert_eq!(matching.pairs.len(), 1);
        assert_eq!(matching.pairs[0].rule, PairingRule::SameName);
        assert_eq!(matching.pairs[0].new.full_signature(), "a(long)");
    }

    #[test]
    fn test_same_name_with_identical_body_is_untouched() {
        let old = vec![method("a", &["int"], "{ x(); }")];
        let new = vec![method("a", &["long"], "{ x(); }")];
        let matching = match_methods(&old, &new);
        assert!(matching.pairs.is_empty());
        assert_eq!(matching.untouched.len(), 1);
        assert!(matching.only_old.is_empty() && matching.only_new.is_empty());
    }

    #[test]
    fn test_body_identical_rename_is_consumed() {
        let old = vec![method("a", &["int"], "{ x(); }")];
        let new = vec![method("b", &["long"], "{ x(); }")];
        let matching = match_methods(&old, &new);
        assert!(matching.pairs.is_empty());
        assert_eq!(matching.untouched.len(), 1);
        assert!(matching.only_old.is_empty() && matching.only_new.is_empty());
    }

    #[test]
    fn test_rename_with_changed_body_is_add_and_delete() {
        let old = vec![method("a", &["int"], "{ x(); }")];
        let new = vec![method("b", &["long"], "{ y(); }")];
        let matching = match_methods(&old, &new);
        assert!(matching.pairs.is_empty());
        assert_eq!(names(&matching.only_old), vec!["a(int)"]);
        assert_eq!(names(&matching.only_new), vec!["b(long)"]);
    }

    #[test]
    fn test_rename_keeping_parameters_is_add_and_delete() {
        let old = vec![method("a", &["int"], "{ x(); }")];
        let new = vec![method("b", &["int"], "{ x(); }")];
        let matching = match_methods(&old, &new);
        assert_eq!(matching.only_old.len(), 1);
        assert_eq!(matching.only_new.len(), 1);
    }

    #[test]
    fn test_exact_pass_wins_over_same_name() {
        let old = vec![
            method("a", &["int"], "{ x(); }"),
            method("a", &["String"], "{ s(); }"),
        ];
        let new = vec![
            method("a", &["String"], "{ s2(); }"),
            method("a", &["int"], "{ x2(); }"),
        ];
        let matching = match_methods(&old, &new);
        assert_eq!(matching.pairs.len(), 2);
        for pair in &matching.pairs {
            assert_eq!(pair.rule, PairingRule::ExactSignature);
            assert_eq!(pair.old.full_signature(), pair.new.full_signature());
        }
    }

    #[test]
    fn test_each_fragment_used_once() {
        let old = vec![method("a", &["int"], "{ x(); }")];
        let new = vec![
            method("a", &["long"], "{ y(); }"),
            method("a", &["short"], "{ z(); }"),
        ];
        let matching = match_methods(&old, &new);
        assert_eq!(matching.pairs.len(), 1);
        assert_eq!(names(&matching.only_new), vec!["a(short)"]);
    }

    #[test]
    fn test_nameless_fragments_pair_by_exact_signature() {
        let old = vec![method("", &["int"], "{ x(); }")];
        let new = vec![method("", &["long"], "{ y(); }")];
        let matching = match_methods(&old, &new);
        assert_eq!(matching.pairs.len(), 1);
        assert_eq!(matching.pairs[0].rule, PairingRule::ExactSignature);
    }

    #[test]
    fn test_added_and_deleted_methods() {
        let old = vec![method("gone", &[], "{ }")];
        let new = vec![method("fresh", &[], "{ y(); }")];
        let matching = match_methods(&old, &new);
        // Same (empty) parameter list, different names: never paired.
        assert_eq!(names(&matching.only_old), vec!["gone()"]);
        assert_eq!(names(&matching.only_new), vec!["fresh()"]);
    }
}
