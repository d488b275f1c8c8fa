//! Greedy pairing of logging call sites within one matched method pair.
//!
//! Every (old, new) pair is scored once, old-major scan order. Pairs above
//! the threshold are fed into a mapping table keyed by call-site index:
//! a free pair is inserted, and an occupied slot is only taken over by a
//! strictly higher ratio. This is a best-effort assignment, not a global
//! optimum; equal ratios keep whichever pair was seen first.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;

use crate::extract::canonical::similarity_ratio;
use crate::models::{CallSite, MatchedPair};

/// One-to-one pairing of two call-site sequences plus their residue.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallMatching {
    /// Ordered by old index.
    pub pairs: Vec<MatchedPair>,
    /// Old indices without a partner (deleted inside the method).
    pub unmatched_old: Vec<usize>,
    /// New indices without a partner (added inside the method).
    pub unmatched_new: Vec<usize>,
}

impl CallMatching {
    /// Pairs whose canonical texts differ, i.e. genuine updates.
    pub fn updated<'m>(
        &'m self,
        old: &'m [CallSite],
        new: &'m [CallSite],
    ) -> impl Iterator<Item = MatchedPair> + 'm {
        self.pairs
            .iter()
            .copied()
            .filter(move |p| old[p.old].text != new[p.new].text)
    }
}

/// Pair `old` and `new` call sites whose similarity exceeds `threshold`.
pub fn match_calls(old: &[CallSite], new: &[CallSite], threshold: f64) -> CallMatching {
    // old index -> (new index, ratio), plus the reverse lookup.
    let mut by_old: IndexMap<usize, (usize, f64)> = IndexMap::new();
    let mut by_new: HashMap<usize, usize> = HashMap::new();

    for (i, old_site) in old.iter().enumerate() {
        for (j, new_site) in new.iter().enumerate() {
            let ratio = similarity_ratio(&old_site.text, &new_site.text);
            if ratio <= threshold {
                continue;
            }

            let old_slot = by_old.get(&i).copied();
            let new_slot = by_new.get(&j).copied();

            match (old_slot, new_slot) {
                (None, None) => {
                    by_old.insert(i, (j, ratio));
                    by_new.insert(j, i);
                }
                (Some((current_new, current_ratio)), None) => {
                    if ratio > current_ratio {
                        by_new.remove(&current_new);
                        by_old.insert(i, (j, ratio));
                        by_new.insert(j, i);
                    }
                }
                (None, Some(current_old)) => {
                    let current_ratio = by_old.get(&current_old).map_or(0.0, |slot| slot.1);
                    if ratio > current_ratio {
                        by_old.shift_remove(&current_old);
                        by_old.insert(i, (j, ratio));
                        by_new.insert(j, i);
                    }
                }
                (Some((current_new, old_ratio)), Some(current_old)) => {
                    if current_old == i {
                        continue;
                    }
                    // Both ends are taken: the new pair must beat both holders,
                    // which then lose their partners.
                    let new_ratio = by_old.get(&current_old).map_or(0.0, |slot| slot.1);
                    if ratio > old_ratio && ratio > new_ratio {
                        by_new.remove(&current_new);
                        by_old.shift_remove(&current_old);
                        by_old.insert(i, (j, ratio));
                        by_new.insert(j, i);
                    }
                }
            }
        }
    }

    let mut pairs: Vec<MatchedPair> = by_old
        .iter()
        .map(|(&old_idx, &(new_idx, ratio))| MatchedPair {
            old: old_idx,
            new: new_idx,
            ratio,
        })
        .collect();
    pairs.sort_by_key(|p| p.old);

    let mapped_old: BTreeSet<usize> = pairs.iter().map(|p| p.old).collect();
    let mapped_new: BTreeSet<usize> = pairs.iter().map(|p| p.new).collect();

    CallMatching {
        pairs,
        unmatched_old: (0..old.len()).filter(|i| !mapped_old.contains(i)).collect(),
        unmatched_new: (0..new.len()).filter(|j| !mapped_new.contains(j)).collect(),
    }
}
