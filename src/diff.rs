//! Keyed diff between two ordered contact lists.
//!
//! Items are paired by [`Contact::key`] (the phone number). When a key occurs
//! more than once, the k-th occurrence in the old list pairs with the k-th
//! occurrence in the new list. Paired items whose relative order survives
//! (the longest increasing run of old positions) stay put; the rest are
//! reported as moves.

use std::collections::{HashMap, VecDeque};

use crate::contact::Contact;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Present only in the new list.
    Insert { new_index: usize },
    /// Present only in the old list.
    Remove { old_index: usize },
    /// Present in both lists but its position relative to the others changed.
    Move { old_index: usize, new_index: usize },
    /// Same key in both lists, some other field differs.
    Update { old_index: usize, new_index: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDiff {
    pub changes: Vec<Change>,
    /// For each position of the new list, the paired position in the old list.
    pub sources: Vec<Option<usize>>,
}

impl ListDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Old position that the item at `new_index` was carried over from.
    pub fn source_of(&self, new_index: usize) -> Option<usize> {
        self.sources.get(new_index).copied().flatten()
    }

    pub fn inserted(&self) -> usize {
        self.count(|change| matches!(change, Change::Insert { .. }))
    }

    pub fn removed(&self) -> usize {
        self.count(|change| matches!(change, Change::Remove { .. }))
    }

    pub fn moved(&self) -> usize {
        self.count(|change| matches!(change, Change::Move { .. }))
    }

    pub fn updated(&self) -> usize {
        self.count(|change| matches!(change, Change::Update { .. }))
    }

    fn count(&self, predicate: impl Fn(&Change) -> bool) -> usize {
        self.changes.iter().filter(|change| predicate(change)).count()
    }
}

pub fn diff(old: &[Contact], new: &[Contact]) -> ListDiff {
    let mut by_key: HashMap<&str, VecDeque<usize>> = HashMap::new();
    for (index, contact) in old.iter().enumerate() {
        by_key.entry(contact.key()).or_default().push_back(index);
    }

    let sources: Vec<Option<usize>> = new
        .iter()
        .map(|contact| {
            by_key
                .get_mut(contact.key())
                .and_then(|indices| indices.pop_front())
        })
        .collect();

    let mut removed: Vec<usize> = by_key.into_values().flatten().collect();
    removed.sort_unstable();

    // Paired old positions in new-list order; the ones on the longest
    // increasing run keep their place.
    let paired: Vec<(usize, usize)> = sources
        .iter()
        .enumerate()
        .filter_map(|(new_index, source)| source.map(|old_index| (new_index, old_index)))
        .collect();
    let old_positions: Vec<usize> = paired.iter().map(|(_, old_index)| *old_index).collect();
    let mut stable = vec![false; new.len()];
    for position in longest_increasing_run(&old_positions) {
        stable[paired[position].0] = true;
    }

    let mut changes: Vec<Change> = removed
        .into_iter()
        .map(|old_index| Change::Remove { old_index })
        .collect();

    for (new_index, source) in sources.iter().enumerate() {
        match source {
            None => changes.push(Change::Insert { new_index }),
            Some(old_index) => {
                let old_index = *old_index;
                if !stable[new_index] {
                    changes.push(Change::Move {
                        old_index,
                        new_index,
                    });
                }
                if old[old_index] != new[new_index] {
                    changes.push(Change::Update {
                        old_index,
                        new_index,
                    });
                }
            }
        }
    }

    ListDiff { changes, sources }
}

/// Positions (into `values`) of one longest strictly increasing subsequence.
fn longest_increasing_run(values: &[usize]) -> Vec<usize> {
    // tails[k] holds the position of the smallest tail of a run of length k + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; values.len()];

    for (position, value) in values.iter().enumerate() {
        let slot = tails.partition_point(|&tail| values[tail] < *value);
        if slot > 0 {
            previous[position] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(position);
        } else {
            tails[slot] = position;
        }
    }

    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(position) = cursor {
        run.push(position);
        cursor = previous[position];
    }
    run.reverse();
    run
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(name: &str, phone: &str) -> Contact {
        Contact::new(name, phone, "mobile")
    }

    #[test]
    fn test_identical_lists_produce_no_changes() {
        let list = vec![c("Alice", "1"), c("Bob", "2")];
        let result = diff(&list, &list);
        assert!(result.is_empty());
        assert_eq!(result.sources, vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_same_phone_different_fields_is_update() {
        let old = vec![c("Alice", "555-1111")];
        let new = vec![Contact::new("Alice Smith", "555-1111", "home")];
        let result = diff(&old, &new);
        assert_eq!(
            result.changes,
            vec![Change::Update {
                old_index: 0,
                new_index: 0
            }]
        );
        assert_eq!(result.inserted(), 0);
        assert_eq!(result.removed(), 0);
    }

    #[test]
    fn test_from_empty_is_all_inserts() {
        let new = vec![c("Alice", "1"), c("Bob", "2")];
        let result = diff(&[], &new);
        assert_eq!(
            result.changes,
            vec![
                Change::Insert { new_index: 0 },
                Change::Insert { new_index: 1 }
            ]
        );
    }

    #[test]
    fn test_to_empty_is_all_removes() {
        let old = vec![c("Alice", "1"), c("Bob", "2")];
        let result = diff(&old, &[]);
        assert_eq!(
            result.changes,
            vec![
                Change::Remove { old_index: 0 },
                Change::Remove { old_index: 1 }
            ]
        );
    }

    #[test]
    fn test_filtering_removes_without_moves() {
        let old = vec![c("Alice", "1"), c("Bob", "2"), c("Alina", "3")];
        let new = vec![c("Alice", "1"), c("Alina", "3")];
        let result = diff(&old, &new);
        assert_eq!(result.changes, vec![Change::Remove { old_index: 1 }]);
        assert_eq!(result.source_of(1), Some(2));
    }

    #[test]
    fn test_rotation_is_single_move() {
        let old = vec![c("A", "1"), c("B", "2"), c("C", "3"), c("D", "4")];
        let new = vec![c("B", "2"), c("C", "3"), c("D", "4"), c("A", "1")];
        let result = diff(&old, &new);
        assert_eq!(
            result.changes,
            vec![Change::Move {
                old_index: 0,
                new_index: 3
            }]
        );
    }

    #[test]
    fn test_moved_and_changed_reports_both() {
        let old = vec![c("A", "1"), c("B", "2")];
        let new = vec![c("B", "2"), c("Anna", "1")];
        let result = diff(&old, &new);
        assert_eq!(result.moved(), 1);
        assert_eq!(result.updated(), 1);
        assert!(result.changes.contains(&Change::Update {
            old_index: 0,
            new_index: 1
        }));
    }

    #[test]
    fn test_duplicate_phones_pair_by_occurrence() {
        let old = vec![c("Home", "1"), c("Work", "1")];
        let new = vec![c("Home", "1"), c("Work", "1"), c("Cell", "1")];
        let result = diff(&old, &new);
        assert_eq!(result.changes, vec![Change::Insert { new_index: 2 }]);
        assert_eq!(result.sources, vec![Some(0), Some(1), None]);
    }

    #[test]
    fn test_mixed_changes() {
        let old = vec![c("A", "1"), c("B", "2"), c("C", "3")];
        let new = vec![c("C", "3"), c("A", "1"), c("Bee", "2b"), c("D", "4")];
        let result = diff(&old, &new);
        assert_eq!(result.removed(), 1);
        assert_eq!(result.inserted(), 2);
        assert_eq!(result.moved(), 1);
        assert_eq!(result.updated(), 0);
    }

    #[test]
    fn test_longest_increasing_run() {
        assert_eq!(longest_increasing_run(&[]), Vec::<usize>::new());
        assert_eq!(longest_increasing_run(&[3, 0, 1, 2]), vec![1, 2, 3]);
        assert_eq!(longest_increasing_run(&[0, 1, 2]), vec![0, 1, 2]);
        assert_eq!(longest_increasing_run(&[2, 1, 0]).len(), 1);
    }
}
