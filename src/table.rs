//! Grouping and joining: the aggregation layer shared by the comparison
//! commands.

use crate::Result;
use anyhow::bail;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Sum/count reduction of one group; mean is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupStats {
    pub sum: f64,
    pub count: usize,
}

impl GroupStats {
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Group (key, value) rows into per-key sum/count reductions.
pub fn group_stats<K, I>(rows: I) -> BTreeMap<K, GroupStats>
where
    K: Ord,
    I: IntoIterator<Item = (K, f64)>,
{
    let mut groups: BTreeMap<K, GroupStats> = BTreeMap::new();
    for (key, value) in rows {
        let entry = groups.entry(key).or_default();
        entry.sum += value;
        entry.count += 1;
    }
    groups
}

/// Joined native/VM aggregates for one key, with the derived speedup
/// (VM mean over native mean).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutorPair {
    pub native: GroupStats,
    pub vm: GroupStats,
    pub speedup: f64,
}

/// Join the two executor aggregates, requiring exact key alignment.
///
/// The compared runs replay the same workload, so a key on only one side is
/// an input error, not a row to drop.
pub fn join_aligned<K>(
    native: BTreeMap<K, GroupStats>,
    vm: BTreeMap<K, GroupStats>,
) -> Result<BTreeMap<K, ExecutorPair>>
where
    K: Ord + Display + Clone,
{
    let only_native: Vec<_> = native
        .keys()
        .filter(|k| !vm.contains_key(k))
        .map(|k| k.to_string())
        .collect();
    let only_vm: Vec<_> = vm
        .keys()
        .filter(|k| !native.contains_key(k))
        .map(|k| k.to_string())
        .collect();
    if !only_native.is_empty() || !only_vm.is_empty() {
        bail!(
            "native and vm datasets are misaligned; native-only keys: [{}], vm-only keys: [{}]",
            only_native.join(", "),
            only_vm.join(", "),
        );
    }

    // Same key sets and both maps iterate sorted, so the entries pair up.
    let mut joined = BTreeMap::new();
    for ((key, native_stats), (_, vm_stats)) in native.into_iter().zip(vm) {
        joined.insert(
            key,
            ExecutorPair {
                native: native_stats,
                vm: vm_stats,
                speedup: vm_stats.mean() / native_stats.mean(),
            },
        );
    }
    Ok(joined)
}

/// Inner join on key: the intersection of two keyed maps.
pub fn join_intersect<K, A, B>(a: BTreeMap<K, A>, mut b: BTreeMap<K, B>) -> BTreeMap<K, (A, B)>
where
    K: Ord,
{
    let mut joined = BTreeMap::new();
    for (key, va) in a {
        if let Some(vb) = b.remove(&key) {
            joined.insert(key, (va, vb));
        }
    }
    joined
}

pub fn mean_speedup<K>(joined: &BTreeMap<K, ExecutorPair>) -> f64 {
    crate::stats::mean(&joined.values().map(|p| p.speedup).collect::<Vec<_>>())
}

/// The `n` largest plus `n` smallest rows by value, deduplicated, sorted by
/// value descending.
pub fn edge_slice<K: Clone>(rows: &[(K, f64)], n: usize) -> Vec<(K, f64)> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

    if sorted.len() <= 2 * n {
        return sorted;
    }

    let mut edge: Vec<(K, f64)> = sorted[..n].to_vec();
    edge.extend_from_slice(&sorted[sorted.len() - n..]);
    edge
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn grouping_reduces_per_key() {
        let groups = group_stats(vec![
            ("a", 1.0),
            ("b", 10.0),
            ("a", 3.0),
            ("b", 20.0),
            ("a", 2.0),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["a"].count, 3);
        assert_eq!(groups["a"].sum, 6.0);
        assert_eq!(groups["a"].mean(), 2.0);
        assert_eq!(groups["b"].mean(), 15.0);
    }

    #[test]
    fn speedup_is_vm_over_native() {
        let native = group_stats(vec![("a", 2.0), ("a", 4.0)]);
        let vm = group_stats(vec![("a", 9.0), ("a", 15.0)]);
        let joined = join_aligned(native, vm).unwrap();
        assert_eq!(joined["a"].speedup, 4.0);
        assert_eq!(mean_speedup(&joined), 4.0);
    }

    #[test]
    fn misaligned_keys_error_names_them() {
        let native = group_stats(vec![("a", 1.0), ("b", 1.0)]);
        let vm = group_stats(vec![("a", 1.0), ("c", 1.0)]);
        let err = join_aligned(native, vm).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains('b') && msg.contains('c'), "{msg}");
    }

    #[test]
    fn intersect_join_drops_unmatched() {
        let a = BTreeMap::from([("x", 1), ("y", 2)]);
        let b = BTreeMap::from([("y", 20), ("z", 30)]);
        let joined = join_intersect(a, b);
        assert_eq!(joined, BTreeMap::from([("y", (2, 20))]));
    }

    #[test]
    fn edge_slice_keeps_extremes() {
        let rows: Vec<(u32, f64)> = (0..10).map(|i| (i, i as f64)).collect();
        let edge = edge_slice(&rows, 2);
        let values: Vec<f64> = edge.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![9.0, 8.0, 1.0, 0.0]);

        // Short inputs come back whole, not duplicated.
        let edge = edge_slice(&rows[..3], 2);
        assert_eq!(edge.len(), 3);
    }
}
