//! Block composition model: what the transactions in a block actually did
//! (plain transfers, swaps, everything else), derived from the block
//! execution dumps.

use serde::Deserialize;
use std::collections::BTreeMap;

/// `transfer(recipient, amount)` entry point selector.
pub const TRANSFER_SELECTOR: &str =
    "0x83afd3f4caedc6eebf44246fe54e38c95e3179a5ec9ea81740eca5b482d12e";

/// Known swap entry point selectors across the common AMM contracts.
pub const SWAP_SELECTORS: [&str; 5] = [
    // swap
    "0x15543c3708653cda9d418b4ccd3be11368e40636c10c44b18cfe756b6d88b29",
    // swap_exact_token_to
    "0xe9f3b52dc560050c4c679481500c1b1e2ba7496b6a0831638c1acaedcbc6ac",
    // multi_route_swap
    "0x1171593aa5bdadda4d6b0efde6cc94ee7649c3163d5efeb19da6c16d63a2a63",
    // swap_exact_tokens_for_tokens (two router deployments)
    "0x3276861cf5e05d6daf8f352cabb47df623eb10c383ab742fcc7abea94d5c5cc",
    "0x2c0f7bf2d6cf5304c29171bf493feb222fef84bdaf17805a6574b0c2e8bcc87",
];

/// One block record from a block execution dump.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockRecord {
    pub block_number: u64,
    /// Unix seconds.
    pub block_timestamp: u64,
    /// One entry per transaction; reverted transactions are null.
    #[serde(default)]
    pub entrypoints: Vec<Option<TxCallInfos>>,
}

/// The three call trees a transaction may produce.
#[derive(Debug, Clone, Deserialize)]
pub struct TxCallInfos {
    #[serde(default)]
    pub tx_hash: Option<String>,
    pub validate_call_info: Option<CallTree>,
    pub execute_call_info: Option<CallTree>,
    pub fee_transfer_call_info: Option<CallTree>,
}

impl TxCallInfos {
    /// Syscalls recorded across all three call trees.
    pub fn syscall_count(&self) -> u64 {
        [&self.validate_call_info, &self.execute_call_info, &self.fee_transfer_call_info]
            .into_iter()
            .flatten()
            .flat_map(flatten_call_tree)
            .map(|c| c.syscall_count)
            .sum()
    }
}

/// An entry point call and the calls it made.
#[derive(Debug, Clone, Deserialize)]
pub struct CallTree {
    pub root: Call,
    #[serde(default)]
    pub inner: Vec<CallTree>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Call {
    pub selector: String,
    #[serde(default)]
    pub syscall_count: u64,
}

/// Flat per-block composition row.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRow {
    pub block: u64,
    pub day: i64,
    pub txs: usize,
    pub transfers: usize,
    pub swaps: usize,
    pub transfers_ptg: f64,
    pub swaps_ptg: f64,
}

/// Per-day averages over the block rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayAverages {
    pub txs: f64,
    pub transfers: f64,
    pub swaps: f64,
    pub transfers_ptg: f64,
    pub swaps_ptg: f64,
}

/// Flatten a call tree into the list of calls it contains, children before
/// their root.
pub fn flatten_call_tree(tree: &CallTree) -> Vec<&Call> {
    let mut calls: Vec<&Call> = tree.inner.iter().flat_map(flatten_call_tree).collect();
    calls.push(&tree.root);
    calls
}

/// A pure transfer executes at most two entry points (`__execute__` plus
/// `transfer`), one of which is the transfer selector.
fn is_transfer(tx: &TxCallInfos) -> bool {
    let Some(execute) = &tx.execute_call_info else {
        return false;
    };
    let calls = flatten_call_tree(execute);
    calls.len() <= 2 && calls.iter().any(|c| c.selector == TRANSFER_SELECTOR)
}

/// A swap calls any of the known swap entry points anywhere in its execute
/// tree.
fn is_swap(tx: &TxCallInfos) -> bool {
    let Some(execute) = &tx.execute_call_info else {
        return false;
    };
    flatten_call_tree(execute)
        .iter()
        .any(|c| SWAP_SELECTORS.contains(&c.selector.as_str()))
}

/// Derive the flat composition row for one block. Percentages are over all
/// transaction slots, reverted (null) ones included.
pub fn block_row(block: &BlockRecord) -> BlockRow {
    let slots = block.entrypoints.len();
    let txs = block.entrypoints.iter().flatten().count();
    let transfers = block.entrypoints.iter().flatten().filter(|tx| is_transfer(tx)).count();
    let swaps = block.entrypoints.iter().flatten().filter(|tx| is_swap(tx)).count();

    BlockRow {
        block: block.block_number,
        day: day_bucket(block.block_timestamp),
        txs,
        transfers,
        swaps,
        transfers_ptg: crate::stats::percentage(transfers as f64, slots as f64),
        swaps_ptg: crate::stats::percentage(swaps as f64, slots as f64),
    }
}

/// Average the rows per day bucket.
pub fn group_by_day(rows: &[BlockRow]) -> BTreeMap<i64, DayAverages> {
    let mut sums: BTreeMap<i64, (DayAverages, usize)> = BTreeMap::new();
    for row in rows {
        let (avg, n) = sums.entry(row.day).or_default();
        avg.txs += row.txs as f64;
        avg.transfers += row.transfers as f64;
        avg.swaps += row.swaps as f64;
        avg.transfers_ptg += row.transfers_ptg;
        avg.swaps_ptg += row.swaps_ptg;
        *n += 1;
    }

    sums.into_iter()
        .map(|(day, (mut avg, n))| {
            let n = n as f64;
            avg.txs /= n;
            avg.transfers /= n;
            avg.swaps /= n;
            avg.transfers_ptg /= n;
            avg.swaps_ptg /= n;
            (day, avg)
        })
        .collect()
}

/// Days since the unix epoch.
pub fn day_bucket(timestamp: u64) -> i64 {
    (timestamp / 86_400) as i64
}

/// `YYYY-MM-DD` label for a day bucket (civil-from-days, Hinnant's
/// algorithm).
pub fn day_label(day: i64) -> String {
    let z = day + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { year + 1 } else { year };
    format!("{y:04}-{m:02}-{d:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call(selector: &str) -> Call {
        Call { selector: selector.to_string(), syscall_count: 0 }
    }

    fn leaf(selector: &str) -> CallTree {
        CallTree { root: call(selector), inner: vec![] }
    }

    fn tx(execute: Option<CallTree>) -> TxCallInfos {
        TxCallInfos {
            tx_hash: Some("0xdeadbeef".to_string()),
            validate_call_info: Some(leaf("0xval")),
            execute_call_info: execute,
            fee_transfer_call_info: Some(leaf("0xfee")),
        }
    }

    fn transfer_tx() -> TxCallInfos {
        tx(Some(CallTree {
            root: call("0xexec"),
            inner: vec![leaf(TRANSFER_SELECTOR)],
        }))
    }

    fn swap_tx() -> TxCallInfos {
        tx(Some(CallTree {
            root: call("0xexec"),
            inner: vec![CallTree {
                root: call("0xrouter"),
                inner: vec![leaf(SWAP_SELECTORS[0])],
            }],
        }))
    }

    #[test]
    fn call_tree_flattens_root_last() {
        let tree = CallTree {
            root: call("0xa"),
            inner: vec![leaf("0xb"), CallTree { root: call("0xc"), inner: vec![leaf("0xd")] }],
        };
        let selectors: Vec<&str> =
            flatten_call_tree(&tree).iter().map(|c| c.selector.as_str()).collect();
        assert_eq!(selectors, vec!["0xb", "0xd", "0xc", "0xa"]);
    }

    #[test]
    fn syscalls_sum_over_all_three_trees() {
        let mut t = tx(Some(CallTree {
            root: Call { selector: "0xexec".to_string(), syscall_count: 2 },
            inner: vec![CallTree {
                root: Call { selector: "0xinner".to_string(), syscall_count: 3 },
                inner: vec![],
            }],
        }));
        t.validate_call_info = Some(CallTree {
            root: Call { selector: "0xval".to_string(), syscall_count: 1 },
            inner: vec![],
        });
        assert_eq!(t.syscall_count(), 6);

        assert_eq!(tx(None).syscall_count(), 0);
    }

    #[test]
    fn transfer_requires_small_execute_tree() {
        assert!(is_transfer(&transfer_tx()));

        // Transfer selector buried in a larger call tree is not a pure
        // transfer.
        let busy = tx(Some(CallTree {
            root: call("0xexec"),
            inner: vec![leaf(TRANSFER_SELECTOR), leaf("0xother")],
        }));
        assert!(!is_transfer(&busy));
        assert!(!is_transfer(&tx(None)));
    }

    #[test]
    fn swap_matches_anywhere_in_the_tree() {
        assert!(is_swap(&swap_tx()));
        assert!(!is_swap(&transfer_tx()));
    }

    #[test]
    fn block_row_counts_and_percentages() {
        let block = BlockRecord {
            block_number: 7,
            block_timestamp: 86_400 * 3 + 10,
            entrypoints: vec![Some(transfer_tx()), Some(swap_tx()), None, Some(tx(None))],
        };
        let row = block_row(&block);
        assert_eq!(row.block, 7);
        assert_eq!(row.day, 3);
        assert_eq!(row.txs, 3);
        assert_eq!(row.transfers, 1);
        assert_eq!(row.swaps, 1);
        // Percentages are over all four slots, null included.
        assert_eq!(row.transfers_ptg, 25.0);
        assert_eq!(row.swaps_ptg, 25.0);
    }

    #[test]
    fn empty_block_has_zero_percentages() {
        let block = BlockRecord { block_number: 1, block_timestamp: 0, entrypoints: vec![] };
        let row = block_row(&block);
        assert_eq!(row.transfers_ptg, 0.0);
        assert_eq!(row.swaps_ptg, 0.0);
    }

    #[test]
    fn day_grouping_averages() {
        let rows = vec![
            BlockRow { block: 1, day: 5, txs: 10, transfers: 2, swaps: 0, transfers_ptg: 20.0, swaps_ptg: 0.0 },
            BlockRow { block: 2, day: 5, txs: 20, transfers: 4, swaps: 2, transfers_ptg: 20.0, swaps_ptg: 10.0 },
            BlockRow { block: 3, day: 6, txs: 4, transfers: 0, swaps: 0, transfers_ptg: 0.0, swaps_ptg: 0.0 },
        ];
        let days = group_by_day(&rows);
        assert_eq!(days.len(), 2);
        assert_eq!(days[&5].txs, 15.0);
        assert_eq!(days[&5].transfers, 3.0);
        assert_eq!(days[&5].swaps_ptg, 5.0);
        assert_eq!(days[&6].txs, 4.0);
    }

    #[test]
    fn day_labels_are_civil_dates() {
        assert_eq!(day_label(0), "1970-01-01");
        assert_eq!(day_label(19_723), "2024-01-01");
    }
}
