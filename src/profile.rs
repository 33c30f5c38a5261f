//! Libfunc profiling dumps and per-transaction bench data: how much of a
//! transaction's work lands in runtime (syscall-backed) libfuncs.

use serde::Deserialize;

/// Libfuncs implemented by runtime calls rather than inline code.
pub const RUNTIME_LIBFUNCS: [&str; 50] = [
    "debug_print",
    "pedersen_hash",
    "hades_permutation",
    "ec_state_finalize",
    "ec_state_init",
    "ec_state_add_mul",
    "ec_state_add",
    "ec_try_new",
    "ec_point_from_x",
    "felt252dict_new",
    "felt252dict_get",
    "get_builtin_costs",
    "class_hash_const",
    "class_hash_try_from_felt252",
    "class_hash_to_felt252",
    "contract_address_const",
    "contract_address_try_from_felt252",
    "contract_address_to_felt252",
    "storage_read",
    "storage_write",
    "storage_base_address_const",
    "storage_base_address_from_felt252",
    "storage_address_from_base",
    "storage_address_from_base_and_offset",
    "storage_address_to_felt252",
    "storage_address_try_from_felt252",
    "emit_event",
    "get_block_hash",
    "get_exec_info_v1",
    "get_exec_info_v2",
    "deploy",
    "keccak",
    "replace_class",
    "send_message_to_l1",
    "cheatcode",
    "secp256k1_new",
    "secp256k1_add",
    "secp256k1_mul",
    "secp256k1_get_point_from_x",
    "secp256k1_get_xy",
    "secp256r1_new",
    "secp256r1_add",
    "secp256r1_mul",
    "secp256r1_get_point_from_x",
    "secp256r1_get_xy",
    "sha256_process_block",
    "sha256_state_handle_init",
    "sha256_state_handle_digest",
    "get_class_hash_at_syscall",
    "meta_tx_v0",
];

/// Nested-call libfuncs, excluded from totals since their time is already
/// accounted for inside the callee's own samples.
const CALL_LIBFUNCS: [&str; 2] = ["contract_call", "library_call"];

/// One transaction's libfunc profile from a profiling dump.
#[derive(Debug, Clone, Deserialize)]
pub struct LibfuncProfile {
    pub block_number: u64,
    #[serde(rename = "tx")]
    pub tx_hash: String,
    #[serde(default)]
    pub data: Vec<LibfuncSample>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibfuncSample {
    pub libfunc_name: String,
    #[serde(default)]
    pub samples: u64,
    #[serde(default)]
    pub total_time: f64,
}

impl LibfuncProfile {
    /// Total libfunc invocations.
    pub fn total_calls(&self) -> u64 {
        self.data.iter().map(|s| s.samples).sum()
    }

    /// Libfunc time excluding nested calls.
    pub fn libfunc_time(&self) -> f64 {
        self.data
            .iter()
            .filter(|s| !CALL_LIBFUNCS.contains(&s.libfunc_name.as_str()))
            .map(|s| s.total_time)
            .sum()
    }

    /// Time spent in runtime libfuncs.
    pub fn runtime_time(&self) -> f64 {
        self.data
            .iter()
            .filter(|s| RUNTIME_LIBFUNCS.contains(&s.libfunc_name.as_str()))
            .map(|s| s.total_time)
            .sum()
    }

    /// Share of libfunc time spent in runtime libfuncs, in percent.
    pub fn runtime_percentage(&self) -> f64 {
        crate::stats::percentage(self.runtime_time(), self.libfunc_time())
    }
}

/// Per-transaction wall times from one executor's bench run.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchData {
    pub transactions: Vec<BenchTx>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BenchTx {
    pub hash: String,
    pub time_ns: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(name: &str, samples: u64, total_time: f64) -> LibfuncSample {
        LibfuncSample { libfunc_name: name.to_string(), samples, total_time }
    }

    fn profile(data: Vec<LibfuncSample>) -> LibfuncProfile {
        LibfuncProfile { block_number: 1, tx_hash: "0x1".to_string(), data }
    }

    #[test]
    fn total_calls_sum_samples() {
        let p = profile(vec![sample("felt252_add", 10, 1.0), sample("storage_read", 5, 2.0)]);
        assert_eq!(p.total_calls(), 15);
    }

    #[test]
    fn runtime_percentage_excludes_nested_calls() {
        let p = profile(vec![
            sample("storage_read", 1, 30.0),
            sample("felt252_add", 1, 70.0),
            // Nested-call time is not part of the denominator.
            sample("contract_call", 1, 900.0),
        ]);
        assert_eq!(p.runtime_percentage(), 30.0);
    }

    #[test]
    fn runtime_percentage_of_an_empty_profile_is_zero() {
        assert_eq!(profile(vec![]).runtime_percentage(), 0.0);
    }

    #[test]
    fn profiles_deserialize_the_dump_shape() {
        let p: LibfuncProfile = serde_json::from_str(
            r#"{"block_number": 7, "tx": "0xabc",
                "data": [{"libfunc_name": "storage_read", "samples": 3, "total_time": 12.5}]}"#,
        )
        .unwrap();
        assert_eq!(p.tx_hash, "0xabc");
        assert_eq!(p.total_calls(), 3);
    }
}
