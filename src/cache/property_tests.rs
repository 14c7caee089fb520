//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the memory table's capacity and FIFO guarantees.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::cache::{ByteSize, Capacity, MemoryTable};

// == Strategies ==
/// Generates small keys so that sequences contain repeats
fn key_strategy() -> impl Strategy<Value = u16> {
    0u16..64
}

/// Generates string values of varying estimated size
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-z]{0,48}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum TableOp {
    Put { key: u16, value: String },
    Remove { key: u16 },
    Clear,
}

fn table_op_strategy() -> impl Strategy<Value = TableOp> {
    prop_oneof![
        8 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| TableOp::Put { key, value }),
        2 => key_strategy().prop_map(|key| TableOp::Remove { key }),
        1 => Just(TableOp::Clear),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* key not evicted since insertion, get after put returns the
    // value that was put.
    #[test]
    fn prop_roundtrip_until_evicted(key in key_strategy(), value in value_strategy()) {
        let mut table = MemoryTable::new(Capacity::MaxEntries(8));

        table.put(key, value.clone());
        prop_assert_eq!(table.get(&key), Some(&value), "Round-trip value mismatch");
    }

    // *For any* sequence of puts, the entry count never exceeds MaxEntries.
    #[test]
    fn prop_entry_capacity_enforcement(
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..200)
    ) {
        let max_entries = 10;
        let mut table = MemoryTable::new(Capacity::MaxEntries(max_entries));

        for (key, value) in entries {
            table.put(key, value);
            prop_assert!(
                table.len() <= max_entries,
                "Table size {} exceeds max {}",
                table.len(),
                max_entries
            );
        }
    }

    // *For any* sequence of puts, the byte size stays within MaxBytes unless
    // the single entry just written is itself larger than the bound.
    #[test]
    fn prop_byte_capacity_enforcement(
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..200)
    ) {
        let max_bytes = 200;
        let mut table = MemoryTable::new(Capacity::MaxBytes(max_bytes));

        for (key, value) in entries {
            let size = value.byte_size();
            table.put(key, value);
            if size > max_bytes {
                prop_assert_eq!(table.len(), 1);
                prop_assert!(table.contains(&key));
            } else {
                prop_assert!(table.size() <= max_bytes);
            }
        }
    }

    // *For any* N distinct keys inserted into a table of capacity N - 1,
    // exactly the first key is gone and the rest survive.
    #[test]
    fn prop_fifo_eviction_order(
        keys in prop::collection::hash_set(key_strategy(), 2..20)
    ) {
        let keys: Vec<u16> = keys.into_iter().collect();
        let capacity = keys.len() - 1;
        let mut table = MemoryTable::new(Capacity::MaxEntries(capacity));

        for key in &keys {
            table.put(*key, key.to_string());
        }

        prop_assert!(!table.contains(&keys[0]), "Oldest key should be evicted");
        for key in keys.iter().skip(1) {
            prop_assert!(table.contains(key), "Key {} should survive", key);
        }
    }

    // *For any* operation sequence, the table agrees with a model map on
    // every surviving key, and the byte counter equals the sum of sizes.
    #[test]
    fn prop_matches_model(ops in prop::collection::vec(table_op_strategy(), 1..100)) {
        let mut table = MemoryTable::new(Capacity::MaxEntries(16));
        let mut model: HashMap<u16, String> = HashMap::new();

        for op in ops {
            match op {
                TableOp::Put { key, value } => {
                    model.insert(key, value.clone());
                    for evicted in table.put(key, value) {
                        model.remove(&evicted);
                    }
                }
                TableOp::Remove { key } => {
                    prop_assert_eq!(table.remove(&key), model.remove(&key));
                }
                TableOp::Clear => {
                    table.clear();
                    model.clear();
                }
            }
        }

        prop_assert_eq!(table.len(), model.len());
        for (key, value) in &model {
            prop_assert_eq!(table.get(key), Some(value));
        }
        let expected_bytes: usize = model.values().map(ByteSize::byte_size).sum();
        prop_assert_eq!(table.bytes(), expected_bytes);
    }
}
