// Copyright (c) 2026 Pulsechain
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use libfuzzer_sys::fuzz_target;
use pulsechain::core::block::genesis;
use pulsechain::core::chain::store::ChainStore;
use pulsechain::networking::session::{ingest_record, Ingest};

fuzz_target!(|data: &[u8]| {
    // Arbitrary wire records must never panic and never shrink the chain.
    let store = ChainStore::new(genesis());
    match ingest_record(&store, data, 1 << 16) {
        Ingest::Adopted { len } => assert_eq!(store.len(), len),
        _ => assert_eq!(store.len(), 1),
    }
});
