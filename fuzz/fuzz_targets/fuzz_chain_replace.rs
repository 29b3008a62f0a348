// Copyright (c) 2026 Pulsechain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![no_main]
#![forbid(unsafe_code)]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pulsechain::core::block::{generate_block_at, genesis};
use pulsechain::core::chain::store::{validate_chain, ChainStore};

#[derive(Clone, Debug, Arbitrary)]
struct Input {
    payloads: Vec<i64>,
    tamper_at: Option<(u16, u8, i64)>,
}

fuzz_target!(|inp: Input| {
    let g = genesis();
    let store = ChainStore::new(g.clone());
    let mut chain = vec![g];
    for (i, p) in inp.payloads.iter().take(64).enumerate() {
        let prev = chain[chain.len() - 1].clone();
        chain.push(generate_block_at(&prev, *p, format!("f{i}")));
    }
    if let Some((pos, field, v)) = inp.tamper_at {
        let pos = pos as usize % chain.len();
        match field % 3 {
            0 => chain[pos].index = v as u64,
            1 => chain[pos].payload = v,
            _ => chain[pos].prev_hash = format!("{v:x}"),
        }
    }

    let before = store.snapshot();
    match store.replace_if_better(chain.clone()) {
        Ok(_) => assert!(validate_chain(&store.snapshot(), store.genesis()).is_ok()),
        Err(_) => assert_eq!(store.snapshot(), before),
    }
});
