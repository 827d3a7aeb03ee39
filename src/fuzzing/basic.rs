use std::collections::HashMap;

use super::*;
use itertools::Itertools;

fn hashmap_of(list: &[(TestPrefix, u8)]) -> HashMap<TestPrefix, u8> {
    list.iter().map(|(p, v)| (*p, small(*v))).collect()
}

qc!(iter_matches_hashmap, _iter_matches_hashmap);
fn _iter_matches_hashmap(list: Vec<(TestPrefix, u8)>) -> bool {
    let trie = trie_of(&list);
    let hmap = hashmap_of(&list);

    trie.len() == hmap.len()
        && trie
            .iter()
            .map(|(p, v)| (TestPrefix((p.bits() >> 96) as u32, p.len()), *v))
            .eq(hmap.into_iter().sorted())
}

qc!(get_matches_hashmap, _get_matches_hashmap);
fn _get_matches_hashmap(list: Vec<(TestPrefix, u8)>) -> bool {
    let trie = trie_of(&list);
    let hmap = hashmap_of(&list);
    list.iter().all(|(p, _)| {
        let key = p.0.to_be_bytes();
        let exact = trie.get(&key, p.1 as u32) == hmap.get(p);
        // the left child of `p` has the same address bits
        let child = p.1 == 32
            || trie.get(&key, p.1 as u32 + 1) == hmap.get(&TestPrefix(p.0, p.1 + 1));
        exact && child
    })
}

qc!(lookup_is_longest_match, _lookup_is_longest_match);
fn _lookup_is_longest_match((list, addrs): (Vec<(TestPrefix, u8)>, Vec<u32>)) -> bool {
    let trie = trie_of(&list);
    let hmap = hashmap_of(&list);
    sample_addrs(&list, &addrs).into_iter().all(|addr| {
        let want = hmap
            .iter()
            .filter(|(p, _)| p.contains(addr))
            .max_by_key(|(p, _)| p.1)
            .map(|(_, v)| v);
        trie.lookup_u32(addr) == want
    })
}

qc!(compress_preserves_lookup, _compress_preserves_lookup);
fn _compress_preserves_lookup((list, addrs): (Vec<(TestPrefix, u8)>, Vec<u32>)) -> bool {
    let trie = trie_of(&list);
    let mut compressed = trie.clone();
    compressed.compress();
    compressed.node_count() <= trie.node_count()
        && sample_addrs(&list, &addrs)
            .into_iter()
            .all(|addr| trie.lookup_u32(addr) == compressed.lookup_u32(addr))
}

qc!(compress_is_idempotent, _compress_is_idempotent);
fn _compress_is_idempotent(list: Vec<(TestPrefix, u8)>) -> bool {
    let mut once = trie_of(&list);
    once.compress();
    let mut twice = once.clone();
    twice.compress();
    once == twice && once.node_count() == twice.node_count()
}

qc!(clone_is_equal, _clone_is_equal);
fn _clone_is_equal(list: Vec<(TestPrefix, u8)>) -> bool {
    let trie = trie_of(&list);
    let mut rebuilt = BinaryTrie::new();
    for (p, v) in trie.iter() {
        rebuilt.insert_bits(p, *v);
    }
    trie == trie.clone() && trie == rebuilt
}
