use std::collections::HashSet;

use super::*;

type Input = (Vec<(TestPrefix, u8)>, Vec<u32>, TestPartition);

qc!(array_matches_trie, _array_matches_trie);
fn _array_matches_trie((list, addrs, partition): Input) -> bool {
    let trie = trie_of(&list);
    let mut compressed = trie.clone();
    compressed.compress();
    let partition = partition.partition();
    let array = LayeredArrayBuilder::new(&partition).build(&trie).unwrap();
    let from_compressed = LayeredArrayBuilder::new(&partition)
        .build(&compressed)
        .unwrap();

    sample_addrs(&list, &addrs).into_iter().all(|addr| {
        let key = addr.to_be_bytes();
        let want = trie.lookup(&key);
        array.lookup(&key) == want && from_compressed.lookup(&key) == want
    })
}

qc!(compact_array_matches_trie, _compact_array_matches_trie);
fn _compact_array_matches_trie((list, addrs, partition): Input) -> bool {
    let trie = trie_of(&list);
    let partition = partition.partition();
    let array = LayeredArrayBuilder::new(&partition)
        .compact(true)
        .build(&trie)
        .unwrap();

    array.stored_nodes() <= array.slot_count()
        && sample_addrs(&list, &addrs)
            .into_iter()
            .all(|addr| array.lookup(&addr.to_be_bytes()) == trie.lookup_u32(addr))
}

qc!(table_matches_trie, _table_matches_trie);
fn _table_matches_trie(((list, addrs, partition), k): (Input, u8)) -> bool {
    let trie = trie_of(&list);
    let builder = TableBuilder::new(partition.partition()).k((k % 12) as u32);
    let table = builder
        .build(list.iter().map(|(p, v)| (p.0.to_be_bytes(), p.1 as u32, small(*v))))
        .unwrap();
    // the table does not depend on the trie being compressed first
    let uncompressed = builder.build_from_trie(&trie).unwrap();

    sample_addrs(&list, &addrs).into_iter().all(|addr| {
        let want = trie.lookup_u32(addr);
        table.lookup_u32(addr) == want && uncompressed.lookup_u32(addr) == want
    })
}

qc!(dense_matches_sparse, _dense_matches_sparse);
fn _dense_matches_sparse((list, addrs, partition): Input) -> bool {
    let trie = trie_of(&list);
    let all_dense = TableBuilder::new(partition.partition())
        .k(0)
        .build_from_trie(&trie)
        .unwrap();
    let all_sparse = TableBuilder::new(partition.partition())
        .k(u32::MAX)
        .build_from_trie(&trie)
        .unwrap();

    all_dense.stats().sparse_blocks == 0
        && all_sparse.stats().dense_blocks == 0
        && sample_addrs(&list, &addrs)
            .into_iter()
            .all(|addr| all_dense.lookup_u32(addr) == all_sparse.lookup_u32(addr))
}

qc!(results_are_deduplicated, _results_are_deduplicated);
fn _results_are_deduplicated((list, _, partition): Input) -> bool {
    let trie = trie_of(&list);
    let table = TableBuilder::new(partition.partition())
        .build_from_trie(&trie)
        .unwrap();
    let results = table.results();
    let values: HashSet<u8> = trie.iter().map(|(_, v)| *v).collect();
    let distinct: HashSet<&u8> = results[1..].iter().flatten().collect();

    results[0].is_none()
        && results[1..].iter().all(|r| r.is_some())
        && distinct.len() == results.len() - 1
        && distinct.iter().all(|v| values.contains(v))
}
