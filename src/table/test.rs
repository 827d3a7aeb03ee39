use std::net::{IpAddr, Ipv4Addr};

use super::*;

use crate::error::Error;
use crate::trie::BinaryTrie;
use crate::LayeredArrayBuilder;

fn ip(s: &str) -> [u8; 4] {
    s.parse::<Ipv4Addr>().unwrap().octets()
}

fn table(prefixes: &[(&str, u32, &'static str)]) -> CompressedLookupTable<&'static str> {
    TableBuilder::new(DepthPartition::ipv4())
        .build(prefixes.iter().map(|(addr, len, value)| (ip(addr), *len, *value)))
        .unwrap()
}

#[test]
fn longest_prefix_match() {
    let t = table(&[
        ("10.0.0.0", 8, "broad"),
        ("10.1.0.0", 16, "narrow"),
        ("10.1.2.0", 24, "narrower"),
    ]);
    assert_eq!(t.lookup(&ip("10.1.2.100")), Some(&"narrower"));
    assert_eq!(t.lookup(&ip("10.1.3.1")), Some(&"narrow"));
    assert_eq!(t.lookup(&ip("10.2.3.4")), Some(&"broad"));
    assert_eq!(t.lookup(&ip("9.255.255.255")), None);
    assert_eq!(t.lookup(&ip("11.0.0.0")), None);
}

#[test]
fn default_route() {
    let t = table(&[("0.0.0.0", 0, "default")]);
    for addr in ["0.0.0.0", "1.2.3.4", "127.0.0.1", "255.255.255.255"] {
        assert_eq!(t.lookup(&ip(addr)), Some(&"default"), "{addr}");
    }
    assert!((0..1 << 16).all(|i| t.root_entry(i) == Some(LookupEntry::Leaf(1))));
    assert_eq!(t.stats().dense_blocks + t.stats().sparse_blocks, 0);
}

#[test]
fn default_route_with_specifics() {
    let t = table(&[("0.0.0.0", 0, "default"), ("1.2.3.0", 24, "specific")]);
    assert_eq!(t.lookup(&ip("255.255.255.255")), Some(&"default"));
    assert_eq!(t.lookup(&ip("1.2.3.200")), Some(&"specific"));
    assert_eq!(t.lookup(&ip("1.2.4.200")), Some(&"default"));
}

#[test]
fn host_route() {
    let t = table(&[("1.2.3.4", 32, "host")]);
    assert_eq!(t.lookup(&ip("1.2.3.4")), Some(&"host"));
    assert_eq!(t.lookup(&ip("1.2.3.5")), None);
    assert_eq!(t.lookup(&ip("1.2.3.3")), None);
    assert_eq!(t.lookup_u32(0x01020304), Some(&"host"));
}

#[test]
fn value_dedup() {
    let t = table(&[
        ("10.0.0.0", 8, "same"),
        ("20.1.0.0", 16, "same"),
        ("30.1.2.0", 24, "same"),
    ]);
    assert!(t.results().len() <= 2);
    assert_eq!(t.results()[0], None);
    assert_eq!(t.stats().results, 1);
    for addr in ["10.9.9.9", "20.1.9.9", "30.1.2.9"] {
        assert_eq!(t.lookup(&ip(addr)), Some(&"same"));
    }
}

/// Prefixes below `10.0.0.0/16` that produce a level-1 block with exactly `distinct` distinct
/// values (including the inherited `/16` value).
fn block_with(distinct: u32) -> Vec<([u8; 4], u32, u32)> {
    let mut prefixes = vec![([10, 0, 0, 0], 16, 0)];
    for i in 1..distinct {
        prefixes.push(([10, 0, (i * 7) as u8, 0], 24, i));
    }
    prefixes
}

#[test]
fn dense_sparse_boundary() {
    for k in [1, 3, DEFAULT_K, 20] {
        let builder = TableBuilder::new(DepthPartition::ipv4()).k(k);
        let dense = builder.build(block_with(k + 1)).unwrap();
        let sparse = builder.build(block_with(k)).unwrap();
        assert!(matches!(dense.root_entry(0x0a00), Some(LookupEntry::Dense(0))));
        if k > 1 {
            assert!(matches!(sparse.root_entry(0x0a00), Some(LookupEntry::Sparse(0))));
        }

        let mut trie = BinaryTrie::new();
        for (key, len, value) in block_with(k + 1) {
            trie.insert(&key, len, value).unwrap();
        }
        let mut small_trie = BinaryTrie::new();
        for (key, len, value) in block_with(k) {
            small_trie.insert(&key, len, value).unwrap();
        }
        for byte in 0..=255u8 {
            let addr = [10, 0, byte, 1];
            assert_eq!(dense.lookup(&addr), trie.lookup(&addr), "k {k}, byte {byte}");
            assert_eq!(
                sparse.lookup(&addr),
                small_trie.lookup(&addr),
                "k {k}, byte {byte}"
            );
        }
    }
}

#[test]
fn dense_and_sparse_agree() {
    let prefixes = block_with(12);
    let dense = TableBuilder::new(DepthPartition::ipv4())
        .k(2)
        .build(prefixes.clone())
        .unwrap();
    let sparse = TableBuilder::new(DepthPartition::ipv4())
        .k(100)
        .build(prefixes)
        .unwrap();
    assert_eq!(dense.stats().sparse_blocks, 0);
    assert_eq!(sparse.stats().dense_blocks, 0);
    for byte in 0..=255u8 {
        let addr = [10, 0, byte, 0];
        assert_eq!(dense.lookup(&addr), sparse.lookup(&addr));
    }
}

#[test]
fn uniform_block_is_collapsed() {
    // the /24 does not merge into the /16 in the trie, but every slot below resolves to "a"
    let t = table(&[("10.0.0.0", 16, "a"), ("10.0.1.0", 24, "a")]);
    assert_eq!(t.root_entry(0x0a00), Some(LookupEntry::Leaf(1)));
    assert_eq!(t.stats().sparse_blocks, 0);
}

#[test]
fn identical_blocks_are_shared() {
    let t = table(&[
        ("10.0.0.0", 16, "a"),
        ("10.0.5.0", 24, "b"),
        ("11.0.0.0", 16, "a"),
        ("11.0.5.0", 24, "b"),
        ("12.0.5.0", 24, "b"),
    ]);
    assert_eq!(t.root_entry(0x0a00), t.root_entry(0x0b00));
    assert_ne!(t.root_entry(0x0a00), t.root_entry(0x0c00));
    assert_eq!(t.stats().sparse_blocks, 2);
    assert_eq!(t.lookup(&ip("11.0.5.1")), Some(&"b"));
    assert_eq!(t.lookup(&ip("11.0.6.1")), Some(&"a"));
    assert_eq!(t.lookup(&ip("12.0.6.1")), None);
}

#[test]
fn short_input() {
    let t = table(&[("10.0.0.0", 8, "broad"), ("10.1.2.0", 24, "narrow")]);
    assert_eq!(t.lookup(&[]), None);
    assert_eq!(t.lookup(&[10]), None);
    // the root level resolves 10.2 on its own
    assert_eq!(t.lookup(&[10, 2]), Some(&"broad"));
    // 10.1 needs the next level
    assert_eq!(t.lookup(&[10, 1]), None);
    assert_eq!(t.lookup(&[10, 1, 2]), Some(&"narrow"));
}

#[test]
fn longer_input_is_truncated() {
    let t = table(&[("10.1.2.0", 24, "narrow")]);
    assert_eq!(t.lookup(&[10, 1, 2, 3, 4, 5, 6]), Some(&"narrow"));
}

#[test]
fn typed_lookups() {
    let t = table(&[("192.168.0.0", 16, "lan")]);
    assert_eq!(
        t.lookup_addr(IpAddr::V4(Ipv4Addr::new(192, 168, 3, 4))),
        Some(&"lan")
    );
    assert_eq!(t.lookup_u32(0xc0a80001), Some(&"lan"));
    assert_eq!(t.lookup_u32(0xc0a90001), None);

    let v6 = TableBuilder::new(DepthPartition::ipv6())
        .build([(0x2001_0db8u128 << 96, 32, 'd'), (0x2001_0db8_0001u128 << 80, 48, 'e')]
            .map(|(addr, len, v)| (addr.to_be_bytes(), len, v)))
        .unwrap();
    let addr: std::net::Ipv6Addr = "2001:db8:1::42".parse().unwrap();
    assert_eq!(v6.lookup_addr(IpAddr::V6(addr)), Some(&'e'));
    assert_eq!(v6.lookup_u128((0x2001_0db8_0002u128 << 80) | 1), Some(&'d'));
    assert_eq!(v6.lookup_u128(1), None);
}

#[test]
fn errors() {
    let builder = TableBuilder::new(DepthPartition::ipv4());
    assert_eq!(
        builder.build([([10, 0, 0, 0], 33, 1)]).err(),
        Some(Error::PrefixLength {
            prefix_len: 33,
            key_bits: 32
        })
    );
    assert_eq!(
        crate::build([([10, 0, 0, 0], 8, 1)], &[], 8).err(),
        Some(Error::EmptyPartition)
    );
}

#[test]
fn key_width_must_match_partition() {
    assert_eq!(
        crate::build([([10, 1, 0, 0], 16, 'x')], &[16, 8], 8).err(),
        Some(Error::KeyWidth {
            key_bits: 32,
            width: 24
        })
    );
    let v6 = TableBuilder::new(DepthPartition::ipv6());
    assert_eq!(
        v6.build([([10, 1, 0, 0], 16, 'x')]).err(),
        Some(Error::KeyWidth {
            key_bits: 32,
            width: 128
        })
    );
    let v4 = TableBuilder::new(DepthPartition::ipv4());
    assert_eq!(
        v4.build([(vec![10u8], 8, 'x')]).err(),
        Some(Error::KeyWidth {
            key_bits: 8,
            width: 32
        })
    );
    // one bad key fails the whole build
    assert_eq!(
        v4.build([(vec![10u8, 0, 0, 0], 8, 'a'), (vec![10u8, 1, 0], 16, 'b')])
            .err(),
        Some(Error::KeyWidth {
            key_bits: 24,
            width: 32
        })
    );
    assert!(crate::build([([10, 1, 0], 16, 'x')], &[16, 8], 8).is_ok());
}

#[test]
fn array_shape() {
    let mut trie = BinaryTrie::new();
    trie.insert(&[10, 1, 2, 0], 24, 1).unwrap();
    let array = LayeredArrayBuilder::new(&DepthPartition::ipv4())
        .build(&trie)
        .unwrap();

    let other = TableBuilder::new(DepthPartition::new(&[8, 8, 8, 8]).unwrap());
    assert_eq!(
        other.build_from_array(&array).err(),
        Some(Error::ArrayShape {
            level: 0,
            expected: 8,
            found: 16
        })
    );
    let other = TableBuilder::new(DepthPartition::new(&[16, 4, 12]).unwrap());
    assert_eq!(
        other.build_from_array(&array).err(),
        Some(Error::ArrayShape {
            level: 1,
            expected: 4,
            found: 8
        })
    );
    let t = TableBuilder::new(DepthPartition::ipv4())
        .build_from_array(&array)
        .unwrap();
    assert_eq!(t.lookup(&[10, 1, 2, 3]), Some(&1));
}

#[test]
fn compact_arrays() {
    let prefixes = [
        ([10, 0, 0, 0], 8, 1),
        ([10, 1, 0, 0], 16, 2),
        ([10, 1, 2, 0], 23, 3),
        ([10, 1, 2, 128], 25, 4),
    ];
    let plain = TableBuilder::new(DepthPartition::ipv4())
        .build(prefixes)
        .unwrap();
    let compact = TableBuilder::new(DepthPartition::ipv4())
        .compact_arrays(true)
        .build(prefixes)
        .unwrap();
    assert_eq!(plain.stats(), compact.stats());
    for addr in [[10, 1, 2, 200], [10, 1, 3, 1], [10, 1, 4, 1], [10, 2, 0, 0]] {
        assert_eq!(plain.lookup(&addr), compact.lookup(&addr));
    }
    assert_eq!(compact.lookup(&[10, 1, 2, 200]), Some(&4));
    assert_eq!(compact.lookup(&[10, 1, 3, 1]), Some(&3));
}

#[test]
fn uneven_partition() {
    let prefixes = [
        ([10, 0, 0, 0], 8, 'a'),
        ([10, 16, 0, 0], 12, 'b'),
        ([10, 17, 0, 0], 17, 'c'),
        ([10, 17, 128, 7], 32, 'd'),
    ];
    let t = TableBuilder::new(DepthPartition::new(&[12, 4, 4, 4, 8]).unwrap())
        .build(prefixes)
        .unwrap();
    assert_eq!(t.lookup(&[10, 0, 0, 1]), Some(&'a'));
    assert_eq!(t.lookup(&[10, 18, 0, 1]), Some(&'b'));
    assert_eq!(t.lookup(&[10, 17, 1, 1]), Some(&'c'));
    assert_eq!(t.lookup(&[10, 17, 128, 7]), Some(&'d'));
    assert_eq!(t.lookup(&[10, 17, 128, 8]), Some(&'b'));
}

#[test]
fn deterministic() {
    let prefixes: Vec<_> = (0..200u32)
        .map(|i| (((i * 7919) << 8).to_be_bytes(), 16 + i % 17, i % 13))
        .collect();
    let a = TableBuilder::new(DepthPartition::ipv4())
        .build(prefixes.clone())
        .unwrap();
    let b = TableBuilder::new(DepthPartition::ipv4())
        .build(prefixes)
        .unwrap();
    assert_eq!(a.stats(), b.stats());
    assert_eq!(a.results(), b.results());
    assert!((0..1 << 16).all(|i| a.root_entry(i) == b.root_entry(i)));
}

#[test]
fn stats() {
    let t = table(&[("10.0.0.0", 8, "a"), ("10.0.1.0", 24, "b")]);
    let stats = t.stats();
    assert_eq!(stats.levels, 3);
    assert_eq!(stats.root_slots, 1 << 16);
    assert_eq!(stats.results, 2);
    assert_eq!(stats.sparse_blocks, 1);
    assert_eq!(stats.sparse_entries, 2);
    assert_eq!(stats.dense_blocks, 0);
    assert!(stats.memory_bytes >= (1 << 16) * 4);
}

#[test]
fn send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CompressedLookupTable<String>>();
}

#[test]
fn shared_across_threads() {
    let t = std::sync::Arc::new(table(&[("10.0.0.0", 8, "a"), ("10.0.1.0", 24, "b")]));
    let handles: Vec<_> = (0..4u8)
        .map(|i| {
            let t = t.clone();
            std::thread::spawn(move || *t.lookup(&[10, 0, i % 2, 9]).unwrap())
        })
        .collect();
    let found: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(found, vec!["a", "b", "a", "b"]);
}
