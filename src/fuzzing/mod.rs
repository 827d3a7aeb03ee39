//! Module for testing using fuzzing (quickcheck)
#![allow(clippy::type_complexity)]

use std::fmt::Debug;
use std::net::Ipv4Addr;

use crate::prefix::{mask_from_prefix_len, KeyBytes};
use crate::*;
use quickcheck::Arbitrary;

mod basic;
mod table;

#[cfg(miri)]
const DEFAULT_NUM_TESTS: usize = 10;
#[cfg(not(miri))]
const DEFAULT_NUM_TESTS: usize = 1000;
const DEFAULT_GEN_SIZE: usize = 100;

fn proptest_runner<A: Arbitrary + Debug + PartialEq, F: Fn(A) -> bool>(f: F) {
    let num_tests: usize = std::env::var("QUICKCHECK_TESTS")
        .ok()
        .and_then(|x| x.parse::<usize>().ok())
        .unwrap_or(DEFAULT_NUM_TESTS);

    let gen_size: usize = std::env::var("QUICKCHECK_GENERATOR_SIZE")
        .ok()
        .and_then(|x| x.parse::<usize>().ok())
        .unwrap_or(DEFAULT_GEN_SIZE);

    let mut gen = quickcheck::Gen::new(gen_size);

    // sample all inputs
    for _ in 0..num_tests {
        let input = A::arbitrary(&mut gen);
        let input_c = input.clone();
        let success = f(input_c);
        if !success {
            shrink_failure(f, input)
        }
    }
}

fn shrink_failure<A: Arbitrary + Debug + PartialEq, F: Fn(A) -> bool>(f: F, input: A) -> ! {
    for i in input.shrink() {
        let i_c = i.clone();
        let success = f(i_c);
        if !success {
            shrink_failure(f, i)
        }
    }
    // if we reach this point, then all shrunken inputs work. Therefore, `inputs` is the minimal
    // input
    panic!(
        "[QUICKCHECK] Test case failed!\n  Minimal input:\n    {:?}",
        input
    );
}

#[allow(missing_docs)]
#[macro_export]
macro_rules! qc {
    ($name:ident, $f:ident) => {
        #[test]
        fn $name() {
            proptest_runner($f)
        }
    };
}

/// An IPv4 prefix with all host bits cleared.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
struct TestPrefix(u32, u8);

impl TestPrefix {
    fn from_repr_len(repr: u32, len: u8) -> Self {
        Self(repr & mask_from_prefix_len::<u32>(len), len)
    }

    fn first(self) -> u32 {
        self.0
    }

    fn last(self) -> u32 {
        self.0 | !mask_from_prefix_len::<u32>(self.1)
    }

    fn contains(self, addr: u32) -> bool {
        addr & mask_from_prefix_len::<u32>(self.1) == self.0
    }
}

impl Debug for TestPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", Ipv4Addr::from(self.0), self.1)
    }
}

impl Prefix for TestPrefix {
    fn key(&self) -> KeyBytes {
        self.0.to_be_bytes().into()
    }

    fn prefix_len(&self) -> u8 {
        self.1
    }
}

impl Arbitrary for TestPrefix {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        #[rustfmt::skip]
        let len: u8 = *g
            .choose(&[
                0,
                4, 7,
                8, 8, 8,
                9, 11, 12, 14, 15,
                16, 16, 16, 16,
                17, 18, 20, 22, 23,
                24, 24, 24, 24,
                25, 26, 28, 30, 31,
                32, 32,
            ])
            .unwrap();
        // cluster the prefixes below a few top octets so that they overlap
        let top: u32 = *g.choose(&[10, 10, 10, 11, 192]).unwrap();
        let x = (top << 24) | (u32::arbitrary(g) >> 8);
        let x = if bool::arbitrary(g) { x } else { x & 0xffff_0f0f };
        Self::from_repr_len(x, len)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        if self.1 == 0 {
            quickcheck::empty_shrinker()
        } else {
            let len = self.1 - 1;
            let x = Self::from_repr_len(self.0, len);
            quickcheck::single_shrinker(x)
        }
    }
}

const PARTITIONS: &[&[u32]] = &[
    &[16, 8, 8],
    &[8, 8, 8, 8],
    &[12, 4, 4, 4, 8],
    &[4, 4, 8, 8, 8],
    &[8, 16, 8],
    &[1, 15, 16],
];

/// A depth partition of 32 bits.
#[derive(Clone, Debug, PartialEq)]
struct TestPartition(Vec<u32>);

impl TestPartition {
    fn partition(&self) -> DepthPartition {
        DepthPartition::with_width(&self.0, 32).unwrap()
    }
}

impl Arbitrary for TestPartition {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Self(g.choose(PARTITIONS).unwrap().to_vec())
    }
}

/// A small value, so that many prefixes share the same one.
fn small(value: u8) -> u8 {
    value % 4
}

fn trie_of(list: &[(TestPrefix, u8)]) -> BinaryTrie<u8> {
    let mut trie = BinaryTrie::new();
    for (p, v) in list {
        trie.insert_prefix(p, small(*v)).unwrap();
    }
    trie
}

/// Addresses worth probing: the bounds of every prefix and their neighbors, and `extra`.
fn sample_addrs(list: &[(TestPrefix, u8)], extra: &[u32]) -> Vec<u32> {
    list.iter()
        .flat_map(|(p, _)| {
            [
                p.first(),
                p.last(),
                p.first().wrapping_sub(1),
                p.last().wrapping_add(1),
            ]
        })
        .chain(extra.iter().copied())
        .collect()
}
