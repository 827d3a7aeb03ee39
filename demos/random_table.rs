use std::net::Ipv4Addr;
use std::time::Instant;

use fib_compress::*;

use rand::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut rng = thread_rng();
    let mut trie = BinaryTrie::new();

    for _ in 0..500_000 {
        let len = rng.gen_range(8..=24);
        let addr = Ipv4Addr::from(rng.gen::<u32>());
        // a few hundred next hops, shared by many prefixes
        let value: u32 = rng.gen_range(0..300);
        trie.insert(&addr.octets(), len, value)?;
    }
    trie.insert(&[0, 0, 0, 0], 0, u32::MAX)?;

    let start = Instant::now();
    trie.compress();
    let table = TableBuilder::new(DepthPartition::ipv4()).build_from_trie(&trie)?;
    println!("built in {:?}", start.elapsed());
    println!("{}", table.stats());

    let mut mismatches = 0;
    for _ in 0..1_000_000 {
        let addr = rng.gen::<u32>();
        if table.lookup_u32(addr) != trie.lookup_u32(addr) {
            mismatches += 1;
        }
    }
    println!("mismatches: {mismatches}");
    Ok(())
}
