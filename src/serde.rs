//! Serialization and Deserialization implementation

use ::serde::de::Error as _;
use ::serde::ser::SerializeSeq;
use ::serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::prefix::Prefix;
use crate::trie::BinaryTrie;

/// A trie is serialized as a list of `(key, prefix_len, value)` rows in lexicographic order, where
/// `key` holds the `ceil(prefix_len / 8)` leading bytes of the prefix.
impl<V: Serialize> Serialize for BinaryTrie<V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for (prefix, value) in self {
            let key = prefix.key();
            seq.serialize_element(&(key.as_ref(), prefix.prefix_len(), value))?;
        }
        seq.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for BinaryTrie<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rows: Vec<(Vec<u8>, u32, V)> = Vec::deserialize(deserializer)?;
        let mut trie = BinaryTrie::new();
        for (key, prefix_len, value) in rows {
            trie.insert(&key, prefix_len, value)
                .map_err(D::Error::custom)?;
        }
        Ok(trie)
    }
}
