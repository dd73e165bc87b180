use std::fmt;

use serde::{Deserialize, Serialize};

use super::entropy::EntropySource;
use crate::blockchain::Address;

/// Shard tag partitioning status requests among oracles.
pub type ShardIndex = u8;

/// Indices assigned to every oracle at registration.
pub const INDEXES_PER_ORACLE: usize = 3;

/// The ordered triple of shard indices held by one oracle. Repeats are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexTriple([ShardIndex; INDEXES_PER_ORACLE]);

impl IndexTriple {
    pub fn new(indexes: [ShardIndex; INDEXES_PER_ORACLE]) -> Self {
        IndexTriple(indexes)
    }

    /// Strict equality match against a request's shard index.
    pub fn contains(&self, index: ShardIndex) -> bool {
        self.0.iter().any(|own| *own == index)
    }

    pub fn iter(&self) -> impl Iterator<Item = ShardIndex> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for IndexTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.0[0], self.0[1], self.0[2])
    }
}

/// Draws shard indices uniformly from `[0, index_range)`.
#[derive(Debug, Clone, Copy)]
pub struct ShardAssigner {
    index_range: u8,
}

impl ShardAssigner {
    pub fn new(index_range: u8) -> Self {
        Self {
            index_range: index_range.max(1),
        }
    }

    pub fn index_range(&self) -> u8 {
        self.index_range
    }

    pub fn assign_indexes(&self, entropy: &mut dyn EntropySource, oracle: &Address) -> IndexTriple {
        let mut indexes = [0; INDEXES_PER_ORACLE];
        for slot in indexes.iter_mut() {
            *slot = entropy.next_below(self.index_range, oracle);
        }
        IndexTriple(indexes)
    }

    pub fn request_index(&self, entropy: &mut dyn EntropySource, airline: &Address) -> ShardIndex {
        entropy.next_below(self.index_range, airline)
    }

    pub fn in_range(&self, index: ShardIndex) -> bool {
        index < self.index_range
    }
}

/// Number of oracles holding each shard index. An oracle holding the same
/// index twice is counted once for that index.
pub fn index_coverage<'a>(
    triples: impl IntoIterator<Item = &'a IndexTriple>,
    index_range: u8,
) -> Vec<usize> {
    let mut coverage = vec![0usize; index_range as usize];
    for triple in triples {
        for index in 0..index_range {
            if triple.contains(index) {
                coverage[index as usize] += 1;
            }
        }
    }
    coverage
}
