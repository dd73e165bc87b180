use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

use crate::blockchain::Address;

/// Source of shard-index draws. Implementations must be unpredictable to any
/// single party yet reproducible from their inputs.
#[cfg_attr(test, mockall::automock)]
pub trait EntropySource: Send {
    /// Draws a value uniformly from `[0, bound)` on behalf of `account`.
    fn next_below(&mut self, bound: u8, account: &Address) -> u8;
}

/// Hash-chained entropy in the style of block-hash randomness: every draw
/// hashes the beacon, a strictly increasing nonce and the account.
#[derive(Debug, Clone)]
pub struct ChainEntropy {
    beacon: [u8; 32],
    nonce: u64,
}

impl ChainEntropy {
    pub fn new(beacon: [u8; 32]) -> Self {
        Self { beacon, nonce: 0 }
    }

    /// Beacon drawn from the operating system RNG.
    pub fn from_os() -> Self {
        let mut beacon = [0u8; 32];
        rand::rngs::OsRng.fill(&mut beacon);
        Self::new(beacon)
    }

    /// Mixes a new block hash into the beacon.
    pub fn absorb(&mut self, block_hash: &[u8]) {
        let mut hasher = Sha256::new();
        hasher.update(self.beacon);
        hasher.update(block_hash);
        self.beacon.copy_from_slice(&hasher.finalize());
    }

    fn draw(&mut self, account: &Address) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.beacon);
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(account.as_bytes());
        let result = hasher.finalize();
        self.nonce = self.nonce.wrapping_add(1);

        let mut value = 0u64;
        for byte in result.iter().take(8) {
            value = (value << 8) | (*byte as u64);
        }
        value
    }
}

impl EntropySource for ChainEntropy {
    fn next_below(&mut self, bound: u8, account: &Address) -> u8 {
        if bound == 0 {
            return 0;
        }
        (self.draw(account) % bound as u64) as u8
    }
}

/// Seeded ChaCha20 stream; identical seeds give identical index assignment.
#[derive(Debug, Clone)]
pub struct SeededEntropy {
    rng: ChaCha20Rng,
}

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl EntropySource for SeededEntropy {
    fn next_below(&mut self, bound: u8, _account: &Address) -> u8 {
        if bound == 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }
}

/// Replays a fixed sequence of draws (wrapping), reduced modulo the bound.
#[derive(Debug, Clone)]
pub struct ScriptedEntropy {
    script: Vec<u8>,
    position: usize,
}

impl ScriptedEntropy {
    pub fn new(script: Vec<u8>) -> Self {
        Self { script, position: 0 }
    }
}

impl EntropySource for ScriptedEntropy {
    fn next_below(&mut self, bound: u8, _account: &Address) -> u8 {
        if bound == 0 || self.script.is_empty() {
            return 0;
        }
        let value = self.script[self.position % self.script.len()];
        self.position += 1;
        value % bound
    }
}
