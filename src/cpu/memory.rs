//! Sparse byte-addressable memory.
//!
//! The address space is a full 2^32 bytes, but programs only ever touch a
//! handful of addresses. Bytes live in a chained hash table: each bucket is
//! a short list of `(address, byte)` pairs. The table starts with two
//! buckets and doubles whenever utilisation passes 80%.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::TryReserveError;
use thiserror::Error;

/// Number of buckets in a freshly created store.
pub const INITIAL_BUCKETS: usize = 2;

/// Entries-per-bucket percentage that triggers a resize.
pub const UTILISATION_THRESHOLD: usize = 80;

/// What a read from a never-written address returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillPolicy {
    /// Always `0x00`. Deterministic, used for testing and by default.
    #[default]
    Zero,
    /// Pseudo-random garbage, reproducible for a given seed.
    Random { seed: u64 },
}

/// Fill source built from a [`FillPolicy`].
#[derive(Debug, Clone)]
enum Filler {
    Zero,
    Random(StdRng),
}

impl From<FillPolicy> for Filler {
    fn from(policy: FillPolicy) -> Self {
        match policy {
            FillPolicy::Zero => Filler::Zero,
            FillPolicy::Random { seed } => Filler::Random(StdRng::seed_from_u64(seed)),
        }
    }
}

type Bucket = Vec<(u32, u8)>;

/// Sparse address → byte store.
#[derive(Clone)]
pub struct ByteStore {
    buckets: Vec<Bucket>,
    entries: usize,
    fill: Filler,
}

impl ByteStore {
    /// Create an empty store that reads unmapped addresses as zero.
    pub fn new() -> Self {
        Self::with_fill(FillPolicy::Zero)
    }

    /// Create an empty store with the given fill policy.
    pub fn with_fill(policy: FillPolicy) -> Self {
        Self {
            buckets: vec![Bucket::new(); INITIAL_BUCKETS],
            entries: 0,
            fill: policy.into(),
        }
    }

    /// Write `bytes` to consecutive addresses starting at `addr`.
    ///
    /// Each byte is inserted or overwritten independently; addresses wrap
    /// around at 2^32. No alignment is required.
    pub fn store(&mut self, addr: u32, bytes: &[u8]) -> Result<(), MemoryError> {
        for (i, &byte) in bytes.iter().enumerate() {
            self.insert(addr.wrapping_add(i as u32), byte)?;
        }
        Ok(())
    }

    /// Write a 32-bit word as four little-endian bytes.
    pub fn store_word(&mut self, addr: u32, word: u32) -> Result<(), MemoryError> {
        self.store(addr, &word.to_le_bytes())
    }

    /// Read one byte. Unmapped addresses yield the fill byte.
    pub fn load(&mut self, addr: u32) -> u8 {
        match self.get(addr) {
            Some(byte) => byte,
            None => match &mut self.fill {
                Filler::Zero => 0x00,
                Filler::Random(rng) => rng.gen(),
            },
        }
    }

    /// Read a little-endian word: `addr` is the least significant byte.
    pub fn load_word(&mut self, addr: u32) -> u32 {
        let bytes = [
            self.load(addr),
            self.load(addr.wrapping_add(1)),
            self.load(addr.wrapping_add(2)),
            self.load(addr.wrapping_add(3)),
        ];
        u32::from_le_bytes(bytes)
    }

    /// Look up a stored byte without synthesising a fill value.
    pub fn get(&self, addr: u32) -> Option<u8> {
        self.buckets[self.bucket_of(addr)]
            .iter()
            .find(|(a, _)| *a == addr)
            .map(|&(_, byte)| byte)
    }

    /// Every stored pair, sorted by ascending address.
    pub fn enumerate(&self) -> Vec<(u32, u8)> {
        let mut pairs: Vec<(u32, u8)> = self.buckets.iter().flatten().copied().collect();
        pairs.sort_unstable_by_key(|&(addr, _)| addr);
        pairs
    }

    /// Number of stored bytes.
    pub fn len(&self) -> usize {
        self.entries
    }

    /// True if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Current number of hash buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn insert(&mut self, addr: u32, byte: u8) -> Result<(), MemoryError> {
        let index = self.bucket_of(addr);
        let buckets = self.buckets.len();
        let bucket = &mut self.buckets[index];

        if let Some(slot) = bucket.iter_mut().find(|(a, _)| *a == addr) {
            slot.1 = byte;
            return Ok(());
        }

        bucket
            .try_reserve(1)
            .map_err(|_| MemoryError::OutOfMemory { buckets })?;
        bucket.push((addr, byte));
        self.entries += 1;

        if self.entries * 100 > self.buckets.len() * UTILISATION_THRESHOLD {
            self.grow()?;
        }
        Ok(())
    }

    /// Double the bucket count and rehash every entry.
    fn grow(&mut self) -> Result<(), MemoryError> {
        let new_len = self.buckets.len() * 2;
        let oom = move |_: TryReserveError| MemoryError::OutOfMemory { buckets: new_len };

        let mut table: Vec<Bucket> = Vec::new();
        table.try_reserve_exact(new_len).map_err(oom)?;
        table.resize_with(new_len, Bucket::new);

        for (addr, byte) in self.buckets.iter().flatten().copied() {
            let bucket = &mut table[hash(addr, new_len)];
            bucket.try_reserve(1).map_err(oom)?;
            bucket.push((addr, byte));
        }

        tracing::debug!(buckets = new_len, entries = self.entries, "memory table resized");
        self.buckets = table;
        Ok(())
    }

    #[inline]
    fn bucket_of(&self, addr: u32) -> usize {
        hash(addr, self.buckets.len())
    }
}

/// Fibonacci hashing; `buckets` is always a power of two.
#[inline]
fn hash(addr: u32, buckets: usize) -> usize {
    let mixed = addr.wrapping_mul(0x9E37_79B9);
    (mixed as usize ^ (mixed >> 16) as usize) & (buckets - 1)
}

impl Default for ByteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ByteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteStore")
            .field("entries", &self.entries)
            .field("buckets", &self.buckets.len())
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// The table could not grow.
    #[error("out of memory growing the memory table to {buckets} buckets")]
    OutOfMemory { buckets: usize },
}
