use std::{collections::VecDeque, fmt, str::FromStr};

use rand::{
    Rng as _, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom as _,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::core::PieceKind;

/// Seed of the piece sequence. Two bags built from the same seed
/// produce identical sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for PieceSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ParsePieceSeedError {
    #[display("seed must be 32 hex digits, got {len} characters")]
    Length { len: usize },
    #[display("seed contains a non-hex character")]
    InvalidDigit,
}

impl FromStr for PieceSeed {
    type Err = ParsePieceSeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let len = s.chars().count();
        if len != 32 {
            return Err(ParsePieceSeedError::Length { len });
        }
        let mut bytes = [0; 16];
        for (byte, pair) in bytes.iter_mut().zip(s.as_bytes().chunks(2)) {
            let pair = std::str::from_utf8(pair).map_err(|_| ParsePieceSeedError::InvalidDigit)?;
            *byte = u8::from_str_radix(pair, 16).map_err(|_| ParsePieceSeedError::InvalidDigit)?;
        }
        Ok(Self(bytes))
    }
}

impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R>(&self, rng: &mut R) -> PieceSeed
    where
        R: rand::Rng + ?Sized,
    {
        PieceSeed(rng.random())
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Seven-bag piece source.
///
/// Pieces are dealt from a queue that is refilled with shuffled
/// permutations of all seven kinds, so every window of seven
/// consecutive draws from one refill contains each kind exactly once
/// and the same kind never waits more than twelve draws.
#[derive(Debug, Clone)]
pub struct Bag {
    seed: PieceSeed,
    rng: Pcg32,
    queue: VecDeque<PieceKind>,
}

impl Bag {
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        let mut bag = Self {
            seed,
            rng: Pcg32::from_seed(*seed.as_bytes()),
            queue: VecDeque::new(),
        };
        bag.refill();
        bag
    }

    #[must_use]
    pub fn seed(&self) -> PieceSeed {
        self.seed
    }

    /// Deals the next piece. The queue keeps at least seven upcoming
    /// pieces so previews never run dry.
    pub fn draw_next(&mut self) -> PieceKind {
        self.refill();
        self.queue.pop_front().expect("queue is refilled above")
    }

    /// Upcoming pieces in draw order.
    pub fn preview(&self, count: usize) -> impl Iterator<Item = PieceKind> + '_ {
        self.queue.iter().copied().take(count)
    }

    fn refill(&mut self) {
        while self.queue.len() <= PieceKind::LEN {
            let mut kinds = PieceKind::ALL;
            kinds.shuffle(&mut self.rng);
            self.queue.extend(kinds);
        }
    }
}

impl Default for Bag {
    fn default() -> Self {
        Self::new()
    }
}
