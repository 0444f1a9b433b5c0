use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The rank of a node in a [`ZipTree`](crate::ZipTree).
pub type Rank = u32;

/// A source of node ranks.
///
/// Each call must be independent of the previous ones. The expected _O(log(n))_ height of a zip
/// tree only holds when ranks are geometrically distributed, as produced by [`GeometricRank`];
/// other implementations are mostly useful for forcing a particular shape in tests.
pub trait RankGenerator {
    /// Returns the rank for the next inserted node.
    fn next_rank(&mut self) -> Rank;
}

impl<R: RankGenerator + ?Sized> RankGenerator for &mut R {
    #[inline]
    fn next_rank(&mut self) -> Rank {
        (**self).next_rank()
    }
}

/// Draws ranks from a geometric distribution with success probability 1/2.
///
/// The rank is the number of heads flipped before the first tails, so
/// `P(rank = k) = 2^-(k+1)`.
#[derive(Clone, Debug)]
pub struct GeometricRank<G = ChaCha8Rng> {
    rng: G,
}

impl<G: RngCore> GeometricRank<G> {
    /// Returns a generator that flips its coins with `rng`.
    pub const fn new(rng: G) -> Self {
        GeometricRank { rng }
    }
}

impl GeometricRank<ChaCha8Rng> {
    /// Returns a generator producing the same rank sequence for the same `seed`.
    pub fn from_seed(seed: u64) -> Self {
        GeometricRank::new(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Returns a generator seeded from the thread-local RNG.
    pub fn from_entropy() -> Self {
        GeometricRank::from_seed(rand::random())
    }
}

impl<G: RngCore> RankGenerator for GeometricRank<G> {
    fn next_rank(&mut self) -> Rank {
        let mut rank: Rank = 0;

        // Each set bit is a head. A word of all heads means the run continues into the next one.
        loop {
            let heads = self.rng.next_u64().trailing_ones();
            rank = rank.saturating_add(heads);

            if heads < u64::BITS {
                return rank;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;

    use super::*;

    #[test]
    fn seeded_sequences_repeat() {
        let mut a = GeometricRank::from_seed(7);
        let mut b = GeometricRank::from_seed(7);

        for _ in 0..1000 {
            assert_eq!(a.next_rank(), b.next_rank());
        }
    }

    #[test]
    fn counts_heads_before_tails() {
        // 0b0111 repeated: three heads, then tails.
        let mut ranks = GeometricRank::new(StepRng::new(0b0111, 0));
        assert_eq!(ranks.next_rank(), 3);

        let mut ranks = GeometricRank::new(StepRng::new(0, 0));
        assert_eq!(ranks.next_rank(), 0);
    }

    #[test]
    fn all_heads_carries_into_next_word() {
        // First word is all ones, the next one (wrapping to zero) stops immediately.
        let mut ranks = GeometricRank::new(StepRng::new(u64::MAX, 1));
        assert_eq!(ranks.next_rank(), 64);
    }

    #[test]
    fn geometric_distribution() {
        const SAMPLES: usize = 100_000;

        let mut ranks = GeometricRank::from_seed(0x5eed);
        let mut histogram = [0usize; 8];

        for _ in 0..SAMPLES {
            let rank = ranks.next_rank() as usize;
            if rank < histogram.len() {
                histogram[rank] += 1;
            }
        }

        // P(0) = 1/2, P(1) = 1/4, P(2) = 1/8, with generous slack.
        for (rank, expected) in [(0, 0.5), (1, 0.25), (2, 0.125)] {
            let observed = histogram[rank] as f64 / SAMPLES as f64;
            assert!(
                (observed - expected).abs() < 0.01,
                "rank {rank}: observed {observed}, expected {expected}"
            );
        }
    }
}
