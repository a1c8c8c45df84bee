//! 7-bag randomizer for piece generation
//!
//! All 7 pieces are shuffled, then dealt out before reshuffling. This
//! prevents long droughts. A lookahead queue sits in front of the bag so
//! the next few pieces can be shown to the player.

use crate::tetromino::TetrominoType;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Number of upcoming pieces kept visible by default
pub const PREVIEW_LEN: usize = 5;

/// The 7-bag piece randomizer
#[derive(Debug, Clone)]
pub struct Bag {
    rng: ChaCha8Rng,
    /// Pieces left in the current bag, dealt from the back
    remaining: Vec<TetrominoType>,
}

impl Default for Bag {
    fn default() -> Self {
        Self::new()
    }
}

impl Bag {
    /// Create a bag with a random seed
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create a bag whose sequence is fully determined by `seed`
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            remaining: Vec::with_capacity(7),
        }
    }

    /// Deal the next piece, refilling when the current bag is exhausted
    pub fn next(&mut self) -> TetrominoType {
        loop {
            if let Some(kind) = self.remaining.pop() {
                return kind;
            }
            self.refill();
        }
    }

    /// Throw away whatever is left of the current bag
    pub fn discard(&mut self) {
        self.remaining.clear();
    }

    /// Pieces still to be dealt from the current bag
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    fn refill(&mut self) {
        let mut fresh = TetrominoType::all();
        fresh.shuffle(&mut self.rng);
        self.remaining.extend(fresh);
    }
}

/// Lookahead queue fed by a [`Bag`]
#[derive(Debug, Clone)]
pub struct PieceQueue {
    bag: Bag,
    upcoming: VecDeque<TetrominoType>,
    len: usize,
}

impl PieceQueue {
    /// Create a queue that keeps `len` pieces (at least 1) visible
    pub fn new(bag: Bag, len: usize) -> Self {
        let mut queue = Self {
            bag,
            upcoming: VecDeque::with_capacity(len.max(1)),
            len: len.max(1),
        };
        queue.top_up();
        queue
    }

    /// Take the front piece and refill from the bag
    pub fn pop(&mut self) -> TetrominoType {
        self.top_up();
        let kind = self
            .upcoming
            .pop_front()
            .unwrap_or_else(|| self.bag.next());
        self.top_up();
        kind
    }

    /// Drop the queued pieces and the rest of the current bag, then deal a fresh lookahead
    pub fn reset(&mut self) {
        self.upcoming.clear();
        self.bag.discard();
        self.top_up();
    }

    /// The visible upcoming pieces, front first
    pub fn preview(&self) -> Vec<TetrominoType> {
        self.upcoming.iter().copied().collect()
    }

    pub fn peek(&self) -> Option<TetrominoType> {
        self.upcoming.front().copied()
    }

    fn top_up(&mut self) {
        while self.upcoming.len() < self.len {
            self.upcoming.push_back(self.bag.next());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_bag_contains_all_pieces() {
        let mut bag = Bag::with_seed(7);
        for _ in 0..20 {
            // Each aligned window of 7 is a full set
            let pieces: HashSet<_> = (0..7).map(|_| bag.next()).collect();
            assert_eq!(pieces.len(), 7);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Bag::with_seed(42);
        let mut b = Bag::with_seed(42);
        let seq_a: Vec<_> = (0..28).map(|_| a.next()).collect();
        let seq_b: Vec<_> = (0..28).map(|_| b.next()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn test_discard_starts_a_new_bag() {
        let mut bag = Bag::with_seed(3);
        bag.next();
        bag.next();
        assert_eq!(bag.remaining(), 5);
        bag.discard();
        let pieces: HashSet<_> = (0..7).map(|_| bag.next()).collect();
        assert_eq!(pieces.len(), 7);
    }

    #[test]
    fn test_preview() {
        let queue = PieceQueue::new(Bag::with_seed(1), PREVIEW_LEN);
        assert_eq!(queue.preview().len(), 5);
    }

    #[test]
    fn test_pop_takes_front_and_refills() {
        let mut queue = PieceQueue::new(Bag::with_seed(9), PREVIEW_LEN);
        let before = queue.preview();
        let popped = queue.pop();
        assert_eq!(popped, before[0]);
        let after = queue.preview();
        assert_eq!(after.len(), 5);
        assert_eq!(after[..4], before[1..]);
    }

    #[test]
    fn test_queue_preserves_bag_fairness() {
        let mut queue = PieceQueue::new(Bag::with_seed(11), PREVIEW_LEN);
        for _ in 0..10 {
            let pieces: HashSet<_> = (0..7).map(|_| queue.pop()).collect();
            assert_eq!(pieces.len(), 7);
        }
    }

    #[test]
    fn test_reset_deals_fresh_bag() {
        let mut queue = PieceQueue::new(Bag::with_seed(5), PREVIEW_LEN);
        queue.pop();
        queue.pop();
        queue.reset();
        let pieces: HashSet<_> = (0..7).map(|_| queue.pop()).collect();
        assert_eq!(pieces.len(), 7);
    }

    #[test]
    fn test_zero_length_queue_still_deals() {
        let mut queue = PieceQueue::new(Bag::with_seed(2), 0);
        assert_eq!(queue.preview().len(), 1);
        let _ = queue.pop();
    }
}
