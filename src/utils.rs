//! Free-standing bit-twiddling helpers shared by move generation and the
//! magic bitboard builder.

/// Clears and returns the index of the least significant set bit.
/// Panics if `bb` is zero, matching the call sites which only invoke this
/// while iterating a known-nonempty bitboard.
#[inline(always)]
pub fn pop_lsb(bb: &mut u64) -> u8 {
    debug_assert!(*bb != 0, "pop_lsb on empty bitboard");
    let idx = bb.trailing_zeros() as u8;
    *bb &= *bb - 1;
    idx
}

/// Maps (rank, file) in 0..8 to a 0..64 square index, a1 = 0.
#[inline(always)]
pub fn square_index(rank: usize, file: usize) -> usize {
    rank * 8 + file
}
