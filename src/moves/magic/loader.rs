//! Builds the magic bitboard tables once at startup and hands back a
//! ready-to-use `MagicTables`. Always uses the fixed seed so the tables
//! (and therefore every move generated from them) are identical across
//! runs and platforms.

use crate::moves::magic::precompute::{MagicTableSeed, generate_magic_tables};
use crate::moves::magic::structs::MagicTables;

const MAGIC_SEED: u64 = 0x4D4F_5645_5345_4544; // "MOVESEED" in ASCII hex

pub fn load_magic_tables() -> MagicTables {
    generate_magic_tables(MagicTableSeed::Fixed(MAGIC_SEED))
        .expect("magic number search should always succeed for a fixed seed")
}
