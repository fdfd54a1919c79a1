use crate::utils::square_index;

#[inline]
/// Scanning along an axis for available positions. Created a function to replace repeated logic.
fn scan_ray<F>(mut rank: isize, mut file: isize, step: F, mut on_square: impl FnMut(usize) -> bool)
where
    F: Fn(isize, isize) -> (isize, isize),
{
    while (0..=7).contains(&rank) && (0..=7).contains(&file) {
        let sq = square_index(rank as usize, file as usize);
        if !on_square(sq) {
            break;
        }
        let (new_rank, new_file) = step(rank, file);
        rank = new_rank;
        file = new_file;
    }
}

#[inline]
pub fn rook_attacks_per_square(square: usize, blockers: u64) -> u64 {
    let rank = square / 8;
    let file = square % 8;
    let mut attacks = 0u64;

    // Function to add possible attacks based blockers and current square
    // Created as a closure to keep the function local
    let mut add = |sq: usize| {
        attacks |= 1 << sq;
        (blockers >> sq) & 1 == 0 // stop if blocker found
    };

    scan_ray(
        rank as isize + 1,
        file as isize,
        |r, f| (r + 1, f),
        &mut add,
    ); // north

    scan_ray(
        rank as isize - 1,
        file as isize,
        |r, f| (r - 1, f),
        &mut add,
    ); // south

    scan_ray(
        rank as isize,
        file as isize + 1,
        |r, f| (r, f + 1),
        &mut add,
    ); // east

    scan_ray(
        rank as isize,
        file as isize - 1,
        |r, f| (r, f - 1),
        &mut add,
    ); // west

    attacks
}

#[inline]
pub fn bishop_attacks_per_square(square: usize, blockers: u64) -> u64 {
    let rank = square / 8;
    let file = square % 8;
    let mut attacks = 0u64;

    let mut add = |sq: usize| {
        attacks |= 1 << sq;
        (blockers >> sq) & 1 == 0
    };

    scan_ray(
        rank as isize + 1,
        file as isize + 1,
        |r, f| (r + 1, f + 1),
        &mut add,
    ); // NE

    scan_ray(
        rank as isize - 1,
        file as isize - 1,
        |r, f| (r - 1, f - 1),
        &mut add,
    ); // SW

    scan_ray(
        rank as isize + 1,
        file as isize - 1,
        |r, f| (r + 1, f - 1),
        &mut add,
    ); // NW

    scan_ray(
        rank as isize - 1,
        file as isize + 1,
        |r, f| (r - 1, f + 1),
        &mut add,
    ); // SE

    attacks
}

pub fn get_rook_attack_bitboards(square: usize, blockers: &[u64]) -> Vec<u64> {
    blockers
        .iter()
        .map(|&b| rook_attacks_per_square(square, b))
        .collect()
}

pub fn get_bishop_attack_bitboards(square: usize, blockers: &[u64]) -> Vec<u64> {
    blockers
        .iter()
        .map(|&b| bishop_attacks_per_square(square, b))
        .collect()
}
