//! The 5×5 game card: layout, generation, and mark computation.
//!
//! A card is 25 distinct numbers from the call range, stored row-major:
//! index `r * 5 + c` is row `r`, column `c`. The win condition reads the
//! card as five rows and five columns (no diagonals).

use crate::draw;

/// Lowest callable number.
pub const CALL_MIN: u8 = 1;
/// Highest callable number.
pub const CALL_MAX: u8 = 90;
/// Numbers on a card.
pub const CARD_SIZE: usize = 25;
/// Numbers per row/column.
pub const CARD_LINE: usize = 5;

/// Generates a fresh 25-number card for one game.
pub fn generate() -> Vec<u8> {
    draw::unique(CALL_MIN, CALL_MAX, CARD_SIZE)
}

/// Which card positions have been called, in card order.
///
/// Drives the "marked numbers" rendering on the presentation sink.
pub fn matched_marks(card: &[u8], called: &[u8]) -> Vec<bool> {
    card.iter().map(|n| called.contains(n)).collect()
}

/// `true` if any full row or column of `card` is contained in `called`.
///
/// Cards that are not exactly [`CARD_SIZE`] numbers never win: the honest
/// client can't produce one, and a malformed claim must not panic the host.
pub fn has_winning_line(card: &[u8], called: &[u8]) -> bool {
    if card.len() != CARD_SIZE {
        return false;
    }
    let hit = |r: usize, c: usize| called.contains(&card[r * CARD_LINE + c]);
    (0..CARD_LINE).any(|r| (0..CARD_LINE).all(|c| hit(r, c)))
        || (0..CARD_LINE).any(|c| (0..CARD_LINE).all(|r| hit(r, c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fixed card: 1..=25 laid out row-major.
    fn card() -> Vec<u8> {
        (1..=25).collect()
    }

    #[test]
    fn test_generate_is_25_distinct_in_range() {
        let card = generate();
        assert_eq!(card.len(), CARD_SIZE);
        for n in &card {
            assert!((CALL_MIN..=CALL_MAX).contains(n));
        }
        let mut dedup = card.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), CARD_SIZE);
    }

    #[test]
    fn test_full_row_wins() {
        // First row of the fixed card is 1..=5; call exactly those.
        assert!(has_winning_line(&card(), &[1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_full_column_wins() {
        // First column is positions {0,5,10,15,20} → numbers 1,6,11,16,21.
        // No row is complete with only these called.
        assert!(has_winning_line(&card(), &[1, 6, 11, 16, 21]));
    }

    #[test]
    fn test_four_of_a_line_does_not_win() {
        assert!(!has_winning_line(&card(), &[1, 2, 3, 4]));
        assert!(!has_winning_line(&card(), &[1, 6, 11, 16]));
    }

    #[test]
    fn test_scattered_calls_do_not_win() {
        // One number from each row and column, so no complete line.
        assert!(!has_winning_line(&card(), &[1, 7, 13, 19, 25]));
    }

    #[test]
    fn test_diagonals_do_not_win() {
        // The main diagonal of the fixed card is 1,7,13,19,25 (covered
        // above); the anti-diagonal is 5,9,13,17,21.
        assert!(!has_winning_line(&card(), &[5, 9, 13, 17, 21]));
    }

    #[test]
    fn test_short_card_never_wins() {
        assert!(!has_winning_line(&[1, 2, 3], &[1, 2, 3]));
        assert!(!has_winning_line(&[], &[1, 2, 3]));
    }

    #[test]
    fn test_matched_marks_follow_card_order() {
        let marks = matched_marks(&[10, 20, 30], &[20]);
        assert_eq!(marks, vec![false, true, false]);
    }
}
