//! Deck construction and shuffling.

use bluffdeck_protocol::{Card, GameMode, SpecialCard};
use rand::seq::SliceRandom;

/// Letter frequencies for the base deck, roughly tracking English letter
/// distribution. 106 letter cards in total.
const LETTER_FREQUENCY: &[(char, usize)] = &[
    ('A', 10),
    ('B', 2),
    ('C', 5),
    ('D', 5),
    ('E', 14),
    ('F', 2),
    ('G', 3),
    ('H', 1),
    ('I', 10),
    ('L', 5),
    ('M', 5),
    ('N', 5),
    ('O', 10),
    ('P', 5),
    ('Q', 1),
    ('R', 5),
    ('S', 5),
    ('T', 5),
    ('U', 4),
    ('V', 3),
    ('Z', 1),
];

/// Builds and shuffles a fresh deck for the given mode.
///
/// Every mode gets the letter cards plus two jokers and one reverse-turn.
/// Battle mode adds its four aggressive specials on top.
pub fn build(mode: GameMode) -> Vec<Card> {
    let mut deck = Vec::with_capacity(deck_size(mode));
    for &(letter, count) in LETTER_FREQUENCY {
        for _ in 0..count {
            deck.push(Card::Letter(letter));
        }
    }
    deck.push(Card::Special(SpecialCard::Joker));
    deck.push(Card::Special(SpecialCard::Joker));
    deck.push(Card::Special(SpecialCard::ReverseTurn));
    if mode == GameMode::Battle {
        deck.push(Card::Special(SpecialCard::StealCard));
        deck.push(Card::Special(SpecialCard::SwapHands));
        deck.push(Card::Special(SpecialCard::SkipNext));
        deck.push(Card::Special(SpecialCard::DrawThree));
    }
    deck.shuffle(&mut rand::rng());
    deck
}

/// Total card count for a freshly built deck of this mode.
pub fn deck_size(mode: GameMode) -> usize {
    let letters: usize = LETTER_FREQUENCY.iter().map(|(_, n)| n).sum();
    let specials = if mode == GameMode::Battle { 7 } else { 3 };
    letters + specials
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_classic_deck_has_expected_size() {
        assert_eq!(deck_size(GameMode::Classic), 109);
        assert_eq!(build(GameMode::Classic).len(), 109);
    }

    #[test]
    fn test_build_battle_deck_adds_four_specials() {
        assert_eq!(deck_size(GameMode::Battle), 113);
        let deck = build(GameMode::Battle);
        assert_eq!(deck.len(), 113);
        for special in [
            SpecialCard::StealCard,
            SpecialCard::SwapHands,
            SpecialCard::SkipNext,
            SpecialCard::DrawThree,
        ] {
            assert_eq!(
                deck.iter()
                    .filter(|c| **c == Card::Special(special))
                    .count(),
                1
            );
        }
    }

    #[test]
    fn test_build_deck_letter_and_joker_counts() {
        let deck = build(GameMode::Speed);
        let e_count = deck.iter().filter(|c| c.letter() == Some('E')).count();
        assert_eq!(e_count, 14);
        let jokers = deck.iter().filter(|c| c.is_joker()).count();
        assert_eq!(jokers, 2);
        let reverses = deck
            .iter()
            .filter(|c| **c == Card::Special(SpecialCard::ReverseTurn))
            .count();
        assert_eq!(reverses, 1);
    }

    #[test]
    fn test_non_battle_deck_excludes_battle_specials() {
        let deck = build(GameMode::Coop);
        assert!(!deck
            .iter()
            .any(|c| matches!(c, Card::Special(SpecialCard::StealCard)
                | Card::Special(SpecialCard::SwapHands)
                | Card::Special(SpecialCard::SkipNext)
                | Card::Special(SpecialCard::DrawThree))));
    }
}
