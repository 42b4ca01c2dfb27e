//! Custom card parsing and the reserve card.

use smyslov_core::model::{Card, RoomCode};

/// Number of subtopics on an express card.
pub const EXPRESS_PARTS: usize = 6;

/// Topic used when no card of the required flavor exists.
pub const RESERVE_TOPIC: &str = "Резерв";

/// The fallback card. Always a standard (non-express) card.
#[must_use]
pub fn reserve_card() -> Card {
    Card {
        text: RESERVE_TOPIC.to_owned(),
        is_blitz: false,
        room_code: None,
    }
}

/// Outcome of parsing a host's custom card message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCards {
    /// Card texts in storage form.
    pub texts: Vec<String>,
    /// Lines that could not be turned into a card.
    pub rejected: usize,
}

impl ParsedCards {
    /// Builds room-scoped cards of the given flavor.
    #[must_use]
    pub fn into_cards(self, room_code: &RoomCode, is_blitz: bool) -> Vec<Card> {
        self.texts
            .into_iter()
            .map(|text| Card {
                text,
                is_blitz,
                room_code: Some(room_code.clone()),
            })
            .collect()
    }
}

/// Parses standard cards: one topic per comma- or newline-separated entry.
#[must_use]
pub fn parse_standard_cards(raw: &str) -> ParsedCards {
    let texts = raw
        .split([',', '\n'])
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .map(str::to_owned)
        .collect();
    ParsedCards { texts, rejected: 0 }
}

/// Parses express cards: one card per line, subtopics separated by `|`.
///
/// A line needs exactly [`EXPRESS_PARTS`] non-empty subtopics; other
/// non-blank lines are counted as rejected.
#[must_use]
pub fn parse_express_cards(raw: &str) -> ParsedCards {
    let mut texts = Vec::new();
    let mut rejected = 0;
    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let parts: Vec<&str> = line.split('|').map(str::trim).collect();
        if parts.len() == EXPRESS_PARTS && parts.iter().all(|part| !part.is_empty()) {
            texts.push(parts.join("|"));
        } else {
            rejected += 1;
        }
    }
    ParsedCards { texts, rejected }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_cards_splits_commas_and_lines() {
        let parsed = parse_standard_cards("Animals, Cities\n\nRivers ,");

        assert_eq!(parsed.texts, vec!["Animals", "Cities", "Rivers"]);
        assert_eq!(parsed.rejected, 0);
    }

    #[test]
    fn test_parse_express_cards_requires_six_parts() {
        let parsed = parse_express_cards("a|b|c|d|e|f\n a | b | c \n1|2|3|4|5|\n");

        assert_eq!(parsed.texts, vec!["a|b|c|d|e|f"]);
        assert_eq!(parsed.rejected, 2);
    }

    #[test]
    fn test_into_cards_scopes_to_room() {
        let code: RoomCode = "QW12".parse().unwrap();

        let cards = parse_standard_cards("Animals").into_cards(&code, false);

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].room_code, Some(code));
        assert!(!cards[0].is_blitz);
    }

    #[test]
    fn test_reserve_card_is_standard() {
        let card = reserve_card();

        assert_eq!(card.text, RESERVE_TOPIC);
        assert!(!card.is_blitz);
    }
}
