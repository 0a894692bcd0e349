/// Treasure kinds hidden under the dirt piles.
/// Names and glyphs are queried via methods so every layer agrees on them.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TreasureKind {
    Star,
    Gem,
    Bone,
    ToyCar,
    Crown,
}

impl TreasureKind {
    /// Every kind, in declaration order. The sampler's refill source.
    pub const ALL: [TreasureKind; 5] = [
        TreasureKind::Star,
        TreasureKind::Gem,
        TreasureKind::Bone,
        TreasureKind::ToyCar,
        TreasureKind::Crown,
    ];

    /// Identifier form, e.g. `TOY_CAR`.
    pub fn key(self) -> &'static str {
        match self {
            TreasureKind::Star => "STAR",
            TreasureKind::Gem => "GEM",
            TreasureKind::Bone => "BONE",
            TreasureKind::ToyCar => "TOY_CAR",
            TreasureKind::Crown => "CROWN",
        }
    }

    /// Human-readable name used in messages: underscores become spaces, lower case.
    pub fn display_name(self) -> String {
        self.key().replace('_', " ").to_lowercase()
    }

    /// Double-width glyph drawn in a 2-column grid cell.
    pub fn glyph(self) -> char {
        match self {
            TreasureKind::Star => '⭐',
            TreasureKind::Gem => '💎',
            TreasureKind::Bone => '🦴',
            TreasureKind::ToyCar => '🚗',
            TreasureKind::Crown => '👑',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_are_lowercase_words() {
        assert_eq!(TreasureKind::ToyCar.display_name(), "toy car");
        assert_eq!(TreasureKind::Crown.display_name(), "crown");
    }

    #[test]
    fn all_is_unique() {
        for (i, a) in TreasureKind::ALL.iter().enumerate() {
            for b in &TreasureKind::ALL[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
