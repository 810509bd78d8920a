use serde::{Deserialize, Serialize};

/// Position in the fixed visitor progression.
///
/// The declaration order is the progression order, so the derived `Ord` is what
/// the gate compares against. Persisted as its ordinal (`0..=5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Step {
    #[default]
    Landing,
    Puzzle,
    Message,
    Places,
    Outfits,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("step ordinal {0} is out of range")]
pub struct InvalidStep(pub u8);

impl Step {
    pub const ALL: [Self; 6] = [
        Self::Landing,
        Self::Puzzle,
        Self::Message,
        Self::Places,
        Self::Outfits,
        Self::Summary,
    ];

    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Landing => 0,
            Self::Puzzle => 1,
            Self::Message => 2,
            Self::Places => 3,
            Self::Outfits => 4,
            Self::Summary => 5,
        }
    }

    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Landing),
            1 => Some(Self::Puzzle),
            2 => Some(Self::Message),
            3 => Some(Self::Places),
            4 => Some(Self::Outfits),
            5 => Some(Self::Summary),
            _ => None,
        }
    }

    /// The following step, or `None` once the flow is complete.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Summary)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::Puzzle => "puzzle",
            Self::Message => "message",
            Self::Places => "places",
            Self::Outfits => "outfits",
            Self::Summary => "summary",
        }
    }
}

impl TryFrom<u8> for Step {
    type Error = InvalidStep;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value).ok_or(InvalidStep(value))
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> Self {
        step.index()
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.index(), self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_follow_declaration_order() {
        for (expected, step) in Step::ALL.iter().enumerate() {
            assert_eq!(usize::from(step.index()), expected);
            assert_eq!(Step::from_index(step.index()), Some(*step));
        }
        assert!(Step::Landing < Step::Summary);
        assert_eq!(Step::from_index(6), None);
    }

    #[test]
    fn next_stops_at_summary() {
        assert_eq!(Step::Outfits.next(), Some(Step::Summary));
        assert_eq!(Step::Summary.next(), None);
        assert!(Step::Summary.is_final());
    }

    #[test]
    fn serializes_as_ordinal() {
        assert_eq!(serde_json::to_string(&Step::Places).unwrap(), "3");
        assert_eq!(serde_json::from_str::<Step>("4").unwrap(), Step::Outfits);
        assert!(serde_json::from_str::<Step>("9").is_err());
        assert!(serde_json::from_str::<Step>("\"places\"").is_err());
    }
}
