/// Highest finite complexity a trust level can grant. Anything above it
/// means the avatar is not limited at all.
pub const COMPLEXITY_MAX: i32 = 12287;

/// Per-avatar face budget, read once at the start of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplexityBudget(i64);

impl ComplexityBudget {
    pub const UNLIMITED: ComplexityBudget = ComplexityBudget(i64::MAX);

    pub fn faces(faces: u32) -> Self {
        Self(faces as i64)
    }

    /// Interprets the trust setting: `-1` (nothing set) renders nothing,
    /// values past [`COMPLEXITY_MAX`] are unlimited.
    pub fn from_trust(value: i32) -> Self {
        if value > COMPLEXITY_MAX {
            Self::UNLIMITED
        } else {
            Self(value.max(0) as i64)
        }
    }

    pub fn is_unlimited(self) -> bool {
        self == Self::UNLIMITED
    }

    /// Starting value of the walker's depleting counter.
    pub fn initial(self) -> i64 {
        self.0
    }
}

impl Default for ComplexityBudget {
    fn default() -> Self {
        Self::from_trust(COMPLEXITY_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trust_values_map_to_budgets() {
        assert_eq!(ComplexityBudget::from_trust(-1).initial(), 0);
        assert_eq!(ComplexityBudget::from_trust(0).initial(), 0);
        assert_eq!(ComplexityBudget::from_trust(512).initial(), 512);
        assert_eq!(ComplexityBudget::from_trust(COMPLEXITY_MAX).initial(), 12287);
        assert!(ComplexityBudget::from_trust(COMPLEXITY_MAX + 1).is_unlimited());
        assert!(!ComplexityBudget::default().is_unlimited());
    }
}
