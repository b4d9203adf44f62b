//! The process-wide cap on simultaneously running jobs.

use serde::{Deserialize, Serialize};

/// Current maximum number of simultaneously running jobs.
///
/// `floor <= current <= ceiling` holds at all times; `raise` and `lower`
/// clamp rather than error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrencyBudget {
    pub current: usize,
    pub floor: usize,
    pub ceiling: usize,
}

impl ConcurrencyBudget {
    /// Build a budget, clamping `initial` into `[floor, ceiling]`.
    pub fn new(initial: usize, floor: usize, ceiling: usize) -> Self {
        let floor = floor.max(1);
        let ceiling = ceiling.max(floor);
        Self {
            current: initial.clamp(floor, ceiling),
            floor,
            ceiling,
        }
    }

    /// Increase by one, ceiling-clamped. Returns whether anything changed.
    pub fn raise(&mut self) -> bool {
        if self.current < self.ceiling {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Decrease by one, floor-clamped. Returns whether anything changed.
    pub fn lower(&mut self) -> bool {
        if self.current > self.floor {
            self.current -= 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_value_is_clamped() {
        let b = ConcurrencyBudget::new(100, 1, 8);
        assert_eq!(b.current, 8);
        let b = ConcurrencyBudget::new(0, 2, 8);
        assert_eq!(b.current, 2);
    }

    #[test]
    fn raise_and_lower_respect_bounds() {
        let mut b = ConcurrencyBudget::new(2, 1, 3);
        assert!(b.raise());
        assert!(!b.raise());
        assert_eq!(b.current, 3);

        assert!(b.lower());
        assert!(b.lower());
        assert!(!b.lower());
        assert_eq!(b.current, 1);
    }

    #[test]
    fn degenerate_bounds_are_repaired() {
        let b = ConcurrencyBudget::new(5, 0, 0);
        assert_eq!(b.floor, 1);
        assert_eq!(b.ceiling, 1);
        assert_eq!(b.current, 1);
    }
}
