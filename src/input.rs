use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// Six-bit field encoding which movement directions are active.
///
/// Opposing bits may be set together; the camera resolves them to a zero
/// net displacement rather than rejecting the combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveMask(u8);

impl MoveMask {
    pub const FORWARD: Self = Self(1);
    pub const BACKWARD: Self = Self(1 << 1);
    pub const LEFT: Self = Self(1 << 2);
    pub const RIGHT: Self = Self(1 << 3);
    pub const UP: Self = Self(1 << 4);
    pub const DOWN: Self = Self(1 << 5);

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for MoveMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Movement directions currently held, sampled once per frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    held: MoveMask,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_direction(&mut self, direction: MoveMask, pressed: bool) {
        if pressed {
            self.held.insert(direction);
        } else {
            self.held.remove(direction);
        }
    }

    pub fn mask(&self) -> MoveMask {
        self.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_bits_are_independent() {
        let mask = MoveMask::FORWARD | MoveMask::UP;
        assert!(mask.contains(MoveMask::FORWARD));
        assert!(mask.contains(MoveMask::UP));
        assert!(!mask.contains(MoveMask::DOWN));
    }

    #[test]
    fn opposing_bits_may_coexist() {
        let mask = MoveMask::LEFT | MoveMask::RIGHT;
        assert!(mask.contains(MoveMask::LEFT | MoveMask::RIGHT));
        assert_eq!(mask.bits(), 0b1100);
    }

    #[test]
    fn input_state_tracks_held_directions() {
        let mut input = InputState::new();
        input.set_direction(MoveMask::FORWARD, true);
        input.set_direction(MoveMask::LEFT, true);
        assert_eq!(input.mask(), MoveMask::FORWARD | MoveMask::LEFT);
        input.set_direction(MoveMask::FORWARD, false);
        assert_eq!(input.mask(), MoveMask::LEFT);
    }
}
