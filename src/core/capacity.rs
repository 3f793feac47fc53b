use serde::{Deserialize, Serialize};

/// Seats still available on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemainingSeats {
    /// Capacity `0`: no limit.
    Unbounded,
    /// Capacity set: this many seats left.
    Limited(usize),
}

impl RemainingSeats {
    /// Caps `n` by the remaining seats.
    pub fn cap(self, n: usize) -> usize {
        match self {
            Self::Unbounded => n,
            Self::Limited(left) => left.min(n),
        }
    }

    /// Returns true when no seat is left.
    pub fn is_exhausted(self) -> bool {
        self == Self::Limited(0)
    }
}

/// `max(0, capacity - signed_up)`, or unbounded when `capacity == 0`.
pub fn remaining_seats(capacity: u32, signed_up: usize) -> RemainingSeats {
    if capacity == 0 {
        return RemainingSeats::Unbounded;
    }
    RemainingSeats::Limited((capacity as usize).saturating_sub(signed_up))
}

/// `capacity > 0 && signed_up >= capacity`.
pub fn is_full(capacity: u32, signed_up: usize) -> bool {
    remaining_seats(capacity, signed_up).is_exhausted()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_unbounded() {
        assert_eq!(remaining_seats(0, 10_000), RemainingSeats::Unbounded);
        assert!(!is_full(0, 10_000));
        assert_eq!(RemainingSeats::Unbounded.cap(7), 7);
    }

    #[test]
    fn limited_capacity_never_goes_negative() {
        assert_eq!(remaining_seats(2, 0), RemainingSeats::Limited(2));
        assert_eq!(remaining_seats(2, 5), RemainingSeats::Limited(0));
        assert!(is_full(2, 2));
        assert!(!is_full(2, 1));
        assert_eq!(RemainingSeats::Limited(1).cap(7), 1);
    }
}
