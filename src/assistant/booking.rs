//! Booking projector: resolved slots → `PartialBooking`.
//!
//! Coordinates are always the `{0, 0}` placeholder here. The booking UI
//! geocodes addresses itself.

use super::types::{Coordinates, Location, PartialBooking, Slot};

/// A location with placeholder coordinates.
pub fn placeholder_location(address: &str) -> Location {
    Location {
        address: address.to_string(),
        coordinates: Coordinates::default(),
    }
}

/// A booking with exactly one slot filled.
pub fn project_slot(slot: Slot, address: &str) -> PartialBooking {
    PartialBooking::default().with_slot(slot, placeholder_location(address))
}

/// A booking with both slots filled.
pub fn project_pair(pickup: &str, dropoff: &str) -> PartialBooking {
    PartialBooking {
        pickup_location: Some(placeholder_location(pickup)),
        dropoff_location: Some(placeholder_location(dropoff)),
    }
}

impl PartialBooking {
    /// Set one slot, leaving the other untouched.
    pub fn with_slot(mut self, slot: Slot, location: Location) -> Self {
        match slot {
            Slot::Pickup => self.pickup_location = Some(location),
            Slot::Dropoff => self.dropoff_location = Some(location),
        }
        self
    }

    /// The location in `slot`, if any.
    pub fn slot(&self, slot: Slot) -> Option<&Location> {
        match slot {
            Slot::Pickup => self.pickup_location.as_ref(),
            Slot::Dropoff => self.dropoff_location.as_ref(),
        }
    }

    /// Combine two bookings; fields set in `other` win.
    pub fn merge(self, other: PartialBooking) -> PartialBooking {
        PartialBooking {
            pickup_location: other.pickup_location.or(self.pickup_location),
            dropoff_location: other.dropoff_location.or(self.dropoff_location),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.pickup_location.is_some() && self.dropoff_location.is_some()
    }
}
