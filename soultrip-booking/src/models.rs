use serde::Serialize;
use soultrip_core::Booking;
use soultrip_shared::LifecycleKind;
use std::fmt;
use uuid::Uuid;

use crate::BookingError;

/// Result of the create-or-reactivate protocol.
///
/// Both success variants carry a booking, so callers branch on the tag.
#[derive(Debug, Clone)]
pub enum BookingOutcome {
    Created(Booking),
    Reactivated(Booking),
    Error(BookingError),
}

impl BookingOutcome {
    pub fn booking(&self) -> Option<&Booking> {
        match self {
            BookingOutcome::Created(b) | BookingOutcome::Reactivated(b) => Some(b),
            BookingOutcome::Error(_) => None,
        }
    }

    pub fn booking_id(&self) -> Option<Uuid> {
        self.booking().map(|b| b.id)
    }

    pub fn kind(&self) -> Option<LifecycleKind> {
        match self {
            BookingOutcome::Created(_) => Some(LifecycleKind::Created),
            BookingOutcome::Reactivated(_) => Some(LifecycleKind::Reactivated),
            BookingOutcome::Error(_) => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            BookingOutcome::Created(_) => "created",
            BookingOutcome::Reactivated(_) => "reactivated",
            BookingOutcome::Error(_) => "error",
        }
    }

    /// User-facing message
    pub fn message(&self) -> &'static str {
        match self {
            BookingOutcome::Created(_) => "Booking created! We will contact you with next steps.",
            BookingOutcome::Reactivated(_) => "Booking re-activated!",
            BookingOutcome::Error(_) => "Failed to create booking. Please try again.",
        }
    }
}

/// Result of the cancellation protocol
#[derive(Debug, Clone)]
pub enum CancelOutcome {
    Deleted(Booking),
    SoftCancelled(Booking),
    Error(BookingError),
}

impl CancelOutcome {
    pub fn booking(&self) -> Option<&Booking> {
        match self {
            CancelOutcome::Deleted(b) | CancelOutcome::SoftCancelled(b) => Some(b),
            CancelOutcome::Error(_) => None,
        }
    }

    pub fn kind(&self) -> Option<LifecycleKind> {
        match self {
            CancelOutcome::Deleted(_) => Some(LifecycleKind::Deleted),
            CancelOutcome::SoftCancelled(_) => Some(LifecycleKind::SoftCancelled),
            CancelOutcome::Error(_) => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            CancelOutcome::Deleted(_) => "deleted",
            CancelOutcome::SoftCancelled(_) => "soft_cancelled",
            CancelOutcome::Error(_) => "error",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            CancelOutcome::Deleted(_) | CancelOutcome::SoftCancelled(_) => "Your booking has been cancelled.",
            CancelOutcome::Error(_) => "Failed to cancel booking. Please try again.",
        }
    }
}

/// What the booking panel offers the current viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    SignInRequired,
    WrongRole,
    NotBookable,
    AlreadyBooked,
    CapacityUnknown,
    SoldOut,
    Bookable,
}

impl Eligibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Eligibility::SignInRequired => "sign_in_required",
            Eligibility::WrongRole => "wrong_role",
            Eligibility::NotBookable => "not_bookable",
            Eligibility::AlreadyBooked => "already_booked",
            Eligibility::CapacityUnknown => "capacity_unknown",
            Eligibility::SoldOut => "sold_out",
            Eligibility::Bookable => "bookable",
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soultrip_core::NewBooking;

    fn booking() -> Booking {
        let new = NewBooking::pending(Uuid::new_v4(), Uuid::new_v4());
        Booking {
            id: Uuid::new_v4(),
            tour_id: new.tour_id,
            participant_id: new.participant_id,
            status: new.status,
            payment_status: new.payment_status,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_success_variants_both_carry_ids() {
        let b = booking();
        let created = BookingOutcome::Created(b.clone());
        let reactivated = BookingOutcome::Reactivated(b.clone());
        assert_eq!(created.booking_id(), reactivated.booking_id());
        assert_ne!(created.tag(), reactivated.tag());
        assert_eq!(reactivated.message(), "Booking re-activated!");
    }

    #[test]
    fn test_error_outcomes_have_no_kind() {
        let failed = CancelOutcome::Error(BookingError::NotFound(Uuid::new_v4()));
        assert!(failed.kind().is_none());
        assert!(failed.booking().is_none());
        assert_eq!(failed.message(), "Failed to cancel booking. Please try again.");
    }
}
