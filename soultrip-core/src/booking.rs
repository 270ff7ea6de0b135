use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::CoreError;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(CoreError::ValidationError(format!("unknown booking status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "partial" => Ok(PaymentStatus::Partial),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(CoreError::ValidationError(format!("unknown payment status: {}", other))),
        }
    }
}

/// A participant's seat on a tour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub participant_id: Uuid,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Counts toward capacity
    pub fn is_active(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }

    pub fn apply(&mut self, patch: &BookingPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(payment_status) = patch.payment_status {
            self.payment_status = payment_status;
        }
    }
}

/// Row to insert; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub tour_id: Uuid,
    pub participant_id: Uuid,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
}

impl NewBooking {
    pub fn pending(tour_id: Uuid, participant_id: Uuid) -> Self {
        Self {
            tour_id,
            participant_id,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingPatch {
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl BookingPatch {
    /// Back to a fresh, unpaid booking
    pub fn reactivate() -> Self {
        Self {
            status: Some(BookingStatus::Pending),
            payment_status: Some(PaymentStatus::Unpaid),
        }
    }

    pub fn cancel() -> Self {
        Self {
            status: Some(BookingStatus::Cancelled),
            payment_status: None,
        }
    }
}

/// Conjunction of row predicates understood by every [`crate::BookingStore`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFilter {
    pub id: Option<Uuid>,
    pub tour_id: Option<Uuid>,
    pub participant_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
    pub status_not: Option<BookingStatus>,
}

impl BookingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn tour(mut self, tour_id: Uuid) -> Self {
        self.tour_id = Some(tour_id);
        self
    }

    pub fn participant(mut self, participant_id: Uuid) -> Self {
        self.participant_id = Some(participant_id);
        self
    }

    pub fn status(mut self, status: BookingStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn status_not(mut self, status: BookingStatus) -> Self {
        self.status_not = Some(status);
        self
    }

    /// Shorthand for `status != cancelled`
    pub fn active(self) -> Self {
        self.status_not(BookingStatus::Cancelled)
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        self.id.map_or(true, |id| booking.id == id)
            && self.tour_id.map_or(true, |id| booking.tour_id == id)
            && self.participant_id.map_or(true, |id| booking.participant_id == id)
            && self.status.map_or(true, |s| booking.status == s)
            && self.status_not.map_or(true, |s| booking.status != s)
    }
}
