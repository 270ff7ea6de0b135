use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::identity::Identity;
use crate::CoreError;

/// Publication state of a tour
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TourStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl TourStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TourStatus::Draft => "draft",
            TourStatus::Published => "published",
            TourStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for TourStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TourStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TourStatus::Draft),
            "published" => Ok(TourStatus::Published),
            "archived" => Ok(TourStatus::Archived),
            other => Err(CoreError::ValidationError(format!("unknown tour status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Challenging,
    Intense,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Moderate,
        Difficulty::Challenging,
        Difficulty::Intense,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
            Difficulty::Challenging => "challenging",
            Difficulty::Intense => "intense",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| CoreError::ValidationError(format!("unknown difficulty: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    SoldOut,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TourImage {
    pub image_url: String,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tour {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub organizer_name: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: f64,
    pub currency: String,
    pub max_participants: i32,
    pub status: TourStatus,
    pub country: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub images: Vec<TourImage>,
    pub created_at: DateTime<Utc>,
}

impl Tour {
    pub fn is_bookable(&self) -> bool {
        self.status == TourStatus::Published
    }

    /// Published tours are public; drafts and archived tours only show to their organizer.
    pub fn is_visible_to(&self, viewer: Option<&Identity>) -> bool {
        self.is_bookable() || viewer.is_some_and(|v| v.user_id == self.organizer_id)
    }

    pub fn is_sold_out(&self, occupancy: u64) -> bool {
        occupancy >= self.max_participants.max(0) as u64
    }

    pub fn availability(&self, occupancy: u64) -> Availability {
        if self.is_sold_out(occupancy) {
            Availability::SoldOut
        } else {
            Availability::Available
        }
    }

    pub fn apply(&mut self, patch: &TourPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(currency) = &patch.currency {
            self.currency = currency.clone();
        }
        if let Some(max_participants) = patch.max_participants {
            self.max_participants = max_participants;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(country) = &patch.country {
            self.country = country.clone();
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTour {
    pub organizer_id: Uuid,
    pub organizer_name: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: f64,
    pub currency: String,
    pub max_participants: i32,
    pub status: TourStatus,
    pub country: Option<String>,
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub images: Vec<TourImage>,
}

/// Partial update; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TourPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub max_participants: Option<i32>,
    #[serde(default)]
    pub status: Option<TourStatus>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub difficulty: Option<Option<Difficulty>>,
}

// A present-but-null field means "clear it"; an absent one means "leave it".
pub(crate) fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
