use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use soultrip_core::{
    Difficulty, Identity, NewTour, Role, Tour, TourImage, TourPatch, TourRepository, TourStatus,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{CatalogError, CatalogResult};

/// Organizer input for a new tour, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourDraft {
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub max_participants: i32,
    #[serde(default)]
    pub status: TourStatus,
    pub country: Option<String>,
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub images: Vec<TourImage>,
}

fn default_currency() -> String { "USD".to_string() }

struct TourFields<'a> {
    title: &'a str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    price: f64,
    currency: &'a str,
    max_participants: i32,
}

fn validate(fields: TourFields<'_>) -> CatalogResult<()> {
    if fields.title.trim().is_empty() {
        return Err(CatalogError::Validation("title is required".to_string()));
    }
    if fields.start_date > fields.end_date {
        return Err(CatalogError::Validation("start date must not be after end date".to_string()));
    }
    if !(fields.price.is_finite() && fields.price > 0.0) {
        return Err(CatalogError::Validation("price must be positive".to_string()));
    }
    if fields.currency.trim().len() != 3 {
        return Err(CatalogError::Validation("currency must be a three-letter code".to_string()));
    }
    if fields.max_participants < 1 {
        return Err(CatalogError::Validation("max participants must be at least 1".to_string()));
    }
    Ok(())
}

fn require_organizer(identity: Option<&Identity>) -> CatalogResult<&Identity> {
    match identity {
        Some(identity) if identity.role == Role::Organizer => Ok(identity),
        Some(_) => Err(CatalogError::Forbidden("only organizers manage tours".to_string())),
        None => Err(CatalogError::Forbidden("sign in required".to_string())),
    }
}

/// Organizer-side tour lifecycle: create, edit, delete, and visibility-checked reads.
#[derive(Clone)]
pub struct TourManager {
    tours: Arc<dyn TourRepository>,
}

impl TourManager {
    pub fn new(tours: Arc<dyn TourRepository>) -> Self {
        Self { tours }
    }

    pub async fn create(
        &self,
        identity: Option<&Identity>,
        organizer_name: Option<String>,
        draft: TourDraft,
    ) -> CatalogResult<Tour> {
        let organizer = require_organizer(identity)?;
        validate(TourFields {
            title: &draft.title,
            start_date: draft.start_date,
            end_date: draft.end_date,
            price: draft.price,
            currency: &draft.currency,
            max_participants: draft.max_participants,
        })?;

        let tour = self
            .tours
            .create_tour(&NewTour {
                organizer_id: organizer.user_id,
                organizer_name,
                title: draft.title.trim().to_string(),
                description: draft.description,
                start_date: draft.start_date,
                end_date: draft.end_date,
                price: draft.price,
                currency: draft.currency.trim().to_uppercase(),
                max_participants: draft.max_participants,
                status: draft.status,
                country: draft.country.filter(|c| !c.trim().is_empty()),
                difficulty: draft.difficulty,
                images: draft.images,
            })
            .await?;

        info!("Tour {} created by organizer {}", tour.id, organizer.user_id);
        Ok(tour)
    }

    /// Fetch a tour the viewer is allowed to see
    pub async fn get_visible(&self, viewer: Option<&Identity>, tour_id: Uuid) -> CatalogResult<Tour> {
        let tour = self
            .tours
            .get_tour(tour_id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("tour {}", tour_id)))?;

        if !tour.is_visible_to(viewer) {
            return Err(CatalogError::NotFound(format!("tour {}", tour_id)));
        }
        Ok(tour)
    }

    /// Fetch a tour owned by the caller
    pub async fn get_owned(&self, identity: Option<&Identity>, tour_id: Uuid) -> CatalogResult<Tour> {
        let organizer = require_organizer(identity)?;
        let tour = self
            .tours
            .get_tour(tour_id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("tour {}", tour_id)))?;

        if tour.organizer_id != organizer.user_id {
            return Err(CatalogError::Forbidden("tour belongs to another organizer".to_string()));
        }
        Ok(tour)
    }

    pub async fn update(
        &self,
        identity: Option<&Identity>,
        tour_id: Uuid,
        mut patch: TourPatch,
    ) -> CatalogResult<Tour> {
        // Same normalization as `create`
        patch.title = patch.title.map(|t| t.trim().to_string());
        patch.currency = patch.currency.map(|c| c.trim().to_uppercase());
        if matches!(&patch.country, Some(Some(country)) if country.trim().is_empty()) {
            patch.country = Some(None);
        }

        let mut merged = self.get_owned(identity, tour_id).await?;
        merged.apply(&patch);
        validate(TourFields {
            title: &merged.title,
            start_date: merged.start_date,
            end_date: merged.end_date,
            price: merged.price,
            currency: &merged.currency,
            max_participants: merged.max_participants,
        })?;

        let organizer_id = merged.organizer_id;
        let updated = self
            .tours
            .update_tour(tour_id, organizer_id, &patch)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("tour {}", tour_id)))?;

        info!("Tour {} updated (status {})", updated.id, updated.status);
        Ok(updated)
    }

    pub async fn delete(&self, identity: Option<&Identity>, tour_id: Uuid) -> CatalogResult<()> {
        let organizer = require_organizer(identity)?;
        let deleted = self.tours.delete_tour(tour_id, organizer.user_id).await?;
        if !deleted {
            return Err(CatalogError::NotFound(format!("tour {}", tour_id)));
        }
        info!("Tour {} deleted by organizer {}", tour_id, organizer.user_id);
        Ok(())
    }

    pub async fn list_mine(&self, identity: Option<&Identity>) -> CatalogResult<Vec<Tour>> {
        let organizer = require_organizer(identity)?;
        Ok(self.tours.list_by_organizer(organizer.user_id).await?)
    }
}
