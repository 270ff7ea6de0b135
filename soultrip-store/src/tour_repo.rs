use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use soultrip_core::{
    CoreError, NewTour, PageRange, StoreError, StoreResult, Tour, TourFilters, TourImage,
    TourPatch, TourRepository, TourStatus,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::classify;

const TOUR_COLUMNS: &str = "id, organizer_id, organizer_name, title, description, start_date, end_date, \
     price, currency, max_participants, status, country, difficulty, created_at";

pub struct PgTourRepository {
    pool: PgPool,
}

impl PgTourRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load images for a batch of tour rows in one round trip
    async fn with_images(&self, rows: Vec<TourRow>) -> StoreResult<Vec<Tour>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let images = sqlx::query_as::<_, ImageRow>(
            "SELECT tour_id, image_url, alt_text FROM tour_images \
             WHERE tour_id = ANY($1) ORDER BY position ASC",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        let mut by_tour: HashMap<Uuid, Vec<TourImage>> = HashMap::new();
        for image in images {
            by_tour.entry(image.tour_id).or_default().push(TourImage {
                image_url: image.image_url,
                alt_text: image.alt_text,
            });
        }

        rows.into_iter()
            .map(|row| {
                let images = by_tour.remove(&row.id).unwrap_or_default();
                row.into_tour(images)
            })
            .collect()
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct TourRow {
    id: Uuid,
    organizer_id: Uuid,
    organizer_name: Option<String>,
    title: String,
    description: Option<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    price: f64,
    currency: String,
    max_participants: i32,
    status: String,
    country: Option<String>,
    difficulty: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ImageRow {
    tour_id: Uuid,
    image_url: String,
    alt_text: Option<String>,
}

fn malformed(e: CoreError) -> StoreError {
    StoreError::Other(e.to_string())
}

impl TourRow {
    fn into_tour(self, images: Vec<TourImage>) -> StoreResult<Tour> {
        Ok(Tour {
            id: self.id,
            organizer_id: self.organizer_id,
            organizer_name: self.organizer_name,
            title: self.title,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            price: self.price,
            currency: self.currency,
            max_participants: self.max_participants,
            status: self.status.parse().map_err(malformed)?,
            country: self.country,
            difficulty: self.difficulty.map(|d| d.parse()).transpose().map_err(malformed)?,
            images,
            created_at: self.created_at,
        })
    }
}

fn to_bigint(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn push_listing_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &TourFilters) {
    qb.push(" WHERE status = ").push_bind(TourStatus::Published.as_str());
    if let Some(start_date) = filters.start_date {
        qb.push(" AND start_date >= ").push_bind(start_date);
    }
    if let Some(end_date) = filters.end_date {
        qb.push(" AND end_date <= ").push_bind(end_date);
    }
    let countries = filters.normalized_countries();
    if !countries.is_empty() {
        qb.push(" AND LOWER(country) = ANY(").push_bind(countries).push(")");
    }
    if let Some(difficulty) = filters.difficulty {
        qb.push(" AND difficulty = ").push_bind(difficulty.as_str());
    }
    // Column names come from a closed enum, never from the request
    qb.push(format_args!(
        " ORDER BY {} {} NULLS LAST, id ASC",
        filters.sort.column(),
        if filters.sort.ascending() { "ASC" } else { "DESC" }
    ));
}

#[async_trait]
impl TourRepository for PgTourRepository {
    async fn create_tour(&self, tour: &NewTour) -> StoreResult<Tour> {
        let mut tx = self.pool.begin().await.map_err(classify)?;

        let row = sqlx::query_as::<_, TourRow>(&format!(
            "INSERT INTO tours (organizer_id, organizer_name, title, description, start_date, end_date, \
             price, currency, max_participants, status, country, difficulty) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {}",
            TOUR_COLUMNS
        ))
        .bind(tour.organizer_id)
        .bind(&tour.organizer_name)
        .bind(&tour.title)
        .bind(&tour.description)
        .bind(tour.start_date)
        .bind(tour.end_date)
        .bind(tour.price)
        .bind(&tour.currency)
        .bind(tour.max_participants)
        .bind(tour.status.as_str())
        .bind(tour.country.as_deref().map(str::to_lowercase))
        .bind(tour.difficulty.map(|d| d.as_str()))
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        for (position, image) in tour.images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO tour_images (tour_id, image_url, alt_text, position) VALUES ($1, $2, $3, $4)",
            )
            .bind(row.id)
            .bind(&image.image_url)
            .bind(&image.alt_text)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
        }

        tx.commit().await.map_err(classify)?;

        row.into_tour(tour.images.clone())
    }

    async fn get_tour(&self, id: Uuid) -> StoreResult<Option<Tour>> {
        let row = sqlx::query_as::<_, TourRow>(&format!("SELECT {} FROM tours WHERE id = $1", TOUR_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

        match row {
            Some(row) => Ok(self.with_images(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn get_tours(&self, ids: &[Uuid]) -> StoreResult<Vec<Tour>> {
        let rows = sqlx::query_as::<_, TourRow>(&format!("SELECT {} FROM tours WHERE id = ANY($1)", TOUR_COLUMNS))
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;

        self.with_images(rows).await
    }

    async fn update_tour(
        &self,
        id: Uuid,
        organizer_id: Uuid,
        patch: &TourPatch,
    ) -> StoreResult<Option<Tour>> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE tours SET updated_at = NOW()");
        if let Some(title) = &patch.title {
            qb.push(", title = ").push_bind(title.clone());
        }
        if let Some(description) = &patch.description {
            qb.push(", description = ").push_bind(description.clone());
        }
        if let Some(start_date) = patch.start_date {
            qb.push(", start_date = ").push_bind(start_date);
        }
        if let Some(end_date) = patch.end_date {
            qb.push(", end_date = ").push_bind(end_date);
        }
        if let Some(price) = patch.price {
            qb.push(", price = ").push_bind(price);
        }
        if let Some(currency) = &patch.currency {
            qb.push(", currency = ").push_bind(currency.clone());
        }
        if let Some(max_participants) = patch.max_participants {
            qb.push(", max_participants = ").push_bind(max_participants);
        }
        if let Some(status) = patch.status {
            qb.push(", status = ").push_bind(status.as_str());
        }
        if let Some(country) = &patch.country {
            qb.push(", country = ").push_bind(country.as_deref().map(str::to_lowercase));
        }
        if let Some(difficulty) = patch.difficulty {
            qb.push(", difficulty = ").push_bind(difficulty.map(|d| d.as_str()));
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" AND organizer_id = ").push_bind(organizer_id);
        qb.push(" RETURNING ").push(TOUR_COLUMNS);

        let row = qb
            .build_query_as::<TourRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

        match row {
            Some(row) => Ok(self.with_images(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn delete_tour(&self, id: Uuid, organizer_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tours WHERE id = $1 AND organizer_id = $2")
            .bind(id)
            .bind(organizer_id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_published(
        &self,
        filters: &TourFilters,
        range: Option<PageRange>,
    ) -> StoreResult<Vec<Tour>> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM tours", TOUR_COLUMNS));
        push_listing_filters(&mut qb, filters);
        if let Some(range) = range {
            qb.push(" LIMIT ").push_bind(to_bigint(range.limit()));
            qb.push(" OFFSET ").push_bind(to_bigint(range.from));
        }

        let rows = qb
            .build_query_as::<TourRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;

        self.with_images(rows).await
    }

    async fn list_by_organizer(&self, organizer_id: Uuid) -> StoreResult<Vec<Tour>> {
        let rows = sqlx::query_as::<_, TourRow>(&format!(
            "SELECT {} FROM tours WHERE organizer_id = $1 ORDER BY created_at DESC",
            TOUR_COLUMNS
        ))
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        self.with_images(rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soultrip_core::{Difficulty, TourSort};

    #[test]
    fn test_listing_sql_shape() {
        let filters = TourFilters {
            start_date: NaiveDate::from_ymd_opt(2026, 6, 1),
            countries: vec!["Peru".to_string(), "  ".to_string()],
            difficulty: Some(Difficulty::Easy),
            sort: TourSort::PriceAsc,
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM tours");
        push_listing_filters(&mut qb, &filters);

        assert_eq!(
            qb.sql(),
            "SELECT * FROM tours WHERE status = $1 AND start_date >= $2 \
             AND LOWER(country) = ANY($3) AND difficulty = $4 ORDER BY price ASC NULLS LAST, id ASC"
        );
    }

    #[test]
    fn test_paging_bounds_never_go_negative() {
        assert_eq!(to_bigint(u64::MAX), i64::MAX);
        assert_eq!(to_bigint(PageRange::MAX_OFFSET), i64::MAX);
        assert_eq!(to_bigint(18), 18);
    }

    #[test]
    fn test_default_listing_is_newest_first() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM tours");
        push_listing_filters(&mut qb, &TourFilters::default());
        assert!(qb.sql().ends_with("ORDER BY created_at DESC NULLS LAST, id ASC"));
    }
}
