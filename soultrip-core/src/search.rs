use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::tour::{Difficulty, Tour};
use crate::CoreError;

/// Sort orders offered on the tour listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TourSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    CountryAsc,
    CountryDesc,
    StartDateAsc,
    StartDateDesc,
}

impl TourSort {
    pub const ALL: [TourSort; 7] = [
        TourSort::Newest,
        TourSort::PriceAsc,
        TourSort::PriceDesc,
        TourSort::CountryAsc,
        TourSort::CountryDesc,
        TourSort::StartDateAsc,
        TourSort::StartDateDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TourSort::Newest => "newest",
            TourSort::PriceAsc => "price_asc",
            TourSort::PriceDesc => "price_desc",
            TourSort::CountryAsc => "country_asc",
            TourSort::CountryDesc => "country_desc",
            TourSort::StartDateAsc => "start_date_asc",
            TourSort::StartDateDesc => "start_date_desc",
        }
    }

    /// Column the storage layer orders by
    pub fn column(&self) -> &'static str {
        match self {
            TourSort::Newest => "created_at",
            TourSort::PriceAsc | TourSort::PriceDesc => "price",
            TourSort::CountryAsc | TourSort::CountryDesc => "country",
            TourSort::StartDateAsc | TourSort::StartDateDesc => "start_date",
        }
    }

    pub fn ascending(&self) -> bool {
        matches!(self, TourSort::PriceAsc | TourSort::CountryAsc | TourSort::StartDateAsc)
    }

    pub fn compare(&self, a: &Tour, b: &Tour) -> std::cmp::Ordering {
        let ord = match self {
            TourSort::Newest => a.created_at.cmp(&b.created_at),
            TourSort::PriceAsc | TourSort::PriceDesc => a.price.total_cmp(&b.price),
            TourSort::CountryAsc | TourSort::CountryDesc => a.country.cmp(&b.country),
            TourSort::StartDateAsc | TourSort::StartDateDesc => a.start_date.cmp(&b.start_date),
        };
        if self.ascending() { ord } else { ord.reverse() }
    }
}

impl FromStr for TourSort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TourSort::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| CoreError::ValidationError(format!("unknown sort option: {}", s)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TourFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub countries: Vec<String>,
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub sort: TourSort,
}

impl TourFilters {
    /// Countries are stored lower-cased
    pub fn normalized_countries(&self) -> Vec<String> {
        self.countries
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect()
    }

    pub fn matches(&self, tour: &Tour) -> bool {
        if self.start_date.is_some_and(|d| tour.start_date < d) {
            return false;
        }
        if self.end_date.is_some_and(|d| tour.end_date > d) {
            return false;
        }
        let countries = self.normalized_countries();
        if !countries.is_empty() {
            let country = tour.country.as_deref().map(str::to_lowercase);
            if !country.is_some_and(|c| countries.contains(&c)) {
                return false;
            }
        }
        if let Some(difficulty) = self.difficulty {
            if tour.difficulty != Some(difficulty) {
                return false;
            }
        }
        true
    }
}

/// Inclusive row range, `from..=to`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRange {
    pub from: u64,
    pub to: u64,
}

impl PageRange {
    /// Largest row offset storage can address (`OFFSET` is a signed bigint)
    pub const MAX_OFFSET: u64 = i64::MAX as u64;

    pub fn new(from: u64, page_size: u64) -> Self {
        Self {
            from,
            to: from.saturating_add(page_size.max(1) - 1),
        }
    }

    pub fn limit(&self) -> u64 {
        self.to.saturating_sub(self.from).saturating_add(1)
    }
}

/// Structured filters inferred from a free-text trip description
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InferredFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub countries: Option<Vec<String>>,
    pub difficulty: Option<Difficulty>,
}

impl InferredFilters {
    pub fn into_tour_filters(self, sort: TourSort) -> TourFilters {
        TourFilters {
            start_date: self.start_date,
            end_date: self.end_date,
            countries: self.countries.unwrap_or_default(),
            difficulty: self.difficulty,
            sort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_columns() {
        assert_eq!("price_desc".parse::<TourSort>().unwrap().column(), "price");
        assert!(!TourSort::Newest.ascending());
        assert!(TourSort::StartDateAsc.ascending());
        assert!("cheapest".parse::<TourSort>().is_err());
    }

    #[test]
    fn test_page_range_is_inclusive() {
        let range = PageRange::new(12, 6);
        assert_eq!(range.to, 17);
        assert_eq!(range.limit(), 6);
    }

    #[test]
    fn test_page_range_saturates_at_the_end_of_the_row_space() {
        let range = PageRange::new(u64::MAX, 9);
        assert_eq!(range.to, u64::MAX);
        assert_eq!(range.limit(), 1);

        let whole = PageRange { from: 0, to: u64::MAX };
        assert_eq!(whole.limit(), u64::MAX);
    }

    #[test]
    fn test_inferred_filters_wire_format() {
        let json = r#"{"startDate":"2026-05-01","endDate":null,"countries":["peru"],"difficulty":"easy"}"#;
        let parsed: InferredFilters = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.start_date, NaiveDate::from_ymd_opt(2026, 5, 1));
        assert_eq!(parsed.difficulty, Some(Difficulty::Easy));

        let filters = parsed.into_tour_filters(TourSort::PriceAsc);
        assert_eq!(filters.countries, vec!["peru".to_string()]);
    }
}
