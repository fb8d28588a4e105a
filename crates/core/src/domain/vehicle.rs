use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::profile::AttributeProfile;

static DECIMAL_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("decimal pattern is valid"));

/// One marketed vehicle configuration as returned by the catalog store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub model: String,
    pub variant: Option<String>,
    pub seats: Option<u32>,
    pub fuel_type: Option<String>,
    pub body_type: Option<String>,
    pub drivetrain: Option<String>,
    /// Ex-showroom price in whole rupees.
    pub price: Option<i64>,
    pub price_display: Option<String>,
    /// Certified mileage as printed, e.g. "24.8 km/l".
    pub mileage: Option<String>,
    pub mileage_value: Option<f64>,
}

impl CatalogItem {
    /// First decimal number in the mileage text, if any.
    pub fn mileage_figure(&self) -> Option<f64> {
        let text = self.mileage.as_deref()?;
        DECIMAL_NUMBER.find(text).and_then(|found| found.as_str().parse::<f64>().ok())
    }
}

/// Conjunction of predicates understood by every catalog store.
///
/// Text predicates are case-insensitive substring matches; numeric ones are
/// inclusive ranges.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub min_seats: Option<u32>,
    pub fuel_type: Option<String>,
    pub body_type: Option<String>,
    pub drivetrain: Option<String>,
    pub model: Option<String>,
    pub variant: Option<String>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    pub mileage_min: Option<f64>,
    pub mileage_max: Option<f64>,
    pub limit: Option<usize>,
}

impl CatalogQuery {
    pub fn by_model(model: impl Into<String>) -> Self {
        Self { model: Some(model.into()), ..Self::default() }
    }

    /// Translates a profile into store predicates, widening the price ceiling
    /// by `budget_flex_pct` percent.
    pub fn from_profile(profile: &AttributeProfile, budget_flex_pct: u32) -> Self {
        let price_max = profile
            .budget_max
            .map(|ceiling| ceiling.saturating_mul(100 + i64::from(budget_flex_pct)) / 100);

        Self {
            min_seats: profile.family_size,
            fuel_type: profile.fuel_type.map(|fuel| fuel.label().to_string()),
            body_type: profile.car_type.map(|body| body.label().to_string()),
            drivetrain: profile.drive_type.map(|drive| drive.label().to_string()),
            model: None,
            variant: None,
            price_min: profile.budget_min,
            price_max,
            mileage_min: profile.mileage_min,
            mileage_max: profile.mileage_max,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Evaluates the predicates against one item. Stores without a native
    /// query language use this directly.
    pub fn matches(&self, item: &CatalogItem) -> bool {
        if let Some(min_seats) = self.min_seats {
            if !item.seats.is_some_and(|seats| seats >= min_seats) {
                return false;
            }
        }

        let text_predicates = [
            (&self.fuel_type, &item.fuel_type),
            (&self.body_type, &item.body_type),
            (&self.drivetrain, &item.drivetrain),
            (&self.variant, &item.variant),
        ];
        for (needle, haystack) in text_predicates {
            if let Some(needle) = needle {
                if !haystack.as_deref().is_some_and(|value| contains_ignore_case(value, needle)) {
                    return false;
                }
            }
        }
        if let Some(model) = &self.model {
            if !contains_ignore_case(&item.model, model) {
                return false;
            }
        }

        if self.price_min.is_some() || self.price_max.is_some() {
            let Some(price) = item.price else {
                return false;
            };
            if self.price_min.is_some_and(|min| price < min)
                || self.price_max.is_some_and(|max| price > max)
            {
                return false;
            }
        }

        if self.mileage_min.is_some() || self.mileage_max.is_some() {
            let Some(mileage) = item.mileage_value else {
                return false;
            };
            if self.mileage_min.is_some_and(|min| mileage < min)
                || self.mileage_max.is_some_and(|max| mileage > max)
            {
                return false;
            }
        }

        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use crate::domain::profile::{AttributeProfile, CarType, FuelType};

    use super::{CatalogItem, CatalogQuery};

    fn brezza() -> CatalogItem {
        CatalogItem {
            model: "Brezza".to_string(),
            variant: Some("ZXi Plus".to_string()),
            seats: Some(5),
            fuel_type: Some("Diesel".to_string()),
            body_type: Some("SUV".to_string()),
            drivetrain: Some("Front Wheel Drive".to_string()),
            price: Some(850_000),
            price_display: None,
            mileage: Some("19.8 km/l".to_string()),
            mileage_value: Some(19.8),
        }
    }

    #[test]
    fn profile_query_applies_budget_flex() {
        let profile = AttributeProfile {
            family_size: Some(5),
            fuel_type: Some(FuelType::Diesel),
            car_type: Some(CarType::Suv),
            budget_max: Some(800_000),
            ..AttributeProfile::default()
        };

        let query = CatalogQuery::from_profile(&profile, 10);
        assert_eq!(query.price_max, Some(880_000));
        assert_eq!(query.min_seats, Some(5));
        assert_eq!(query.fuel_type.as_deref(), Some("Diesel"));
        assert!(query.matches(&brezza()));
    }

    #[test]
    fn text_predicates_are_case_insensitive_substrings() {
        let query = CatalogQuery { fuel_type: Some("diesel".to_string()), ..CatalogQuery::default() };
        assert!(query.matches(&brezza()));

        let miss = CatalogQuery { body_type: Some("sedan".to_string()), ..CatalogQuery::default() };
        assert!(!miss.matches(&brezza()));
    }

    #[test]
    fn range_predicates_reject_items_without_values() {
        let item = CatalogItem { price: None, ..brezza() };
        let query = CatalogQuery { price_max: Some(900_000), ..CatalogQuery::default() };
        assert!(!query.matches(&item));
    }

    #[test]
    fn mileage_figure_reads_first_number() {
        assert_eq!(brezza().mileage_figure(), Some(19.8));
        let unreadable = CatalogItem { mileage: Some("N/A".to_string()), ..brezza() };
        assert_eq!(unreadable.mileage_figure(), None);
    }
}
