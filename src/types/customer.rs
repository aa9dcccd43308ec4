//! Customer types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::defaults::{DEFAULT_FREQUENCY_DAYS, DEFAULT_SERVICE_DURATION_MINUTES, MAX_FREQUENCY_DAYS};

/// Customer identifier as supplied by the caller
pub type CustomerId = i64;

/// Coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Latitude within [-90, 90], longitude within [-180, 180], both finite
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Customer as it arrives in a scheduling request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInput {
    pub id: CustomerId,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub estimated_duration_minutes: Option<u32>,
    pub last_cleaned_date: NaiveDate,
    #[serde(default)]
    pub frequency_days: Option<i64>,
    /// Free-text cadence ("weekly", "monthly", ...) used when `frequency_days` is absent
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Validated customer, immutable for the duration of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub coordinates: Coordinates,
    pub price: f64,
    pub estimated_duration_minutes: u32,
    pub last_cleaned_date: NaiveDate,
    pub frequency_days: u32,
    pub name: Option<String>,
    pub address: Option<String>,
}

impl CustomerInput {
    /// Resolve the cleaning frequency in days.
    ///
    /// An explicit `frequency_days` wins; otherwise the cadence label is parsed.
    /// Returns `Err` with a message when the explicit value is not within
    /// 1..=[`MAX_FREQUENCY_DAYS`].
    pub fn resolve_frequency_days(&self) -> Result<u32, String> {
        if let Some(days) = self.frequency_days {
            if days <= 0 {
                return Err(format!(
                    "customer {}: frequency_days must be positive, got {}",
                    self.id, days
                ));
            }
            return u32::try_from(days)
                .ok()
                .filter(|days| *days <= MAX_FREQUENCY_DAYS)
                .ok_or_else(|| {
                    format!(
                        "customer {}: frequency_days must be at most {}, got {}",
                        self.id, MAX_FREQUENCY_DAYS, days
                    )
                });
        }

        match self.frequency.as_deref() {
            Some(label) => Ok(parse_frequency_label(label).unwrap_or_else(|| {
                warn!(
                    "Customer {}: unknown frequency '{}', using {} days",
                    self.id, label, DEFAULT_FREQUENCY_DAYS
                );
                DEFAULT_FREQUENCY_DAYS
            })),
            None => {
                warn!(
                    "Customer {}: no frequency given, using {} days",
                    self.id, DEFAULT_FREQUENCY_DAYS
                );
                Ok(DEFAULT_FREQUENCY_DAYS)
            }
        }
    }

    /// Convert into a validated [`Customer`]
    pub fn into_customer(self) -> Result<Customer, String> {
        let coordinates = Coordinates::new(self.lat, self.lng);
        if !coordinates.is_valid() {
            return Err(format!(
                "customer {}: invalid coordinates ({}, {})",
                self.id, self.lat, self.lng
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(format!("customer {}: price must be >= 0", self.id));
        }

        let frequency_days = self.resolve_frequency_days()?;
        let estimated_duration_minutes = match self.estimated_duration_minutes {
            Some(0) => {
                return Err(format!(
                    "customer {}: estimated_duration_minutes must be positive",
                    self.id
                ))
            }
            Some(minutes) => minutes,
            None => DEFAULT_SERVICE_DURATION_MINUTES,
        };

        Ok(Customer {
            id: self.id,
            coordinates,
            price: self.price,
            estimated_duration_minutes,
            last_cleaned_date: self.last_cleaned_date,
            frequency_days,
            name: self.name,
            address: self.address,
        })
    }
}

/// Map a cadence label to days
pub fn parse_frequency_label(label: &str) -> Option<u32> {
    match label.trim().to_lowercase().as_str() {
        "weekly" => Some(7),
        "bi-weekly" | "biweekly" | "fortnightly" => Some(14),
        "monthly" => Some(30),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(frequency_days: Option<i64>, frequency: Option<&str>) -> CustomerInput {
        CustomerInput {
            id: 7,
            lat: 51.5,
            lng: -0.1,
            price: 20.0,
            estimated_duration_minutes: None,
            last_cleaned_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            frequency_days,
            frequency: frequency.map(str::to_string),
            name: None,
            address: None,
        }
    }

    #[test]
    fn test_explicit_frequency_wins_over_label() {
        let customer = input(Some(21), Some("weekly"));
        assert_eq!(customer.resolve_frequency_days().unwrap(), 21);
    }

    #[test]
    fn test_non_positive_frequency_rejected() {
        assert!(input(Some(0), None).resolve_frequency_days().is_err());
        assert!(input(Some(-3), None).resolve_frequency_days().is_err());
    }

    #[test]
    fn test_huge_frequency_rejected() {
        assert_eq!(input(Some(3_650), None).resolve_frequency_days().unwrap(), 3_650);
        let err = input(Some(4_000_000_000), None).resolve_frequency_days().unwrap_err();
        assert!(err.contains("at most 3650"));
        assert!(input(Some(i64::MAX), None).resolve_frequency_days().is_err());
    }

    #[test]
    fn test_frequency_labels() {
        assert_eq!(parse_frequency_label("Weekly"), Some(7));
        assert_eq!(parse_frequency_label("fortnightly"), Some(14));
        assert_eq!(parse_frequency_label("bi-weekly"), Some(14));
        assert_eq!(parse_frequency_label("monthly"), Some(30));
        assert_eq!(parse_frequency_label("quarterly"), None);
    }

    #[test]
    fn test_unknown_or_missing_label_defaults() {
        assert_eq!(input(None, Some("sometimes")).resolve_frequency_days().unwrap(), 14);
        assert_eq!(input(None, None).resolve_frequency_days().unwrap(), 14);
    }

    #[test]
    fn test_into_customer_applies_default_duration() {
        let customer = input(Some(14), None).into_customer().unwrap();
        assert_eq!(customer.estimated_duration_minutes, 30);
        assert_eq!(customer.frequency_days, 14);
    }

    #[test]
    fn test_into_customer_rejects_bad_coordinates() {
        let mut bad = input(Some(14), None);
        bad.lat = 120.0;
        assert!(bad.into_customer().is_err());
    }

    #[test]
    fn test_into_customer_rejects_zero_duration() {
        let mut bad = input(Some(14), None);
        bad.estimated_duration_minutes = Some(0);
        assert!(bad.into_customer().is_err());
    }
}
