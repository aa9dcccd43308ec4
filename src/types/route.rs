//! Day plan types: visits, day slots and travel savings

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{Coordinates, CustomerId};

/// Status of one calendar day in the horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Working,
    DayOff,
    Frozen,
}

/// A scheduled visit, owned by the day slot it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visit {
    #[serde(rename = "id")]
    pub customer_id: CustomerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub date: NaiveDate,
    /// Position in the day's route (1-based)
    pub route_order: u32,
    pub arrival_time: NaiveTime,
    pub departure_time: NaiveTime,
    pub estimated_duration_minutes: u32,
    pub price: f64,
    pub priority: f64,
    pub travel_minutes_from_previous: u32,
    pub distance_km_from_previous: f64,
}

/// Optimized route compared to visiting the same stops in selection order
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimeSavings {
    pub naive_travel_minutes: u32,
    pub optimized_travel_minutes: u32,
    pub minutes_saved: u32,
    pub naive_distance_km: f64,
    pub optimized_distance_km: f64,
    pub distance_saved_km: f64,
    pub fuel_saved_litres: f64,
    pub fuel_cost_saved: f64,
    pub improvement_percent: f64,
}

impl TimeSavings {
    /// Sum per-day savings into a horizon total; the percentage is recomputed from minutes
    pub fn accumulate<'a>(items: impl IntoIterator<Item = &'a TimeSavings>) -> TimeSavings {
        let mut total = TimeSavings::default();
        for item in items {
            total.naive_travel_minutes += item.naive_travel_minutes;
            total.optimized_travel_minutes += item.optimized_travel_minutes;
            total.minutes_saved += item.minutes_saved;
            total.naive_distance_km += item.naive_distance_km;
            total.optimized_distance_km += item.optimized_distance_km;
            total.distance_saved_km += item.distance_saved_km;
            total.fuel_saved_litres += item.fuel_saved_litres;
            total.fuel_cost_saved += item.fuel_cost_saved;
        }
        total.naive_distance_km = round2(total.naive_distance_km);
        total.optimized_distance_km = round2(total.optimized_distance_km);
        total.distance_saved_km = round2(total.distance_saved_km);
        total.fuel_saved_litres = round2(total.fuel_saved_litres);
        total.fuel_cost_saved = round2(total.fuel_cost_saved);
        total.improvement_percent = if total.naive_travel_minutes > 0 {
            round1(total.minutes_saved as f64 / total.naive_travel_minutes as f64 * 100.0)
        } else {
            0.0
        };
        total
    }
}

/// One calendar day: capacity and the ordered visits assigned to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySlot {
    pub date: NaiveDate,
    pub day: String,
    pub status: DayStatus,
    pub capacity_minutes: u32,
    pub remaining_minutes: u32,
    #[serde(rename = "customers")]
    pub visits: Vec<Visit>,
    /// Service time plus travel time
    pub total_duration_minutes: u32,
    pub total_service_minutes: u32,
    pub total_revenue: f64,
    pub estimated_travel_time_minutes: u32,
    pub travel_distance_km: f64,
    pub time_savings: TimeSavings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DaySlot {
    /// A day that receives no visits (day off, frozen, or nothing eligible)
    pub fn empty(date: NaiveDate, status: DayStatus, capacity_minutes: u32) -> Self {
        Self {
            date,
            day: date.format("%A").to_string(),
            status,
            capacity_minutes,
            remaining_minutes: capacity_minutes,
            visits: Vec::new(),
            total_duration_minutes: 0,
            total_service_minutes: 0,
            total_revenue: 0.0,
            estimated_travel_time_minutes: 0,
            travel_distance_km: 0.0,
            time_savings: TimeSavings::default(),
            algorithm: None,
            warnings: Vec::new(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Stop of a single-route request; only location and service time matter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStopInput {
    pub id: CustomerId,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub estimated_duration_minutes: Option<u32>,
}

/// Order a stop list without scheduling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub customers: Vec<RouteStopInput>,
    #[serde(default)]
    pub start_location: Option<Coordinates>,
    #[serde(default)]
    pub return_to_start: bool,
    #[serde(default)]
    pub day_start: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStopOrder {
    pub customer_id: CustomerId,
    /// 1-based
    pub order: u32,
    pub arrival_time: NaiveTime,
    pub departure_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResponse {
    pub schedule: Vec<RouteStopOrder>,
    pub total_distance_km: f64,
    pub total_travel_minutes: u32,
    pub algorithm: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
