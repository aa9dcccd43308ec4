//! Travel savings of an optimized route against the naive visiting order

use crate::services::vrp::RouteSolution;
use crate::types::route::{round1, round2};
use crate::types::TimeSavings;

/// Fuel consumption used to price saved kilometres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelModel {
    pub litres_per_100km: f64,
    pub price_per_litre: f64,
}

impl Default for FuelModel {
    fn default() -> Self {
        Self {
            litres_per_100km: 8.0,
            price_per_litre: 1.50,
        }
    }
}

impl FuelModel {
    pub fn litres_for_km(&self, km: f64) -> f64 {
        km * self.litres_per_100km / 100.0
    }
}

/// Compare two orderings of the same stops. Savings never go negative.
pub fn compare(naive: &RouteSolution, optimized: &RouteSolution, fuel: &FuelModel) -> TimeSavings {
    let naive_minutes = naive.total_travel_minutes();
    let optimized_minutes = optimized.total_travel_minutes();
    let naive_km = naive.total_distance_km();
    let optimized_km = optimized.total_distance_km();

    let minutes_saved = naive_minutes.saturating_sub(optimized_minutes);
    let distance_saved_km = (naive_km - optimized_km).max(0.0);
    let fuel_saved_litres = fuel.litres_for_km(distance_saved_km);
    let improvement_percent = if naive_minutes > 0 {
        minutes_saved as f64 / naive_minutes as f64 * 100.0
    } else {
        0.0
    };

    TimeSavings {
        naive_travel_minutes: naive_minutes,
        optimized_travel_minutes: optimized_minutes,
        minutes_saved,
        naive_distance_km: round2(naive_km),
        optimized_distance_km: round2(optimized_km),
        distance_saved_km: round2(distance_saved_km),
        fuel_saved_litres: round2(fuel_saved_litres),
        fuel_cost_saved: round2(fuel_saved_litres * fuel.price_per_litre),
        improvement_percent: round1(improvement_percent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(distance_meters: u64, travel_seconds: u64) -> RouteSolution {
        RouteSolution {
            total_distance_meters: distance_meters,
            total_travel_seconds: travel_seconds,
            ..RouteSolution::empty()
        }
    }

    #[test]
    fn test_savings_against_naive_order() {
        let naive = route(30_000, 3_600);
        let optimized = route(20_000, 2_700);

        let savings = compare(&naive, &optimized, &FuelModel::default());

        assert_eq!(savings.naive_travel_minutes, 60);
        assert_eq!(savings.optimized_travel_minutes, 45);
        assert_eq!(savings.minutes_saved, 15);
        assert_eq!(savings.distance_saved_km, 10.0);
        assert_eq!(savings.fuel_saved_litres, 0.8);
        assert_eq!(savings.fuel_cost_saved, 1.2);
        assert_eq!(savings.improvement_percent, 25.0);
    }

    #[test]
    fn test_no_negative_savings() {
        let naive = route(10_000, 600);
        let optimized = route(12_000, 900);

        let savings = compare(&naive, &optimized, &FuelModel::default());

        assert_eq!(savings.minutes_saved, 0);
        assert_eq!(savings.distance_saved_km, 0.0);
        assert_eq!(savings.fuel_cost_saved, 0.0);
    }

    #[test]
    fn test_empty_routes_save_nothing() {
        let savings = compare(&RouteSolution::empty(), &RouteSolution::empty(), &FuelModel::default());
        assert_eq!(savings, TimeSavings::default());
    }
}
