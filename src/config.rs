//! Configuration management

use std::str::FromStr;

use anyhow::{self, Context, Result};

use crate::services::geo::{GeoEstimator, AVERAGE_SPEED_KMH, ROAD_COEFFICIENT};
use crate::services::savings::FuelModel;
use crate::services::vrp::SolverConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Valhalla routing engine URL (optional, straight-line estimates when unset)
    pub valhalla_url: Option<String>,

    /// Route solver budget and seed
    pub solver: SolverConfig,

    pub fuel: FuelModel,

    pub estimator: GeoEstimator,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = SolverConfig::default();
        let fuel_defaults = FuelModel::default();

        let valhalla_url = lookup("VALHALLA_URL").filter(|url| !url.trim().is_empty());

        let solver = SolverConfig {
            time_limit_ms: parse_or(&lookup, "SOLVER_TIME_LIMIT_MS", defaults.time_limit_ms)?,
            max_iterations: parse_or(&lookup, "SOLVER_MAX_ITERATIONS", defaults.max_iterations)?,
            seed: parse_or(&lookup, "SOLVER_SEED", defaults.seed)?,
            cost_metric: defaults.cost_metric,
        };
        if solver.time_limit_ms == 0 {
            anyhow::bail!("SOLVER_TIME_LIMIT_MS must be positive");
        }

        let fuel = FuelModel {
            litres_per_100km: parse_or(&lookup, "FUEL_LITRES_PER_100KM", fuel_defaults.litres_per_100km)?,
            price_per_litre: parse_or(&lookup, "FUEL_PRICE_PER_LITRE", fuel_defaults.price_per_litre)?,
        };

        let average_speed_kmh: f64 = parse_or(&lookup, "AVERAGE_SPEED_KMH", AVERAGE_SPEED_KMH)?;
        let road_coefficient: f64 = parse_or(&lookup, "ROAD_COEFFICIENT", ROAD_COEFFICIENT)?;
        if average_speed_kmh <= 0.0 || road_coefficient <= 0.0 {
            anyhow::bail!(
                "AVERAGE_SPEED_KMH and ROAD_COEFFICIENT must be positive (got {} and {})",
                average_speed_kmh,
                road_coefficient
            );
        }

        Ok(Self {
            valhalla_url,
            solver,
            fuel,
            estimator: GeoEstimator::new(road_coefficient, average_speed_kmh),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}
