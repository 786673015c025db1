//! Static catalog configuration
//!
//! Plot list, growth curve, currency rate table and supported purchase years.
//! These are injected into the projection engine rather than hardcoded so the
//! engine can be exercised against alternative catalogs.

use crate::error::EstateError;
use crate::models::{Currency, Hotspot, HotspotStatus, PlotOption};
use std::collections::HashSet;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_BASELINE_YEAR: i32 = 2026;
pub const DEFAULT_EXTRAPOLATION_RATE: f64 = 0.15;
pub const HOME_CURRENCY: Currency = Currency::Ngn;

//
// ================= Growth Curve =================
//

/// Cumulative growth multipliers keyed by calendar year (baseline = 1.0)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthCurve {
    pub baseline_year: i32,
    pub multipliers: BTreeMap<i32, f64>,
    /// Linear per-year rate used for years missing from `multipliers`
    pub extrapolation_rate: f64,
    /// Last projected year; defaults to the last tabulated year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon_year: Option<i32>,
}

impl GrowthCurve {
    pub fn new(
        baseline_year: i32,
        multipliers: BTreeMap<i32, f64>,
        extrapolation_rate: f64,
    ) -> Result<Self> {
        let curve = Self {
            baseline_year,
            multipliers,
            extrapolation_rate,
            horizon_year: None,
        };
        curve.validate()?;
        Ok(curve)
    }

    pub fn with_horizon(mut self, horizon_year: i32) -> Result<Self> {
        self.horizon_year = Some(horizon_year);
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.multipliers.is_empty() {
            return Err(EstateError::InvalidCatalog(
                "growth curve has no tabulated years".to_string(),
            ));
        }

        if let Some(base) = self.multipliers.get(&self.baseline_year) {
            if (*base - 1.0).abs() > f64::EPSILON {
                return Err(EstateError::InvalidCatalog(format!(
                    "baseline year {} must map to 1.0, found {}",
                    self.baseline_year, base
                )));
            }
        }

        if !(self.extrapolation_rate.is_finite() && self.extrapolation_rate > 0.0) {
            return Err(EstateError::InvalidCatalog(format!(
                "extrapolation rate must be positive, found {}",
                self.extrapolation_rate
            )));
        }

        let mut previous: Option<(i32, f64)> = None;
        for (&year, &factor) in &self.multipliers {
            if !(factor.is_finite() && factor > 0.0) {
                return Err(EstateError::InvalidCatalog(format!(
                    "multiplier for {} must be positive, found {}",
                    year, factor
                )));
            }
            if let Some((prev_year, prev_factor)) = previous {
                if factor < prev_factor {
                    return Err(EstateError::InvalidCatalog(format!(
                        "multiplier decreases from {} ({}) to {} ({})",
                        prev_year, prev_factor, year, factor
                    )));
                }
            }
            previous = Some((year, factor));
        }

        if self.horizon_year() < self.baseline_year {
            return Err(EstateError::InvalidCatalog(format!(
                "horizon {} precedes baseline {}",
                self.horizon_year(),
                self.baseline_year
            )));
        }

        Ok(())
    }

    pub fn horizon_year(&self) -> i32 {
        self.horizon_year
            .or_else(|| self.multipliers.keys().next_back().copied())
            .unwrap_or(self.baseline_year)
    }

    /// Tabulated multiplier for `year`, or the linear extrapolation when the
    /// year is not in the table.
    pub fn multiplier(&self, year: i32) -> f64 {
        match self.multipliers.get(&year) {
            Some(factor) => *factor,
            None => self.extrapolate(year),
        }
    }

    pub fn extrapolate(&self, year: i32) -> f64 {
        1.0 + f64::from(year - self.baseline_year) * self.extrapolation_rate
    }
}

impl Default for GrowthCurve {
    fn default() -> Self {
        let multipliers = BTreeMap::from([
            (2026, 1.00),
            (2027, 1.15),
            (2028, 1.35),
            (2029, 1.55),
            (2030, 1.80),
            (2031, 2.10),
        ]);

        Self {
            baseline_year: DEFAULT_BASELINE_YEAR,
            multipliers,
            extrapolation_rate: DEFAULT_EXTRAPOLATION_RATE,
            horizon_year: None,
        }
    }
}

//
// ================= Currency Rates =================
//

/// Multiplicative conversion factors from the home currency
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CurrencyRates {
    rates: BTreeMap<Currency, f64>,
}

impl CurrencyRates {
    pub fn new(rates: BTreeMap<Currency, f64>) -> Result<Self> {
        let table = Self { rates };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        for (currency, factor) in &self.rates {
            if !(factor.is_finite() && *factor > 0.0) {
                return Err(EstateError::InvalidCatalog(format!(
                    "rate for {} must be positive, found {}",
                    currency, factor
                )));
            }
        }

        let home_entries = self
            .rates
            .values()
            .filter(|factor| (**factor - 1.0).abs() <= f64::EPSILON)
            .count();

        if home_entries != 1 {
            return Err(EstateError::InvalidCatalog(format!(
                "expected exactly one home currency rate of 1.0, found {}",
                home_entries
            )));
        }

        Ok(())
    }

    pub fn rate(&self, currency: Currency) -> Result<f64> {
        self.rates
            .get(&currency)
            .copied()
            .ok_or_else(|| EstateError::MissingRate(currency.to_string()))
    }

    pub fn home_currency(&self) -> Option<Currency> {
        self.rates
            .iter()
            .find(|(_, factor)| (**factor - 1.0).abs() <= f64::EPSILON)
            .map(|(currency, _)| *currency)
    }

    pub fn currencies(&self) -> impl Iterator<Item = Currency> + '_ {
        self.rates.keys().copied()
    }
}

impl Default for CurrencyRates {
    fn default() -> Self {
        // Approx 1600 NGN = 1 USD, 2040 NGN = 1 GBP
        Self {
            rates: BTreeMap::from([
                (Currency::Ngn, 1.0),
                (Currency::Usd, 0.000625),
                (Currency::Gbp, 0.00049),
            ]),
        }
    }
}

//
// ================= Catalog =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    pub plots: Vec<PlotOption>,
    pub growth_curve: GrowthCurve,
    pub currency_rates: CurrencyRates,
    pub purchase_years: Vec<i32>,
    /// Masterplan areas; catalogs without a map leave this out
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
}

impl Catalog {
    pub fn from_json(raw: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        self.growth_curve.validate()?;
        self.currency_rates.validate()?;

        if self.plots.is_empty() {
            return Err(EstateError::InvalidCatalog("no plots configured".to_string()));
        }

        if let Some(plot) = self
            .plots
            .iter()
            .find(|p| !(p.base_price.is_finite() && p.base_price > 0.0))
        {
            return Err(EstateError::InvalidCatalog(format!(
                "plot {:?} has non-positive price {}",
                plot.label, plot.base_price
            )));
        }

        let baseline = self.growth_curve.baseline_year;
        let horizon = self.growth_curve.horizon_year();
        if let Some(year) = self
            .purchase_years
            .iter()
            .find(|y| **y < baseline || **y > horizon)
        {
            return Err(EstateError::InvalidCatalog(format!(
                "purchase year {} outside {}..={}",
                year, baseline, horizon
            )));
        }

        self.validate_hotspots()
    }

    fn validate_hotspots(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spot in &self.hotspots {
            if !seen.insert(spot.id.as_str()) {
                return Err(EstateError::InvalidCatalog(format!(
                    "duplicate hotspot id {:?}",
                    spot.id
                )));
            }

            let on_map = |v: f64| (0.0..=100.0).contains(&v);
            if !(on_map(spot.x) && on_map(spot.y)) {
                return Err(EstateError::InvalidCatalog(format!(
                    "hotspot {:?} at ({}, {}) is off the map",
                    spot.id, spot.x, spot.y
                )));
            }
        }

        Ok(())
    }

    pub fn plot(&self, index: usize) -> Result<&PlotOption> {
        self.plots.get(index).ok_or(EstateError::PlotNotFound(index))
    }

    pub fn is_supported_purchase_year(&self, year: i32) -> bool {
        self.purchase_years.contains(&year)
    }

    pub fn hotspot(&self, id: &str) -> Option<&Hotspot> {
        self.hotspots.iter().find(|h| h.id == id)
    }
}

fn hotspot(
    id: &str,
    (x, y): (f64, f64),
    title: &str,
    status: HotspotStatus,
    price: &str,
    description: &str,
) -> Hotspot {
    Hotspot {
        id: id.to_string(),
        x,
        y,
        title: title.to_string(),
        status,
        price: Some(price.to_string()),
        description: description.to_string(),
    }
}

fn default_hotspots() -> Vec<Hotspot> {
    vec![
        hotspot(
            "gate",
            (50.0, 85.0),
            "Monstrous City Gate",
            HotspotStatus::Available,
            "N/A",
            "The iconic entrance to luxury. 24/7 high-tech security access control.",
        ),
        hotspot(
            "residential-a",
            (25.0, 40.0),
            "Residential Cluster A",
            HotspotStatus::SellingFast,
            "From ₦37M",
            "Premium plots available in 258sqm, 315sqm, and 560sqm configurations.",
        ),
        hotspot(
            "commercial",
            (75.0, 50.0),
            "Commercial Hub",
            HotspotStatus::FuturePhase,
            "From ₦150M",
            "The future business district of Asaba. High-rise capable zones.",
        ),
        hotspot(
            "school",
            (20.0, 20.0),
            "International Academy",
            HotspotStatus::SoldOut,
            "Sold Out",
            "World-class educational facility site.",
        ),
    ]
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            plots: vec![
                PlotOption::new(258, 37_000_000.0, "Starter Plot"),
                PlotOption::new(315, 47_000_000.0, "Standard Plot"),
                PlotOption::new(560, 80_000_000.0, "Executive Plot"),
            ],
            growth_curve: GrowthCurve::default(),
            currency_rates: CurrencyRates::default(),
            purchase_years: vec![2026, 2027, 2028],
            hotspots: default_hotspots(),
        }
    }
}
