//! Price projection engine
//!
//! Deterministic appreciation series from a baseline price, a purchase year
//! and a display currency. Pure: no I/O, no shared state.

use crate::catalog::{Catalog, CurrencyRates, GrowthCurve};
use crate::error::EstateError;
use crate::models::{Currency, PlotQuote, Projection, ProjectionPoint};
use crate::Result;
use tracing::debug;

pub struct ProjectionEngine {
    growth_curve: GrowthCurve,
    currency_rates: CurrencyRates,
}

impl ProjectionEngine {
    pub fn new(growth_curve: GrowthCurve, currency_rates: CurrencyRates) -> Self {
        Self {
            growth_curve,
            currency_rates,
        }
    }

    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self::new(catalog.growth_curve.clone(), catalog.currency_rates.clone())
    }

    pub fn growth_curve(&self) -> &GrowthCurve {
        &self.growth_curve
    }

    pub fn horizon_year(&self) -> i32 {
        self.growth_curve.horizon_year()
    }

    /// Home-currency price of an asset in `year`
    pub fn price_for_year(&self, base_price: f64, year: i32) -> f64 {
        base_price * self.growth_curve.multiplier(year)
    }

    /// Project yearly values from `purchase_year` to the horizon (SYNC)
    pub fn project(
        &self,
        base_price: f64,
        purchase_year: i32,
        currency: Currency,
    ) -> Result<Projection> {
        if !(base_price.is_finite() && base_price > 0.0) {
            return Err(EstateError::InvalidPrice(base_price));
        }

        let rate = self.currency_rates.rate(currency)?;
        let baseline = self.growth_curve.baseline_year;
        let horizon = self.horizon_year();

        if purchase_year < baseline || purchase_year > horizon {
            return Err(EstateError::PurchaseYearOutOfRange {
                year: purchase_year,
                baseline,
                horizon,
            });
        }

        let series: Vec<ProjectionPoint> = (purchase_year..=horizon)
            .map(|year| {
                let value = self.price_for_year(base_price, year);
                ProjectionPoint {
                    year,
                    value_in_home_currency: value,
                    value_in_display_currency: value * rate,
                    is_entry_year: year == purchase_year,
                }
            })
            .collect();

        // Non-empty: purchase_year <= horizon was checked above.
        let last_index = series.len() - 1;
        let entry_value = series[0].value_in_display_currency;
        let final_value = series[last_index].value_in_display_currency;
        let next_year_value = series[last_index.min(1)].value_in_display_currency;
        let total_appreciation_percent = (final_value - entry_value) / entry_value * 100.0;

        // A finite price can still overflow once grown and converted.
        let overflowed = series
            .iter()
            .any(|p| !(p.value_in_home_currency.is_finite() && p.value_in_display_currency.is_finite()));
        if overflowed || !total_appreciation_percent.is_finite() {
            return Err(EstateError::InvalidPrice(base_price));
        }

        debug!(
            purchase_year,
            horizon,
            currency = %currency,
            total_appreciation_percent,
            "Projection computed"
        );

        Ok(Projection {
            currency,
            series,
            entry_value,
            next_year_value,
            total_appreciation_percent,
            horizon_year: horizon,
        })
    }

    /// Project a catalog plot by index
    pub fn project_plot(
        &self,
        catalog: &Catalog,
        plot_index: usize,
        purchase_year: i32,
        currency: Currency,
    ) -> Result<Projection> {
        let plot = catalog.plot(plot_index)?;
        self.project(plot.base_price, purchase_year, currency)
    }

    /// Price of every plot in `purchase_year`, converted to `currency`
    pub fn quote_plots(
        &self,
        catalog: &Catalog,
        purchase_year: i32,
        currency: Currency,
    ) -> Result<Vec<PlotQuote>> {
        let rate = self.currency_rates.rate(currency)?;

        catalog
            .plots
            .iter()
            .map(|plot| {
                let price = self.price_for_year(plot.base_price, purchase_year) * rate;
                if !price.is_finite() {
                    return Err(EstateError::InvalidPrice(plot.base_price));
                }
                Ok(PlotQuote {
                    plot: plot.clone(),
                    purchase_year,
                    currency,
                    price,
                })
            })
            .collect()
    }
}

impl Default for ProjectionEngine {
    fn default() -> Self {
        Self::new(GrowthCurve::default(), CurrencyRates::default())
    }
}
