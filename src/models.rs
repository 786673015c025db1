//! Core data models for the estate service

use crate::error::EstateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//
// ================= Enums =================
//

/// Display currencies. NGN is the home currency catalog prices are quoted in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Ngn,
    Usd,
    Gbp,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Ngn, Currency::Usd, Currency::Gbp];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Ngn => "NGN",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
        }
    }
}

impl FromStr for Currency {
    type Err = EstateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NGN" => Ok(Currency::Ngn),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            _ => Err(EstateError::UnknownCurrency(s.to_string())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

//
// ================= Catalog =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlotOption {
    /// Area in square meters
    pub size: u32,
    /// Price in the home currency at the baseline year
    pub base_price: f64,
    pub label: String,
}

impl PlotOption {
    pub fn new(size: u32, base_price: f64, label: &str) -> Self {
        Self {
            size,
            base_price,
            label: label.to_string(),
        }
    }
}

/// Sales status of a masterplan area
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HotspotStatus {
    #[serde(rename = "Sold Out")]
    SoldOut,
    #[serde(rename = "Selling Fast")]
    SellingFast,
    #[serde(rename = "Future Phase")]
    FuturePhase,
    Available,
}

impl HotspotStatus {
    /// Whether visitors can still register interest
    pub fn accepts_enquiries(&self) -> bool {
        !matches!(self, HotspotStatus::SoldOut)
    }
}

impl fmt::Display for HotspotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HotspotStatus::SoldOut => "Sold Out",
            HotspotStatus::SellingFast => "Selling Fast",
            HotspotStatus::FuturePhase => "Future Phase",
            HotspotStatus::Available => "Available",
        };
        write!(f, "{}", label)
    }
}

/// A marked area on the masterplan map
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hotspot {
    pub id: String,
    /// Horizontal position as a percentage of the map width
    pub x: f64,
    /// Vertical position as a percentage of the map height
    pub y: f64,
    pub title: String,
    pub status: HotspotStatus,
    /// Display price label, e.g. "From ₦37M"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub description: String,
}

//
// ================= Projection =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectionPoint {
    pub year: i32,
    pub value_in_home_currency: f64,
    pub value_in_display_currency: f64,
    pub is_entry_year: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Projection {
    pub currency: Currency,
    pub series: Vec<ProjectionPoint>,
    pub entry_value: f64,
    pub next_year_value: f64,
    pub total_appreciation_percent: f64,
    pub horizon_year: i32,
}

impl Projection {
    pub fn horizon_value(&self) -> f64 {
        self.series
            .last()
            .map(|p| p.value_in_display_currency)
            .unwrap_or(self.entry_value)
    }

    /// Year shown beside `next_year_value`
    pub fn next_year(&self) -> i32 {
        self.series
            .get(1)
            .or_else(|| self.series.first())
            .map(|p| p.year)
            .unwrap_or(self.horizon_year)
    }
}

/// A plot priced at a purchase year in a display currency
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlotQuote {
    pub plot: PlotOption,
    pub purchase_year: i32,
    pub currency: Currency,
    pub price: f64,
}

//
// ================= Concierge =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}
