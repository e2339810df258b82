pub mod opencage;
pub mod yahoo;

use crate::errors::Result;
use crate::models::geo::{Address, GeoPoint};
use crate::models::profile::TickerProfile;
use crate::models::quote::QuoteSeries;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Source of quote history and company profiles
#[async_trait]
pub trait MarketData {
    /// Provider name used in logs
    fn name(&self) -> &'static str;

    /// Daily quotes for `[start, end]`, both ends inclusive.
    /// A ticker or range without data is an empty series, not an error.
    async fn quote_series(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<QuoteSeries>;

    /// Company profile. An unknown ticker is an empty profile.
    async fn profile(&self, ticker: &str) -> Result<TickerProfile>;
}

/// Address to coordinates lookup
#[async_trait]
pub trait Geocoder {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the provider has no match for the address.
    async fn locate(&self, address: &Address) -> Result<Option<GeoPoint>>;
}
