#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use ticker_dashboard::errors::{DashboardError, Result};
use ticker_dashboard::models::geo::{Address, GeoPoint};
use ticker_dashboard::models::profile::TickerProfile;
use ticker_dashboard::models::quote::{QuoteBar, QuoteSeries};
use ticker_dashboard::providers::{Geocoder, MarketData};
use ticker_dashboard::Query;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn query(ticker: &str) -> Query {
    Query {
        ticker: ticker.to_string(),
        start_date: day(2024, 3, 1),
        end_date: day(2024, 3, 8),
    }
}

pub fn series(days: &[u32], base: f64) -> QuoteSeries {
    QuoteSeries::from_bars(
        days.iter()
            .map(|&d| QuoteBar {
                trading_day: day(2024, 3, d),
                open: base,
                high: base + 2.0,
                low: base - 2.0,
                close: base + 1.0,
                adj_close: base + 0.5,
                volume: 1_000_000,
            })
            .collect(),
    )
}

pub fn full_profile(name: &str) -> Value {
    json!({
        "shortName": name,
        "longBusinessSummary": format!("{} makes things.", name),
        "currency": "USD",
        "beta": 1.1,
        "currentPrice": 101.5,
        "companyOfficers": [{"name": "Jane Doe", "title": "CEO"}],
        "website": "https://example.com",
        "phone": "555 0100",
        "address1": "1 Main Street",
        "zip": "10001",
        "city": "New York",
        "country": "United States"
    })
}

#[derive(Default)]
pub struct FakeMarket {
    entries: HashMap<String, (QuoteSeries, TickerProfile)>,
    delays: HashMap<String, Duration>,
    failing: Vec<String>,
    pub calls: AtomicUsize,
}

impl FakeMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, ticker: &str, series: QuoteSeries, profile: Value) -> Self {
        self.entries
            .insert(ticker.to_string(), (series, TickerProfile::from_json(&profile)));
        self
    }

    pub fn with_delay(mut self, ticker: &str, delay: Duration) -> Self {
        self.delays.insert(ticker.to_string(), delay);
        self
    }

    pub fn failing(mut self, ticker: &str) -> Self {
        self.failing.push(ticker.to_string());
        self
    }

    async fn pause(&self, ticker: &str) -> Result<()> {
        if let Some(delay) = self.delays.get(ticker) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.iter().any(|t| t == ticker) {
            return Err(DashboardError::ProviderError(format!("upstream refused {}", ticker)));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketData for FakeMarket {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn quote_series(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<QuoteSeries> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pause(ticker).await?;
        Ok(self
            .entries
            .get(ticker)
            .map(|(series, _)| series.clone().within(start, end))
            .unwrap_or_default())
    }

    async fn profile(&self, ticker: &str) -> Result<TickerProfile> {
        self.pause(ticker).await?;
        Ok(self
            .entries
            .get(ticker)
            .map(|(_, profile)| profile.clone())
            .unwrap_or_default())
    }
}

/// Resolves every address in `known`; anything else has no match.
#[derive(Default)]
pub struct FakeGeocoder {
    known: HashMap<String, GeoPoint>,
    broken: bool,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn knowing(mut self, city: &str, latitude: f64, longitude: f64) -> Self {
        self.known.insert(city.to_string(), GeoPoint { latitude, longitude });
        self
    }

    pub fn broken() -> Self {
        Self {
            known: HashMap::new(),
            broken: true,
        }
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    fn name(&self) -> &'static str {
        "fake-geo"
    }

    async fn locate(&self, address: &Address) -> Result<Option<GeoPoint>> {
        if self.broken {
            return Err(DashboardError::ProviderError("geocoder unreachable".to_string()));
        }
        Ok(self.known.get(&address.city).copied())
    }
}
