use crate::config::Config;
use crate::errors::{DashboardError, Result};
use crate::models::profile::TickerProfile;
use crate::models::quote::{QuoteBar, QuoteSeries};
use crate::providers::MarketData;
use async_trait::async_trait;
use chrono::{DateTime, Duration as DateDuration, NaiveDate, NaiveTime};
use log::{debug, info, warn};
use reqwest::{Client, StatusCode, Url};
use serde_json::{Map, Value};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const SUMMARY_MODULES: &str = "assetProfile,summaryDetail,price,defaultKeyStatistics,financialData";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Yahoo Finance chart and quoteSummary client
pub struct YahooFinance {
    client: Client,
    chart_url: String,
    summary_url: String,
    cookie_url: String,
    crumb_url: String,
    crumb: tokio::sync::Mutex<Option<String>>,
    last_request: Mutex<Option<Instant>>,
}

impl YahooFinance {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(DashboardError::RequestError)?;

        Ok(Self {
            client,
            chart_url: config.yahoo_chart_url.clone(),
            summary_url: config.yahoo_summary_url.clone(),
            cookie_url: config.yahoo_cookie_url.clone(),
            crumb_url: config.yahoo_crumb_url.clone(),
            crumb: tokio::sync::Mutex::new(None),
            last_request: Mutex::new(None),
        })
    }

    /// Keep at least 250ms between requests to Yahoo.
    async fn wait_for_rate_limit(&self) {
        const MIN_INTERVAL: Duration = Duration::from_millis(250);

        let now = Instant::now();
        let should_wait = {
            let mut last = match self.last_request.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let should_wait = last
                .map(|instant| instant.elapsed())
                .filter(|elapsed| *elapsed < MIN_INTERVAL)
                .map(|elapsed| MIN_INTERVAL - elapsed);
            *last = Some(now);
            should_wait
        };

        if let Some(wait_time) = should_wait {
            debug!("Waiting {:?} before the next Yahoo request", wait_time);
            tokio::time::sleep(wait_time).await;
        }
    }

    /// quoteSummary needs a session cookie plus the crumb bound to it.
    async fn crumb(&self, refresh: bool) -> Result<String> {
        let mut cached = self.crumb.lock().await;
        if !refresh {
            if let Some(crumb) = cached.as_ref() {
                return Ok(crumb.clone());
            }
        }

        // fc.yahoo.com answers 404 but sets the cookie
        if let Err(e) = self.client.get(&self.cookie_url).send().await {
            debug!("Cookie request failed: {}", e);
        }

        let response = self.client.get(&self.crumb_url).send().await?;
        if !response.status().is_success() {
            return Err(DashboardError::ProviderError(format!(
                "Crumb request failed: HTTP status {}",
                response.status()
            )));
        }

        let crumb = response.text().await?.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(DashboardError::ProviderError("Yahoo returned an invalid crumb".to_string()));
        }

        info!("Obtained a new Yahoo crumb");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    fn endpoint(base: &str, ticker: &str) -> Result<Url> {
        let mut url = Url::parse(base)
            .map_err(|e| DashboardError::ConfigError(format!("Invalid Yahoo URL {}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| DashboardError::ConfigError(format!("Yahoo URL {} cannot take a path", base)))?
            .push(ticker);
        Ok(url)
    }
}

#[async_trait]
impl MarketData for YahooFinance {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn quote_series(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<QuoteSeries> {
        // period2 is exclusive, so push it to the midnight after `end`
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = (end + DateDuration::days(1)).and_time(NaiveTime::MIN).and_utc().timestamp();
        debug!("Fetching {} quotes {} to {}", ticker, start, end);

        self.wait_for_rate_limit().await;

        let response = self
            .client
            .get(Self::endpoint(&self.chart_url, ticker)?)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,splits".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await
            .map_err(DashboardError::RequestError)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!("No chart data for {}; using an empty series", ticker);
            return Ok(QuoteSeries::empty());
        }
        if !status.is_success() {
            return Err(DashboardError::ProviderError(format!(
                "Chart request for {} failed: HTTP status {}",
                ticker, status
            )));
        }

        let json: Value = response.json().await?;
        let series = parse_chart(&json)?.within(start, end);
        info!("Fetched {} daily bars for {}", series.len(), ticker);
        Ok(series)
    }

    async fn profile(&self, ticker: &str) -> Result<TickerProfile> {
        for attempt in 0..2 {
            let crumb = self.crumb(attempt > 0).await?;
            self.wait_for_rate_limit().await;

            let response = self
                .client
                .get(Self::endpoint(&self.summary_url, ticker)?)
                .query(&[
                    ("modules", SUMMARY_MODULES),
                    ("formatted", "false"),
                    ("crumb", crumb.as_str()),
                ])
                .send()
                .await
                .map_err(DashboardError::RequestError)?;

            let status = response.status();
            if (status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN) && attempt == 0 {
                warn!("Yahoo rejected the crumb for {}; refreshing", ticker);
                continue;
            }
            if status == StatusCode::NOT_FOUND {
                warn!("No profile for {}; using an empty profile", ticker);
                return Ok(TickerProfile::default());
            }
            if !status.is_success() {
                return Err(DashboardError::ProviderError(format!(
                    "Profile request for {} failed: HTTP status {}",
                    ticker, status
                )));
            }

            let json: Value = response.json().await?;
            return parse_summary(&json);
        }

        Err(DashboardError::ProviderError(format!(
            "Profile request for {} was rejected after refreshing the crumb",
            ticker
        )))
    }
}

/// Parse a v8 chart response. "Not Found" and a result without
/// timestamps are empty series; rows with a null price are skipped.
pub fn parse_chart(json: &Value) -> Result<QuoteSeries> {
    let chart = json
        .get("chart")
        .ok_or_else(|| DashboardError::ProviderError("Chart response has no `chart` object".to_string()))?;

    if let Some(error) = chart.get("error").filter(|e| !e.is_null()) {
        if error.get("code").and_then(Value::as_str) == Some("Not Found") {
            return Ok(QuoteSeries::empty());
        }
        let description = error
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unknown chart error");
        return Err(DashboardError::ProviderError(description.to_string()));
    }

    let result = match chart.get("result").and_then(Value::as_array).and_then(|r| r.first()) {
        Some(result) => result,
        None => return Ok(QuoteSeries::empty()),
    };
    let timestamps = match result.get("timestamp").and_then(Value::as_array) {
        Some(ts) => ts,
        None => return Ok(QuoteSeries::empty()),
    };

    // dates are local to the exchange
    let offset = result["meta"]["gmtoffset"].as_i64().unwrap_or(0);
    let quote = &result["indicators"]["quote"][0];
    let adjclose = &result["indicators"]["adjclose"][0]["adjclose"];

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let (Some(ts), Some(open), Some(high), Some(low), Some(close)) = (
            ts.as_i64(),
            quote["open"][i].as_f64(),
            quote["high"][i].as_f64(),
            quote["low"][i].as_f64(),
            quote["close"][i].as_f64(),
        ) else {
            continue;
        };
        let Some(trading_day) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
            continue;
        };

        let volume = quote["volume"][i]
            .as_u64()
            .or_else(|| quote["volume"][i].as_f64().map(|v| v.max(0.0) as u64))
            .unwrap_or(0);

        bars.push(QuoteBar {
            trading_day,
            open,
            high,
            low,
            close,
            adj_close: adjclose[i].as_f64().unwrap_or(close),
            volume,
        });
    }

    Ok(QuoteSeries::from_bars(bars))
}

/// Parse a quoteSummary response into a profile by merging every module
/// into one flat field map.
pub fn parse_summary(json: &Value) -> Result<TickerProfile> {
    let summary = json.get("quoteSummary").ok_or_else(|| {
        DashboardError::ProviderError("Summary response has no `quoteSummary` object".to_string())
    })?;

    if let Some(error) = summary.get("error").filter(|e| !e.is_null()) {
        if error.get("code").and_then(Value::as_str) == Some("Not Found") {
            return Ok(TickerProfile::default());
        }
        let description = error
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unknown summary error");
        return Err(DashboardError::ProviderError(description.to_string()));
    }

    let modules = match summary["result"][0].as_object() {
        Some(modules) => modules,
        None => return Ok(TickerProfile::default()),
    };

    let mut fields = Map::new();
    for module in modules.values() {
        if let Some(module) = module.as_object() {
            for (key, value) in module {
                let value = unwrap_raw(value);
                if !value.is_null() {
                    fields.entry(key.clone()).or_insert(value);
                }
            }
        }
    }

    Ok(TickerProfile::from_fields(&fields))
}

// {"raw": 1.2, "fmt": "1.20"} -> 1.2, {} -> null
fn unwrap_raw(value: &Value) -> Value {
    match value {
        Value::Object(obj) if obj.contains_key("raw") => obj["raw"].clone(),
        Value::Object(obj) if obj.is_empty() => Value::Null,
        Value::Object(obj) => Value::Object(obj.iter().map(|(k, v)| (k.clone(), unwrap_raw(v))).collect()),
        Value::Array(items) => Value::Array(items.iter().map(unwrap_raw).collect()),
        other => other.clone(),
    }
}
