use chrono::{Duration, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::{DashboardError, Result};

/// One user request: a ticker and an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Query {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Raw form input, validated into a [`Query`].
#[derive(Debug, Clone, Deserialize)]
pub struct QueryInput {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Query {
    /// Validate against the local calendar date.
    pub fn new(ticker: &str, start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        Self::validate_at(ticker, start_date, end_date, Local::now().date_naive())
    }

    pub fn validate_at(
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Self> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(DashboardError::InvalidQuery("ticker must not be empty".to_string()));
        }
        if start_date > end_date {
            return Err(DashboardError::InvalidQuery(format!(
                "start date {} is after end date {}",
                start_date, end_date
            )));
        }
        if end_date > today {
            return Err(DashboardError::InvalidQuery(format!(
                "end date {} is in the future",
                end_date
            )));
        }
        if start_date < earliest_date() {
            return Err(DashboardError::InvalidQuery(format!(
                "start date {} is before {}",
                start_date,
                earliest_date()
            )));
        }

        Ok(Self {
            ticker,
            start_date,
            end_date,
        })
    }

    /// Default ticker over the configured lookback, ending yesterday.
    pub fn default_at(config: &Config, today: NaiveDate) -> Self {
        let end_date = today - Duration::days(1);
        let start_date = today
            .checked_sub_months(Months::new(12 * config.lookback_years))
            .unwrap_or_else(earliest_date)
            .min(end_date);

        Self {
            ticker: config.default_ticker.clone(),
            start_date,
            end_date,
        }
    }
}

impl TryFrom<QueryInput> for Query {
    type Error = DashboardError;

    fn try_from(input: QueryInput) -> Result<Self> {
        Query::new(&input.ticker, input.start_date, input.end_date)
    }
}

/// Lower bound of the date pickers.
pub fn earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}
