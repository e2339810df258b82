use chrono::NaiveDate;
use serde::Serialize;

/// One trading day of quote history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteBar {
    pub trading_day: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// Quote history for one query, ascending by trading day
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuoteSeries {
    bars: Vec<QuoteBar>,
}

impl QuoteSeries {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sorts by trading day and keeps the first bar of any duplicated day.
    pub fn from_bars(mut bars: Vec<QuoteBar>) -> Self {
        bars.sort_by_key(|b| b.trading_day);
        bars.dedup_by_key(|b| b.trading_day);
        Self { bars }
    }

    /// Bars whose trading day falls inside `[start, end]`.
    pub fn within(self, start: NaiveDate, end: NaiveDate) -> Self {
        let bars = self
            .bars
            .into_iter()
            .filter(|b| b.trading_day >= start && b.trading_day <= end)
            .collect();
        Self { bars }
    }

    pub fn bars(&self) -> &[QuoteBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn trading_days(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.trading_day).collect()
    }

    pub fn adj_closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.adj_close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }
}
