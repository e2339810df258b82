use serde::Serialize;
use std::fmt;

use crate::models::profile::{FieldValue, TickerProfile};
use crate::util::{currency_symbol, format_decimal, timestamp_to_date, NOT_AVAILABLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Number(usize),
    /// Number followed by the currency symbol
    Money(usize),
    Text,
    /// Unix seconds shown as a date
    Date,
}

/// The statistics shown under the chart, in display order.
///
/// Only quoted amounts (prices and market cap) carry the currency symbol.
/// Enterprise to Revenue and Return on equity are ratios and are shown
/// without one, even though they are often suffixed like prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    FiftyTwoWeekChange,
    AverageVolume,
    Beta,
    Currency,
    CurrentPrice,
    DayHigh,
    DayLow,
    DividendRate,
    DividendYield,
    EnterpriseToRevenue,
    ExDividendDate,
    MarketCap,
    Open,
    PreviousClose,
    ReturnOnEquity,
}

impl Stat {
    pub const ALL: [Stat; 15] = [
        Stat::FiftyTwoWeekChange,
        Stat::AverageVolume,
        Stat::Beta,
        Stat::Currency,
        Stat::CurrentPrice,
        Stat::DayHigh,
        Stat::DayLow,
        Stat::DividendRate,
        Stat::DividendYield,
        Stat::EnterpriseToRevenue,
        Stat::ExDividendDate,
        Stat::MarketCap,
        Stat::Open,
        Stat::PreviousClose,
        Stat::ReturnOnEquity,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stat::FiftyTwoWeekChange => "52 Week Change",
            Stat::AverageVolume => "Average Volume",
            Stat::Beta => "Beta",
            Stat::Currency => "Currency",
            Stat::CurrentPrice => "Current Price",
            Stat::DayHigh => "Day High",
            Stat::DayLow => "Day Low",
            Stat::DividendRate => "Dividend Rate",
            Stat::DividendYield => "Dividend Yield",
            Stat::EnterpriseToRevenue => "Enterprise to Revenue",
            Stat::ExDividendDate => "Ex-Dividend date",
            Stat::MarketCap => "Market cap",
            Stat::Open => "Open",
            Stat::PreviousClose => "Previous close",
            Stat::ReturnOnEquity => "Return on equity",
        }
    }

    fn format(self) -> Format {
        match self {
            Stat::FiftyTwoWeekChange | Stat::ReturnOnEquity => Format::Number(7),
            Stat::AverageVolume => Format::Number(0),
            Stat::Beta => Format::Number(6),
            Stat::Currency => Format::Text,
            Stat::CurrentPrice | Stat::DayHigh | Stat::DayLow | Stat::Open | Stat::PreviousClose => Format::Money(2),
            Stat::DividendRate => Format::Number(2),
            Stat::DividendYield => Format::Number(4),
            Stat::EnterpriseToRevenue => Format::Number(3),
            Stat::ExDividendDate => Format::Date,
            Stat::MarketCap => Format::Money(0),
        }
    }

    fn value(self, profile: &TickerProfile) -> Option<FieldValue> {
        let field = match self {
            Stat::FiftyTwoWeekChange => &profile.fifty_two_week_change,
            Stat::AverageVolume => &profile.average_volume,
            Stat::Beta => &profile.beta,
            Stat::Currency => return profile.currency.clone().map(FieldValue::Text),
            Stat::CurrentPrice => &profile.current_price,
            Stat::DayHigh => &profile.day_high,
            Stat::DayLow => &profile.day_low,
            Stat::DividendRate => &profile.dividend_rate,
            Stat::DividendYield => &profile.dividend_yield,
            Stat::EnterpriseToRevenue => &profile.enterprise_to_revenue,
            Stat::ExDividendDate => &profile.ex_dividend_date,
            Stat::MarketCap => &profile.market_cap,
            Stat::Open => &profile.open,
            Stat::PreviousClose => &profile.previous_close,
            Stat::ReturnOnEquity => &profile.return_on_equity,
        };
        field.clone()
    }
}

/// `"{label} : {value}{suffix}"`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatLine {
    pub label: &'static str,
    pub value: String,
    pub suffix: Option<&'static str>,
}

impl fmt::Display for StatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}{}", self.label, self.value, self.suffix.unwrap_or(""))
    }
}

/// Three columns of five lines each
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsPanel {
    pub columns: Vec<Vec<StatLine>>,
}

impl StatsPanel {
    pub fn lines(&self) -> impl Iterator<Item = &StatLine> {
        self.columns.iter().flatten()
    }

    pub fn line(&self, stat: Stat) -> Option<&StatLine> {
        self.lines().find(|line| line.label == stat.label())
    }
}

pub fn build_stats(profile: &TickerProfile) -> StatsPanel {
    let symbol = currency_symbol(profile.currency.as_deref());
    let lines: Vec<StatLine> = Stat::ALL
        .iter()
        .map(|&stat| stat_line(stat, stat.value(profile), symbol))
        .collect();

    StatsPanel {
        columns: lines.chunks(5).map(|chunk| chunk.to_vec()).collect(),
    }
}

fn stat_line(stat: Stat, value: Option<FieldValue>, symbol: &'static str) -> StatLine {
    let missing = StatLine {
        label: stat.label(),
        value: NOT_AVAILABLE.to_string(),
        suffix: None,
    };
    let Some(value) = value else {
        return missing;
    };

    let (value, suffix) = match (stat.format(), value) {
        // text values pass through unformatted
        (Format::Money(_), FieldValue::Text(text)) => (text, Some(symbol)),
        (_, FieldValue::Text(text)) => (text, None),
        (Format::Number(precision), FieldValue::Number(n)) => (format_decimal(n, precision), None),
        (Format::Money(precision), FieldValue::Number(n)) => (format_decimal(n, precision), Some(symbol)),
        (Format::Text, FieldValue::Number(n)) => (n.to_string(), None),
        (Format::Date, FieldValue::Number(n)) => match timestamp_to_date(n as i64) {
            Some(date) => (date, None),
            None => return missing,
        },
    };

    StatLine {
        label: stat.label(),
        value,
        suffix,
    }
}
