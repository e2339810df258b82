use chrono::NaiveDate;
use serde::Serialize;

use crate::models::profile::TickerProfile;
use crate::models::query::Query;
use crate::models::quote::QuoteSeries;
use crate::view::stats::StatsPanel;

/// Chart and statistics region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPanel {
    pub figure: ChartFigure,
    pub stats: StatsPanel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    pub kind: TraceKind,
    /// 1 for price, 2 for volume
    pub row: u8,
    pub color: &'static str,
    pub dashed: bool,
    pub x: Vec<NaiveDate>,
    pub y: Vec<f64>,
}

/// Two stacked rows sharing the x axis: price lines over volume bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFigure {
    pub title: String,
    pub row_titles: [&'static str; 2],
    pub traces: Vec<Trace>,
    /// Set when there is nothing to plot
    pub message: Option<String>,
}

pub fn build_figure(query: &Query, series: &QuoteSeries, profile: &TickerProfile) -> ChartFigure {
    let days = series.trading_days();
    let display_name = profile.short_name.as_deref().unwrap_or(&query.ticker);

    let line = |name: &str, color: &'static str, dashed: bool, y: Vec<f64>| Trace {
        name: name.to_string(),
        kind: TraceKind::Line,
        row: 1,
        color,
        dashed,
        x: days.clone(),
        y,
    };

    let traces = vec![
        line(&query.ticker, "blue", false, series.adj_closes()),
        line("High", "green", true, series.highs()),
        line("Low", "red", true, series.lows()),
        Trace {
            name: "Volume".to_string(),
            kind: TraceKind::Bar,
            row: 2,
            color: "skyblue",
            dashed: false,
            x: days.clone(),
            y: series.volumes(),
        },
    ];

    let message = series.is_empty().then(|| {
        format!(
            "No price data for {} between {} and {}",
            query.ticker, query.start_date, query.end_date
        )
    });

    ChartFigure {
        title: format!("Price chart of {}", display_name),
        row_titles: ["Price", "Volume"],
        traces,
        message,
    }
}
