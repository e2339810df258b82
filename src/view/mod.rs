//! Pure construction of the three dashboard fragments from one data snapshot.
//!
//! Nothing here performs I/O: [`build_view`] maps a [`Query`] and the
//! [`Snapshot`] fetched for it to a [`View`]. The same inputs always give the
//! same view.

pub mod chart;
pub mod info;
pub mod map;
pub mod stats;

use serde::Serialize;

use crate::models::geo::GeoPoint;
use crate::models::profile::TickerProfile;
use crate::models::query::Query;
use crate::models::quote::QuoteSeries;

pub use chart::{ChartFigure, ChartPanel};
pub use info::{AboutPanel, ContactPanel, InfoPanel, OfficerPanel};
pub use map::MapPanel;
pub use stats::{StatLine, StatsPanel};

/// Outcome of resolving the profile address.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationLookup {
    Resolved(GeoPoint),
    NoMatch,
    IncompleteAddress(Vec<&'static str>),
    Failed(String),
}

/// Everything one cycle fetched.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Fetched {
        series: QuoteSeries,
        profile: TickerProfile,
        location: LocationLookup,
    },
    /// The bundled market-data call failed; nothing can be built.
    MarketDataFailed(String),
}

/// One rendered region. A failed fragment carries the message to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Fragment<T> {
    Ready(T),
    Failed { message: String },
}

impl<T> Fragment<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Fragment::Ready(value) => Some(value),
            Fragment::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Fragment::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub query: Query,
    pub chart: Fragment<ChartPanel>,
    pub info: Fragment<InfoPanel>,
    pub map: Fragment<MapPanel>,
}

pub fn build_view(query: &Query, snapshot: &Snapshot, map_zoom: u8) -> View {
    match snapshot {
        Snapshot::Fetched {
            series,
            profile,
            location,
        } => View {
            query: query.clone(),
            chart: Fragment::Ready(ChartPanel {
                figure: chart::build_figure(query, series, profile),
                stats: stats::build_stats(profile),
            }),
            info: Fragment::Ready(info::build_info(profile)),
            map: map::build_map(query, profile, location, map_zoom),
        },
        Snapshot::MarketDataFailed(message) => {
            let message = format!("Could not load data for {}: {}", query.ticker, message);
            View {
                query: query.clone(),
                chart: Fragment::Failed {
                    message: message.clone(),
                },
                info: Fragment::Failed {
                    message: message.clone(),
                },
                map: Fragment::Failed { message },
            }
        }
    }
}
