use crate::config::Config;
use crate::errors::DashboardError;
use crate::models::query::Query;
use crate::providers::{Geocoder, MarketData};
use crate::view::{build_view, LocationLookup, Snapshot, View};
use log::{debug, info, warn};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;

/// A view together with the number of the cycle that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedView {
    pub cycle: u64,
    pub view: View,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Published(Arc<PublishedView>),
    /// A newer cycle started before this one finished; its result was dropped.
    Superseded { cycle: u64 },
}

/// Runs one fetch-and-build cycle per query and publishes only the newest
/// cycle's view.
pub struct ViewController {
    market: Arc<dyn MarketData + Send + Sync>,
    geocoder: Arc<dyn Geocoder + Send + Sync>,
    timeout: Duration,
    map_zoom: u8,
    started: AtomicU64,
    visible: watch::Sender<Option<Arc<PublishedView>>>,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl ViewController {
    pub fn new(
        config: &Config,
        market: Arc<dyn MarketData + Send + Sync>,
        geocoder: Arc<dyn Geocoder + Send + Sync>,
    ) -> Self {
        let (visible, _) = watch::channel(None);
        Self {
            market,
            geocoder,
            timeout: config.request_timeout,
            map_zoom: config.map_zoom,
            started: AtomicU64::new(0),
            visible,
            in_flight: Mutex::new(None),
        }
    }

    /// The view currently on screen, if any cycle has been published.
    pub fn visible(&self) -> Option<Arc<PublishedView>> {
        self.visible.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<PublishedView>>> {
        self.visible.subscribe()
    }

    /// Number of the most recently started cycle.
    pub fn latest_cycle(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    /// Whether a cycle started by `submit` is still running.
    pub fn is_running(&self) -> bool {
        let in_flight = match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        in_flight.as_ref().map_or(false, |handle| !handle.is_finished())
    }

    /// Run one cycle on the current task.
    pub async fn run_cycle(&self, query: Query) -> CycleOutcome {
        let cycle = self.begin_cycle();
        self.execute(cycle, query).await
    }

    /// Run one cycle on a spawned task, aborting the previous in-flight one.
    pub async fn submit(self: &Arc<Self>, query: Query) -> CycleOutcome {
        // numbering and replacing the in-flight task happen under one lock so
        // a later cycle is never aborted by an earlier one
        let (cycle, handle) = {
            let mut in_flight = match self.in_flight.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let cycle = self.begin_cycle();
            let controller = Arc::clone(self);
            let handle = tokio::spawn(async move { controller.execute(cycle, query).await });
            if let Some(previous) = in_flight.replace(handle.abort_handle()) {
                previous.abort();
            }
            (cycle, handle)
        };

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => {
                debug!("Cycle {} aborted by a newer query", cycle);
                CycleOutcome::Superseded { cycle }
            }
            Err(e) => {
                warn!("Cycle {} panicked: {}", cycle, e);
                CycleOutcome::Superseded { cycle }
            }
        }
    }

    /// Fetch everything one cycle needs: quotes and profile as one unit,
    /// then the headquarters location.
    pub async fn fetch_snapshot(&self, query: &Query) -> Snapshot {
        let market = async {
            tokio::try_join!(
                self.market.quote_series(&query.ticker, query.start_date, query.end_date),
                self.market.profile(&query.ticker),
            )
        };

        let (series, profile) = match self.bounded("market data", market).await {
            Ok(data) => data,
            Err(e) => {
                warn!("{} market data for {} failed: {}", self.market.name(), query.ticker, e);
                return Snapshot::MarketDataFailed(e.to_string());
            }
        };

        let location = match profile.address() {
            Err(missing) => {
                debug!("{} has no usable address (missing {:?})", query.ticker, missing);
                LocationLookup::IncompleteAddress(missing)
            }
            Ok(address) => match self.bounded("geocoding", self.geocoder.locate(&address)).await {
                Ok(Some(point)) => LocationLookup::Resolved(point),
                Ok(None) => {
                    info!("{} found no match for {}", self.geocoder.name(), address.lookup_text());
                    LocationLookup::NoMatch
                }
                Err(e) => {
                    warn!("{} geocoding for {} failed: {}", self.geocoder.name(), query.ticker, e);
                    LocationLookup::Failed(e.to_string())
                }
            },
        };

        Snapshot::Fetched {
            series,
            profile,
            location,
        }
    }

    fn begin_cycle(&self) -> u64 {
        self.started.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn execute(&self, cycle: u64, query: Query) -> CycleOutcome {
        info!(
            "Cycle {} started for {} ({} to {})",
            cycle, query.ticker, query.start_date, query.end_date
        );

        let snapshot = self.fetch_snapshot(&query).await;
        let view = build_view(&query, &snapshot, self.map_zoom);
        self.publish(cycle, view)
    }

    fn publish(&self, cycle: u64, view: View) -> CycleOutcome {
        let published = Arc::new(PublishedView { cycle, view });

        let accepted = self.visible.send_if_modified(|current| {
            let newest_started = self.started.load(Ordering::SeqCst) == cycle;
            let newer_than_visible = current.as_ref().map_or(true, |shown| shown.cycle < cycle);
            if newest_started && newer_than_visible {
                *current = Some(Arc::clone(&published));
                true
            } else {
                false
            }
        });

        if accepted {
            info!("Cycle {} published", cycle);
            CycleOutcome::Published(published)
        } else {
            info!("Cycle {} superseded by cycle {}; result discarded", cycle, self.latest_cycle());
            CycleOutcome::Superseded { cycle }
        }
    }

    async fn bounded<T, F>(&self, what: &'static str, call: F) -> crate::errors::Result<T>
    where
        F: Future<Output = crate::errors::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DashboardError::Timeout(what, self.timeout)),
        }
    }
}
