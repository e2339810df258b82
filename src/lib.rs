pub mod config;
pub mod errors;
pub mod models;
pub mod providers;
pub mod render;
pub mod server;
pub mod services;
pub mod util;
pub mod view;

pub use config::Config;
pub use errors::{DashboardError, Result};
pub use models::query::Query;
pub use services::controller::{CycleOutcome, PublishedView, ViewController};
pub use view::{build_view, Fragment, Snapshot, View};
