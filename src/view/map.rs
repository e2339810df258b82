use serde::Serialize;

use crate::models::geo::GeoPoint;
use crate::models::profile::TickerProfile;
use crate::models::query::Query;
use crate::view::{Fragment, LocationLookup};

pub const LOCATION_UNAVAILABLE: &str = "Location unavailable";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapPanel {
    /// Map centered on the headquarters with a single marker
    Located {
        center: GeoPoint,
        zoom: u8,
        tooltip: String,
        popup_title: String,
        popup_address: String,
    },
    Unavailable { reason: String },
}

pub fn build_map(query: &Query, profile: &TickerProfile, location: &LocationLookup, zoom: u8) -> Fragment<MapPanel> {
    let unavailable = |detail: String| {
        Fragment::Ready(MapPanel::Unavailable {
            reason: format!("{}: {}", LOCATION_UNAVAILABLE, detail),
        })
    };

    match location {
        LocationLookup::Resolved(center) => {
            let address = match profile.address() {
                Ok(address) => address,
                // located without an address means the snapshot is inconsistent
                Err(missing) => return unavailable(format!("missing {}", missing.join(", "))),
            };
            let name = profile.short_name.clone().unwrap_or_else(|| query.ticker.clone());
            Fragment::Ready(MapPanel::Located {
                center: *center,
                zoom,
                tooltip: name.clone(),
                popup_title: name,
                popup_address: address.display(),
            })
        }
        LocationLookup::NoMatch => unavailable("the address could not be found".to_string()),
        LocationLookup::IncompleteAddress(missing) => unavailable(format!("missing {}", missing.join(", "))),
        LocationLookup::Failed(message) => Fragment::Failed {
            message: format!("Geocoding failed: {}", message),
        },
    }
}
