//! HTML for the dashboard page and its three regions.
//!
//! Markup lives in the tera templates under `templates/`, compiled into the
//! binary and parsed once per [`Renderer`]. Charts and maps are drawn
//! client-side: the chart region carries a Plotly figure and the map region a
//! Leaflet description, both as JSON in `data-` attributes that the page
//! script picks up after every update.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use tera::{Context, Tera};

use crate::config::Config;
use crate::errors::Result;
use crate::models::query::{earliest_date, Query};
use crate::view::chart::{ChartFigure, TraceKind};
use crate::view::{ChartPanel, ContactPanel, Fragment, InfoPanel, MapPanel, View};

const TEMPLATES: [(&str, &str); 4] = [
    ("page.html", include_str!("../templates/page.html.tera")),
    ("chart.html", include_str!("../templates/chart.html.tera")),
    ("info.html", include_str!("../templates/info.html.tera")),
    ("map.html", include_str!("../templates/map.html.tera")),
];

/// The three regions of one view as HTML
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFragments {
    pub chart: String,
    pub info: String,
    pub map: String,
}

/// Parsed page templates. Text is HTML-escaped by tera.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self { tera })
    }

    pub fn fragments(&self, view: &View) -> Result<RenderedFragments> {
        Ok(RenderedFragments {
            chart: self.chart(&view.chart)?,
            info: self.info(&view.info)?,
            map: self.map(&view.map)?,
        })
    }

    pub fn chart(&self, fragment: &Fragment<ChartPanel>) -> Result<String> {
        let mut context = Context::new();
        context.insert("fragment", fragment);
        let figure = fragment
            .ready()
            .map(|panel| plotly_figure(&panel.figure).to_string())
            .unwrap_or_default();
        context.insert("figure", &figure);
        Ok(self.tera.render("chart.html", &context)?)
    }

    pub fn info(&self, fragment: &Fragment<InfoPanel>) -> Result<String> {
        let mut context = Context::new();
        context.insert("fragment", fragment);
        let website_link = match fragment.ready().map(|panel| &panel.contact) {
            Some(ContactPanel::Available { website, .. }) => is_web_link(website),
            _ => false,
        };
        context.insert("website_link", &website_link);
        Ok(self.tera.render("info.html", &context)?)
    }

    pub fn map(&self, fragment: &Fragment<MapPanel>) -> Result<String> {
        let mut context = Context::new();
        context.insert("fragment", fragment);
        let map = match fragment.ready() {
            Some(MapPanel::Located {
                center,
                zoom,
                tooltip,
                popup_title,
                popup_address,
            }) => json!({
                "lat": center.latitude,
                "lng": center.longitude,
                "zoom": zoom,
                "tooltip": tooltip,
                "popup_title": popup_title,
                "popup_address": popup_address,
            })
            .to_string(),
            _ => String::new(),
        };
        context.insert("map", &map);
        Ok(self.tera.render("map.html", &context)?)
    }

    /// Full dashboard page. `interactive` adds the input controls and the
    /// script that drives `/api/session/{id}/query`; without it the page is a
    /// static snapshot of `view`.
    pub fn page(&self, query: &Query, today: NaiveDate, view: Option<&View>, interactive: bool) -> Result<String> {
        let fragments = match view {
            Some(view) => self.fragments(view)?,
            None => RenderedFragments {
                chart: String::new(),
                info: String::new(),
                map: String::new(),
            },
        };

        let mut context = Context::new();
        context.insert("ticker", &query.ticker);
        context.insert("start_date", &query.start_date);
        context.insert("end_date", &query.end_date);
        context.insert("earliest", &earliest_date());
        context.insert("today", &today);
        context.insert("interactive", &interactive);
        context.insert("chart", &fragments.chart);
        context.insert("info", &fragments.info);
        context.insert("map", &fragments.map);
        Ok(self.tera.render("page.html", &context)?)
    }

    /// Page with the configured defaults and no data yet.
    pub fn index(&self, config: &Config, today: NaiveDate) -> Result<String> {
        self.page(&Query::default_at(config, today), today, None, true)
    }
}

// only web links become anchors; phone numbers always get a tel: link
fn is_web_link(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Plotly `{data, layout}` for the two-row figure. Row 2 matches row 1's x axis.
pub fn plotly_figure(figure: &ChartFigure) -> Value {
    let data: Vec<Value> = figure
        .traces
        .iter()
        .map(|trace| {
            let (xaxis, yaxis) = if trace.row == 1 { ("x", "y") } else { ("x2", "y2") };
            let x: Vec<String> = trace.x.iter().map(|d| d.to_string()).collect();
            match trace.kind {
                TraceKind::Line => {
                    let mut line = json!({"color": trace.color});
                    if trace.dashed {
                        line["dash"] = json!("dot");
                    }
                    json!({
                        "type": "scatter",
                        "mode": "lines",
                        "name": trace.name,
                        "x": x,
                        "y": trace.y,
                        "line": line,
                        "xaxis": xaxis,
                        "yaxis": yaxis,
                    })
                }
                TraceKind::Bar => json!({
                    "type": "bar",
                    "name": trace.name,
                    "x": x,
                    "y": trace.y,
                    "marker": {"color": trace.color},
                    "xaxis": xaxis,
                    "yaxis": yaxis,
                }),
            }
        })
        .collect();

    let grid = json!({"showgrid": true, "gridwidth": 1, "gridcolor": "gray"});
    let mut layout = json!({
        "title": {"text": figure.title, "x": 0.5, "xanchor": "center"},
        "grid": {"rows": 2, "columns": 1, "pattern": "independent", "ygap": 0.08},
        "xaxis": merge(&grid, json!({"matches": "x2", "showticklabels": false})),
        "xaxis2": grid.clone(),
        "yaxis": merge(&grid, json!({"title": {"text": figure.row_titles[0]}})),
        "yaxis2": merge(&grid, json!({"title": {"text": figure.row_titles[1]}})),
        "plot_bgcolor": "white",
        "autosize": true,
    });
    if let Some(message) = &figure.message {
        layout["annotations"] = json!([{
            "text": message,
            "xref": "paper",
            "yref": "paper",
            "x": 0.5,
            "y": 0.5,
            "showarrow": false,
        }]);
    }

    json!({"data": data, "layout": layout})
}

fn merge(base: &Value, extra: Value) -> Value {
    let mut merged = base.clone();
    if let (Some(target), Value::Object(extra)) = (merged.as_object_mut(), extra) {
        target.extend(extra);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geo::GeoPoint;
    use crate::models::profile::TickerProfile;
    use crate::models::quote::{QuoteBar, QuoteSeries};
    use crate::view::{build_view, LocationLookup, Snapshot};
    use chrono::NaiveDate;

    fn query() -> Query {
        Query {
            ticker: "AAPL".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
        }
    }

    fn view(profile: serde_json::Value, location: LocationLookup) -> View {
        let bar = QuoteBar {
            trading_day: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            open: 176.1,
            high: 176.9,
            low: 173.8,
            close: 175.1,
            adj_close: 174.3,
            volume: 81510100,
        };
        let snapshot = Snapshot::Fetched {
            series: QuoteSeries::from_bars(vec![bar]),
            profile: TickerProfile::from_json(&profile),
            location,
        };
        build_view(&query(), &snapshot, 12)
    }

    #[test]
    fn figure_shares_the_x_axis() {
        let v = view(json!({"shortName": "Apple Inc."}), LocationLookup::NoMatch);
        let figure = plotly_figure(&v.chart.ready().unwrap().figure);
        assert_eq!(figure["layout"]["title"]["text"], "Price chart of Apple Inc.");
        assert_eq!(figure["layout"]["xaxis"]["matches"], "x2");
        assert_eq!(figure["data"][0]["name"], "AAPL");
        assert_eq!(figure["data"][1]["line"]["dash"], "dot");
        assert!(figure["data"][0]["line"].get("dash").is_none());
        assert_eq!(figure["data"][3]["type"], "bar");
        assert_eq!(figure["data"][3]["yaxis"], "y2");
        assert_eq!(figure["data"][0]["x"][0], "2024-03-04");
    }

    #[test]
    fn info_escapes_and_guards_links() {
        let v = view(
            json!({
                "shortName": "A&B <Corp>",
                "longBusinessSummary": "Makes things.",
                "website": "javascript:alert(1)",
                "phone": "555 0100",
                "companyOfficers": [{"name": "Jane Doe", "title": "CEO"}]
            }),
            LocationLookup::NoMatch,
        );
        let html = Renderer::new().unwrap().info(&v.info).unwrap();
        assert!(html.contains("About A&amp;B &lt;Corp&gt;:"));
        assert!(html.contains("<li>Jane Doe,CEO</li>"));
        assert!(html.contains("<span>javascript:alert(1)</span>"));
        assert!(!html.contains("href=\"javascript"));
        assert!(html.contains("href=\"tel:555 0100\""));
    }

    #[test]
    fn web_sites_become_links() {
        let v = view(
            json!({"website": "https://www.apple.com", "phone": "408 996 1010"}),
            LocationLookup::NoMatch,
        );
        let html = Renderer::new().unwrap().info(&v.info).unwrap();
        assert!(html.contains("<a href=\"https:&#x2F;&#x2F;www.apple.com\" target=\"_blank\""));
        assert!(html.contains("<h1>No officers</h1>"));
        assert!(html.contains("No information about the enterprise"));
    }

    #[test]
    fn missing_contact_fields_are_named() {
        let v = view(json!({"phone": "555 0100"}), LocationLookup::NoMatch);
        let html = Renderer::new().unwrap().info(&v.info).unwrap();
        assert!(html.contains("Contact details unavailable: missing website"));
    }

    #[test]
    fn unavailable_map_has_no_leaflet_block() {
        let renderer = Renderer::new().unwrap();
        let v = view(json!({}), LocationLookup::IncompleteAddress(vec!["address1"]));
        let html = renderer.map(&v.map).unwrap();
        assert!(html.contains("Location unavailable"));
        assert!(!html.contains("leaflet-map"));

        let located = view(
            json!({"shortName": "Apple Inc.", "address1": "One Apple Park Way", "city": "Cupertino", "country": "United States"}),
            LocationLookup::Resolved(GeoPoint { latitude: 37.33, longitude: -122.01 }),
        );
        let html = renderer.map(&located.map).unwrap();
        assert!(html.contains("class=\"leaflet-map\""));
        assert!(html.contains("&quot;lat&quot;:37.33"));
    }

    #[test]
    fn failed_fragments_show_their_message() {
        let failed: Fragment<ChartPanel> = Fragment::Failed {
            message: "Could not load data for AAPL: timed out".to_string(),
        };
        let html = Renderer::new().unwrap().chart(&failed).unwrap();
        assert_eq!(
            html.trim(),
            "<div class=\"fragment chart error\"><p>Could not load data for AAPL: timed out</p></div>"
        );
    }

    #[test]
    fn chart_lists_the_statistics() {
        let v = view(json!({"currency": "USD", "currentPrice": 174.3}), LocationLookup::NoMatch);
        let html = Renderer::new().unwrap().chart(&v.chart).unwrap();
        assert!(html.contains("class=\"plotly-figure\" data-figure=\"{&quot;data&quot;"));
        assert!(html.contains("<p>Current Price : 174.30$</p>"));
        assert_eq!(html.matches("class=\"stats-column\"").count(), 3);
    }

    #[test]
    fn static_page_has_no_controls() {
        let renderer = Renderer::new().unwrap();
        let v = view(json!({}), LocationLookup::NoMatch);
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let page = renderer.page(&query(), today, Some(&v), false).unwrap();
        // tera escapes the slash
        assert!(page.contains("<p>Beta : N&#x2F;A</p>"));
        assert!(page.contains("2024-03-01 to 2024-03-08"));
        assert!(!page.contains("id=\"input\""));

        let index = renderer.index(&Config::new(), today).unwrap();
        assert!(index.contains("id=\"input\" type=\"search\" value=\"AAPL\""));
        assert!(index.contains("max=\"2024-06-01\""));
        assert!(index.contains("value=\"2023-06-01\""));
        assert!(index.contains("min=\"1900-01-01\""));
    }
}
