use std::time::Duration;

pub struct Config {
    pub bind_addr: String,
    pub default_ticker: String,
    pub lookback_years: u32,
    pub request_timeout: Duration,
    pub yahoo_chart_url: String,
    pub yahoo_summary_url: String,
    pub yahoo_cookie_url: String,
    pub yahoo_crumb_url: String,
    pub opencage_url: String,
    pub opencage_api_key: Option<String>,
    pub map_zoom: u8,
    pub max_sessions: usize,
}

impl Config {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8888".to_string(),
            default_ticker: "AAPL".to_string(),
            lookback_years: 1,
            request_timeout: Duration::from_secs(10),
            yahoo_chart_url: "https://query2.finance.yahoo.com/v8/finance/chart".to_string(),
            yahoo_summary_url: "https://query2.finance.yahoo.com/v10/finance/quoteSummary".to_string(),
            yahoo_cookie_url: "https://fc.yahoo.com".to_string(),
            yahoo_crumb_url: "https://query1.finance.yahoo.com/v1/test/getcrumb".to_string(),
            opencage_url: "https://api.opencagedata.com/geocode/v1/json".to_string(),
            opencage_api_key: None,
            map_zoom: 12,
            max_sessions: 256,
        }
    }

    pub fn with_bind_addr(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn with_default_ticker(mut self, ticker: &str) -> Self {
        self.default_ticker = ticker.trim().to_uppercase();
        self
    }

    pub fn with_lookback_years(mut self, years: u32) -> Self {
        self.lookback_years = years;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_yahoo_chart_url(mut self, url: &str) -> Self {
        self.yahoo_chart_url = url.to_string();
        self
    }

    pub fn with_yahoo_summary_url(mut self, url: &str) -> Self {
        self.yahoo_summary_url = url.to_string();
        self
    }

    /// Cookie and crumb endpoints used to authorize quoteSummary requests
    pub fn with_yahoo_auth_urls(mut self, cookie_url: &str, crumb_url: &str) -> Self {
        self.yahoo_cookie_url = cookie_url.to_string();
        self.yahoo_crumb_url = crumb_url.to_string();
        self
    }

    pub fn with_opencage_url(mut self, url: &str) -> Self {
        self.opencage_url = url.to_string();
        self
    }

    pub fn with_opencage_api_key(mut self, key: Option<String>) -> Self {
        // an empty key is the same as no key
        self.opencage_api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max.max(1);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
