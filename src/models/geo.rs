use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Address components handed to the geocoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub line: String,
    pub zip: Option<String>,
    pub city: String,
    pub country: String,
}

impl Address {
    /// Free-form lookup string, `line, city, country`.
    pub fn lookup_text(&self) -> String {
        format!("{}, {}, {}", self.line, self.city, self.country)
    }

    /// Postal form shown in the map popup.
    pub fn display(&self) -> String {
        match &self.zip {
            Some(zip) => format!("{}, {} {}, {}", self.line, zip, self.city, self.country),
            None => format!("{}, {}, {}", self.line, self.city, self.country),
        }
    }
}
