use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::geo::Address;

/// A profile value as the provider sent it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Officer {
    pub name: Option<String>,
    pub title: Option<String>,
}

impl Officer {
    /// Name and title, when both are present.
    pub fn entry(&self) -> Option<(&str, &str)> {
        match (&self.name, &self.title) {
            (Some(name), Some(title)) => Some((name.as_str(), title.as_str())),
            _ => None,
        }
    }
}

/// Company and market attributes for one ticker. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerProfile {
    pub short_name: Option<String>,
    pub long_business_summary: Option<String>,
    pub company_officers: Option<Vec<Officer>>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub address1: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,

    #[serde(rename = "52WeekChange")]
    pub fifty_two_week_change: Option<FieldValue>,
    pub average_volume: Option<FieldValue>,
    pub beta: Option<FieldValue>,
    pub current_price: Option<FieldValue>,
    pub day_high: Option<FieldValue>,
    pub day_low: Option<FieldValue>,
    pub dividend_rate: Option<FieldValue>,
    pub dividend_yield: Option<FieldValue>,
    pub enterprise_to_revenue: Option<FieldValue>,
    pub ex_dividend_date: Option<FieldValue>,
    pub market_cap: Option<FieldValue>,
    pub open: Option<FieldValue>,
    pub previous_close: Option<FieldValue>,
    pub return_on_equity: Option<FieldValue>,
}

impl TickerProfile {
    /// Build from a flat provider field map. Unknown keys are ignored and
    /// values of an unexpected shape count as absent.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            short_name: text(fields, "shortName"),
            long_business_summary: text(fields, "longBusinessSummary"),
            company_officers: officers(fields),
            website: text(fields, "website"),
            phone: text(fields, "phone"),
            address1: text(fields, "address1"),
            city: text(fields, "city"),
            zip: text(fields, "zip"),
            country: text(fields, "country"),
            currency: text(fields, "currency"),
            fifty_two_week_change: value(fields, "52WeekChange"),
            average_volume: value(fields, "averageVolume"),
            beta: value(fields, "beta"),
            current_price: value(fields, "currentPrice"),
            day_high: value(fields, "dayHigh"),
            day_low: value(fields, "dayLow"),
            dividend_rate: value(fields, "dividendRate"),
            dividend_yield: value(fields, "dividendYield"),
            enterprise_to_revenue: value(fields, "enterpriseToRevenue"),
            ex_dividend_date: value(fields, "exDividendDate"),
            market_cap: value(fields, "marketCap"),
            open: value(fields, "open"),
            previous_close: value(fields, "previousClose"),
            return_on_equity: value(fields, "returnOnEquity"),
        }
    }

    /// Convenience for a JSON object; anything else is an empty profile.
    pub fn from_json(json: &Value) -> Self {
        json.as_object().map(Self::from_fields).unwrap_or_default()
    }

    /// Address for geocoding, or the names of the missing components.
    pub fn address(&self) -> std::result::Result<Address, Vec<&'static str>> {
        let mut missing = Vec::new();
        if self.address1.is_none() {
            missing.push("address1");
        }
        if self.city.is_none() {
            missing.push("city");
        }
        if self.country.is_none() {
            missing.push("country");
        }

        match (&self.address1, &self.city, &self.country) {
            (Some(line), Some(city), Some(country)) => Ok(Address {
                line: line.clone(),
                zip: self.zip.clone(),
                city: city.clone(),
                country: country.clone(),
            }),
            _ => Err(missing),
        }
    }
}

fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value(fields: &Map<String, Value>, key: &str) -> Option<FieldValue> {
    match fields.get(key)? {
        Value::Number(n) => n.as_f64().map(FieldValue::Number),
        Value::String(s) if !s.is_empty() => Some(FieldValue::Text(s.clone())),
        _ => None,
    }
}

fn officers(fields: &Map<String, Value>) -> Option<Vec<Officer>> {
    let list = fields.get("companyOfficers")?.as_array()?;
    Some(
        list.iter()
            .map(|entry| match entry.as_object() {
                Some(obj) => Officer {
                    name: text(obj, "name"),
                    title: text(obj, "title"),
                },
                None => Officer {
                    name: None,
                    title: None,
                },
            })
            .collect(),
    )
}
