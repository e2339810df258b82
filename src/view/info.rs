use serde::Serialize;

use crate::models::profile::TickerProfile;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AboutPanel {
    Description { name: String, summary: String },
    NoInformation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfficerLine {
    pub name: String,
    pub title: String,
}

impl OfficerLine {
    /// `name,title`
    pub fn text(&self) -> String {
        format!("{},{}", self.name, self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OfficerPanel {
    Listed { officers: Vec<OfficerLine> },
    NoOfficers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContactPanel {
    Available { website: String, phone: String },
    /// Shown as an error state naming the absent fields
    Missing { fields: Vec<&'static str> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoPanel {
    pub about: AboutPanel,
    pub officers: OfficerPanel,
    pub contact: ContactPanel,
}

pub fn build_info(profile: &TickerProfile) -> InfoPanel {
    InfoPanel {
        about: about(profile),
        officers: officers(profile),
        contact: contact(profile),
    }
}

fn about(profile: &TickerProfile) -> AboutPanel {
    match (&profile.short_name, &profile.long_business_summary) {
        (Some(name), Some(summary)) => AboutPanel::Description {
            name: name.clone(),
            summary: summary.clone(),
        },
        _ => AboutPanel::NoInformation,
    }
}

// Entries without both a name and a title are skipped.
fn officers(profile: &TickerProfile) -> OfficerPanel {
    let listed: Vec<OfficerLine> = profile
        .company_officers
        .iter()
        .flatten()
        .filter_map(|officer| officer.entry())
        .map(|(name, title)| OfficerLine {
            name: name.to_string(),
            title: title.to_string(),
        })
        .collect();

    if listed.is_empty() {
        OfficerPanel::NoOfficers
    } else {
        OfficerPanel::Listed { officers: listed }
    }
}

fn contact(profile: &TickerProfile) -> ContactPanel {
    match (&profile.website, &profile.phone) {
        (Some(website), Some(phone)) => ContactPanel::Available {
            website: website.clone(),
            phone: phone.clone(),
        },
        (website, phone) => {
            let mut fields = Vec::new();
            if website.is_none() {
                fields.push("website");
            }
            if phone.is_none() {
                fields.push("phone");
            }
            ContactPanel::Missing { fields }
        }
    }
}
