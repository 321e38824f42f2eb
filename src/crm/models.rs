use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ContactProperties {
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: String,
    pub properties: ContactProperties,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.properties.firstname, self.properties.lastname)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DealStage {
    #[serde(rename = "appointmentscheduled")]
    AppointmentScheduled,
    #[serde(rename = "qualifiedtobuy")]
    QualifiedToBuy,
    #[serde(rename = "closedwon")]
    ClosedWon,
    #[serde(rename = "closedlost")]
    ClosedLost,
}

impl DealStage {
    pub const ALL: [DealStage; 4] = [
        DealStage::AppointmentScheduled,
        DealStage::QualifiedToBuy,
        DealStage::ClosedWon,
        DealStage::ClosedLost,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DealStage::AppointmentScheduled => "Trial Started",
            DealStage::QualifiedToBuy => "Active Trial User",
            DealStage::ClosedWon => "Converted to Paid",
            DealStage::ClosedLost => "Trial Ended",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DealStage::AppointmentScheduled => "appointmentscheduled",
            DealStage::QualifiedToBuy => "qualifiedtobuy",
            DealStage::ClosedWon => "closedwon",
            DealStage::ClosedLost => "closedlost",
        }
    }
}

impl FromStr for DealStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DealStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("Unknown deal stage: {}", s))
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DealProperties {
    pub dealname: String,
    /// Kept as entered; the backend stores it as a string.
    #[serde(default)]
    pub amount: String,
    pub dealstage: DealStage,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Deal {
    pub id: String,
    pub properties: DealProperties,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateDealPayload {
    pub deal_properties: DealProperties,
    pub contact_id: String,
}

/// List endpoints answer either with a bare array or with `{"results": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse<T> {
    Wrapped { results: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Wrapped { results } => results,
            ListResponse::Bare(items) => items,
        }
    }
}
