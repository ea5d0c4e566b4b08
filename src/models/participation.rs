use serde::{Deserialize, Serialize};

/// One participation as stored by the participation API.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub percentage: f64,
}

/// Body of the create and update calls. Updates always send all three fields.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewParticipation {
    pub first_name: String,
    pub last_name: String,
    pub percentage: f64,
}

/// List answers come wrapped in `{ "data": [...] }`; older builds of the API
/// return the bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ParticipationList {
    Wrapped { data: Vec<ParticipationRecord> },
    Bare(Vec<ParticipationRecord>),
}

impl ParticipationList {
    pub fn into_records(self) -> Vec<ParticipationRecord> {
        match self {
            ParticipationList::Wrapped { data } => data,
            ParticipationList::Bare(records) => records,
        }
    }
}
