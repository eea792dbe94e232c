use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A contact tracked through the outreach pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: String,
    pub role: String,
    pub topic: String,
    pub status: LeadStatus,
    pub generated_content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle state of a lead. `Generated` is reserved for a future
/// generation/delivery split; no transition currently assigns it, but
/// the stats contract reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeadStatus {
    Awaiting,
    Generated,
    Sent,
    Failed,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 4] = [
        LeadStatus::Awaiting,
        LeadStatus::Generated,
        LeadStatus::Sent,
        LeadStatus::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::Awaiting => "AWAITING",
            LeadStatus::Generated => "GENERATED",
            LeadStatus::Sent => "SENT",
            LeadStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown lead status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for LeadStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AWAITING" => Ok(LeadStatus::Awaiting),
            "GENERATED" => Ok(LeadStatus::Generated),
            "SENT" => Ok(LeadStatus::Sent),
            "FAILED" => Ok(LeadStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A row to ingest. `name` and `email` are required; rows missing
/// either are counted as skipped by the store, not rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub company: String,
    pub role: String,
    pub topic: String,
}

impl NewLead {
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && !self.email.is_empty()
    }
}

/// Per-status lead counts. Serializes with the uppercase keys the
/// stats endpoint promises, `GENERATED` included even while unused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct StatusCounts {
    pub awaiting: i64,
    pub generated: i64,
    pub sent: i64,
    pub failed: i64,
    pub total: i64,
}

impl StatusCounts {
    pub fn record(&mut self, status: LeadStatus, count: i64) {
        match status {
            LeadStatus::Awaiting => self.awaiting += count,
            LeadStatus::Generated => self.generated += count,
            LeadStatus::Sent => self.sent += count,
            LeadStatus::Failed => self.failed += count,
        }
        self.total += count;
    }
}
