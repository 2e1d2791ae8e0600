//! Record and derived-report types
//!
//! Uploaded records use English field names; the Portuguese names of the
//! legacy upload format are accepted as aliases on input.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Action label counted by the daily login aggregation
pub const LOGIN_ACTION: &str = "login";

/// An ingested user record
///
/// Only `id` is required. Any other field that is missing or `null` takes
/// its zero value, so partially filled records from older exports still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Externally supplied identifier, used as the store key
    pub id: Uuid,

    #[serde(default, alias = "nome", deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, alias = "idade", deserialize_with = "null_as_default")]
    pub age: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub score: i64,

    #[serde(default, alias = "ativo", deserialize_with = "null_as_default")]
    pub active: bool,

    /// Country code or name, compared by exact string equality
    #[serde(default, alias = "pais", deserialize_with = "null_as_default")]
    pub country: String,

    #[serde(default, alias = "equipe", deserialize_with = "null_as_default")]
    pub team: Team,

    #[serde(default, deserialize_with = "null_as_default")]
    pub logs: Vec<LogEntry>,
}

/// Team membership as seen from one user's record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default, alias = "nome", deserialize_with = "null_as_default")]
    pub name: String,

    /// Whether this record's user leads the team (per-user, not per-team)
    #[serde(default, alias = "lider", deserialize_with = "null_as_default")]
    pub leader: bool,

    #[serde(default, alias = "projetos", deserialize_with = "null_as_default")]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, alias = "nome", deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, alias = "concluido", deserialize_with = "null_as_default")]
    pub completed: bool,
}

/// One entry of a user's activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(alias = "data", with = "calendar_date")]
    pub date: NaiveDate,

    #[serde(default, alias = "acao", deserialize_with = "null_as_default")]
    pub action: String,
}

/// Decode `null` as the type's zero value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl LogEntry {
    pub fn is_login(&self) -> bool {
        self.action == LOGIN_ACTION
    }
}

/// Number of active superusers in one country
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryTally {
    pub country: String,
    pub total: usize,
}

/// Per-team statistics aggregated over every member record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInsight {
    pub team: String,
    pub total_members: usize,
    pub leaders: usize,
    pub completed_projects: usize,
    pub active_percentage: f64,
}

/// Login events observed on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLoginCount {
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub total: usize,
}

/// Strict `YYYY-MM-DD` date encoding: no time of day, no timezone, zero-padded
pub mod calendar_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    pub fn parse(s: &str) -> Result<NaiveDate, String> {
        if s.len() != 10 {
            return Err(format!("invalid date {s:?}: expected YYYY-MM-DD"));
        }
        NaiveDate::parse_from_str(s, FORMAT)
            .map_err(|e| format!("invalid date {s:?}: {e}"))
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }
}
