use serde::Deserialize;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime, UtcOffset,
};
use uuid::Uuid;

/// A timestamp as sent by a client: RFC 3339, an offset-less ISO-8601
/// datetime (read as UTC), or Unix epoch milliseconds.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ClientTimestamp {
    Millis(i64),
    Text(String),
}

impl ClientTimestamp {
    pub fn normalize(&self) -> Option<OffsetDateTime> {
        match self {
            Self::Millis(ms) => {
                OffsetDateTime::from_unix_timestamp_nanos(i128::from(*ms) * 1_000_000).ok()
            }
            Self::Text(s) => {
                let s = s.trim();
                if let Ok(ts) = OffsetDateTime::parse(s, &Rfc3339) {
                    return Some(ts.to_offset(UtcOffset::UTC));
                }
                parse_naive(s).map(PrimitiveDateTime::assume_utc)
            }
        }
    }
}

fn parse_naive(s: &str) -> Option<PrimitiveDateTime> {
    PrimitiveDateTime::parse(
        s,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            s,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        )
    })
    .or_else(|_| {
        PrimitiveDateTime::parse(
            s,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
        )
    })
    .or_else(|_| {
        PrimitiveDateTime::parse(
            s,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        )
    })
    .ok()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_at: ClientTimestamp,
    #[serde(default)]
    pub completed: bool,
    /// Accepted for client compatibility; the owner always comes from the session.
    #[serde(default)]
    pub uid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteTaskRequest {
    #[serde(rename = "taskID")]
    pub task_id: Uuid,
}

/// One client-held task in a sync batch.
///
/// A client-local `id` may be present; it is ignored and every record is
/// inserted as a new row.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncTaskRecord {
    #[serde(default)]
    pub uid: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_at: ClientTimestamp,
    #[serde(default)]
    pub created_at: Option<ClientTimestamp>,
    #[serde(default)]
    pub updated_at: Option<ClientTimestamp>,
    #[serde(default)]
    pub completed: bool,
}
