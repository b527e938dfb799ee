use chrono::{DateTime, Utc};
use serde::Serialize;

/// One alarm of the active cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Alarm {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date: Option<DateTime<Utc>>,
    pub closed: bool,
    pub new: bool,
    pub priority: bool,
}
