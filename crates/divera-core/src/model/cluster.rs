use serde::Serialize;

/// One user-cluster relation (UCR) of the account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterInfo {
    pub ucr_id: i64,
    pub name: String,
    pub shortname: Option<String>,
    pub cluster_id: Option<i64>,
    pub usergroup_id: Option<i64>,
}

/// The cluster the pull answered for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActiveCluster {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub shortname: Option<String>,
    pub version: ClusterVersion,
}

/// Subscription tier of a cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, strum::Display)]
pub enum ClusterVersion {
    Free,
    Alarm,
    Pro,
    #[default]
    Unknown,
}

impl ClusterVersion {
    pub fn from_id(id: Option<i64>) -> Self {
        match id {
            Some(1) => Self::Free,
            Some(2) => Self::Alarm,
            Some(3) => Self::Pro,
            _ => Self::Unknown,
        }
    }
}
