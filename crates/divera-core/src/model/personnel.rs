use serde::Serialize;

/// The account owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub firstname: String,
    pub lastname: String,
    pub email: Option<String>,
}

impl UserInfo {
    pub fn full_name(&self) -> String {
        join_name(&self.firstname, &self.lastname)
    }
}

/// The account owner's current personnel status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserStatus {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub note: Option<String>,
}

/// A member of the cluster's personnel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Helper {
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    /// Status label; `"unknown"` when the service sent none.
    pub status: String,
    pub status_id: Option<i64>,
    /// Fields this crate does not model, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Helper {
    pub fn full_name(&self) -> String {
        join_name(&self.firstname, &self.lastname)
    }

    /// `"On Duty"` → `"on_duty"`.
    pub fn status_slug(&self) -> String {
        self.status.trim().to_lowercase().replace([' ', '-'], "_")
    }
}

fn join_name(first: &str, last: &str) -> String {
    format!("{first} {last}").trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_tolerate_missing_parts() {
        let user = UserInfo {
            firstname: "Erika".into(),
            ..UserInfo::default()
        };
        assert_eq!(user.full_name(), "Erika");
    }

    #[test]
    fn status_slug_normalizes_label() {
        let helper = Helper {
            status: "On Duty".into(),
            ..Helper::default()
        };
        assert_eq!(helper.status_slug(), "on_duty");
    }
}
