use serde::Serialize;

use crate::config::VehicleNameMode;

/// A vehicle of the active cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Vehicle {
    pub id: String,
    pub name: Option<String>,
    pub shortname: Option<String>,
    pub fullname: Option<String>,
    pub fmsstatus_id: Option<i64>,
    pub fmsstatus_note: Option<String>,
    pub fmsstatus_ts: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub opta: Option<String>,
    pub issi: Option<String>,
    pub number: Option<String>,
    /// Fields this crate does not model, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Vehicle {
    /// Display name for the given mode, falling back to the vehicle id.
    pub fn display_name(&self, mode: VehicleNameMode) -> &str {
        let picked = match mode {
            VehicleNameMode::Shortname => self.shortname.as_deref(),
            VehicleNameMode::Name => self.name.as_deref(),
            VehicleNameMode::Fullname => self.fullname.as_deref(),
            VehicleNameMode::Auto => self
                .shortname
                .as_deref()
                .or(self.name.as_deref())
                .or(self.fullname.as_deref()),
        };
        picked.unwrap_or(&self.id)
    }

    /// Both coordinates, or nothing.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hlf() -> Vehicle {
        Vehicle {
            id: "42".into(),
            name: Some("HLF 20".into()),
            fullname: Some("Hilfeleistungslöschfahrzeug 20".into()),
            ..Vehicle::default()
        }
    }

    #[test]
    fn auto_mode_falls_through_variants() {
        assert_eq!(hlf().display_name(VehicleNameMode::Auto), "HLF 20");
    }

    #[test]
    fn explicit_mode_falls_back_to_id() {
        assert_eq!(hlf().display_name(VehicleNameMode::Shortname), "42");
        assert_eq!(
            hlf().display_name(VehicleNameMode::Fullname),
            "Hilfeleistungslöschfahrzeug 20"
        );
    }

    #[test]
    fn position_requires_both_coordinates() {
        let mut v = hlf();
        v.latitude = Some(52.5);
        assert_eq!(v.position(), None);
        v.longitude = Some(13.4);
        assert_eq!(v.position(), Some((52.5, 13.4)));
    }
}
