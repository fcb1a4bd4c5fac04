use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::string_column;

#[derive(
    Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum AssetStatus {
    #[default]
    Available,
    #[serde(rename = "Checked Out")]
    #[strum(serialize = "Checked Out")]
    CheckedOut,
    #[serde(rename = "In Maintenance")]
    #[strum(serialize = "In Maintenance")]
    InMaintenance,
}

string_column!(AssetStatus);

/// `status` mirrors whether an open [`AssetLog`] exists for the asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, ToSchema)]
pub struct Asset {
    pub id: u64,
    #[schema(example = "Dell Latitude 7440")]
    pub name: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: AssetStatus,
}

#[derive(Debug, Clone)]
pub struct NewAsset {
    pub name: String,
    pub description: Option<String>,
}

/// Administrative edit. `status` may only move between `Available` and
/// `In Maintenance`.
#[derive(Debug, Clone, Default)]
pub struct AssetPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<AssetStatus>,
}

/// One row per checkout; open while `check_in_time` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, ToSchema)]
pub struct AssetLog {
    pub id: u64,
    pub check_out_time: NaiveDateTime,
    pub check_in_time: Option<NaiveDateTime>,
    pub user_id: u64,
    pub asset_id: u64,
}

impl AssetLog {
    pub fn is_open(&self) -> bool {
        self.check_in_time.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_display_names() {
        assert_eq!(AssetStatus::CheckedOut.to_string(), "Checked Out");
        assert_eq!(
            "In Maintenance".parse::<AssetStatus>().unwrap(),
            AssetStatus::InMaintenance
        );
        assert_eq!(
            serde_json::to_value(AssetStatus::CheckedOut).unwrap(),
            serde_json::json!("Checked Out")
        );
    }
}
