use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Fixed department choice set. "Other" is the catch-all.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
    AsRefStr, ToSchema,
)]
pub enum Department {
    Engineering,
    Marketing,
    Sales,
    #[strum(serialize = "HR")]
    #[serde(rename = "HR")]
    Hr,
    Finance,
    Operations,
    Design,
    Product,
    Legal,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn display_and_from_str_round_trip() {
        for dept in Department::iter() {
            let name = dept.to_string();
            assert_eq!(Department::from_str(&name).unwrap(), dept);
        }
    }

    #[test]
    fn hr_uses_all_caps() {
        assert_eq!(Department::Hr.to_string(), "HR");
        assert_eq!(Department::from_str("HR").unwrap(), Department::Hr);
        assert!(Department::from_str("Hr").is_err());
    }

    #[test]
    fn unknown_department_is_rejected() {
        assert!(Department::from_str("Warp").is_err());
        assert!(Department::from_str("engineering").is_err());
    }

    #[test]
    fn serde_names_match_display() {
        for dept in Department::iter() {
            let v = serde_json::to_value(dept).unwrap();
            assert_eq!(v, serde_json::Value::String(dept.to_string()));
        }
    }
}
