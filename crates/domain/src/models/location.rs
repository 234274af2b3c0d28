//! Storage hierarchy: Zone > Furniture > Drawer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Most items named in a blocking-deletion message.
pub const IN_USE_NAMED_ITEMS: usize = 3;
/// Most items listed in a blocking-deletion payload.
pub const IN_USE_LISTED_ITEMS: usize = 10;

/// Top level of the hierarchy. Names are globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A piece of furniture within a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Furniture {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub zone_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A drawer within a piece of furniture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drawer {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub furniture_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateZoneRequest {
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: String,

    #[validate(length(max = 255, message = "Description must be at most 255 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFurnitureRequest {
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: String,

    #[validate(length(max = 255, message = "Description must be at most 255 characters"))]
    pub description: Option<String>,

    pub zone_id: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDrawerRequest {
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: String,

    #[validate(length(max = 255, message = "Description must be at most 255 characters"))]
    pub description: Option<String>,

    pub furniture_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFurnitureQuery {
    pub zone_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListDrawersQuery {
    pub furniture_id: Option<i64>,
}

/// Item reference listed when a location cannot be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: i64,
    pub name: String,
}

/// Builds the message for a location that still holds items.
///
/// Names at most [`IN_USE_NAMED_ITEMS`] items, then "and others".
pub fn in_use_message(kind: &str, name: &str, items: &[ItemRef], total: i64) -> String {
    let named: Vec<&str> = items
        .iter()
        .take(IN_USE_NAMED_ITEMS)
        .map(|item| item.name.as_str())
        .collect();
    let mut message = format!(
        "Cannot delete {} '{}': {} item(s) still stored there ({}",
        kind,
        name,
        total,
        named.join(", ")
    );
    if total > named.len() as i64 {
        message.push_str(" and others");
    }
    message.push(')');
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(names: &[&str]) -> Vec<ItemRef> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| ItemRef {
                id: i as i64 + 1,
                name: name.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_in_use_message_few_items() {
        let items = refs(&["Pliers", "Tape"]);
        assert_eq!(
            in_use_message("drawer", "Top", &items, 2),
            "Cannot delete drawer 'Top': 2 item(s) still stored there (Pliers, Tape)"
        );
    }

    #[test]
    fn test_in_use_message_truncates() {
        let items = refs(&["A", "B", "C", "D", "E"]);
        assert_eq!(
            in_use_message("zone", "Lab", &items, 12),
            "Cannot delete zone 'Lab': 12 item(s) still stored there (A, B, C and others)"
        );
    }

    #[test]
    fn test_zone_request_validation() {
        let ok = CreateZoneRequest {
            name: "Workshop".into(),
            description: None,
        };
        assert!(ok.validate().is_ok());

        let long = CreateZoneRequest {
            name: "x".repeat(101),
            description: None,
        };
        assert!(long.validate().is_err());

        let long_description = CreateZoneRequest {
            name: "Workshop".into(),
            description: Some("d".repeat(256)),
        };
        assert!(long_description.validate().is_err());
    }
}
