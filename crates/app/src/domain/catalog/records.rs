//! Catalog Records

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::uuids::TypedUuid;

/// Course marker.
#[derive(Debug)]
pub struct Course;

/// Course UUID
pub type CourseUuid = TypedUuid<Course>;

/// Event marker.
#[derive(Debug)]
pub struct Event;

/// Event UUID
pub type EventUuid = TypedUuid<Event>;

/// Digital product marker.
#[derive(Debug)]
pub struct DigitalProduct;

/// Digital Product UUID
pub type DigitalProductUuid = TypedUuid<DigitalProduct>;

/// The closed set of sellable item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Course,
    Event,
    DigitalProduct,
}

#[derive(Debug, Error)]
#[error("unknown item type: {0}")]
pub struct UnknownItemType(String);

impl ItemType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Event => "event",
            Self::DigitalProduct => "digital_product",
        }
    }
}

impl FromStr for ItemType {
    type Err = UnknownItemType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "course" => Ok(Self::Course),
            "event" => Ok(Self::Event),
            "digital_product" => Ok(Self::DigitalProduct),
            other => Err(UnknownItemType(other.to_string())),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed reference to exactly one sellable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "item_type", content = "item_id", rename_all = "snake_case")]
pub enum ItemRef {
    Course(CourseUuid),
    Event(EventUuid),
    DigitalProduct(DigitalProductUuid),
}

impl ItemRef {
    #[must_use]
    pub fn new(item_type: ItemType, uuid: Uuid) -> Self {
        match item_type {
            ItemType::Course => Self::Course(uuid.into()),
            ItemType::Event => Self::Event(uuid.into()),
            ItemType::DigitalProduct => Self::DigitalProduct(uuid.into()),
        }
    }

    #[must_use]
    pub const fn item_type(self) -> ItemType {
        match self {
            Self::Course(_) => ItemType::Course,
            Self::Event(_) => ItemType::Event,
            Self::DigitalProduct(_) => ItemType::DigitalProduct,
        }
    }

    #[must_use]
    pub fn uuid(self) -> Uuid {
        match self {
            Self::Course(uuid) => uuid.into_uuid(),
            Self::Event(uuid) => uuid.into_uuid(),
            Self::DigitalProduct(uuid) => uuid.into_uuid(),
        }
    }
}

/// Catalog Item Record
///
/// Only the fields the fulfillment core reads. `capacity`/`available_spots`
/// are set for events, `download_limit`/`file_key` for digital products.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItemRecord {
    pub item: ItemRef,
    pub title: String,
    pub price: u64,
    pub capacity: Option<u32>,
    pub available_spots: Option<u32>,
    pub download_limit: Option<u32>,
    pub file_key: Option<String>,
}
