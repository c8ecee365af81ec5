//! Listing records and their closed vocabularies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a listing row in the remote store
pub type ListingId = Uuid;

/// Identifier of a marketplace user (seller, buyer, viewer)
pub type UserId = Uuid;

/// Listing category
///
/// The set is closed: the remote store rejects anything else, so parsing
/// an unknown name yields an error rather than an `Other(String)` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Textbook,
    Electronics,
    Furniture,
    Clothing,
    Stationery,
    Vehicle,
    Household,
    Other,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 8] = [
        Category::Textbook,
        Category::Electronics,
        Category::Furniture,
        Category::Clothing,
        Category::Stationery,
        Category::Vehicle,
        Category::Household,
        Category::Other,
    ];

    /// Canonical name as stored remotely
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Textbook => "Textbook",
            Category::Electronics => "Electronics",
            Category::Furniture => "Furniture",
            Category::Clothing => "Clothing",
            Category::Stationery => "Stationery",
            Category::Vehicle => "Vehicle",
            Category::Household => "Household",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a category or condition name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Category {
    type Err = UnknownVariant;

    /// Case-insensitive; accepts a few plural/alias spellings a model or a
    /// user is likely to produce.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let category = match normalized.as_str() {
            "textbook" | "textbooks" | "book" | "books" => Category::Textbook,
            "electronics" | "electronic" => Category::Electronics,
            "furniture" => Category::Furniture,
            "clothing" | "clothes" | "fashion" => Category::Clothing,
            "stationery" | "stationary" => Category::Stationery,
            "vehicle" | "vehicles" => Category::Vehicle,
            "household" | "home" => Category::Household,
            "other" => Category::Other,
            _ => {
                return Err(UnknownVariant {
                    kind: "category",
                    value: s.to_string(),
                });
            }
        };
        Ok(category)
    }
}

/// Physical condition declared by the seller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    New,
    LikeNew,
    Good,
    Fair,
    Poor,
}

impl FromStr for Condition {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match normalized.as_str() {
            "new" => Ok(Condition::New),
            "likenew" => Ok(Condition::LikeNew),
            "good" => Ok(Condition::Good),
            "fair" => Ok(Condition::Fair),
            "poor" => Ok(Condition::Poor),
            _ => Err(UnknownVariant {
                kind: "condition",
                value: s.to_string(),
            }),
        }
    }
}

/// How buyer and seller exchange the item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeMethod {
    Meetup,
    Delivery,
    Either,
}

/// Availability of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    #[default]
    Available,
    Pending,
    Sold,
}

/// A sell-offer or buy-request in the marketplace
///
/// Owned by exactly one seller. The engine never mutates a listing; edits
/// and deletions arrive from the remote store (fetch or change feed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub seller_id: UserId,
    pub title: String,
    pub description: String,
    /// Price in the smallest currency unit
    pub price: u64,
    pub category: Category,
    pub condition: Condition,
    #[serde(default)]
    pub images: Vec<String>,
    pub trade_method: TradeMethod,
    pub posted_at: DateTime<Utc>,
    #[serde(default)]
    pub status: ListingStatus,
    #[serde(default)]
    pub views: u64,
    /// `true` for buy-requests ("wanted" posts), `false` for sell-offers
    #[serde(default)]
    pub wanted: bool,
}

impl Listing {
    /// Create an available sell-offer posted now
    pub fn new(
        seller_id: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        price: u64,
        category: Category,
        condition: Condition,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            seller_id,
            title: title.into(),
            description: description.into(),
            price,
            category,
            condition,
            images: Vec::new(),
            trade_method: TradeMethod::Either,
            posted_at: Utc::now(),
            status: ListingStatus::Available,
            views: 0,
            wanted: false,
        }
    }

    pub fn is_sold(&self) -> bool {
        self.status == ListingStatus::Sold
    }

    /// Case-insensitive substring test against title or description
    ///
    /// `needle` must already be lowercase.
    pub fn mentions(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}
