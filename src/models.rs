use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Business,
    Technology,
    Fiction,
    Horror,
    Adventure,
    Science,
    History,
    NonFiction,
    Children,
    SciFi,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Business,
        Category::Technology,
        Category::Fiction,
        Category::Horror,
        Category::Adventure,
        Category::Science,
        Category::History,
        Category::NonFiction,
        Category::Children,
        Category::SciFi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Technology => "technology",
            Category::Fiction => "fiction",
            Category::Horror => "horror",
            Category::Adventure => "adventure",
            Category::Science => "science",
            Category::History => "history",
            Category::NonFiction => "non-fiction",
            Category::Children => "children",
            Category::SciFi => "sci-fi",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category {:?}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub category: Category,
    pub old_price: Option<f64>,
    pub new_price: f64,
    /// Image reference, served from `/api/books/image/{ref}`.
    pub cover_image: Option<String>,
    pub trending: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub city: String,
    pub country: String,
    pub state: String,
    pub zipcode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
    /// Soft references into the catalog; duplicates and dangling ids are kept.
    pub product_ids: Vec<Uuid>,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry of `Order::product_ids` resolved against the current catalog.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolvedBook {
    Available(Book),
    Missing { id: Uuid },
}

impl ResolvedBook {
    pub fn id(&self) -> Uuid {
        match self {
            ResolvedBook::Available(book) => book.id,
            ResolvedBook::Missing { id } => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySales {
    /// `YYYY-MM`
    pub month: String,
    pub total_sales: f64,
    pub order_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub total_books: u64,
    pub total_sales: f64,
    pub total_orders: u64,
    pub trending_books: u64,
    pub monthly_sales: Vec<MonthlySales>,
}
