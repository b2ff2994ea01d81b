use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{Book, Category},
};

/// Book attributes as submitted by a form or JSON body. Every field is
/// optional here; create and update apply different requirements.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookFields {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Absent keeps the stored value; `null` clears it.
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<f64>)]
    pub old_price: Option<Option<f64>>,
    pub new_price: Option<f64>,
    pub trending: Option<bool>,
}

/// Tells an explicit `null` (`Some(None)`) apart from a missing field (`None`).
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

/// Raw cover upload taken from a multipart file part.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct BookPayload {
    pub fields: BookFields,
    pub image: Option<ImageUpload>,
}

impl BookPayload {
    pub fn json(fields: BookFields) -> Self {
        Self {
            fields,
            image: None,
        }
    }
}

/// Validated attributes for a new catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub description: String,
    pub category: Category,
    pub old_price: Option<f64>,
    pub new_price: f64,
    pub trending: bool,
}

/// Validated partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    /// `Some(None)` removes the stored `oldPrice`.
    pub old_price: Option<Option<f64>>,
    pub new_price: Option<f64>,
    pub trending: Option<bool>,
}

impl TryFrom<BookFields> for NewBook {
    type Error = AppError;

    fn try_from(fields: BookFields) -> AppResult<Self> {
        let title = required_text("title", fields.title)?;
        let description = required_text("description", fields.description)?;
        let category = match fields.category {
            Some(raw) => parse_category(&raw)?,
            None => return Err(AppError::validation("category is required")),
        };
        let new_price = match fields.new_price {
            Some(price) => checked_price("newPrice", price)?,
            None => return Err(AppError::validation("newPrice is required")),
        };
        let old_price = fields
            .old_price
            .flatten()
            .map(|price| checked_price("oldPrice", price))
            .transpose()?;

        Ok(Self {
            title,
            author: fields.author.map(|a| a.trim().to_string()).unwrap_or_default(),
            description,
            category,
            old_price,
            new_price,
            trending: fields.trending.unwrap_or(false),
        })
    }
}

impl TryFrom<BookFields> for BookChanges {
    type Error = AppError;

    fn try_from(fields: BookFields) -> AppResult<Self> {
        Ok(Self {
            title: fields
                .title
                .map(|title| required_text("title", Some(title)))
                .transpose()?,
            author: fields.author.map(|a| a.trim().to_string()),
            description: fields
                .description
                .map(|description| required_text("description", Some(description)))
                .transpose()?,
            category: fields
                .category
                .as_deref()
                .map(parse_category)
                .transpose()?,
            old_price: fields
                .old_price
                .map(|price| price.map(|p| checked_price("oldPrice", p)).transpose())
                .transpose()?,
            new_price: fields
                .new_price
                .map(|price| checked_price("newPrice", price))
                .transpose()?,
            trending: fields.trending,
        })
    }
}

fn required_text(field: &str, value: Option<String>) -> AppResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::validation(format!("{field} is required"))),
    }
}

fn parse_category(raw: &str) -> AppResult<Category> {
    raw.parse::<Category>()
        .map_err(|err| AppError::validation(err.to_string()))
}

fn checked_price(field: &str, price: f64) -> AppResult<f64> {
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(AppError::validation(format!(
            "{field} must be a non-negative number"
        )))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct BookList {
    #[schema(value_type = Vec<Book>)]
    pub items: Vec<Book>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_fields() -> BookFields {
        BookFields {
            title: Some("  Dune ".into()),
            author: Some("Frank Herbert".into()),
            description: Some("Spice and sand".into()),
            category: Some("sci-fi".into()),
            old_price: Some(Some(24.99)),
            new_price: Some(19.99),
            trending: None,
        }
    }

    #[test]
    fn new_book_trims_and_defaults() {
        let book = NewBook::try_from(complete_fields()).unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.category, Category::SciFi);
        assert!(!book.trending);
        assert_eq!(book.old_price, Some(24.99));
    }

    #[test]
    fn new_book_requires_title_and_price() {
        let mut fields = complete_fields();
        fields.title = Some("   ".into());
        assert!(matches!(
            NewBook::try_from(fields),
            Err(AppError::Validation(msg)) if msg.contains("title")
        ));

        let mut fields = complete_fields();
        fields.new_price = None;
        assert!(matches!(
            NewBook::try_from(fields),
            Err(AppError::Validation(msg)) if msg.contains("newPrice")
        ));
    }

    #[test]
    fn negative_or_nan_prices_are_rejected() {
        let mut fields = complete_fields();
        fields.new_price = Some(-1.0);
        assert!(NewBook::try_from(fields).is_err());

        let mut fields = complete_fields();
        fields.old_price = Some(Some(f64::NAN));
        assert!(NewBook::try_from(fields).is_err());
    }

    #[test]
    fn old_price_below_new_price_is_allowed() {
        let mut fields = complete_fields();
        fields.old_price = Some(Some(5.0));
        assert!(NewBook::try_from(fields).is_ok());
    }

    #[test]
    fn changes_keep_absent_fields_untouched() {
        let changes = BookChanges::try_from(BookFields {
            trending: Some(true),
            ..BookFields::default()
        })
        .unwrap();
        assert_eq!(
            changes,
            BookChanges {
                trending: Some(true),
                ..BookChanges::default()
            }
        );
    }

    #[test]
    fn changes_reject_blank_title_and_unknown_category() {
        let blank = BookFields {
            title: Some(String::new()),
            ..BookFields::default()
        };
        assert!(BookChanges::try_from(blank).is_err());

        let unknown = BookFields {
            category: Some("poetry".into()),
            ..BookFields::default()
        };
        assert!(BookChanges::try_from(unknown).is_err());
    }

    #[test]
    fn json_null_old_price_clears_while_absent_keeps() {
        let cleared: BookFields = serde_json::from_value(serde_json::json!({ "oldPrice": null })).unwrap();
        let changes = BookChanges::try_from(cleared).unwrap();
        assert_eq!(changes.old_price, Some(None));

        let absent: BookFields = serde_json::from_value(serde_json::json!({ "title": "Emma" })).unwrap();
        let changes = BookChanges::try_from(absent).unwrap();
        assert_eq!(changes.old_price, None);

        let set: BookFields = serde_json::from_value(serde_json::json!({ "oldPrice": 9.5 })).unwrap();
        assert_eq!(BookChanges::try_from(set).unwrap().old_price, Some(Some(9.5)));
    }
}
