//! Binary cover storage keyed by an opaque reference.
//!
//! References look like `<uuid>.<ext>` and are unrelated to book ids. Images are
//! never deduplicated or garbage collected; replacing or deleting a book leaves
//! its previous image in place.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, Set};
use thiserror::Error;
use uuid::Uuid;

use crate::entity::images::{ActiveModel, Entity as Images};

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("image upload is empty")]
    Empty,

    #[error("unsupported image content type {0:?}")]
    UnsupportedContentType(String),

    #[error("image not found")]
    NotFound,

    #[error("image storage failed")]
    Storage(#[from] DbErr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub async fn store_image<C: ConnectionTrait>(
    conn: &C,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<String, ImageStoreError> {
    if bytes.is_empty() {
        return Err(ImageStoreError::Empty);
    }
    let content_type = normalize_content_type(content_type)?;
    let image_ref = format!(
        "{}.{}",
        Uuid::new_v4().simple(),
        extension_for(&content_type)
    );
    let size = bytes.len();

    ActiveModel {
        id: Set(image_ref.clone()),
        content_type: Set(content_type),
        bytes: Set(bytes),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;

    tracing::debug!(image_ref = %image_ref, size, "image stored");
    Ok(image_ref)
}

pub async fn retrieve_image<C: ConnectionTrait>(
    conn: &C,
    image_ref: &str,
) -> Result<StoredImage, ImageStoreError> {
    let image = Images::find_by_id(image_ref.to_owned())
        .one(conn)
        .await?
        .ok_or(ImageStoreError::NotFound)?;

    Ok(StoredImage {
        content_type: image.content_type,
        bytes: image.bytes,
    })
}

/// Lower-case `type/subtype` without parameters; only `image/*` is accepted.
fn normalize_content_type(raw: &str) -> Result<String, ImageStoreError> {
    let essence = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let valid = essence.strip_prefix("image/").is_some_and(|subtype| {
        !subtype.is_empty()
            && subtype
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    });

    if valid {
        Ok(essence)
    } else {
        Err(ImageStoreError::UnsupportedContentType(raw.to_string()))
    }
}

fn extension_for(content_type: &str) -> String {
    let subtype = content_type.strip_prefix("image/").unwrap_or(content_type);
    match subtype {
        "jpeg" | "pjpeg" => "jpg".to_string(),
        "svg+xml" => "svg".to_string(),
        "x-icon" | "vnd.microsoft.icon" => "ico".to_string(),
        other => other
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_image_types_and_strips_parameters() {
        assert_eq!(normalize_content_type("image/png").unwrap(), "image/png");
        assert_eq!(
            normalize_content_type("Image/JPEG; charset=binary").unwrap(),
            "image/jpeg"
        );
        assert_eq!(normalize_content_type("image/svg+xml").unwrap(), "image/svg+xml");
    }

    #[test]
    fn rejects_non_images() {
        for raw in ["text/plain", "application/octet-stream", "image/", "", "image/p n g"] {
            assert!(
                matches!(
                    normalize_content_type(raw),
                    Err(ImageStoreError::UnsupportedContentType(_))
                ),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn extensions_follow_subtype() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/svg+xml"), "svg");
        assert_eq!(extension_for("image/x-portable-bitmap"), "xportablebitmap");
    }
}
