use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set, TransactionTrait};
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    audit,
    dto::books::{BookChanges, BookList, BookPayload, NewBook},
    entity::books::{ActiveModel, Column, Entity as Books, Model as BookModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Book, Category},
    response::{ApiResponse, Meta},
    services::image_service::{self, StoredImage},
    state::AppState,
};

pub async fn list_books(state: &AppState) -> AppResult<ApiResponse<BookList>> {
    let items = Books::find()
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(book_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::with_total(items.len());
    Ok(ApiResponse::success("Books", BookList { items }, Some(meta)))
}

pub async fn get_book(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Book>> {
    let book = Books::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Book", book_from_entity(book)?, None))
}

pub async fn create_book(
    state: &AppState,
    user: &AuthUser,
    payload: BookPayload,
) -> AppResult<ApiResponse<Book>> {
    ensure_admin(user)?;
    let new_book = NewBook::try_from(payload.fields)?;

    let txn = state.orm.begin().await?;
    let cover_image = match payload.image {
        Some(image) => Some(image_service::store_image(&txn, image.bytes, &image.content_type).await?),
        None => None,
    };

    let now = Utc::now();
    let book = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(new_book.title),
        author: Set(new_book.author),
        description: Set(new_book.description),
        category: Set(new_book.category.as_str().to_string()),
        old_price: Set(new_book.old_price),
        new_price: Set(new_book.new_price),
        cover_image: Set(cover_image),
        trending: Set(new_book.trending),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!(book_id = %book.id, title = %book.title, "book created");
    audit::record(
        &state.orm,
        Some(&user.subject),
        "book_create",
        "books",
        serde_json::json!({ "book_id": book.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Book created",
        book_from_entity(book)?,
        Some(Meta::empty()),
    ))
}

pub async fn update_book(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: BookPayload,
) -> AppResult<ApiResponse<Book>> {
    ensure_admin(user)?;
    let changes = BookChanges::try_from(payload.fields)?;

    let txn = state.orm.begin().await?;
    let existing = Books::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(title) = changes.title {
        active.title = Set(title);
    }
    if let Some(author) = changes.author {
        active.author = Set(author);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(category) = changes.category {
        active.category = Set(category.as_str().to_string());
    }
    if let Some(old_price) = changes.old_price {
        active.old_price = Set(old_price);
    }
    if let Some(new_price) = changes.new_price {
        active.new_price = Set(new_price);
    }
    if let Some(trending) = changes.trending {
        active.trending = Set(trending);
    }
    // The previous image stays in the store.
    if let Some(image) = payload.image {
        let image_ref =
            image_service::store_image(&txn, image.bytes, &image.content_type).await?;
        active.cover_image = Set(Some(image_ref));
    }
    active.updated_at = Set(Utc::now().into());

    let book = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(book_id = %book.id, "book updated");
    audit::record(
        &state.orm,
        Some(&user.subject),
        "book_update",
        "books",
        serde_json::json!({ "book_id": book.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        book_from_entity(book)?,
        Some(Meta::empty()),
    ))
}

/// Remove a book. Orders that reference it and its cover image are left alone.
pub async fn delete_book(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Books::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(book_id = %id, "book deleted");
    audit::record(
        &state.orm,
        Some(&user.subject),
        "book_delete",
        "books",
        serde_json::json!({ "book_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

pub async fn get_book_image(state: &AppState, image_ref: &str) -> AppResult<StoredImage> {
    Ok(image_service::retrieve_image(&state.orm, image_ref).await?)
}

pub(crate) fn book_from_entity(model: BookModel) -> AppResult<Book> {
    let category = Category::from_str(&model.category).map_err(|err| {
        AppError::Internal(anyhow::anyhow!("book {} has {err}", model.id))
    })?;
    Ok(Book {
        id: model.id,
        title: model.title,
        author: model.author,
        description: model.description,
        category,
        old_price: model.old_price,
        new_price: model.new_price,
        cover_image: model.cover_image,
        trending: model.trending,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}
