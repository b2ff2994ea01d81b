mod common;

use bookstore_api::{
    dto::books::{BookFields, BookPayload, ImageUpload},
    entity::{AuditLogs, audit_logs::Column as AuditCol},
    error::AppError,
    models::Category,
    services::book_service,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use common::{admin, book_fields, create_book, customer, setup_state};

fn png(bytes: &[u8]) -> ImageUpload {
    ImageUpload {
        bytes: bytes.to_vec(),
        content_type: "image/png".into(),
    }
}

#[tokio::test]
async fn created_book_reads_back_identically() -> anyhow::Result<()> {
    let state = setup_state().await?;

    let mut fields = book_fields("Dune", 12.5);
    fields.category = Some("sci-fi".into());
    fields.trending = Some(true);
    let created = create_book(&state, fields).await;

    assert_eq!(created.title, "Dune");
    assert_eq!(created.category, Category::SciFi);
    assert_eq!(created.new_price, 12.5);
    assert_eq!(created.old_price, Some(17.5));
    assert!(created.trending);
    assert_eq!(created.cover_image, None);

    let fetched = book_service::get_book(&state, created.id).await?.data.unwrap();
    assert_eq!(fetched, created);
    Ok(())
}

#[tokio::test]
async fn listing_returns_books_in_creation_order() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let first = create_book(&state, book_fields("First", 1.0)).await;
    let second = create_book(&state, book_fields("Second", 2.0)).await;

    let listed = book_service::list_books(&state).await?;
    assert_eq!(listed.meta.unwrap().total, Some(2));
    let ids: Vec<Uuid> = listed.data.unwrap().items.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    Ok(())
}

#[tokio::test]
async fn invalid_fields_are_rejected_before_storage() -> anyhow::Result<()> {
    let state = setup_state().await?;

    let mut no_title = book_fields("x", 1.0);
    no_title.title = Some("   ".into());
    let err = book_service::create_book(&state, &admin(), BookPayload::json(no_title))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut bad_category = book_fields("x", 1.0);
    bad_category.category = Some("cookbooks".into());
    let err = book_service::create_book(&state, &admin(), BookPayload::json(bad_category))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut negative = book_fields("x", 1.0);
    negative.new_price = Some(-3.0);
    let err = book_service::create_book(&state, &admin(), BookPayload::json(negative))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let listed = book_service::list_books(&state).await?.data.unwrap();
    assert!(listed.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn only_admins_change_the_catalog() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let book = create_book(&state, book_fields("Guarded", 5.0)).await;

    let err = book_service::create_book(
        &state,
        &customer(),
        BookPayload::json(book_fields("Nope", 1.0)),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = book_service::delete_book(&state, &customer(), book.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    assert!(book_service::get_book(&state, book.id).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn partial_update_keeps_untouched_fields() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let book = create_book(&state, book_fields("Emma", 8.0)).await;

    let changes = BookFields {
        new_price: Some(6.5),
        trending: Some(true),
        ..BookFields::default()
    };
    let updated = book_service::update_book(&state, &admin(), book.id, BookPayload::json(changes))
        .await?
        .data
        .unwrap();

    assert_eq!(updated.id, book.id);
    assert_eq!(updated.title, "Emma");
    assert_eq!(updated.description, book.description);
    assert_eq!(updated.new_price, 6.5);
    assert!(updated.trending);
    assert_eq!(updated.created_at, book.created_at);
    assert!(updated.updated_at >= book.updated_at);

    let missing = book_service::update_book(
        &state,
        &admin(),
        Uuid::new_v4(),
        BookPayload::json(BookFields::default()),
    )
    .await
    .unwrap_err();
    assert!(matches!(missing, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn update_can_remove_the_old_price() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let book = create_book(&state, book_fields("Discounted", 8.0)).await;
    assert_eq!(book.old_price, Some(13.0));

    let untouched = book_service::update_book(
        &state,
        &admin(),
        book.id,
        BookPayload::json(BookFields {
            title: Some("Still discounted".into()),
            ..BookFields::default()
        }),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(untouched.old_price, Some(13.0));

    let cleared = book_service::update_book(
        &state,
        &admin(),
        book.id,
        BookPayload::json(BookFields {
            old_price: Some(None),
            ..BookFields::default()
        }),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cleared.old_price, None);
    assert_eq!(cleared.new_price, 8.0);
    Ok(())
}

#[tokio::test]
async fn deleted_book_is_gone() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let book = create_book(&state, book_fields("Ephemeral", 3.0)).await;

    book_service::delete_book(&state, &admin(), book.id).await?;

    let err = book_service::get_book(&state, book.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    let err = book_service::delete_book(&state, &admin(), book.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn cover_images_round_trip_and_survive_replacement() -> anyhow::Result<()> {
    let state = setup_state().await?;

    let payload = BookPayload {
        fields: book_fields("Illustrated", 20.0),
        image: Some(png(b"\x89PNG first")),
    };
    let book = book_service::create_book(&state, &admin(), payload)
        .await?
        .data
        .unwrap();
    let first_ref = book.cover_image.clone().expect("cover image reference");
    assert!(first_ref.ends_with(".png"));

    let image = book_service::get_book_image(&state, &first_ref).await?;
    assert_eq!(image.content_type, "image/png");
    assert_eq!(image.bytes, b"\x89PNG first");

    let replacement = BookPayload {
        fields: BookFields::default(),
        image: Some(png(b"\x89PNG second")),
    };
    let updated = book_service::update_book(&state, &admin(), book.id, replacement)
        .await?
        .data
        .unwrap();
    let second_ref = updated.cover_image.expect("new cover image reference");
    assert_ne!(second_ref, first_ref);

    let second = book_service::get_book_image(&state, &second_ref).await?;
    assert_eq!(second.bytes, b"\x89PNG second");
    // The previous upload stays retrievable.
    assert!(book_service::get_book_image(&state, &first_ref).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn bad_uploads_and_unknown_images_are_rejected() -> anyhow::Result<()> {
    let state = setup_state().await?;

    let not_an_image = BookPayload {
        fields: book_fields("Text", 1.0),
        image: Some(ImageUpload {
            bytes: b"hello".to_vec(),
            content_type: "text/plain".into(),
        }),
    };
    let err = book_service::create_book(&state, &admin(), not_an_image)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let empty = BookPayload {
        fields: book_fields("Empty", 1.0),
        image: Some(png(b"")),
    };
    let err = book_service::create_book(&state, &admin(), empty)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Neither failed upload left a book behind.
    assert!(book_service::list_books(&state).await?.data.unwrap().items.is_empty());

    let err = book_service::get_book_image(&state, "missing.png")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn catalog_changes_leave_an_audit_trail() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let book = create_book(&state, book_fields("Audited", 2.0)).await;
    book_service::delete_book(&state, &admin(), book.id).await?;

    let entries = AuditLogs::find()
        .filter(AuditCol::Resource.eq("books"))
        .all(&state.orm)
        .await?;
    let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
    assert!(actions.contains(&"book_create"));
    assert!(actions.contains(&"book_delete"));
    assert!(entries.iter().all(|e| e.actor.as_deref() == Some("admin-1")));
    Ok(())
}
