mod common;

use bookstore_api::{
    error::AppError,
    services::{admin_service, book_service, order_service},
};

use common::{admin, book_fields, create_book, customer, order_request, setup_state};

#[tokio::test]
async fn empty_store_reports_zeroes() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let summary = admin_service::summary(&state, &admin()).await?.data.unwrap();

    assert_eq!(summary.total_books, 0);
    assert_eq!(summary.total_orders, 0);
    assert_eq!(summary.trending_books, 0);
    assert_eq!(summary.total_sales, 0.0);
    assert!(summary.monthly_sales.is_empty());
    Ok(())
}

#[tokio::test]
async fn summary_reflects_current_catalog_and_orders() -> anyhow::Result<()> {
    let state = setup_state().await?;

    let mut trending = book_fields("Hot", 10.0);
    trending.trending = Some(true);
    let hot = create_book(&state, trending).await;
    let cold = create_book(&state, book_fields("Cold", 5.0)).await;
    let gone = create_book(&state, book_fields("Gone", 1.0)).await;
    book_service::delete_book(&state, &admin(), gone.id).await?;

    for total in [10.10, 0.2, 14.7] {
        order_service::create_order(
            &state,
            order_request("ada@example.com", vec![hot.id, cold.id], total),
            None,
        )
        .await?;
    }

    let summary = admin_service::summary(&state, &admin()).await?.data.unwrap();
    assert_eq!(summary.total_books, 2);
    assert_eq!(summary.trending_books, 1);
    assert_eq!(summary.total_orders, 3);
    assert_eq!(summary.total_sales, 25.0);

    assert_eq!(summary.monthly_sales.len(), 1);
    assert_eq!(summary.monthly_sales[0].order_count, 3);
    assert_eq!(summary.monthly_sales[0].total_sales, 25.0);
    Ok(())
}

#[tokio::test]
async fn summary_is_admin_only() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let err = admin_service::summary(&state, &customer()).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}
