#![allow(dead_code)]

use bookstore_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::{
        auth::Claims,
        books::{BookFields, BookPayload},
        orders::CreateOrderRequest,
    },
    middleware::auth::AuthUser,
    models::{Address, Book},
    services::book_service,
    state::AppState,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

pub const SECRET: &str = "test-secret";

/// Fresh state over its own in-memory database with every migration applied.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let orm = create_orm_conn("sqlite::memory:").await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, AppConfig::in_memory(SECRET)))
}

pub fn admin() -> AuthUser {
    AuthUser::admin("admin-1")
}

pub fn customer() -> AuthUser {
    AuthUser {
        subject: "reader-1".into(),
        role: "user".into(),
    }
}

pub fn bearer(role: &str) -> String {
    let claims = Claims {
        sub: format!("{role}-1"),
        role: role.into(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}

pub fn book_fields(title: &str, new_price: f64) -> BookFields {
    BookFields {
        title: Some(title.into()),
        author: Some("Anon".into()),
        description: Some(format!("About {title}")),
        category: Some("fiction".into()),
        old_price: Some(Some(new_price + 5.0)),
        new_price: Some(new_price),
        trending: Some(false),
    }
}

pub async fn create_book(state: &AppState, fields: BookFields) -> Book {
    book_service::create_book(state, &admin(), BookPayload::json(fields))
        .await
        .unwrap()
        .data
        .unwrap()
}

pub fn order_request(email: &str, product_ids: Vec<Uuid>, total_price: f64) -> CreateOrderRequest {
    CreateOrderRequest {
        name: "Ada".into(),
        email: email.into(),
        phone: "555-0100".into(),
        address: Address {
            city: "Lagos".into(),
            country: "NG".into(),
            state: "LA".into(),
            zipcode: "100001".into(),
        },
        product_ids,
        total_price,
    }
}
