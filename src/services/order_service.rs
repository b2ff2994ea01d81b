use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Select,
    Set, SqlErr,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CreateOrderRequest, OrderDetails, OrderList},
    entity::{
        books::{Column as BookCol, Entity as Books},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Address, Book, Order, ResolvedBook},
    pricing::PricedLine,
    response::{ApiResponse, Meta},
    services::book_service::book_from_entity,
    state::AppState,
};

/// Persist an order as submitted. The total goes through the configured
/// [`TotalVerifier`](crate::pricing::TotalVerifier); stock is never touched.
///
/// A repeated `idempotency_key` replays the stored order only when the new
/// submission is identical; a different submission under the same key is a
/// [`AppError::Conflict`].
pub async fn create_order(
    state: &AppState,
    payload: CreateOrderRequest,
    idempotency_key: Option<String>,
) -> AppResult<ApiResponse<Order>> {
    payload.validate()?;
    let idempotency_key = idempotency_key
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty());

    let request_hash = match idempotency_key {
        Some(_) => Some(payload.fingerprint()?),
        None => None,
    };

    if let (Some(key), Some(hash)) = (idempotency_key.as_deref(), request_hash.as_deref()) {
        if let Some(existing) = find_by_idempotency_key(&state.orm, key).await? {
            return replayed(existing, hash);
        }
    }

    let total_price = verify_total(state, &payload).await?;

    let now = Utc::now();
    let CreateOrderRequest {
        name,
        email,
        phone,
        address,
        product_ids,
        ..
    } = payload;
    let active = OrderActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        phone: Set(phone),
        city: Set(address.city),
        country: Set(address.country),
        state: Set(address.state),
        zipcode: Set(address.zipcode),
        product_ids: Set(ids_to_json(&product_ids)),
        total_price: Set(total_price),
        idempotency_key: Set(idempotency_key.clone()),
        request_hash: Set(request_hash.clone()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    let order = match active.insert(&state.orm).await {
        Ok(order) => order,
        Err(err) => {
            // A concurrent submission with the same key won the insert.
            if let (Some(key), Some(hash), Some(SqlErr::UniqueConstraintViolation(_))) = (
                idempotency_key.as_deref(),
                request_hash.as_deref(),
                err.sql_err(),
            ) {
                if let Some(existing) = find_by_idempotency_key(&state.orm, key).await? {
                    return replayed(existing, hash);
                }
            }
            return Err(err.into());
        }
    };

    tracing::info!(
        order_id = %order.id,
        items = product_ids.len(),
        total_price = order.total_price,
        "order placed"
    );
    audit::record(
        &state.orm,
        None,
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "email": order.email }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order created",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

/// Every order, newest first, with book references resolved.
pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let orders = newest_first(Orders::find()).all(&state.orm).await?;
    let items = resolve_orders(&state.orm, orders).await?;

    let meta = Meta::with_total(items.len());
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// Orders placed with `email`, newest first. An unknown email yields an empty list.
pub async fn list_orders_by_email(
    state: &AppState,
    email: &str,
) -> AppResult<ApiResponse<OrderList>> {
    let orders = newest_first(Orders::find().filter(OrderCol::Email.eq(email)))
        .all(&state.orm)
        .await?;
    let items = resolve_orders(&state.orm, orders).await?;

    let meta = Meta::with_total(items.len());
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetails>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let details = resolve_orders(&state.orm, vec![order])
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Order found", details, Some(Meta::empty())))
}

pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Orders::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(order_id = %id, "order deleted");
    audit::record(
        &state.orm,
        Some(&user.subject),
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order deleted successfully",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

fn newest_first(select: Select<Orders>) -> Select<Orders> {
    select
        .order_by_desc(OrderCol::CreatedAt)
        .order_by_desc(OrderCol::Id)
}

fn replayed(existing: OrderModel, request_hash: &str) -> AppResult<ApiResponse<Order>> {
    if existing.request_hash.as_deref() != Some(request_hash) {
        tracing::warn!(order_id = %existing.id, "idempotency key reused for a different order");
        return Err(AppError::Conflict(
            "Idempotency-Key was already used for a different order".to_string(),
        ));
    }
    tracing::info!(order_id = %existing.id, "duplicate order submission ignored");
    Ok(ApiResponse::success(
        "Order already placed",
        order_from_entity(existing)?,
        Some(Meta::empty()),
    ))
}

async fn find_by_idempotency_key<C: ConnectionTrait>(
    conn: &C,
    key: &str,
) -> AppResult<Option<OrderModel>> {
    Ok(Orders::find()
        .filter(OrderCol::IdempotencyKey.eq(key))
        .one(conn)
        .await?)
}

async fn verify_total(state: &AppState, payload: &CreateOrderRequest) -> AppResult<f64> {
    let verifier = &state.total_verifier;
    let lines = if verifier.requires_prices() {
        let books = load_books(&state.orm, &payload.product_ids).await?;
        payload
            .product_ids
            .iter()
            .map(|id| PricedLine {
                book_id: *id,
                price: books.get(id).map(|book| book.new_price),
            })
            .collect()
    } else {
        Vec::new()
    };
    verifier.verify(payload.total_price, &lines)
}

/// Fetch the catalog entries for `ids`; ids with no book are simply absent.
async fn load_books<C: ConnectionTrait>(conn: &C, ids: &[Uuid]) -> AppResult<HashMap<Uuid, Book>> {
    let unique: HashSet<Uuid> = ids.iter().copied().collect();
    if unique.is_empty() {
        return Ok(HashMap::new());
    }

    Books::find()
        .filter(BookCol::Id.is_in(unique))
        .all(conn)
        .await?
        .into_iter()
        .map(|model| book_from_entity(model).map(|book| (book.id, book)))
        .collect()
}

async fn resolve_orders<C: ConnectionTrait>(
    conn: &C,
    models: Vec<OrderModel>,
) -> AppResult<Vec<OrderDetails>> {
    let orders = models
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let referenced: Vec<Uuid> = orders
        .iter()
        .flat_map(|order| order.product_ids.iter().copied())
        .collect();
    let books = load_books(conn, &referenced).await?;

    Ok(orders
        .into_iter()
        .map(|order| {
            let resolved = order
                .product_ids
                .iter()
                .map(|id| match books.get(id) {
                    Some(book) => ResolvedBook::Available(book.clone()),
                    None => ResolvedBook::Missing { id: *id },
                })
                .collect();
            OrderDetails {
                order,
                books: resolved,
            }
        })
        .collect())
}

fn ids_to_json(ids: &[Uuid]) -> Value {
    Value::Array(ids.iter().map(|id| Value::String(id.to_string())).collect())
}

pub(crate) fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    let product_ids: Vec<Uuid> = serde_json::from_value(model.product_ids).map_err(|err| {
        AppError::Internal(anyhow::anyhow!(
            "order {} has malformed product ids: {err}",
            model.id
        ))
    })?;

    Ok(Order {
        id: model.id,
        name: model.name,
        email: model.email,
        phone: model.phone,
        address: Address {
            city: model.city,
            country: model.country,
            state: model.state,
            zipcode: model.zipcode,
        },
        product_ids,
        total_price: model.total_price,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}
