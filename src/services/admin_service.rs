use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, sea_query::Expr,
};

use crate::{
    entity::{
        books::{Column as BookCol, Entity as Books},
        orders::{Column as OrderCol, Entity as Orders},
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::{AdminSummary, MonthlySales},
    pricing::round_to_cents,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Dashboard figures, recomputed from the full collections on every call.
pub async fn summary(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<AdminSummary>> {
    ensure_admin(user)?;

    let total_books = Books::find().count(&state.orm).await?;
    let trending_books = Books::find()
        .filter(BookCol::Trending.eq(true))
        .count(&state.orm)
        .await?;
    let total_orders = Orders::find().count(&state.orm).await?;

    let total_sales: Option<f64> = Orders::find()
        .select_only()
        .column_as(Expr::col(OrderCol::TotalPrice).sum(), "total_sales")
        .into_tuple::<Option<f64>>()
        .one(&state.orm)
        .await?
        .flatten();

    let sales: Vec<(DateTime<FixedOffset>, f64)> = Orders::find()
        .select_only()
        .column(OrderCol::CreatedAt)
        .column(OrderCol::TotalPrice)
        .into_tuple()
        .all(&state.orm)
        .await?;

    let summary = AdminSummary {
        total_books,
        total_sales: round_to_cents(total_sales.unwrap_or(0.0)),
        total_orders,
        trending_books,
        monthly_sales: monthly_sales(&sales),
    };
    Ok(ApiResponse::success(
        "Admin summary",
        summary,
        Some(Meta::empty()),
    ))
}

/// Group order totals by UTC calendar month, oldest month first.
fn monthly_sales(sales: &[(DateTime<FixedOffset>, f64)]) -> Vec<MonthlySales> {
    let mut months: BTreeMap<String, (f64, u64)> = BTreeMap::new();
    for (created_at, total) in sales {
        let month = created_at.naive_utc().format("%Y-%m").to_string();
        let entry = months.entry(month).or_insert((0.0, 0));
        entry.0 += total;
        entry.1 += 1;
    }

    months
        .into_iter()
        .map(|(month, (total, count))| MonthlySales {
            month,
            total_sales: round_to_cents(total),
            order_count: count,
        })
        .collect()
}
