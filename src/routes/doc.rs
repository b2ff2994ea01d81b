use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        books::{BookFields, BookList},
        orders::{CreateOrderRequest, OrderDetails, OrderList},
    },
    models::{Address, AdminSummary, Book, Category, MonthlySales, Order, ResolvedBook},
    response::{ApiResponse, Meta},
    routes::{admin, books, health, orders},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        books::list_books,
        books::get_book,
        books::get_book_image,
        books::create_book,
        books::update_book,
        books::delete_book,
        orders::create_order,
        orders::list_orders,
        orders::list_orders_by_email,
        orders::get_order,
        orders::delete_order,
        admin::summary
    ),
    components(
        schemas(
            Book,
            Category,
            BookFields,
            BookList,
            Address,
            Order,
            ResolvedBook,
            CreateOrderRequest,
            OrderDetails,
            OrderList,
            MonthlySales,
            AdminSummary,
            health::HealthData,
            Meta,
            ApiResponse<Book>,
            ApiResponse<BookList>,
            ApiResponse<Order>,
            ApiResponse<OrderDetails>,
            ApiResponse<OrderList>,
            ApiResponse<AdminSummary>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Books", description = "Catalog and cover image endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Admin", description = "Admin dashboard endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
