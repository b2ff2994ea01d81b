use axum::{
    Json, Router,
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::books::{BookFields, BookList, BookPayload, ImageUpload},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Book,
    response::ApiResponse,
    routes::PathParam,
    services::book_service,
    state::AppState,
};

pub const COVER_IMAGE_FIELD: &str = "coverImage";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/image/{image_ref}", get(get_book_image))
        .route("/{id}", get(get_book).put(update_book).delete(delete_book))
}

/// Book form submitted either as `multipart/form-data` (with an optional
/// `coverImage` file part) or as a JSON body without an image.
impl FromRequest<AppState> for BookPayload {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|err| AppError::Validation(err.body_text()))?;
            read_multipart(multipart).await
        } else {
            let Json(fields) = Json::<BookFields>::from_request(req, state)
                .await
                .map_err(|err| AppError::Validation(err.body_text()))?;
            Ok(BookPayload::json(fields))
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> AppResult<BookPayload> {
    let mut payload = BookPayload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Validation(err.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_owned();

        if name == COVER_IMAGE_FIELD {
            let content_type = field.content_type().unwrap_or_default().to_owned();
            let has_file_name = field.file_name().is_some_and(|f| !f.is_empty());
            let bytes = field
                .bytes()
                .await
                .map_err(|err| AppError::Validation(err.body_text()))?;
            // Browsers send an empty, unnamed part when no file was picked.
            if bytes.is_empty() && !has_file_name {
                continue;
            }
            payload.image = Some(ImageUpload {
                bytes: bytes.to_vec(),
                content_type,
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|err| AppError::Validation(err.body_text()))?;
        let fields = &mut payload.fields;
        match name.as_str() {
            "title" => fields.title = Some(value),
            "author" => fields.author = Some(value),
            "description" => fields.description = Some(value),
            "category" => fields.category = Some(value),
            // A blank `oldPrice` clears the discount.
            "oldPrice" => fields.old_price = Some(parse_optional_price("oldPrice", &value)?),
            "newPrice" => fields.new_price = parse_optional_price("newPrice", &value)?,
            "trending" => fields.trending = Some(parse_flag(&value)),
            other => tracing::debug!(field = %other, "ignoring unknown book form field"),
        }
    }

    Ok(payload)
}

fn parse_optional_price(field: &str, raw: &str) -> AppResult<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| AppError::validation(format!("{field} must be a number")))
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "on" | "1" | "yes"
    )
}

#[utoipa::path(
    get,
    path = "/api/books",
    responses(
        (status = 200, description = "List every book", body = ApiResponse<BookList>),
        (status = 500, description = "Internal Server Error"),
    ),
    tag = "Books"
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<ApiResponse<BookList>>> {
    let resp = book_service::list_books(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Get book", body = ApiResponse<Book>),
        (status = 404, description = "Book not found"),
    ),
    tag = "Books"
)]
pub async fn get_book(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let resp = book_service::get_book(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/books/image/{image_ref}",
    params(
        ("image_ref" = String, Path, description = "Image reference from `coverImage`")
    ),
    responses(
        (status = 200, description = "Raw image bytes with their stored content type"),
        (status = 404, description = "Unknown image reference"),
    ),
    tag = "Books"
)]
pub async fn get_book_image(
    State(state): State<AppState>,
    PathParam(image_ref): PathParam<String>,
) -> AppResult<Response> {
    let image = book_service::get_book_image(&state, &image_ref).await?;
    Ok(([(header::CONTENT_TYPE, image.content_type)], image.bytes).into_response())
}

#[utoipa::path(
    post,
    path = "/api/books",
    request_body(content = BookFields, content_type = "multipart/form-data", description = "Book fields plus an optional `coverImage` file part; JSON without an image is also accepted"),
    responses(
        (status = 200, description = "Create book", body = ApiResponse<Book>),
        (status = 400, description = "Invalid book fields or image"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Books"
)]
pub async fn create_book(
    State(state): State<AppState>,
    user: AuthUser,
    req: Request,
) -> AppResult<Json<ApiResponse<Book>>> {
    // Authorize before the body is read.
    ensure_admin(&user)?;
    let payload = BookPayload::from_request(req, &state).await?;
    let resp = book_service::create_book(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/books/{id}",
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    request_body(content = BookFields, content_type = "multipart/form-data", description = "Fields to change; a `coverImage` part replaces the cover"),
    responses(
        (status = 200, description = "Updated book", body = ApiResponse<Book>),
        (status = 400, description = "Invalid book fields or image"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Book not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Books"
)]
pub async fn update_book(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<Uuid>,
    req: Request,
) -> AppResult<Json<ApiResponse<Book>>> {
    ensure_admin(&user)?;
    let payload = BookPayload::from_request(req, &state).await?;
    let resp = book_service::update_book(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Deleted book"),
        (status = 404, description = "Book not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Books"
)]
pub async fn delete_book(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = book_service::delete_book(&state, &user, id).await?;
    Ok(Json(resp))
}
