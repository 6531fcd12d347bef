//! # Book handlers
//!
//! Catalogue reads are public. Writes and photo management need an admin.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection}, Multipart, Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    api::extractors::{AdminUser, Query, ValidatedJson},
    error::{AppError, Result},
    models::{
        ApiResponse, BookDetails, BookFilter, BookPhoto, BookSummary, CreateBookRequest,
        EmptyResponse, PaginatedResult, Pagination, UpdateBookRequest,
    },
    services::{AppState, PhotoUpload},
};

/// GET /api/books?search=&category_id=&min_price=&sort_by=&order=&page=&per_page=
pub async fn list_books(
    State(state): State<AppState>,
    Query(filter): Query<BookFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<PaginatedResult<BookSummary>>>> {
    let books = state.book_service.list_paged(&filter, &pagination).await?;
    Ok(Json(ApiResponse::success(books)))
}

/// GET /api/books/:id
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BookDetails>>> {
    let book = state.book_service.get(&id).await?;
    Ok(Json(ApiResponse::success(book)))
}

/// POST /api/books
pub async fn create_book(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(request): ValidatedJson<CreateBookRequest>,
) -> Result<impl IntoResponse> {
    let book = state.book_service.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(book))))
}

/// PUT /api/books/:id
pub async fn update_book(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateBookRequest>,
) -> Result<Json<ApiResponse<BookDetails>>> {
    let book = state.book_service.update(&id, request).await?;
    Ok(Json(ApiResponse::success(book)))
}

/// DELETE /api/books/:id
pub async fn delete_book(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<EmptyResponse>> {
    state.book_service.delete(&id).await?;
    Ok(Json(EmptyResponse::ok("Book deleted")))
}

// =====================================
// Photos
// =====================================
/// POST /api/books/:id/photos, multipart with a `file` field.
pub async fn upload_photo(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let mut multipart = multipart?;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(ToString::to_string);
        let content_type = field
            .content_type()
            .map(ToString::to_string)
            .unwrap_or_default();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        upload = Some(PhotoUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload =
        upload.ok_or_else(|| AppError::BadRequest("Multipart field 'file' is required".into()))?;
    let photo = state.book_service.add_photo(&id, upload).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(photo))))
}

/// DELETE /api/books/:id/photos/:photo_id
pub async fn delete_photo(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((id, photo_id)): Path<(String, String)>,
) -> Result<Json<EmptyResponse>> {
    state.book_service.delete_photo(&id, &photo_id).await?;
    Ok(Json(EmptyResponse::ok("Photo deleted")))
}

/// PUT /api/books/:id/photos/:photo_id/main
pub async fn set_main_photo(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((id, photo_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<BookPhoto>>>> {
    let photos = state.book_service.set_main_photo(&id, &photo_id).await?;
    Ok(Json(ApiResponse::success(photos)))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}
