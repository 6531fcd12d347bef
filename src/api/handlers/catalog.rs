//! Categories, authors and publishers. Reads are public, writes need an admin.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    api::extractors::{AdminUser, Query, ValidatedJson},
    error::Result,
    models::{
        ApiResponse, Author, Category, CreateAuthorRequest, CreateCategoryRequest,
        CreatePublisherRequest, EmptyResponse, NameSearch, PaginatedResult, Pagination,
        Publisher, UpdateAuthorRequest, UpdateCategoryRequest, UpdatePublisherRequest,
    },
    services::AppState,
};

// =====================================
// Categories
// =====================================
/// GET /api/categories?search=&page=&per_page=
pub async fn list_categories(
    State(state): State<AppState>,
    Query(search): Query<NameSearch>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<PaginatedResult<Category>>>> {
    let page = state
        .category_service
        .list_paged(search.term(), &pagination)
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/categories/:id
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Category>>> {
    let category = state.category_service.get(&id).await?;
    Ok(Json(ApiResponse::success(category)))
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(request): ValidatedJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse> {
    let category = state.category_service.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(category))))
}

/// PUT /api/categories/:id
pub async fn update_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<Category>>> {
    let category = state.category_service.update(&id, request).await?;
    Ok(Json(ApiResponse::success(category)))
}

/// DELETE /api/categories/:id, refused with 409 while books use it.
pub async fn delete_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<EmptyResponse>> {
    state.category_service.delete(&id).await?;
    Ok(Json(EmptyResponse::ok("Category deleted")))
}

// =====================================
// Authors
// =====================================
/// GET /api/authors?search=&page=&per_page=
pub async fn list_authors(
    State(state): State<AppState>,
    Query(search): Query<NameSearch>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<PaginatedResult<Author>>>> {
    let page = state
        .author_service
        .list_paged(search.term(), &pagination)
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/authors/:id
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Author>>> {
    let author = state.author_service.get(&id).await?;
    Ok(Json(ApiResponse::success(author)))
}

/// POST /api/authors
pub async fn create_author(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(request): ValidatedJson<CreateAuthorRequest>,
) -> Result<impl IntoResponse> {
    let author = state.author_service.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(author))))
}

/// PUT /api/authors/:id
pub async fn update_author(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateAuthorRequest>,
) -> Result<Json<ApiResponse<Author>>> {
    let author = state.author_service.update(&id, request).await?;
    Ok(Json(ApiResponse::success(author)))
}

/// DELETE /api/authors/:id
pub async fn delete_author(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<EmptyResponse>> {
    state.author_service.delete(&id).await?;
    Ok(Json(EmptyResponse::ok("Author deleted")))
}

// =====================================
// Publishers
// =====================================
/// GET /api/publishers?search=&page=&per_page=
pub async fn list_publishers(
    State(state): State<AppState>,
    Query(search): Query<NameSearch>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<PaginatedResult<Publisher>>>> {
    let page = state
        .publisher_service
        .list_paged(search.term(), &pagination)
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/publishers/:id
pub async fn get_publisher(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Publisher>>> {
    let publisher = state.publisher_service.get(&id).await?;
    Ok(Json(ApiResponse::success(publisher)))
}

/// POST /api/publishers
pub async fn create_publisher(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(request): ValidatedJson<CreatePublisherRequest>,
) -> Result<impl IntoResponse> {
    let publisher = state.publisher_service.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(publisher))))
}

/// PUT /api/publishers/:id
pub async fn update_publisher(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdatePublisherRequest>,
) -> Result<Json<ApiResponse<Publisher>>> {
    let publisher = state.publisher_service.update(&id, request).await?;
    Ok(Json(ApiResponse::success(publisher)))
}

/// DELETE /api/publishers/:id
pub async fn delete_publisher(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<EmptyResponse>> {
    state.publisher_service.delete(&id).await?;
    Ok(Json(EmptyResponse::ok("Publisher deleted")))
}
