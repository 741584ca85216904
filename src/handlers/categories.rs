use crate::handlers::{bad_request, db_error, not_found, ApiError};
use crate::schemas::{ApiResponse, AppState, UserScope};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use model::entities::category::{self, CategoryKind};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

/// Request body for creating a new category
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateCategoryRequest {
    /// Owner user ID
    pub owner_id: i32,
    /// Category name
    pub name: String,
    /// Category kind
    pub kind: CategoryKind,
    /// Display color
    pub color: Option<String>,
    /// Display icon
    pub icon: Option<String>,
    /// Parent category for subcategories
    pub parent_id: Option<i32>,
}

/// Request body for updating a category
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Query parameters for listing categories
#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoriesQuery {
    /// Owner user ID
    pub user_id: i32,
    /// Return a flat list instead of the parent/child tree
    pub flat: Option<bool>,
}

/// Category response model; subcategories nest under their parent
/// unless a flat listing was requested
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub owner_id: i32,
    pub name: String,
    pub kind: CategoryKind,
    pub color: String,
    pub icon: String,
    pub parent_id: Option<i32>,
    pub is_active: bool,
    pub children: Vec<CategoryResponse>,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            kind: model.kind,
            color: model.color,
            icon: model.icon,
            parent_id: model.parent_id,
            is_active: model.is_active,
            children: Vec::new(),
        }
    }
}

/// Nests subcategories under their parents. Categories arrive ordered
/// by name, and both levels keep that order.
fn build_tree(categories: Vec<category::Model>) -> Vec<CategoryResponse> {
    let (roots, children): (Vec<_>, Vec<_>) = categories
        .into_iter()
        .partition(|c| c.parent_id.is_none());

    let mut tree: Vec<CategoryResponse> = roots.into_iter().map(CategoryResponse::from).collect();
    for child in children {
        if let Some(parent) = tree.iter_mut().find(|r| Some(r.id) == child.parent_id) {
            parent.children.push(CategoryResponse::from(child));
        }
    }
    tree
}

async fn find_owned_category(
    state: &AppState,
    category_id: i32,
    user_id: i32,
) -> Result<category::Model, ApiError> {
    category::Entity::find_by_id(category_id)
        .filter(category::Column::OwnerId.eq(user_id))
        .one(&state.db)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found("category"))
}

/// Create a new category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created successfully", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Parent category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), ApiError> {
    debug!(
        "Creating category '{}' for owner {}",
        request.name, request.owner_id
    );

    // A subcategory must hang off a top-level category of the same
    // user and kind; the hierarchy is one level deep.
    if let Some(parent_id) = request.parent_id {
        let parent = find_owned_category(&state, parent_id, request.owner_id).await?;
        if parent.kind != request.kind {
            return Err(bad_request(
                "a subcategory must have the same kind as its parent",
            ));
        }
        if parent.parent_id.is_some() {
            return Err(bad_request("categories can only nest one level deep"));
        }
    }

    let created = category::ActiveModel {
        owner_id: Set(request.owner_id),
        name: Set(request.name),
        kind: Set(request.kind),
        color: Set(request.color.unwrap_or_else(|| "#9e9e9e".to_string())),
        icon: Set(request.icon.unwrap_or_else(|| "tag".to_string())),
        parent_id: Set(request.parent_id),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(db_error)?;

    info!("Category created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CategoryResponse::from(created),
            message: "Category created successfully".to_string(),
            success: true,
        }),
    ))
}

/// Get the user's active categories as a parent/child tree
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "categories",
    params(CategoriesQuery),
    responses(
        (status = 200, description = "Categories retrieved successfully", body = ApiResponse<Vec<CategoryResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_categories(
    Query(query): Query<CategoriesQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CategoryResponse>>>, ApiError> {
    let categories = category::Entity::find()
        .filter(category::Column::OwnerId.eq(query.user_id))
        .filter(category::Column::IsActive.eq(true))
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await
        .map_err(db_error)?;
    debug!(
        "Retrieved {} categories for user {}",
        categories.len(),
        query.user_id
    );

    let data = if query.flat.unwrap_or(false) {
        categories.into_iter().map(CategoryResponse::from).collect()
    } else {
        build_tree(categories)
    };

    Ok(Json(ApiResponse {
        data,
        message: "Categories retrieved successfully".to_string(),
        success: true,
    }))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/v1/categories/{category_id}",
    tag = "categories",
    params(
        ("category_id" = i32, Path, description = "Category ID"),
        UserScope,
    ),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated successfully", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_category(
    Path(category_id): Path<i32>,
    Query(scope): Query<UserScope>,
    State(state): State<AppState>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryResponse>>, ApiError> {
    let existing = find_owned_category(&state, category_id, scope.user_id).await?;

    let mut active: category::ActiveModel = existing.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(color) = request.color {
        active.color = Set(color);
    }
    if let Some(icon) = request.icon {
        active.icon = Set(icon);
    }

    let updated = active.update(&state.db).await.map_err(db_error)?;
    info!("Category with ID {} updated successfully", updated.id);

    Ok(Json(ApiResponse {
        data: CategoryResponse::from(updated),
        message: "Category updated successfully".to_string(),
        success: true,
    }))
}

/// Deactivate a category
///
/// Categories are soft-deleted so old transactions keep their label.
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{category_id}",
    tag = "categories",
    params(
        ("category_id" = i32, Path, description = "Category ID"),
        UserScope,
    ),
    responses(
        (status = 200, description = "Category deactivated successfully", body = ApiResponse<String>),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_category(
    Path(category_id): Path<i32>,
    Query(scope): Query<UserScope>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let existing = find_owned_category(&state, category_id, scope.user_id).await?;

    let mut active: category::ActiveModel = existing.into();
    active.is_active = Set(false);
    active.update(&state.db).await.map_err(db_error)?;

    state.cache.invalidate_all();
    info!("Category with ID {} deactivated", category_id);

    Ok(Json(ApiResponse {
        data: format!("Category {} deactivated", category_id),
        message: "Category deactivated successfully".to_string(),
        success: true,
    }))
}
