//! Catalog Handlers

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::models::{Category, CategoryCreate, CategoryWithItems, Item, ItemCreate, ItemUpdate};
use shared::{AppError, ErrorCode, Money};

use crate::core::ServerState;
use crate::db::repository::{RepoError, catalog};
use crate::utils::validation::{
    MAX_CATEGORY_NAME_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_name,
    validate_optional_text,
};

/// Lowest accepted item price (1 paisa)
const MIN_PRICE: Money = Money::from_minor(1);

#[derive(Debug, Deserialize)]
pub struct ItemQuery {
    pub category_id: Option<i64>,
}

fn validate_price(price: Money) -> Result<(), AppError> {
    if price < MIN_PRICE {
        return Err(AppError::with_message(
            ErrorCode::ItemInvalidPrice,
            format!("Price must be at least {MIN_PRICE}"),
        ));
    }
    Ok(())
}

async fn ensure_category(state: &ServerState, category_id: i64) -> Result<Category, AppError> {
    catalog::find_category(state.pool(), category_id)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::CategoryNotFound).with_detail("category_id", category_id)
        })
}

fn item_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::ItemNotFound).with_detail("item_id", id)
}

/// GET /api/items/categories - 菜单 (分类 + 可售菜品)
pub async fn menu(State(state): State<ServerState>) -> Result<Json<Vec<CategoryWithItems>>, AppError> {
    let categories = catalog::find_active_categories(state.pool()).await?;
    let mut by_category: HashMap<i64, Vec<Item>> = HashMap::new();
    for item in catalog::find_available_items(state.pool(), None).await? {
        by_category.entry(item.category_id).or_default().push(item);
    }

    let menu = categories
        .into_iter()
        .map(|category| {
            let items = by_category.remove(&category.id).unwrap_or_default();
            CategoryWithItems { category, items }
        })
        .collect();
    Ok(Json(menu))
}

/// GET /api/items - 可售菜品
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ItemQuery>,
) -> Result<Json<Vec<Item>>, AppError> {
    let items = catalog::find_available_items(state.pool(), query.category_id).await?;
    Ok(Json(items))
}

/// POST /api/items/categories
pub async fn create_category(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    validate_name(&payload.name, "name", MAX_CATEGORY_NAME_LEN)?;
    validate_optional_text(&payload.image, "image", MAX_URL_LEN)?;

    let category =
        match catalog::create_category(state.pool(), payload.name.trim(), payload.image.as_deref())
            .await
        {
            Ok(category) => category,
            Err(RepoError::Duplicate(_)) => {
                return Err(AppError::new(ErrorCode::CategoryNameExists)
                    .with_detail("name", payload.name.trim()));
            }
            Err(e) => return Err(e.into()),
        };

    tracing::info!(category_id = category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// POST /api/items
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ItemCreate>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    validate_name(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.image, "image", MAX_URL_LEN)?;
    validate_price(payload.price)?;
    ensure_category(&state, payload.category_id).await?;

    let item = catalog::create_item(
        state.pool(),
        catalog::NewItem {
            name: payload.name.trim().to_string(),
            description: payload.description,
            price: payload.price,
            category_id: payload.category_id,
            image: payload.image,
            is_available: payload.is_available.unwrap_or(true),
        },
    )
    .await?;

    tracing::info!(item_id = item.id, name = %item.name, price = %item.price, "Item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/items/{id}
///
/// Order lines keep the price captured at purchase time, so a price change
/// only affects new orders.
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ItemUpdate>,
) -> Result<Json<Item>, AppError> {
    if let Some(name) = &payload.name {
        validate_name(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.image, "image", MAX_URL_LEN)?;
    if let Some(price) = payload.price {
        validate_price(price)?;
    }
    if let Some(category_id) = payload.category_id {
        ensure_category(&state, category_id).await?;
    }

    let patch = catalog::ItemPatch {
        name: payload.name.map(|n| n.trim().to_string()),
        description: payload.description,
        price: payload.price,
        category_id: payload.category_id,
        image: payload.image,
        is_available: payload.is_available,
    };

    match catalog::update_item(state.pool(), id, patch).await {
        Ok(item) => Ok(Json(item)),
        Err(RepoError::NotFound(_)) => Err(item_not_found(id)),
        Err(e) => Err(e.into()),
    }
}

/// DELETE /api/items/{id}
///
/// Items referenced by any order stay in place; mark them unavailable instead.
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<bool>, AppError> {
    let item = catalog::find_item(state.pool(), id)
        .await?
        .ok_or_else(|| item_not_found(id))?;

    let order_lines = catalog::count_item_orders(state.pool(), id).await?;
    if order_lines > 0 {
        return Err(AppError::with_message(
            ErrorCode::ItemHasOrders,
            format!("Item '{}' has been ordered; mark it unavailable instead", item.name),
        )
        .with_detail("item_id", id)
        .with_detail("order_lines", order_lines));
    }

    catalog::delete_item(state.pool(), id).await?;
    tracing::info!(item_id = id, name = %item.name, "Item deleted");
    Ok(Json(true))
}
