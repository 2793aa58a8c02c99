use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{
    error::AppError,
    extract::{Path, Query},
    state::AppState,
    views::IngredientView,
};

#[derive(Deserialize, Debug, Default)]
pub struct IngredientSearch {
    name: Option<String>,
}

/// `?name=` narrows the list to ingredients whose name starts with the value.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(search): Query<IngredientSearch>,
) -> Result<Json<Vec<IngredientView>>, AppError> {
    let prefix = search.name.filter(|name| !name.is_empty());
    let ingredients = state
        .run(move |store| Ok(store.ingredients(prefix.as_deref())?))
        .await?;

    Ok(Json(
        ingredients.into_iter().map(IngredientView::from).collect(),
    ))
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<IngredientView>, AppError> {
    let ingredient = state.run(move |store| Ok(store.ingredient(id)?)).await?;

    Ok(Json(ingredient.into()))
}
