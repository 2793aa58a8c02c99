use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{error::AppError, extract::Path, state::AppState, views::TagView};

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<TagView>>, AppError> {
    let tags = state.run(|store| Ok(store.tags()?)).await?;

    Ok(Json(tags.into_iter().map(TagView::from).collect()))
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<TagView>, AppError> {
    let tag = state.run(move |store| Ok(store.tag(id)?)).await?;

    Ok(Json(tag.into()))
}
