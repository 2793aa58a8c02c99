use std::sync::Arc;

use axum::{
    extract::State,
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::IntoResponse,
    Json,
};
use tracing::info;

use crate::{
    auth::{CurrentUser, Viewer},
    database::models::{recipe::Recipe, user::User},
    error::AppError,
    extract::{JsonBody, Path, Query},
    filters::{QueryParams, RecipeFilter},
    media::DecodedImage,
    state::AppState,
    store::{Mark, StoreError},
    validation::RecipeInput,
    views::{RecipeShortView, RecipeView},
};

const SHOPPING_LIST_FILE: &str = "shopping_list.txt";

fn ensure_can_edit(user: &User, recipe: &Recipe) -> Result<(), AppError> {
    if recipe.author_id == user.id || user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

async fn store_image(state: &AppState, image: Option<&DecodedImage>) -> Result<Option<String>, AppError> {
    match image {
        Some(image) => state
            .media
            .save_recipe_image(image)
            .await
            .map(Some)
            .map_err(|e| AppError::Internal(format!("Failed to store image: {e}"))),
        None => Ok(None),
    }
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Viewer(viewer): Viewer,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<RecipeView>>, AppError> {
    let filter = RecipeFilter::from_params(&QueryParams::from_pairs(pairs))?;
    let Some(query) = filter.resolve(viewer.as_ref()) else {
        return Ok(Json(Vec::new()));
    };

    let recipes = state
        .run(move |store| {
            let recipes = store.recipes(&query)?;
            Ok(RecipeView::build_all(store, recipes, viewer.as_ref())?)
        })
        .await?;

    Ok(Json(recipes))
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    Viewer(viewer): Viewer,
    Path(id): Path<i32>,
) -> Result<Json<RecipeView>, AppError> {
    let recipe = state
        .run(move |store| {
            let recipe = store.recipe(id)?;
            Ok(RecipeView::build(store, recipe, viewer.as_ref())?)
        })
        .await?;

    Ok(Json(recipe))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    JsonBody(input): JsonBody<RecipeInput>,
) -> Result<impl IntoResponse, AppError> {
    let form = input.validate(true)?;
    let image = store_image(&state, form.image.as_ref()).await?;
    let draft = form.into_draft(image);

    let recipe = state
        .run(move |store| {
            let recipe = store.create_recipe(user.id, &draft)?;
            info!("{} created recipe {}", user.username, recipe.id);
            Ok(RecipeView::build(store, recipe, Some(&user))?)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(recipe)))
}

/// Replaces every field, the tag set and the ingredient list. Without an
/// image the stored one is kept. The author never changes.
pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    JsonBody(input): JsonBody<RecipeInput>,
) -> Result<Json<RecipeView>, AppError> {
    let editor = user.clone();
    state
        .run(move |store| ensure_can_edit(&editor, &store.recipe(id)?))
        .await?;

    let form = input.validate(false)?;
    let image = store_image(&state, form.image.as_ref()).await?;
    let draft = form.into_draft(image);

    let recipe = state
        .run(move |store| {
            let recipe = store.update_recipe(id, &draft)?;
            info!("{} updated recipe {id}", user.username);
            Ok(RecipeView::build(store, recipe, Some(&user))?)
        })
        .await?;

    Ok(Json(recipe))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state
        .run(move |store| {
            ensure_can_edit(&user, &store.recipe(id)?)?;
            store.delete_recipe(id)?;
            info!("{} deleted recipe {id}", user.username);
            Ok(())
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn mark_place(mark: Mark) -> &'static str {
    match mark {
        Mark::Favorite => "favorites",
        Mark::ShoppingCart => "the shopping cart",
    }
}

async fn add_mark(
    state: &AppState,
    mark: Mark,
    user: User,
    id: i32,
) -> Result<(StatusCode, Json<RecipeShortView>), AppError> {
    let recipe = state
        .run(move |store| {
            let recipe = store.recipe(id)?;
            store
                .add_mark(mark, user.id, id)
                .map_err(|error| match error {
                    StoreError::AlreadyExists => {
                        AppError::rejected(format!("Recipe is already in {}", mark_place(mark)))
                    }
                    other => other.into(),
                })?;
            info!("{} added recipe {id} to {}", user.username, mark_place(mark));
            Ok(recipe)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(recipe.into())))
}

async fn remove_mark(state: &AppState, mark: Mark, user: User, id: i32) -> Result<StatusCode, AppError> {
    state
        .run(move |store| {
            store.recipe(id)?;
            store
                .remove_mark(mark, user.id, id)
                .map_err(|error| match error {
                    StoreError::Absent => {
                        AppError::rejected(format!("Recipe is not in {}", mark_place(mark)))
                    }
                    other => other.into(),
                })?;
            info!("{} removed recipe {id} from {}", user.username, mark_place(mark));
            Ok(())
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeShortView>), AppError> {
    add_mark(&state, Mark::Favorite, user, id).await
}

pub async fn unfavorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    remove_mark(&state, Mark::Favorite, user, id).await
}

pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeShortView>), AppError> {
    add_mark(&state, Mark::ShoppingCart, user, id).await
}

pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    remove_mark(&state, Mark::ShoppingCart, user, id).await
}

/// One `Name (unit) - total` line per ingredient in the cart.
pub async fn download_shopping_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user_id = user.id;
    let list = state
        .run(move |store| Ok(store.shopping_list(user_id)?))
        .await?;
    info!(
        "{} downloaded a shopping list of {} items",
        user.username,
        list.len()
    );

    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{SHOPPING_LIST_FILE}\""),
            ),
        ],
        list.render(),
    ))
}
