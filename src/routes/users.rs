use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use crate::{
    auth::{hash_password, CurrentUser, Viewer},
    database::models::user::NewUser,
    error::{AppError, FieldErrors},
    extract::{JsonBody, Path, Query},
    filters::QueryParams,
    state::AppState,
    store::{Store, StoreError, StoreResult},
    validation::UserInput,
    views::{CreatedUserView, SubscriptionView, UserView},
};

fn recipes_limit(pairs: Vec<(String, String)>) -> Result<Option<i64>, AppError> {
    let limit: Option<u32> = QueryParams::from_pairs(pairs).parse("recipes_limit")?;
    Ok(limit.map(i64::from))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Viewer(viewer): Viewer,
) -> Result<Json<Vec<UserView>>, AppError> {
    let users = state
        .run(move |store| {
            let users = store
                .users()?
                .into_iter()
                .map(|user| UserView::build(store, user, viewer.as_ref()))
                .collect::<StoreResult<Vec<_>>>()?;
            Ok(users)
        })
        .await?;

    Ok(Json(users))
}

/// Field-keyed errors for an email or username already in use.
fn credential_errors(store: &dyn Store, email: &str, username: &str) -> StoreResult<FieldErrors> {
    let (email_taken, username_taken) = store.taken_credentials(email, username)?;
    let mut errors = FieldErrors::new();
    if email_taken {
        errors.add("email", "A user with that email already exists.");
    }
    if username_taken {
        errors.add("username", "A user with that username already exists.");
    }
    Ok(errors)
}

/// A unique violation on insert means a concurrent registration took the
/// credentials after the check; report it the same way the check would.
fn registration_error(store: &dyn Store, error: StoreError, email: &str, username: &str) -> AppError {
    match error {
        StoreError::AlreadyExists => match credential_errors(store, email, username) {
            Ok(errors) if !errors.is_empty() => AppError::Validation(errors),
            Ok(_) => StoreError::AlreadyExists.into(),
            Err(other) => other.into(),
        },
        other => other.into(),
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<UserInput>,
) -> Result<(StatusCode, Json<CreatedUserView>), AppError> {
    let form = input.validate()?;
    let iterations = state.config.password_iterations;

    let user = state
        .run(move |store| {
            credential_errors(store, &form.email, &form.username)?.into_result(())?;

            let (email, username) = (form.email.clone(), form.username.clone());
            let user = store
                .create_user(NewUser::new(
                    form.email,
                    form.username,
                    form.first_name,
                    form.last_name,
                    hash_password(&form.password, iterations),
                ))
                .map_err(|error| registration_error(store, error, &email, &username))?;
            info!("Registered user {} ({})", user.username, user.id);
            Ok(user)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserView>, AppError> {
    let view = state
        .run(move |store| Ok(UserView::build(store, user.clone(), Some(&user))?))
        .await?;

    Ok(Json(view))
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    Viewer(viewer): Viewer,
    Path(id): Path<i32>,
) -> Result<Json<UserView>, AppError> {
    let view = state
        .run(move |store| {
            let user = store.user(id)?;
            Ok(UserView::build(store, user, viewer.as_ref())?)
        })
        .await?;

    Ok(Json(view))
}

/// Followed authors with their latest recipes, capped by `?recipes_limit=`.
pub async fn subscriptions(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<SubscriptionView>>, AppError> {
    let limit = recipes_limit(pairs)?;

    let subscriptions = state
        .run(move |store| {
            let subscriptions = store
                .followings(user.id)?
                .into_iter()
                .map(|author| SubscriptionView::build(store, author, &user, limit))
                .collect::<StoreResult<Vec<_>>>()?;
            Ok(subscriptions)
        })
        .await?;

    Ok(Json(subscriptions))
}

pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<(StatusCode, Json<SubscriptionView>), AppError> {
    if id == user.id {
        return Err(AppError::rejected("You can't subscribe to yourself"));
    }
    let limit = recipes_limit(pairs)?;

    let subscription = state
        .run(move |store| {
            let author = store.user(id)?;
            store
                .follow(user.id, author.id)
                .map_err(|error| match error {
                    StoreError::AlreadyExists => {
                        AppError::rejected("You are already subscribed to this user")
                    }
                    StoreError::Constraint(_) => {
                        AppError::rejected("You can't subscribe to yourself")
                    }
                    other => other.into(),
                })?;
            info!("{} subscribed to {}", user.username, author.username);
            Ok(SubscriptionView::build(store, author, &user, limit)?)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state
        .run(move |store| {
            store.user(id)?;
            store.unfollow(user.id, id).map_err(|error| match error {
                StoreError::Absent => AppError::rejected("Subscription does not exist"),
                other => other.into(),
            })?;
            info!("{} unsubscribed from {id}", user.username);
            Ok(())
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
