//! Query-string parsing for the list endpoints.

use std::{collections::HashMap, str::FromStr};

use crate::{
    database::models::user::User,
    error::AppError,
    store::{Mark, MarkFilter, RecipeQuery},
};

/// Query parameters with repeatable keys, in arrival order per key.
#[derive(Debug, Default)]
pub struct QueryParams {
    inner: HashMap<String, Vec<String>>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.add_param(&key, &value);
        }
        params
    }

    pub fn add_param(&mut self, key: &str, value: &str) {
        self.inner
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.inner
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn all(&self, key: &str) -> &[String] {
        self.inner.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, AppError> {
        self.first(key)
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| AppError::BadRequest(format!("Invalid value for {key}: {value:?}")))
            })
            .transpose()
    }

    /// Boolean flag, spelled `1`/`0` or `true`/`false`.
    pub fn flag(&self, key: &str) -> Result<Option<bool>, AppError> {
        self.first(key)
            .map(|value| match value.to_ascii_lowercase().as_str() {
                "1" | "true" => Ok(true),
                "0" | "false" => Ok(false),
                _ => Err(AppError::BadRequest(format!(
                    "Invalid value for {key}: {value:?}"
                ))),
            })
            .transpose()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<i32>,
    pub tags: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeFilter {
    pub fn from_params(params: &QueryParams) -> Result<Self, AppError> {
        Ok(Self {
            author: params.parse("author")?,
            tags: params.all("tags").to_vec(),
            is_favorited: params.flag("is_favorited")?,
            is_in_shopping_cart: params.flag("is_in_shopping_cart")?,
        })
    }

    /// Binds the flag filters to `viewer`.
    ///
    /// `None` means nothing can match: an anonymous viewer asked for recipes
    /// they marked. A false flag from an anonymous viewer is ignored.
    pub fn resolve(self, viewer: Option<&User>) -> Option<RecipeQuery> {
        let mut marks = Vec::new();
        for (mark, flag) in [
            (Mark::Favorite, self.is_favorited),
            (Mark::ShoppingCart, self.is_in_shopping_cart),
        ] {
            match (flag, viewer) {
                (None, _) => {}
                (Some(true), None) => return None,
                (Some(false), None) => {}
                (Some(present), Some(user)) => marks.push(MarkFilter {
                    mark,
                    user_id: user.id,
                    present,
                }),
            }
        }

        Some(RecipeQuery {
            author: self.author,
            tags: self.tags,
            marks,
        })
    }
}
