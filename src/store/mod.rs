//! Persistence seam.
//!
//! Everything above this module talks to a [`Store`]. [`pg::PgStore`] runs the
//! queries against PostgreSQL through diesel; [`memory::MemoryStore`] keeps the
//! same tables in process and enforces the same constraints.

use diesel::r2d2::PoolError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::{
    database::models::{
        ingredient::Ingredient,
        ingredient_amount::IngredientAmount,
        recipe::{NewRecipe, Recipe, RecipeChanges},
        tag::Tag,
        user::{NewUser, User},
    },
    shopping_list::ShoppingList,
};

pub mod memory;
pub mod pg;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Row already exists")]
    AlreadyExists,

    #[error("Row does not exist")]
    Absent,

    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Database error: {0}")]
    Database(DieselError),

    #[error("Connection pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Store lock poisoned")]
    Poisoned,
}

impl From<DieselError> for StoreError {
    fn from(error: DieselError) -> Self {
        match error {
            DieselError::NotFound => StoreError::NotFound("Row"),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                StoreError::AlreadyExists
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                StoreError::NotFound("Referenced row")
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                StoreError::Constraint(info.message().to_owned())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Per-user recipe flags backed by a (user, recipe) table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    Favorite,
    ShoppingCart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkFilter {
    pub mark: Mark,
    pub user_id: i32,
    pub present: bool,
}

/// Recipe list filter, already resolved against the requesting user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeQuery {
    pub author: Option<i32>,
    /// Matches recipes carrying any of these tag slugs.
    pub tags: Vec<String>,
    pub marks: Vec<MarkFilter>,
}

/// Validated recipe write.
///
/// Tag and ingredient ids are unique, amounts and cooking time positive. The
/// store still checks that every referenced row exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub cooking_time: i16,
    pub image: Option<String>,
    pub tags: Vec<i32>,
    pub ingredients: Vec<(i32, i16)>,
}

impl RecipeDraft {
    pub fn new_recipe(&self, author_id: i32) -> StoreResult<NewRecipe> {
        let image = self
            .image
            .clone()
            .ok_or_else(|| StoreError::Constraint("recipe image is required".to_string()))?;

        Ok(NewRecipe::new(
            author_id,
            self.name.clone(),
            image,
            self.text.clone(),
            self.cooking_time,
        ))
    }

    pub fn changes(&self) -> RecipeChanges {
        RecipeChanges::new(
            self.name.clone(),
            self.image.clone(),
            self.text.clone(),
            self.cooking_time,
        )
    }

    pub fn ingredient_ids(&self) -> Vec<i32> {
        self.ingredients.iter().map(|&(id, _)| id).collect()
    }
}

pub trait Store: Send + Sync {
    fn create_user(&self, user: NewUser) -> StoreResult<User>;
    /// Whether the email and the username are already taken, in that order.
    fn taken_credentials(&self, email: &str, username: &str) -> StoreResult<(bool, bool)>;
    fn user(&self, id: i32) -> StoreResult<User>;
    fn users(&self) -> StoreResult<Vec<User>>;
    fn user_by_token(&self, key: &str) -> StoreResult<Option<User>>;

    fn tags(&self) -> StoreResult<Vec<Tag>>;
    fn tag(&self, id: i32) -> StoreResult<Tag>;
    fn ingredients(&self, name_prefix: Option<&str>) -> StoreResult<Vec<Ingredient>>;
    fn ingredient(&self, id: i32) -> StoreResult<Ingredient>;

    /// Newest first.
    fn recipes(&self, query: &RecipeQuery) -> StoreResult<Vec<Recipe>>;
    fn recipe(&self, id: i32) -> StoreResult<Recipe>;
    fn recipe_tags(&self, recipe_id: i32) -> StoreResult<Vec<Tag>>;
    /// Insertion order.
    fn recipe_ingredients(&self, recipe_id: i32) -> StoreResult<Vec<(IngredientAmount, Ingredient)>>;
    fn create_recipe(&self, author_id: i32, draft: &RecipeDraft) -> StoreResult<Recipe>;
    /// Replaces the tag set and the ingredient list wholesale.
    fn update_recipe(&self, id: i32, draft: &RecipeDraft) -> StoreResult<Recipe>;
    fn delete_recipe(&self, id: i32) -> StoreResult<()>;
    fn author_recipes(&self, author_id: i32, limit: Option<i64>) -> StoreResult<Vec<Recipe>>;
    fn count_author_recipes(&self, author_id: i32) -> StoreResult<i64>;

    /// Fails with [`StoreError::AlreadyExists`] when the mark is already set.
    fn add_mark(&self, mark: Mark, user_id: i32, recipe_id: i32) -> StoreResult<()>;
    /// Fails with [`StoreError::Absent`] when the mark is not set.
    fn remove_mark(&self, mark: Mark, user_id: i32, recipe_id: i32) -> StoreResult<()>;
    fn has_mark(&self, mark: Mark, user_id: i32, recipe_id: i32) -> StoreResult<bool>;

    fn follow(&self, user_id: i32, following_id: i32) -> StoreResult<()>;
    fn unfollow(&self, user_id: i32, following_id: i32) -> StoreResult<()>;
    fn is_following(&self, user_id: i32, following_id: i32) -> StoreResult<bool>;
    /// Users followed by `user_id`, by id.
    fn followings(&self, user_id: i32) -> StoreResult<Vec<User>>;

    fn shopping_list(&self, user_id: i32) -> StoreResult<ShoppingList>;
}
