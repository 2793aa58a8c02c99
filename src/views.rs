//! Response bodies.
//!
//! Flags such as `is_favorited` are computed against the viewing user when a
//! view is built and are always false for anonymous viewers.

use serde::Serialize;

use crate::{
    database::models::{ingredient::Ingredient, recipe::Recipe, tag::Tag, user::User},
    store::{Mark, Store, StoreResult},
};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TagView {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<Tag> for TagView {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            color: tag.color,
            slug: tag.slug,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IngredientView {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

impl From<Ingredient> for IngredientView {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        }
    }
}

/// Returned by registration, which has no viewer to be subscribed.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CreatedUserView {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for CreatedUserView {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserView {
    pub fn build(store: &dyn Store, user: User, viewer: Option<&User>) -> StoreResult<Self> {
        let is_subscribed = match viewer {
            Some(viewer) => store.is_following(viewer.id, user.id)?,
            None => false,
        };

        Ok(Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IngredientAmountView {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i16,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipeView {
    pub id: i32,
    pub tags: Vec<TagView>,
    pub author: UserView,
    pub ingredients: Vec<IngredientAmountView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i16,
}

impl RecipeView {
    pub fn build(store: &dyn Store, recipe: Recipe, viewer: Option<&User>) -> StoreResult<Self> {
        let author = UserView::build(store, store.user(recipe.author_id)?, viewer)?;
        let tags = store
            .recipe_tags(recipe.id)?
            .into_iter()
            .map(TagView::from)
            .collect();
        let ingredients = store
            .recipe_ingredients(recipe.id)?
            .into_iter()
            .map(|(amount, ingredient)| IngredientAmountView {
                id: ingredient.id,
                name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
                amount: amount.amount,
            })
            .collect();

        let (is_favorited, is_in_shopping_cart) = match viewer {
            Some(viewer) => (
                store.has_mark(Mark::Favorite, viewer.id, recipe.id)?,
                store.has_mark(Mark::ShoppingCart, viewer.id, recipe.id)?,
            ),
            None => (false, false),
        };

        Ok(Self {
            id: recipe.id,
            tags,
            author,
            ingredients,
            is_favorited,
            is_in_shopping_cart,
            name: recipe.name,
            image: recipe.image,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
        })
    }

    pub fn build_all(
        store: &dyn Store,
        recipes: Vec<Recipe>,
        viewer: Option<&User>,
    ) -> StoreResult<Vec<Self>> {
        recipes
            .into_iter()
            .map(|recipe| Self::build(store, recipe, viewer))
            .collect()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipeShortView {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i16,
}

impl From<Recipe> for RecipeShortView {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub user: UserView,
    pub recipes: Vec<RecipeShortView>,
    pub recipes_count: i64,
}

impl SubscriptionView {
    pub fn build(
        store: &dyn Store,
        author: User,
        viewer: &User,
        recipes_limit: Option<i64>,
    ) -> StoreResult<Self> {
        let recipes = store
            .author_recipes(author.id, recipes_limit)?
            .into_iter()
            .map(RecipeShortView::from)
            .collect();
        let recipes_count = store.count_author_recipes(author.id)?;

        Ok(Self {
            user: UserView::build(store, author, Some(viewer))?,
            recipes,
            recipes_count,
        })
    }
}
