use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Mutex, MutexGuard},
};

use itertools::Itertools;
use tracing::{debug, trace_span};

use crate::{
    database::models::{
        favorite::Favorite,
        follow::Follow,
        ingredient::{Ingredient, NewIngredient},
        ingredient_amount::IngredientAmount,
        recipe::Recipe,
        recipe_tag::RecipeTag,
        shopping::Shopping,
        tag::{NewTag, Tag},
        token::Token,
        user::{NewUser, User},
    },
    shopping_list::ShoppingList,
};

use super::{Mark, RecipeDraft, RecipeQuery, Store, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    tokens: HashMap<String, Token>,
    tags: BTreeMap<i32, Tag>,
    ingredients: BTreeMap<i32, Ingredient>,
    recipes: BTreeMap<i32, Recipe>,
    ingredient_amounts: BTreeMap<i32, IngredientAmount>,
    recipe_tags: Vec<RecipeTag>,
    favorites: HashSet<Favorite>,
    shopping_carts: HashSet<Shopping>,
    follows: HashSet<Follow>,
    sequence: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.sequence += 1;
        self.sequence
    }

    fn has_mark(&self, mark: Mark, user_id: i32, recipe_id: i32) -> bool {
        match mark {
            Mark::Favorite => self.favorites.contains(&Favorite::new(user_id, recipe_id)),
            Mark::ShoppingCart => self
                .shopping_carts
                .contains(&Shopping::new(user_id, recipe_id)),
        }
    }

    fn recipe_has_tag_slug(&self, recipe_id: i32, slugs: &[String]) -> bool {
        self.recipe_tags
            .iter()
            .filter(|link| link.recipe_id == recipe_id)
            .filter_map(|link| self.tags.get(&link.tag_id))
            .any(|tag| slugs.contains(&tag.slug))
    }

    fn ensure_references(&self, draft: &RecipeDraft) -> StoreResult<()> {
        if !draft.tags.iter().all(|id| self.tags.contains_key(id)) {
            return Err(StoreError::NotFound("Tag"));
        }
        if !draft
            .ingredients
            .iter()
            .all(|(id, _)| self.ingredients.contains_key(id))
        {
            return Err(StoreError::NotFound("Ingredient"));
        }

        Ok(())
    }

    fn clear_components(&mut self, recipe_id: i32) {
        self.ingredient_amounts
            .retain(|_, amount| amount.recipe_id != recipe_id);
        self.recipe_tags.retain(|link| link.recipe_id != recipe_id);
    }

    fn write_components(&mut self, recipe_id: i32, draft: &RecipeDraft) {
        for &(ingredient_id, amount) in &draft.ingredients {
            let id = self.next_id();
            self.ingredient_amounts.insert(
                id,
                IngredientAmount {
                    id,
                    recipe_id,
                    ingredient_id,
                    amount,
                },
            );
        }
        self.recipe_tags.extend(
            draft
                .tags
                .iter()
                .map(|&tag_id| RecipeTag::new(recipe_id, tag_id)),
        );
    }
}

/// In-process store with the same uniqueness and cascade rules as the schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn insert_tag(&self, tag: NewTag) -> StoreResult<Tag> {
        let mut tables = self.tables()?;
        if tables
            .tags
            .values()
            .any(|t| t.name == tag.name || t.color == tag.color || t.slug == tag.slug)
        {
            return Err(StoreError::AlreadyExists);
        }

        let id = tables.next_id();
        let tag = Tag {
            id,
            name: tag.name,
            color: tag.color,
            slug: tag.slug,
        };
        tables.tags.insert(id, tag.clone());

        Ok(tag)
    }

    pub fn insert_ingredient(&self, ingredient: NewIngredient) -> StoreResult<Ingredient> {
        let mut tables = self.tables()?;

        let id = tables.next_id();
        let ingredient = Ingredient {
            id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        };
        tables.ingredients.insert(id, ingredient.clone());

        Ok(ingredient)
    }

    /// Registers a token the way the external auth provider would.
    pub fn grant_token(&self, user_id: i32, key: &str) -> StoreResult<()> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound("User"));
        }

        tables
            .tokens
            .insert(key.to_owned(), Token::new(key.to_owned(), user_id));
        Ok(())
    }

    pub fn set_staff(&self, user_id: i32, is_staff: bool) -> StoreResult<()> {
        let mut tables = self.tables()?;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("User"))?;

        user.is_staff = is_staff;
        Ok(())
    }
}

impl Store for MemoryStore {
    fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables()?;
        if tables
            .users
            .values()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(StoreError::AlreadyExists);
        }

        let id = tables.next_id();
        let user = User {
            id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            password: user.password,
            is_staff: false,
            is_superuser: false,
        };
        tables.users.insert(id, user.clone());

        Ok(user)
    }

    fn taken_credentials(&self, email: &str, username: &str) -> StoreResult<(bool, bool)> {
        let tables = self.tables()?;

        Ok((
            tables.users.values().any(|u| u.email == email),
            tables.users.values().any(|u| u.username == username),
        ))
    }

    fn user(&self, id: i32) -> StoreResult<User> {
        self.tables()?
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("User"))
    }

    fn users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables()?.users.values().cloned().collect())
    }

    fn user_by_token(&self, key: &str) -> StoreResult<Option<User>> {
        let tables = self.tables()?;

        Ok(tables
            .tokens
            .get(key)
            .and_then(|token| tables.users.get(&token.user_id))
            .cloned())
    }

    fn tags(&self) -> StoreResult<Vec<Tag>> {
        Ok(self.tables()?.tags.values().cloned().collect())
    }

    fn tag(&self, id: i32) -> StoreResult<Tag> {
        self.tables()?
            .tags
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("Tag"))
    }

    fn ingredients(&self, name_prefix: Option<&str>) -> StoreResult<Vec<Ingredient>> {
        let prefix = name_prefix.map(str::to_lowercase);

        Ok(self
            .tables()?
            .ingredients
            .values()
            .filter(|ingredient| match &prefix {
                Some(prefix) => ingredient.name.to_lowercase().starts_with(prefix.as_str()),
                None => true,
            })
            .cloned()
            .sorted_by_cached_key(|ingredient| (ingredient.name.to_lowercase(), ingredient.id))
            .collect())
    }

    fn ingredient(&self, id: i32) -> StoreResult<Ingredient> {
        self.tables()?
            .ingredients
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("Ingredient"))
    }

    fn recipes(&self, query: &RecipeQuery) -> StoreResult<Vec<Recipe>> {
        let tables = self.tables()?;

        let recipes: Vec<_> = tables
            .recipes
            .values()
            .rev()
            .filter(|recipe| query.author.map_or(true, |author| recipe.author_id == author))
            .filter(|recipe| {
                query.tags.is_empty() || tables.recipe_has_tag_slug(recipe.id, &query.tags)
            })
            .filter(|recipe| {
                query.marks.iter().all(|filter| {
                    tables.has_mark(filter.mark, filter.user_id, recipe.id) == filter.present
                })
            })
            .cloned()
            .collect();
        debug!("Loaded {} recipes", recipes.len());

        Ok(recipes)
    }

    fn recipe(&self, id: i32) -> StoreResult<Recipe> {
        self.tables()?
            .recipes
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("Recipe"))
    }

    fn recipe_tags(&self, recipe_id: i32) -> StoreResult<Vec<Tag>> {
        let tables = self.tables()?;

        Ok(tables
            .recipe_tags
            .iter()
            .filter(|link| link.recipe_id == recipe_id)
            .filter_map(|link| tables.tags.get(&link.tag_id))
            .cloned()
            .sorted_by_key(|tag| tag.id)
            .collect())
    }

    fn recipe_ingredients(&self, recipe_id: i32) -> StoreResult<Vec<(IngredientAmount, Ingredient)>> {
        let tables = self.tables()?;

        Ok(tables
            .ingredient_amounts
            .values()
            .filter(|amount| amount.recipe_id == recipe_id)
            .filter_map(|amount| {
                tables
                    .ingredients
                    .get(&amount.ingredient_id)
                    .map(|ingredient| (amount.clone(), ingredient.clone()))
            })
            .collect())
    }

    fn create_recipe(&self, author_id: i32, draft: &RecipeDraft) -> StoreResult<Recipe> {
        let span = trace_span!("creating recipe", author_id);
        let _guard = span.enter();

        let mut tables = self.tables()?;
        if !tables.users.contains_key(&author_id) {
            return Err(StoreError::NotFound("User"));
        }
        tables.ensure_references(draft)?;
        let new_recipe = draft.new_recipe(author_id)?;

        let id = tables.next_id();
        let recipe = Recipe {
            id,
            author_id: new_recipe.author_id,
            name: new_recipe.name,
            image: new_recipe.image,
            text: new_recipe.text,
            cooking_time: new_recipe.cooking_time,
        };
        tables.recipes.insert(id, recipe.clone());
        tables.write_components(id, draft);

        Ok(recipe)
    }

    fn update_recipe(&self, id: i32, draft: &RecipeDraft) -> StoreResult<Recipe> {
        let span = trace_span!("updating recipe", id);
        let _guard = span.enter();

        let mut tables = self.tables()?;
        if !tables.recipes.contains_key(&id) {
            return Err(StoreError::NotFound("Recipe"));
        }
        tables.ensure_references(draft)?;

        let recipe = tables
            .recipes
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Recipe"))?;
        draft.changes().apply(recipe);
        let recipe = recipe.clone();

        tables.clear_components(id);
        tables.write_components(id, draft);

        Ok(recipe)
    }

    fn delete_recipe(&self, id: i32) -> StoreResult<()> {
        let mut tables = self.tables()?;
        if tables.recipes.remove(&id).is_none() {
            return Err(StoreError::NotFound("Recipe"));
        }

        tables.clear_components(id);
        tables.favorites.retain(|favorite| favorite.recipe_id != id);
        tables.shopping_carts.retain(|entry| entry.recipe_id != id);

        Ok(())
    }

    fn author_recipes(&self, author_id: i32, limit: Option<i64>) -> StoreResult<Vec<Recipe>> {
        let tables = self.tables()?;
        let limit = limit.map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(0));

        Ok(tables
            .recipes
            .values()
            .rev()
            .filter(|recipe| recipe.author_id == author_id)
            .take(limit)
            .cloned()
            .collect())
    }

    fn count_author_recipes(&self, author_id: i32) -> StoreResult<i64> {
        let tables = self.tables()?;

        Ok(tables
            .recipes
            .values()
            .filter(|recipe| recipe.author_id == author_id)
            .count() as i64)
    }

    fn add_mark(&self, mark: Mark, user_id: i32, recipe_id: i32) -> StoreResult<()> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound("User"));
        }
        if !tables.recipes.contains_key(&recipe_id) {
            return Err(StoreError::NotFound("Recipe"));
        }

        let inserted = match mark {
            Mark::Favorite => tables.favorites.insert(Favorite::new(user_id, recipe_id)),
            Mark::ShoppingCart => tables
                .shopping_carts
                .insert(Shopping::new(user_id, recipe_id)),
        };

        if inserted {
            Ok(())
        } else {
            Err(StoreError::AlreadyExists)
        }
    }

    fn remove_mark(&self, mark: Mark, user_id: i32, recipe_id: i32) -> StoreResult<()> {
        let mut tables = self.tables()?;

        let removed = match mark {
            Mark::Favorite => tables.favorites.remove(&Favorite::new(user_id, recipe_id)),
            Mark::ShoppingCart => tables
                .shopping_carts
                .remove(&Shopping::new(user_id, recipe_id)),
        };

        if removed {
            Ok(())
        } else {
            Err(StoreError::Absent)
        }
    }

    fn has_mark(&self, mark: Mark, user_id: i32, recipe_id: i32) -> StoreResult<bool> {
        Ok(self.tables()?.has_mark(mark, user_id, recipe_id))
    }

    fn follow(&self, user_id: i32, following_id: i32) -> StoreResult<()> {
        let mut tables = self.tables()?;
        if user_id == following_id {
            return Err(StoreError::Constraint("follows_not_self".to_string()));
        }
        if !tables.users.contains_key(&user_id) || !tables.users.contains_key(&following_id) {
            return Err(StoreError::NotFound("User"));
        }

        if tables.follows.insert(Follow::new(user_id, following_id)) {
            Ok(())
        } else {
            Err(StoreError::AlreadyExists)
        }
    }

    fn unfollow(&self, user_id: i32, following_id: i32) -> StoreResult<()> {
        if self
            .tables()?
            .follows
            .remove(&Follow::new(user_id, following_id))
        {
            Ok(())
        } else {
            Err(StoreError::Absent)
        }
    }

    fn is_following(&self, user_id: i32, following_id: i32) -> StoreResult<bool> {
        Ok(self
            .tables()?
            .follows
            .contains(&Follow::new(user_id, following_id)))
    }

    fn followings(&self, user_id: i32) -> StoreResult<Vec<User>> {
        let tables = self.tables()?;

        Ok(tables
            .follows
            .iter()
            .filter(|follow| follow.user_id == user_id)
            .filter_map(|follow| tables.users.get(&follow.following_id))
            .cloned()
            .sorted_by_key(|user| user.id)
            .collect())
    }

    fn shopping_list(&self, user_id: i32) -> StoreResult<ShoppingList> {
        let span = trace_span!("compiling shopping list", user_id);
        let _guard = span.enter();

        let tables = self.tables()?;
        let mut list = ShoppingList::new();

        // amounts are keyed by row id, so iteration order is insertion order
        tables
            .ingredient_amounts
            .values()
            .filter(|amount| tables.has_mark(Mark::ShoppingCart, user_id, amount.recipe_id))
            .for_each(|amount| {
                if let Some(ingredient) = tables.ingredients.get(&amount.ingredient_id) {
                    list.add_amount(
                        ingredient.id,
                        &ingredient.name,
                        &ingredient.measurement_unit,
                        i64::from(amount.amount),
                    );
                }
            });

        Ok(list)
    }
}
