use diesel::dsl::{exists, min, sum};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::QueryFragment;
use diesel::query_dsl::LoadQuery;
use diesel::sql_types::Text;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::{delete, insert_into, select, update, PgConnection, PgTextExpressionMethods};
use lombok::AllArgsConstructor;
use tracing::{debug, trace_span};

use crate::{
    database::{
        connection::PgPool,
        models::{
            favorite::Favorite,
            follow::Follow,
            ingredient::Ingredient,
            ingredient_amount::{IngredientAmount, NewIngredientAmount},
            recipe::Recipe,
            recipe_tag::RecipeTag,
            shopping::Shopping,
            tag::Tag,
            user::{NewUser, User},
        },
        schema::{
            favorites, follows, ingredient_amounts, ingredients, recipe_tags, recipes,
            shopping_carts, tags, tokens, users,
        },
    },
    shopping_list::{ShoppingItem, ShoppingList},
};

use super::{Mark, RecipeDraft, RecipeQuery, Store, StoreError, StoreResult};

#[derive(AllArgsConstructor, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    fn connection(&self) -> StoreResult<PooledConnection<ConnectionManager<PgConnection>>> {
        Ok(self.pool.get()?)
    }
}

sql_function!(fn lower(x: Text) -> Text);

fn escape_like(pattern: &str) -> String {
    pattern
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// Checks inside the write transaction so a concurrent delete cannot slip in.
fn ensure_references(connection: &mut PgConnection, draft: &RecipeDraft) -> StoreResult<()> {
    let found_tags: i64 = tags::table
        .filter(tags::id.eq_any(&draft.tags))
        .count()
        .get_result(connection)?;
    if found_tags != draft.tags.len() as i64 {
        return Err(StoreError::NotFound("Tag"));
    }

    let found_ingredients: i64 = ingredients::table
        .filter(ingredients::id.eq_any(draft.ingredient_ids()))
        .count()
        .get_result(connection)?;
    if found_ingredients != draft.ingredients.len() as i64 {
        return Err(StoreError::NotFound("Ingredient"));
    }

    Ok(())
}

fn write_components(
    connection: &mut PgConnection,
    recipe_id: i32,
    draft: &RecipeDraft,
) -> StoreResult<()> {
    let amounts: Vec<_> = draft
        .ingredients
        .iter()
        .map(|&(ingredient_id, amount)| NewIngredientAmount::new(recipe_id, ingredient_id, amount))
        .collect();
    insert_into(ingredient_amounts::table)
        .values(&amounts)
        .execute(connection)?;

    let tag_links: Vec<_> = draft
        .tags
        .iter()
        .map(|&tag_id| RecipeTag::new(recipe_id, tag_id))
        .collect();
    insert_into(recipe_tags::table)
        .values(&tag_links)
        .execute(connection)?;

    Ok(())
}

/// Newest first, narrowed by author, tag slugs and per-user marks.
fn recipe_statement(query: &RecipeQuery) -> recipes::BoxedQuery<'_, Pg> {
    let mut statement = recipes::table.order_by(recipes::id.desc()).into_boxed();

    if let Some(author) = query.author {
        statement = statement.filter(recipes::author_id.eq(author));
    }

    if !query.tags.is_empty() {
        let tagged = recipe_tags::table
            .inner_join(tags::table)
            .filter(tags::slug.eq_any(&query.tags))
            .select(recipe_tags::recipe_id);
        statement = statement.filter(recipes::id.eq_any(tagged));
    }

    for filter in &query.marks {
        statement = match filter.mark {
            Mark::Favorite => {
                let marked = favorites::table
                    .filter(favorites::user_id.eq(filter.user_id))
                    .select(favorites::recipe_id);
                if filter.present {
                    statement.filter(recipes::id.eq_any(marked))
                } else {
                    statement.filter(recipes::id.ne_all(marked))
                }
            }
            Mark::ShoppingCart => {
                let marked = shopping_carts::table
                    .filter(shopping_carts::user_id.eq(filter.user_id))
                    .select(shopping_carts::recipe_id);
                if filter.present {
                    statement.filter(recipes::id.eq_any(marked))
                } else {
                    statement.filter(recipes::id.ne_all(marked))
                }
            }
        };
    }
    statement
}

type ShoppingRow = (i32, String, String, Option<i64>);

// One grouped sum per ingredient row; MIN(row id) keeps the first-encountered order.
fn shopping_list_statement(
    user_id: i32,
) -> impl RunQueryDsl<PgConnection> + LoadQuery<'static, PgConnection, ShoppingRow> + QueryFragment<Pg>
{
    shopping_carts::table
        .inner_join(
            ingredient_amounts::table
                .on(ingredient_amounts::recipe_id.eq(shopping_carts::recipe_id)),
        )
        .inner_join(ingredients::table.on(ingredients::id.eq(ingredient_amounts::ingredient_id)))
        .filter(shopping_carts::user_id.eq(user_id))
        .group_by((ingredients::id, ingredients::name, ingredients::measurement_unit))
        .select((
            ingredients::id,
            ingredients::name,
            ingredients::measurement_unit,
            sum(ingredient_amounts::amount),
        ))
        .order_by(min(ingredient_amounts::id))
}

impl Store for PgStore {
    fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut connection = self.connection()?;

        Ok(insert_into(users::table)
            .values(&user)
            .returning(User::as_returning())
            .get_result(&mut connection)?)
    }

    fn taken_credentials(&self, email: &str, username: &str) -> StoreResult<(bool, bool)> {
        let mut connection = self.connection()?;

        let email_taken = select(exists(users::table.filter(users::email.eq(email))))
            .get_result(&mut connection)?;
        let username_taken = select(exists(users::table.filter(users::username.eq(username))))
            .get_result(&mut connection)?;

        Ok((email_taken, username_taken))
    }

    fn user(&self, id: i32) -> StoreResult<User> {
        let mut connection = self.connection()?;

        users::table
            .find(id)
            .select(User::as_select())
            .first(&mut connection)
            .optional()?
            .ok_or(StoreError::NotFound("User"))
    }

    fn users(&self) -> StoreResult<Vec<User>> {
        let mut connection = self.connection()?;

        Ok(users::table
            .order_by(users::id)
            .select(User::as_select())
            .load(&mut connection)?)
    }

    fn user_by_token(&self, key: &str) -> StoreResult<Option<User>> {
        let mut connection = self.connection()?;

        Ok(tokens::table
            .inner_join(users::table)
            .filter(tokens::key.eq(key))
            .select(User::as_select())
            .first(&mut connection)
            .optional()?)
    }

    fn tags(&self) -> StoreResult<Vec<Tag>> {
        let mut connection = self.connection()?;

        Ok(tags::table
            .order_by(tags::id)
            .select(Tag::as_select())
            .load(&mut connection)?)
    }

    fn tag(&self, id: i32) -> StoreResult<Tag> {
        let mut connection = self.connection()?;

        tags::table
            .find(id)
            .select(Tag::as_select())
            .first(&mut connection)
            .optional()?
            .ok_or(StoreError::NotFound("Tag"))
    }

    fn ingredients(&self, name_prefix: Option<&str>) -> StoreResult<Vec<Ingredient>> {
        let mut connection = self.connection()?;

        let mut query = ingredients::table
            .select(Ingredient::as_select())
            .order_by((lower(ingredients::name), ingredients::id))
            .into_boxed();
        if let Some(prefix) = name_prefix {
            query = query.filter(ingredients::name.ilike(format!("{}%", escape_like(prefix))));
        }

        Ok(query.load(&mut connection)?)
    }

    fn ingredient(&self, id: i32) -> StoreResult<Ingredient> {
        let mut connection = self.connection()?;

        ingredients::table
            .find(id)
            .select(Ingredient::as_select())
            .first(&mut connection)
            .optional()?
            .ok_or(StoreError::NotFound("Ingredient"))
    }

    fn recipes(&self, query: &RecipeQuery) -> StoreResult<Vec<Recipe>> {
        let span = trace_span!("loading recipes");
        let _guard = span.enter();

        let mut connection = self.connection()?;

        let recipes: Vec<Recipe> = recipe_statement(query).load(&mut connection)?;
        debug!("Loaded {} recipes", recipes.len());

        Ok(recipes)
    }

    fn recipe(&self, id: i32) -> StoreResult<Recipe> {
        let mut connection = self.connection()?;

        recipes::table
            .find(id)
            .select(Recipe::as_select())
            .first(&mut connection)
            .optional()?
            .ok_or(StoreError::NotFound("Recipe"))
    }

    fn recipe_tags(&self, recipe_id: i32) -> StoreResult<Vec<Tag>> {
        let mut connection = self.connection()?;

        Ok(recipe_tags::table
            .inner_join(tags::table)
            .filter(recipe_tags::recipe_id.eq(recipe_id))
            .order_by(tags::id)
            .select(Tag::as_select())
            .load(&mut connection)?)
    }

    fn recipe_ingredients(&self, recipe_id: i32) -> StoreResult<Vec<(IngredientAmount, Ingredient)>> {
        let mut connection = self.connection()?;

        Ok(ingredient_amounts::table
            .inner_join(ingredients::table)
            .filter(ingredient_amounts::recipe_id.eq(recipe_id))
            .order_by(ingredient_amounts::id)
            .select((IngredientAmount::as_select(), Ingredient::as_select()))
            .load(&mut connection)?)
    }

    fn create_recipe(&self, author_id: i32, draft: &RecipeDraft) -> StoreResult<Recipe> {
        let span = trace_span!("creating recipe", author_id);
        let _guard = span.enter();

        let mut connection = self.connection()?;

        connection.build_transaction().run(|connection| {
            ensure_references(connection, draft)?;

            let recipe = insert_into(recipes::table)
                .values(draft.new_recipe(author_id)?)
                .returning(Recipe::as_returning())
                .get_result(connection)?;

            write_components(connection, recipe.id, draft)?;

            Ok(recipe)
        })
    }

    fn update_recipe(&self, id: i32, draft: &RecipeDraft) -> StoreResult<Recipe> {
        let span = trace_span!("updating recipe", id);
        let _guard = span.enter();

        let mut connection = self.connection()?;

        connection.build_transaction().run(|connection| {
            let recipe = update(recipes::table.find(id))
                .set(draft.changes())
                .returning(Recipe::as_returning())
                .get_result(connection)
                .optional()?
                .ok_or(StoreError::NotFound("Recipe"))?;

            ensure_references(connection, draft)?;

            delete(ingredient_amounts::table.filter(ingredient_amounts::recipe_id.eq(id)))
                .execute(connection)?;
            delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(id))).execute(connection)?;

            write_components(connection, id, draft)?;

            Ok(recipe)
        })
    }

    fn delete_recipe(&self, id: i32) -> StoreResult<()> {
        let mut connection = self.connection()?;

        // ingredient amounts, tags and marks cascade
        match delete(recipes::table.find(id)).execute(&mut connection)? {
            0 => Err(StoreError::NotFound("Recipe")),
            _ => Ok(()),
        }
    }

    fn author_recipes(&self, author_id: i32, limit: Option<i64>) -> StoreResult<Vec<Recipe>> {
        let mut connection = self.connection()?;

        let mut query = recipes::table
            .filter(recipes::author_id.eq(author_id))
            .order_by(recipes::id.desc())
            .select(Recipe::as_select())
            .into_boxed();
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        Ok(query.load(&mut connection)?)
    }

    fn count_author_recipes(&self, author_id: i32) -> StoreResult<i64> {
        let mut connection = self.connection()?;

        Ok(recipes::table
            .filter(recipes::author_id.eq(author_id))
            .count()
            .get_result(&mut connection)?)
    }

    fn add_mark(&self, mark: Mark, user_id: i32, recipe_id: i32) -> StoreResult<()> {
        let mut connection = self.connection()?;

        match mark {
            Mark::Favorite => insert_into(favorites::table)
                .values(Favorite::new(user_id, recipe_id))
                .execute(&mut connection)?,
            Mark::ShoppingCart => insert_into(shopping_carts::table)
                .values(Shopping::new(user_id, recipe_id))
                .execute(&mut connection)?,
        };

        Ok(())
    }

    fn remove_mark(&self, mark: Mark, user_id: i32, recipe_id: i32) -> StoreResult<()> {
        let mut connection = self.connection()?;

        let deleted = match mark {
            Mark::Favorite => {
                delete(favorites::table.find((user_id, recipe_id))).execute(&mut connection)?
            }
            Mark::ShoppingCart => {
                delete(shopping_carts::table.find((user_id, recipe_id))).execute(&mut connection)?
            }
        };

        match deleted {
            0 => Err(StoreError::Absent),
            _ => Ok(()),
        }
    }

    fn has_mark(&self, mark: Mark, user_id: i32, recipe_id: i32) -> StoreResult<bool> {
        let mut connection = self.connection()?;

        let marked = match mark {
            Mark::Favorite => select(exists(favorites::table.find((user_id, recipe_id))))
                .get_result(&mut connection)?,
            Mark::ShoppingCart => select(exists(shopping_carts::table.find((user_id, recipe_id))))
                .get_result(&mut connection)?,
        };

        Ok(marked)
    }

    fn follow(&self, user_id: i32, following_id: i32) -> StoreResult<()> {
        let mut connection = self.connection()?;

        insert_into(follows::table)
            .values(Follow::new(user_id, following_id))
            .execute(&mut connection)?;

        Ok(())
    }

    fn unfollow(&self, user_id: i32, following_id: i32) -> StoreResult<()> {
        let mut connection = self.connection()?;

        match delete(follows::table.find((user_id, following_id))).execute(&mut connection)? {
            0 => Err(StoreError::Absent),
            _ => Ok(()),
        }
    }

    fn is_following(&self, user_id: i32, following_id: i32) -> StoreResult<bool> {
        let mut connection = self.connection()?;

        Ok(select(exists(follows::table.find((user_id, following_id))))
            .get_result(&mut connection)?)
    }

    fn followings(&self, user_id: i32) -> StoreResult<Vec<User>> {
        let mut connection = self.connection()?;

        Ok(users::table
            .inner_join(follows::table.on(follows::following_id.eq(users::id)))
            .filter(follows::user_id.eq(user_id))
            .order_by(users::id)
            .select(User::as_select())
            .load(&mut connection)?)
    }

    fn shopping_list(&self, user_id: i32) -> StoreResult<ShoppingList> {
        let span = trace_span!("compiling shopping list", user_id);
        let _guard = span.enter();

        let mut connection = self.connection()?;

        let rows: Vec<ShoppingRow> = shopping_list_statement(user_id).load(&mut *connection)?;

        Ok(rows
            .into_iter()
            .map(|(id, name, measurement_unit, total)| {
                ShoppingItem::new(id, name, measurement_unit, total.unwrap_or_default())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use diesel::debug_query;

    use super::*;
    use crate::store::MarkFilter;

    fn sql<T: QueryFragment<Pg>>(query: &T) -> String {
        debug_query::<Pg, _>(query).to_string().to_lowercase()
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("sugar"), "sugar");
    }

    #[test]
    fn shopping_list_groups_by_ingredient_row() {
        let sql = sql(&shopping_list_statement(7));

        assert!(sql.contains(r#"group by "ingredients"."id""#), "{sql}");
        assert!(sql.contains(r#"sum("ingredient_amounts"."amount")"#), "{sql}");
        assert!(sql.contains(r#"order by min("ingredient_amounts"."id")"#), "{sql}");
        assert!(sql.contains(r#""shopping_carts"."user_id" = $1"#), "{sql}");
    }

    #[test]
    fn absent_marks_exclude_marked_recipes() {
        let query = RecipeQuery {
            author: None,
            tags: vec!["dinner".to_string()],
            marks: vec![
                MarkFilter {
                    mark: Mark::Favorite,
                    user_id: 3,
                    present: true,
                },
                MarkFilter {
                    mark: Mark::ShoppingCart,
                    user_id: 3,
                    present: false,
                },
            ],
        };

        let sql = sql(&recipe_statement(&query));

        assert!(
            sql.contains(r#""recipes"."id" in (select "favorites"."recipe_id" from "favorites""#),
            "{sql}"
        );
        assert!(
            sql.contains(r#""recipes"."id" not in (select "shopping_carts"."recipe_id" from "shopping_carts""#),
            "{sql}"
        );
        assert!(sql.contains(r#""tags"."slug" = any($"#), "{sql}");
        assert!(sql.contains(r#"order by "recipes"."id" desc"#), "{sql}");
    }
}
