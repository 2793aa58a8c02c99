use diesel::prelude::*;
use lombok::AllArgsConstructor;

use super::{ingredient::Ingredient, recipe::Recipe};

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, PartialEq, Eq, Clone)]
#[diesel(belongs_to(Recipe))]
#[diesel(belongs_to(Ingredient))]
#[diesel(table_name = crate::database::schema::ingredient_amounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
// How much of an ingredient a recipe needs
pub struct IngredientAmount {
    pub id: i32,
    pub recipe_id: i32,
    pub ingredient_id: i32,
    pub amount: i16,
}

#[derive(Insertable, AllArgsConstructor, Debug, Clone)]
#[diesel(table_name = crate::database::schema::ingredient_amounts)]
pub struct NewIngredientAmount {
    pub recipe_id: i32,
    pub ingredient_id: i32,
    pub amount: i16,
}
