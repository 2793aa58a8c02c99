use diesel::prelude::*;
use lombok::AllArgsConstructor;

use super::user::User;

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, PartialEq, Eq, Clone)]
#[diesel(belongs_to(User, foreign_key = author_id))]
#[diesel(table_name = crate::database::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Recipe {
    pub id: i32,
    pub author_id: i32,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i16,
}

#[derive(Insertable, AllArgsConstructor, Debug, Clone)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct NewRecipe {
    pub author_id: i32,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i16,
}

// `image: None` keeps the stored image
#[derive(AsChangeset, AllArgsConstructor, Debug, Clone)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct RecipeChanges {
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i16,
}

impl RecipeChanges {
    pub fn apply(&self, recipe: &mut Recipe) {
        recipe.name.clone_from(&self.name);
        if let Some(image) = &self.image {
            recipe.image.clone_from(image);
        }
        recipe.text.clone_from(&self.text);
        recipe.cooking_time = self.cooking_time;
    }
}
