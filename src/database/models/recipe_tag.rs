use diesel::prelude::*;
use lombok::AllArgsConstructor;

#[derive(Queryable, Selectable, Insertable, AllArgsConstructor, Debug, PartialEq, Eq, Clone)]
#[diesel(table_name = crate::database::schema::recipe_tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecipeTag {
    pub recipe_id: i32,
    pub tag_id: i32,
}
