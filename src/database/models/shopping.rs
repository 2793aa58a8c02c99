use diesel::prelude::*;
use lombok::AllArgsConstructor;

#[derive(Queryable, Selectable, Insertable, AllArgsConstructor, Debug, PartialEq, Eq, Hash, Clone)]
#[diesel(table_name = crate::database::schema::shopping_carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
// Recipe staged for the shopping list
pub struct Shopping {
    pub user_id: i32,
    pub recipe_id: i32,
}
