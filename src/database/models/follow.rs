use diesel::prelude::*;
use lombok::AllArgsConstructor;

#[derive(Queryable, Selectable, Insertable, AllArgsConstructor, Debug, PartialEq, Eq, Hash, Clone)]
#[diesel(table_name = crate::database::schema::follows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
// `user_id` subscribes to `following_id`
pub struct Follow {
    pub user_id: i32,
    pub following_id: i32,
}
