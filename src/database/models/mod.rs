pub mod favorite;
pub mod follow;
pub mod ingredient;
pub mod ingredient_amount;
pub mod recipe;
pub mod recipe_tag;
pub mod shopping;
pub mod tag;
pub mod token;
pub mod user;
