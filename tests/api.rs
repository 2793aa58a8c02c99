use std::sync::Arc;

use axum::http::{
    header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE},
    HeaderValue, StatusCode,
};
use axum_test::{TestRequest, TestServer};
use foodgram::{
    app,
    config::Config,
    database::models::{ingredient::NewIngredient, tag::NewTag, user::NewUser},
    state::AppState,
    store::{memory::MemoryStore, Store},
};
use serde_json::{json, Value};
use tempfile::TempDir;

const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

struct Fixture {
    server: TestServer,
    store: Arc<MemoryStore>,
    _media: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let media = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let mut config = Config::in_memory(media.path());
        config.password_iterations = 1_000;
        let state = AppState::new(config, store.clone());
        let server = TestServer::new(app(Arc::new(state))).unwrap();

        Self {
            server,
            store,
            _media: media,
        }
    }

    /// Creates a user holding the token `token-<username>`.
    fn user(&self, username: &str) -> (i32, String) {
        let user = self
            .store
            .create_user(NewUser::new(
                format!("{username}@example.com"),
                username.to_string(),
                "First".to_string(),
                "Last".to_string(),
                "pbkdf2_sha256$1$salt$hash".to_string(),
            ))
            .unwrap();
        let token = format!("token-{username}");
        self.store.grant_token(user.id, &token).unwrap();

        (user.id, token)
    }

    fn tag(&self, slug: &str) -> i32 {
        self.store
            .insert_tag(NewTag::new(
                slug.to_uppercase(),
                format!("#{slug}"),
                slug.to_string(),
            ))
            .unwrap()
            .id
    }

    fn ingredient(&self, name: &str, unit: &str) -> i32 {
        self.store
            .insert_ingredient(NewIngredient::new(name.to_string(), unit.to_string()))
            .unwrap()
            .id
    }

    async fn create_recipe(&self, token: &str, name: &str, tags: &[i32], ingredients: &[(i32, i64)]) -> i32 {
        let response = authorized(self.server.post("/api/recipes/"), token)
            .json(&recipe_body(name, tags, ingredients))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Value>()["id"].as_i64().unwrap() as i32
    }
}

fn authorized(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Token {token}")).unwrap(),
    )
}

fn recipe_body(name: &str, tags: &[i32], ingredients: &[(i32, i64)]) -> Value {
    json!({
        "ingredients": ingredients
            .iter()
            .map(|&(id, amount)| json!({"id": id, "amount": amount}))
            .collect::<Vec<_>>(),
        "tags": tags,
        "image": PIXEL,
        "name": name,
        "text": "Mix everything",
        "cooking_time": 20,
    })
}

#[tokio::test]
async fn tags_and_ingredients_are_public() {
    let fixture = Fixture::new();
    let breakfast = fixture.tag("breakfast");
    fixture.ingredient("Sugar", "g");
    fixture.ingredient("salt", "g");
    fixture.ingredient("Sour cream", "ml");

    let tags = fixture.server.get("/api/tags/").await;
    tags.assert_status_ok();
    tags.assert_json(&json!([
        {"id": breakfast, "name": "BREAKFAST", "color": "#breakfast", "slug": "breakfast"}
    ]));

    let found: Value = fixture.server.get("/api/ingredients/?name=s").await.json();
    let names: Vec<_> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|ingredient| ingredient["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["salt", "Sour cream", "Sugar"]);

    fixture
        .server
        .get("/api/tags/999/")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn creating_a_recipe_requires_a_token() {
    let fixture = Fixture::new();
    let tag = fixture.tag("lunch");
    let flour = fixture.ingredient("flour", "g");

    let anonymous = fixture
        .server
        .post("/api/recipes/")
        .json(&recipe_body("Bread", &[tag], &[(flour, 500)]))
        .await;
    anonymous.assert_status(StatusCode::UNAUTHORIZED);

    let unknown = authorized(fixture.server.post("/api/recipes/"), "nope")
        .json(&recipe_body("Bread", &[tag], &[(flour, 500)]))
        .await;
    unknown.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.json::<Value>()["detail"], "Invalid token.");
}

#[tokio::test]
async fn created_recipe_is_fully_represented() {
    let fixture = Fixture::new();
    let (author_id, token) = fixture.user("chef");
    let tag = fixture.tag("dinner");
    let flour = fixture.ingredient("flour", "g");

    let id = fixture
        .create_recipe(&token, "Bread", &[tag], &[(flour, 500)])
        .await;

    let recipe: Value = authorized(fixture.server.get(&format!("/api/recipes/{id}/")), &token)
        .await
        .json();
    assert_eq!(recipe["author"]["id"], author_id);
    assert_eq!(recipe["author"]["is_subscribed"], false);
    assert_eq!(recipe["tags"][0]["slug"], "dinner");
    assert_eq!(
        recipe["ingredients"],
        json!([{"id": flour, "name": "flour", "measurement_unit": "g", "amount": 500}])
    );
    assert_eq!(recipe["is_favorited"], false);
    assert!(recipe["image"]
        .as_str()
        .unwrap()
        .starts_with("/media/recipes/images/"));
}

#[tokio::test]
async fn invalid_recipes_are_rejected_before_any_write() {
    let fixture = Fixture::new();
    let (_, token) = fixture.user("chef");
    let tag = fixture.tag("dinner");
    let flour = fixture.ingredient("flour", "g");

    let mut body = recipe_body("Bread", &[tag, tag], &[(flour, 0)]);
    body["image"] = json!("plain text");
    let response = authorized(fixture.server.post("/api/recipes/"), &token)
        .json(&body)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let errors: Value = response.json();
    assert_eq!(errors["tags"], json!(["Tags must be unique"]));
    assert_eq!(
        errors["ingredients"],
        json!(["Ingredient amount must be greater than 0"])
    );
    assert_eq!(errors["image"], json!(["Image must be base64 encoded"]));
    assert!(fixture.store.recipes(&Default::default()).unwrap().is_empty());
}

#[tokio::test]
async fn numbers_may_arrive_as_strings() {
    let fixture = Fixture::new();
    let (_, token) = fixture.user("chef");
    let tag = fixture.tag("dinner");
    let flour = fixture.ingredient("flour", "g");

    let mut body = recipe_body("Bread", &[], &[]);
    body["tags"] = json!([tag.to_string()]);
    body["ingredients"] = json!([{"id": flour.to_string(), "amount": "10"}]);
    body["cooking_time"] = json!("5");
    let response = authorized(fixture.server.post("/api/recipes/"), &token)
        .json(&body)
        .await;

    response.assert_status(StatusCode::CREATED);
    let recipe: Value = response.json();
    assert_eq!(recipe["cooking_time"], 5);
    assert_eq!(recipe["ingredients"][0]["amount"], 10);
    assert_eq!(recipe["tags"][0]["id"], tag);

    body["cooking_time"] = json!("five");
    let response = authorized(fixture.server.post("/api/recipes/"), &token)
        .json(&body)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({"cooking_time": ["A valid integer is required."]})
    );
}

#[tokio::test]
async fn update_replaces_the_ingredient_list() {
    let fixture = Fixture::new();
    let (_, token) = fixture.user("chef");
    let tag = fixture.tag("dinner");
    let a = fixture.ingredient("apple", "pcs");
    let b = fixture.ingredient("butter", "g");
    let id = fixture.create_recipe(&token, "Pie", &[tag], &[(a, 2)]).await;

    let mut body = recipe_body("Pie", &[tag], &[(b, 3)]);
    body.as_object_mut().unwrap().remove("image");
    let response = authorized(fixture.server.patch(&format!("/api/recipes/{id}/")), &token)
        .json(&body)
        .await;

    response.assert_status_ok();
    let recipe: Value = response.json();
    assert_eq!(
        recipe["ingredients"],
        json!([{"id": b, "name": "butter", "measurement_unit": "g", "amount": 3}])
    );
    assert_eq!(fixture.store.recipe_ingredients(id).unwrap().len(), 1);
}

#[tokio::test]
async fn update_with_unknown_ingredient_changes_nothing() {
    let fixture = Fixture::new();
    let (_, token) = fixture.user("chef");
    let tag = fixture.tag("dinner");
    let a = fixture.ingredient("apple", "pcs");
    let id = fixture.create_recipe(&token, "Pie", &[tag], &[(a, 2)]).await;

    let response = authorized(fixture.server.put(&format!("/api/recipes/{id}/")), &token)
        .json(&recipe_body("Renamed", &[tag], &[(a, 1), (9999, 3)]))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let recipe = fixture.store.recipe(id).unwrap();
    assert_eq!(recipe.name, "Pie");
    let ingredients = fixture.store.recipe_ingredients(id).unwrap();
    assert_eq!(ingredients.len(), 1);
    assert_eq!(ingredients[0].0.amount, 2);
}

#[tokio::test]
async fn only_the_author_or_staff_may_edit() {
    let fixture = Fixture::new();
    let (_, author) = fixture.user("chef");
    let (_, stranger) = fixture.user("stranger");
    let (staff_id, staff) = fixture.user("moderator");
    fixture.store.set_staff(staff_id, true).unwrap();
    let tag = fixture.tag("dinner");
    let a = fixture.ingredient("apple", "pcs");
    let id = fixture.create_recipe(&author, "Pie", &[tag], &[(a, 2)]).await;
    let path = format!("/api/recipes/{id}/");

    authorized(fixture.server.delete(&path), &stranger)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    authorized(fixture.server.patch(&path), &stranger)
        .json(&recipe_body("Mine now", &[tag], &[(a, 1)]))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let edited: Value = authorized(fixture.server.patch(&path), &staff)
        .json(&recipe_body("Moderated", &[tag], &[(a, 1)]))
        .await
        .json();
    assert_eq!(edited["name"], "Moderated");
    assert_eq!(edited["author"]["username"], "chef");

    authorized(fixture.server.delete(&path), &author)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    fixture
        .server
        .get(&path)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn favorites_reject_duplicates_and_missing_entries() {
    let fixture = Fixture::new();
    let (_, token) = fixture.user("chef");
    let tag = fixture.tag("dinner");
    let a = fixture.ingredient("apple", "pcs");
    let id = fixture.create_recipe(&token, "Pie", &[tag], &[(a, 2)]).await;
    let path = format!("/api/recipes/{id}/favorite/");

    let added = authorized(fixture.server.post(&path), &token).await;
    added.assert_status(StatusCode::CREATED);
    assert_eq!(added.json::<Value>()["name"], "Pie");

    let again = authorized(fixture.server.post(&path), &token).await;
    again.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        again.json::<Value>()["errors"],
        "Recipe is already in favorites"
    );

    authorized(fixture.server.delete(&path), &token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    authorized(fixture.server.delete(&path), &token)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    authorized(fixture.server.post("/api/recipes/9999/favorite/"), &token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn shopping_cart_rejects_duplicates_and_missing_entries() {
    let fixture = Fixture::new();
    let (_, token) = fixture.user("chef");
    let tag = fixture.tag("dinner");
    let a = fixture.ingredient("apple", "pcs");
    let id = fixture.create_recipe(&token, "Pie", &[tag], &[(a, 2)]).await;
    let path = format!("/api/recipes/{id}/shopping_cart/");

    authorized(fixture.server.post(&path), &token)
        .await
        .assert_status(StatusCode::CREATED);
    authorized(fixture.server.post(&path), &token)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    authorized(fixture.server.delete(&path), &token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let missing = authorized(fixture.server.delete(&path), &token).await;
    missing.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        missing.json::<Value>()["errors"],
        "Recipe is not in the shopping cart"
    );
}

#[tokio::test]
async fn shopping_list_sums_amounts_per_ingredient() {
    let fixture = Fixture::new();
    let (_, token) = fixture.user("chef");
    let tag = fixture.tag("baking");
    let flour = fixture.ingredient("flour", "g");
    let sugar = fixture.ingredient("SUGAR", "g");
    let salt_g = fixture.ingredient("salt", "g");
    let salt_pinch = fixture.ingredient("salt", "pinch");

    let bread = fixture
        .create_recipe(&token, "Bread", &[tag], &[(flour, 200), (salt_g, 5)])
        .await;
    let cake = fixture
        .create_recipe(
            &token,
            "Cake",
            &[tag],
            &[(flour, 300), (sugar, 50), (salt_pinch, 1)],
        )
        .await;
    for id in [bread, cake] {
        authorized(
            fixture
                .server
                .post(&format!("/api/recipes/{id}/shopping_cart/")),
            &token,
        )
        .await
        .assert_status(StatusCode::CREATED);
    }

    let response = authorized(
        fixture.server.get("/api/recipes/download_shopping_cart/"),
        &token,
    )
    .await;

    response.assert_status_ok();
    assert_eq!(
        response.header(CONTENT_DISPOSITION),
        "attachment; filename=\"shopping_list.txt\""
    );
    assert!(response
        .header(CONTENT_TYPE)
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(
        response.text(),
        "Flour (g) - 500\nSalt (g) - 5\nSugar (g) - 50\nSalt (pinch) - 1\n"
    );
}

#[tokio::test]
async fn empty_cart_downloads_an_empty_list() {
    let fixture = Fixture::new();
    let (_, token) = fixture.user("chef");

    let response = authorized(
        fixture.server.get("/api/recipes/download_shopping_cart/"),
        &token,
    )
    .await;

    response.assert_status_ok();
    assert_eq!(response.text(), "");
    fixture
        .server
        .get("/api/recipes/download_shopping_cart/")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn recipe_filters_combine() {
    let fixture = Fixture::new();
    let (chef_id, chef) = fixture.user("chef");
    let (_, cook) = fixture.user("cook");
    let breakfast = fixture.tag("breakfast");
    let dinner = fixture.tag("dinner");
    let egg = fixture.ingredient("egg", "pcs");

    let omelette = fixture
        .create_recipe(&chef, "Omelette", &[breakfast], &[(egg, 3)])
        .await;
    let steak = fixture
        .create_recipe(&chef, "Steak", &[dinner], &[(egg, 1)])
        .await;
    let shakshuka = fixture
        .create_recipe(&cook, "Shakshuka", &[breakfast, dinner], &[(egg, 4)])
        .await;
    authorized(
        fixture
            .server
            .post(&format!("/api/recipes/{omelette}/favorite/")),
        &cook,
    )
    .await
    .assert_status(StatusCode::CREATED);

    let ids = |value: Value| -> Vec<i64> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|recipe| recipe["id"].as_i64().unwrap())
            .collect()
    };

    let all = fixture.server.get("/api/recipes/").await.json();
    assert_eq!(
        ids(all),
        [shakshuka as i64, steak as i64, omelette as i64]
    );

    let by_author = fixture
        .server
        .get(&format!("/api/recipes/?author={chef_id}&tags=dinner"))
        .await
        .json();
    assert_eq!(ids(by_author), [steak as i64]);

    let either_tag = fixture
        .server
        .get("/api/recipes/?tags=breakfast&tags=dinner")
        .await
        .json();
    assert_eq!(ids(either_tag).len(), 3);

    let favorited = authorized(fixture.server.get("/api/recipes/?is_favorited=1"), &cook)
        .await
        .json();
    assert_eq!(ids(favorited), [omelette as i64]);

    let not_favorited = authorized(
        fixture.server.get("/api/recipes/?is_favorited=false"),
        &cook,
    )
    .await
    .json();
    assert_eq!(ids(not_favorited), [shakshuka as i64, steak as i64]);

    fixture
        .server
        .get("/api/recipes/?author=someone")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn anonymous_viewers_see_false_flags() {
    let fixture = Fixture::new();
    let (_, token) = fixture.user("chef");
    let tag = fixture.tag("dinner");
    let a = fixture.ingredient("apple", "pcs");
    let id = fixture.create_recipe(&token, "Pie", &[tag], &[(a, 2)]).await;
    for mark in ["favorite", "shopping_cart"] {
        authorized(
            fixture.server.post(&format!("/api/recipes/{id}/{mark}/")),
            &token,
        )
        .await
        .assert_status(StatusCode::CREATED);
    }

    let own: Value = authorized(fixture.server.get(&format!("/api/recipes/{id}/")), &token)
        .await
        .json();
    assert_eq!(own["is_favorited"], true);
    assert_eq!(own["is_in_shopping_cart"], true);

    let anonymous: Value = fixture
        .server
        .get(&format!("/api/recipes/{id}/"))
        .await
        .json();
    assert_eq!(anonymous["is_favorited"], false);
    assert_eq!(anonymous["is_in_shopping_cart"], false);
    assert_eq!(anonymous["author"]["is_subscribed"], false);

    let filtered: Value = fixture.server.get("/api/recipes/?is_favorited=1").await.json();
    assert_eq!(filtered, json!([]));
    let ignored: Value = fixture
        .server
        .get("/api/recipes/?is_in_shopping_cart=0")
        .await
        .json();
    assert_eq!(ignored.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn registration_validates_and_hides_the_password() {
    let fixture = Fixture::new();
    let body = json!({
        "email": "vpupkin@yandex.ru",
        "username": "vasya.pupkin",
        "first_name": "Vasya",
        "last_name": "Pupkin",
        "password": "Qwerty123",
    });

    let created = fixture.server.post("/api/users/").json(&body).await;
    created.assert_status(StatusCode::CREATED);
    let user: Value = created.json();
    assert_eq!(user["username"], "vasya.pupkin");
    assert!(user.get("password").is_none());
    assert!(user.get("is_subscribed").is_none());

    let stored = fixture.store.user(user["id"].as_i64().unwrap() as i32).unwrap();
    assert!(stored.password.starts_with("pbkdf2_sha256$1000$"));
    assert!(!stored.password.contains("Qwerty123"));

    let mut twin = body.clone();
    twin["username"] = json!("vasya.twin");
    twin["email"] = json!("twin@yandex.ru");
    let twin: Value = fixture.server.post("/api/users/").json(&twin).await.json();
    let twin = fixture.store.user(twin["id"].as_i64().unwrap() as i32).unwrap();
    assert_ne!(twin.password, stored.password);

    let duplicate = fixture.server.post("/api/users/").json(&body).await;
    duplicate.assert_status(StatusCode::BAD_REQUEST);
    let errors: Value = duplicate.json();
    assert!(errors.get("email").is_some());
    assert!(errors.get("username").is_some());

    let mut me = body.clone();
    me["username"] = json!("me");
    me["email"] = json!("me@example.com");
    let rejected: Value = fixture.server.post("/api/users/").json(&me).await.json();
    assert_eq!(rejected["username"], json!(["\"me\" is not valid username"]));
}

#[tokio::test]
async fn current_user_requires_authentication() {
    let fixture = Fixture::new();
    let (id, token) = fixture.user("chef");

    let anonymous = fixture.server.get("/api/users/me/").await;
    anonymous.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        anonymous.json::<Value>()["detail"],
        "Authentication credentials were not provided."
    );

    let me: Value = authorized(fixture.server.get("/api/users/me/"), &token)
        .await
        .json();
    assert_eq!(me["id"], id);
    assert_eq!(me["email"], "chef@example.com");

    let listed: Value = fixture.server.get("/api/users/").await.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    fixture
        .server
        .get("/api/users/4242/")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn subscriptions_cap_recipes_and_count_them() {
    let fixture = Fixture::new();
    let (chef_id, chef) = fixture.user("chef");
    let (_, fan) = fixture.user("fan");
    let tag = fixture.tag("dinner");
    let a = fixture.ingredient("apple", "pcs");
    for name in ["Pie", "Jam", "Cider"] {
        fixture.create_recipe(&chef, name, &[tag], &[(a, 2)]).await;
    }

    let subscribed = authorized(
        fixture
            .server
            .post(&format!("/api/users/{chef_id}/subscribe/?recipes_limit=1")),
        &fan,
    )
    .await;
    subscribed.assert_status(StatusCode::CREATED);
    let subscription: Value = subscribed.json();
    assert_eq!(subscription["username"], "chef");
    assert_eq!(subscription["is_subscribed"], true);
    assert_eq!(subscription["recipes_count"], 3);
    assert_eq!(subscription["recipes"].as_array().unwrap().len(), 1);
    assert_eq!(subscription["recipes"][0]["name"], "Cider");

    let listed: Value = authorized(
        fixture.server.get("/api/users/subscriptions/?recipes_limit=2"),
        &fan,
    )
    .await
    .json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["recipes"].as_array().unwrap().len(), 2);

    let author: Value = authorized(fixture.server.get(&format!("/api/users/{chef_id}/")), &fan)
        .await
        .json();
    assert_eq!(author["is_subscribed"], true);

    authorized(
        fixture.server.get("/api/users/subscriptions/?recipes_limit=-1"),
        &fan,
    )
    .await
    .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn follows_reject_self_duplicates_and_missing_entries() {
    let fixture = Fixture::new();
    let (chef_id, chef) = fixture.user("chef");
    let (fan_id, fan) = fixture.user("fan");

    let own = authorized(
        fixture.server.post(&format!("/api/users/{fan_id}/subscribe/")),
        &fan,
    )
    .await;
    own.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        own.json::<Value>()["errors"],
        "You can't subscribe to yourself"
    );

    let path = format!("/api/users/{chef_id}/subscribe/");
    authorized(fixture.server.post(&path), &fan)
        .await
        .assert_status(StatusCode::CREATED);
    authorized(fixture.server.post(&path), &fan)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    authorized(fixture.server.delete(&path), &fan)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let missing = authorized(fixture.server.delete(&path), &fan).await;
    missing.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        missing.json::<Value>()["errors"],
        "Subscription does not exist"
    );

    authorized(
        fixture.server.delete(&format!("/api/users/{fan_id}/subscribe/")),
        &chef,
    )
    .await
    .assert_status(StatusCode::BAD_REQUEST);
    authorized(fixture.server.post("/api/users/4242/subscribe/"), &fan)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uploaded_images_are_served() {
    let fixture = Fixture::new();
    let (_, token) = fixture.user("chef");
    let tag = fixture.tag("dinner");
    let a = fixture.ingredient("apple", "pcs");
    let id = fixture.create_recipe(&token, "Pie", &[tag], &[(a, 2)]).await;

    let recipe: Value = fixture
        .server
        .get(&format!("/api/recipes/{id}/"))
        .await
        .json();
    let image = fixture
        .server
        .get(recipe["image"].as_str().unwrap())
        .await;

    image.assert_status_ok();
    assert_eq!(&image.as_bytes()[1..4], b"PNG");
}
