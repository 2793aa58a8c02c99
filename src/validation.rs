//! Request bodies and the checks that run on them before any write.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::FieldErrors,
    media::{DecodedImage, ImageError},
    store::RecipeDraft,
};

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const INVALID_INTEGER: &str = "A valid integer is required.";
const SMALLINT_MAX: i64 = i16::MAX as i64;

/// Integer field that also takes its decimal string form, `5` or `"5"`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct IntegerInput(Value);

impl IntegerInput {
    pub fn value(&self) -> Option<i64> {
        match &self.0 {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<i64> for IntegerInput {
    fn from(value: i64) -> Self {
        Self(Value::from(value))
    }
}

impl From<&str> for IntegerInput {
    fn from(value: &str) -> Self {
        Self(Value::from(value))
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct IngredientInput {
    pub id: IntegerInput,
    pub amount: IntegerInput,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RecipeInput {
    #[serde(default)]
    pub ingredients: Option<Vec<IngredientInput>>,
    #[serde(default)]
    pub tags: Option<Vec<IntegerInput>>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub cooking_time: Option<IntegerInput>,
}

/// Recipe write that passed validation; the image is decoded but not stored yet.
#[derive(Debug, Clone)]
pub struct RecipeForm {
    pub name: String,
    pub text: String,
    pub cooking_time: i16,
    pub image: Option<DecodedImage>,
    pub tags: Vec<i32>,
    pub ingredients: Vec<(i32, i16)>,
}

impl RecipeForm {
    pub fn into_draft(self, image_url: Option<String>) -> RecipeDraft {
        RecipeDraft {
            name: self.name,
            text: self.text,
            cooking_time: self.cooking_time,
            image: image_url,
            tags: self.tags,
            ingredients: self.ingredients,
        }
    }
}

fn required_text(errors: &mut FieldErrors, field: &str, value: Option<String>, max: usize) -> String {
    match value {
        None => {
            errors.add(field, REQUIRED);
            String::new()
        }
        Some(value) if value.trim().is_empty() => {
            errors.add(field, BLANK);
            String::new()
        }
        Some(value) => {
            if value.chars().count() > max {
                errors.add(
                    field,
                    format!("Ensure this field has no more than {max} characters."),
                );
            }
            value
        }
    }
}

fn positive_smallint(errors: &mut FieldErrors, field: &str, value: &IntegerInput, message: &str) -> i16 {
    match value.value() {
        None => {
            errors.add(field, INVALID_INTEGER);
            0
        }
        Some(value) if value < 1 => {
            errors.add(field, message);
            0
        }
        Some(value) if value > SMALLINT_MAX => {
            errors.add(
                field,
                format!("Ensure this value is less than or equal to {SMALLINT_MAX}."),
            );
            0
        }
        Some(value) => value as i16,
    }
}

fn row_id(errors: &mut FieldErrors, field: &str, value: &IntegerInput) -> i32 {
    match value.value().and_then(|value| i32::try_from(value).ok()) {
        Some(id) => id,
        None => {
            errors.add(field, INVALID_INTEGER);
            0
        }
    }
}

fn has_duplicates<T: Eq + std::hash::Hash>(values: impl IntoIterator<Item = T>) -> bool {
    let mut seen = HashSet::new();
    values.into_iter().any(|value| !seen.insert(value))
}

impl RecipeInput {
    /// Checks every field and reports all problems at once.
    ///
    /// The image may be omitted only when `image_required` is false, which is
    /// the update case where the stored image is kept.
    pub fn validate(self, image_required: bool) -> Result<RecipeForm, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = required_text(&mut errors, "name", self.name, 200);
        let text = required_text(&mut errors, "text", self.text, usize::MAX);

        let cooking_time = match self.cooking_time {
            Some(minutes) => positive_smallint(
                &mut errors,
                "cooking_time",
                &minutes,
                "Cooking time must be at least 1 minute",
            ),
            None => {
                errors.add("cooking_time", REQUIRED);
                0
            }
        };

        let tags = match self.tags {
            None => {
                errors.add("tags", REQUIRED);
                Vec::new()
            }
            Some(tags) if tags.is_empty() => {
                errors.add("tags", "At least one tag is required");
                Vec::new()
            }
            Some(tags) => {
                let tags: Vec<i32> = tags.iter().map(|tag| row_id(&mut errors, "tags", tag)).collect();
                if has_duplicates(tags.iter()) {
                    errors.add("tags", "Tags must be unique");
                }
                tags
            }
        };

        let ingredients = match self.ingredients {
            None => {
                errors.add("ingredients", REQUIRED);
                Vec::new()
            }
            Some(ingredients) if ingredients.is_empty() => {
                errors.add("ingredients", "At least one ingredient is required");
                Vec::new()
            }
            Some(ingredients) => {
                let ingredients: Vec<(i32, i16)> = ingredients
                    .iter()
                    .map(|ingredient| {
                        let id = row_id(&mut errors, "ingredients", &ingredient.id);
                        let amount = positive_smallint(
                            &mut errors,
                            "ingredients",
                            &ingredient.amount,
                            "Ingredient amount must be greater than 0",
                        );
                        (id, amount)
                    })
                    .collect();
                if has_duplicates(ingredients.iter().map(|&(id, _)| id)) {
                    errors.add("ingredients", "Ingredients must be unique");
                }
                ingredients
            }
        };

        let image = match self.image {
            Some(data) => match DecodedImage::from_data_uri(&data) {
                Ok(image) => Some(image),
                Err(ImageError::UnknownFormat) => {
                    errors.add("image", "Upload a valid image.");
                    None
                }
                Err(_) => {
                    errors.add("image", "Image must be base64 encoded");
                    None
                }
            },
            None => {
                if image_required {
                    errors.add("image", REQUIRED);
                }
                None
            }
        };

        errors.into_result(RecipeForm {
            name,
            text,
            cooking_time,
            image,
            tags,
            ingredients,
        })
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct UserInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Registration that passed validation, password still in clear text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserForm {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl UserInput {
    pub fn validate(self) -> Result<UserForm, FieldErrors> {
        let mut errors = FieldErrors::new();

        let email = required_text(&mut errors, "email", self.email, 254);
        if !email.is_empty() && !is_plausible_email(&email) {
            errors.add("email", "Enter a valid email address.");
        }

        let username = required_text(&mut errors, "username", self.username, 150);
        if username.eq_ignore_ascii_case("me") {
            errors.add("username", "\"me\" is not valid username");
        }
        if !username.is_empty() && !username.chars().all(is_username_char) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        let first_name = required_text(&mut errors, "first_name", self.first_name, 150);
        let last_name = required_text(&mut errors, "last_name", self.last_name, 150);
        let password = required_text(&mut errors, "password", self.password, 150);

        errors.into_result(UserForm {
            email,
            username,
            first_name,
            last_name,
            password,
        })
    }
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !email.contains(' ')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(value: i64) -> IntegerInput {
        value.into()
    }

    fn ingredient(id: i64, amount: i64) -> IngredientInput {
        IngredientInput {
            id: int(id),
            amount: int(amount),
        }
    }

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn recipe() -> RecipeInput {
        RecipeInput {
            ingredients: Some(vec![
                ingredient(1, 10),
                ingredient(2, 3),
            ]),
            tags: Some(vec![int(1), int(2)]),
            image: Some(PIXEL.to_string()),
            name: Some("Borscht".to_string()),
            text: Some("Boil the beets".to_string()),
            cooking_time: Some(int(90)),
        }
    }

    #[test]
    fn accepts_a_complete_recipe() {
        let form = recipe().validate(true).unwrap();

        assert_eq!(form.ingredients, vec![(1, 10), (2, 3)]);
        assert_eq!(form.cooking_time, 90);
        assert!(form.image.is_some());
    }

    #[test]
    fn duplicate_tags_and_ingredients_are_rejected() {
        let mut input = recipe();
        input.tags = Some(vec![int(1), int(1)]);
        input.ingredients = Some(vec![
            ingredient(4, 1),
            ingredient(4, 2),
        ]);

        let errors = input.validate(true).unwrap_err();

        assert_eq!(errors.messages("tags"), ["Tags must be unique"]);
        assert_eq!(errors.messages("ingredients"), ["Ingredients must be unique"]);
    }

    #[test]
    fn amounts_and_cooking_time_must_be_positive() {
        let mut input = recipe();
        input.cooking_time = Some(int(0));
        input.ingredients = Some(vec![ingredient(1, -5)]);

        let errors = input.validate(true).unwrap_err();

        assert!(errors.contains("cooking_time"));
        assert_eq!(
            errors.messages("ingredients"),
            ["Ingredient amount must be greater than 0"]
        );
    }

    #[test]
    fn smallint_overflow_is_reported() {
        let mut input = recipe();
        input.cooking_time = Some(int(40_000));

        let errors = input.validate(true).unwrap_err();

        assert_eq!(
            errors.messages("cooking_time"),
            ["Ensure this value is less than or equal to 32767."]
        );
    }

    #[test]
    fn numeric_strings_count_as_integers() {
        let mut input = recipe();
        input.cooking_time = Some(" 45 ".into());
        input.tags = Some(vec!["3".into(), int(4)]);
        input.ingredients = Some(vec![IngredientInput {
            id: "7".into(),
            amount: "250".into(),
        }]);

        let form = input.validate(true).unwrap();

        assert_eq!(form.cooking_time, 45);
        assert_eq!(form.tags, vec![3, 4]);
        assert_eq!(form.ingredients, vec![(7, 250)]);
    }

    #[test]
    fn non_numeric_integers_are_field_errors() {
        let mut input = recipe();
        input.cooking_time = Some("five".into());
        input.tags = Some(vec![int(i64::from(i32::MAX) + 1)]);
        input.ingredients = Some(vec![IngredientInput {
            id: int(1),
            amount: "1.5".into(),
        }]);

        let errors = input.validate(true).unwrap_err();

        assert_eq!(errors.messages("cooking_time"), [INVALID_INTEGER]);
        assert_eq!(errors.messages("tags"), [INVALID_INTEGER]);
        assert_eq!(errors.messages("ingredients"), [INVALID_INTEGER]);
    }

    #[test]
    fn integer_input_reads_json_numbers_and_strings() {
        let parsed: Vec<IntegerInput> = serde_json::from_str(r#"[12, "13", null, true, 1.5]"#).unwrap();
        let values: Vec<Option<i64>> = parsed.iter().map(IntegerInput::value).collect();

        assert_eq!(values, [Some(12), Some(13), None, None, None]);
    }

    #[test]
    fn image_is_optional_only_on_update() {
        let mut input = recipe();
        input.image = None;

        assert!(input.clone().validate(true).unwrap_err().contains("image"));
        assert!(input.validate(false).unwrap().image.is_none());
    }

    #[test]
    fn malformed_image_is_reported() {
        let mut input = recipe();
        input.image = Some("not an image".to_string());

        let errors = input.validate(true).unwrap_err();

        assert_eq!(errors.messages("image"), ["Image must be base64 encoded"]);
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let errors = RecipeInput::default().validate(true).unwrap_err();

        for field in ["ingredients", "tags", "image", "name", "text", "cooking_time"] {
            assert_eq!(errors.messages(field), [REQUIRED], "{field}");
        }
    }

    fn user() -> UserInput {
        UserInput {
            email: Some("vpupkin@yandex.ru".to_string()),
            username: Some("vasya.pupkin".to_string()),
            first_name: Some("Vasya".to_string()),
            last_name: Some("Pupkin".to_string()),
            password: Some("Qwerty123".to_string()),
        }
    }

    #[test]
    fn me_is_not_a_username() {
        let mut input = user();
        input.username = Some("Me".to_string());

        let errors = input.validate().unwrap_err();

        assert_eq!(errors.messages("username"), ["\"me\" is not valid username"]);
    }

    #[test]
    fn email_must_look_like_one() {
        let mut input = user();
        input.email = Some("vpupkin".to_string());

        assert!(input.validate().unwrap_err().contains("email"));
        assert!(user().validate().is_ok());
    }
}
