use std::{collections::HashMap, fmt, ops::Deref};

use lombok::AllArgsConstructor;

/// One line of the compiled shopping list.
#[derive(AllArgsConstructor, Debug, Clone, PartialEq, Eq)]
pub struct ShoppingItem {
    pub ingredient_id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

impl fmt::Display for ShoppingItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) - {}",
            capitalize(&self.name),
            self.measurement_unit,
            self.total
        )
    }
}

/// Ingredient totals keyed by ingredient row, kept in first-encountered order.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ShoppingList {
    items: Vec<ShoppingItem>,
    positions: HashMap<i32, usize>,
}

impl ShoppingList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_amount(&mut self, ingredient_id: i32, name: &str, measurement_unit: &str, amount: i64) {
        match self.positions.get(&ingredient_id) {
            Some(&position) => self.items[position].total += amount,
            None => {
                self.positions.insert(ingredient_id, self.items.len());
                self.items.push(ShoppingItem::new(
                    ingredient_id,
                    name.to_owned(),
                    measurement_unit.to_owned(),
                    amount,
                ));
            }
        }
    }

    /// Plain-text rendering, one ingredient per line.
    pub fn render(&self) -> String {
        self.items.iter().map(|item| format!("{item}\n")).collect()
    }
}

impl FromIterator<ShoppingItem> for ShoppingList {
    fn from_iter<I: IntoIterator<Item = ShoppingItem>>(iter: I) -> Self {
        let mut list = Self::new();
        for item in iter {
            list.add_amount(item.ingredient_id, &item.name, &item.measurement_unit, item.total);
        }
        list
    }
}

impl Deref for ShoppingList {
    type Target = [ShoppingItem];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl fmt::Debug for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.items, f)
    }
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
