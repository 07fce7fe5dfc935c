// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shopping list aggregation.
//!
//! Sums ingredient amounts across every recipe in a user's cart, grouped by
//! (ingredient name, measurement unit).

use crate::models::RecipeIngredient;
use std::collections::BTreeMap;

pub const SHOPPING_LIST_HEADER: &str = "Shopping list:";

/// One aggregated line of the shopping list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: u64,
}

/// Group rows by (name, unit) and sum their amounts.
///
/// Output is ordered by name, then unit.
pub fn aggregate<'a, I>(rows: I) -> Vec<ShoppingListItem>
where
    I: IntoIterator<Item = &'a RecipeIngredient>,
{
    let mut totals: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for row in rows {
        *totals
            .entry((row.name.as_str(), row.measurement_unit.as_str()))
            .or_insert(0) += u64::from(row.amount);
    }

    totals
        .into_iter()
        .map(|((name, unit), amount)| ShoppingListItem {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        })
        .collect()
}

/// Render the plain-text shopping list: a header, a blank line, then one
/// `- <name> (<unit>) - <amount>` line per item.
pub fn render(items: &[ShoppingListItem]) -> String {
    let mut out = format!("{}\n\n", SHOPPING_LIST_HEADER);
    let lines: Vec<String> = items
        .iter()
        .map(|item| {
            format!(
                "- {} ({}) - {}",
                item.name, item.measurement_unit, item.amount
            )
        })
        .collect();
    out.push_str(&lines.join("\n"));
    if !lines.is_empty() {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        recipe_id: u64,
        ingredient_id: u64,
        name: &str,
        unit: &str,
        amount: u32,
    ) -> RecipeIngredient {
        RecipeIngredient {
            recipe_id,
            ingredient_id,
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn test_sums_across_recipes() {
        let rows = vec![
            row(1, 10, "flour", "g", 200),
            row(1, 11, "sugar", "g", 50),
            row(2, 10, "flour", "g", 100),
            row(2, 12, "egg", "pcs", 2),
        ];

        let items = aggregate(&rows);
        let text = render(&items);

        assert!(text.contains("- flour (g) - 300"));
        assert!(text.contains("- sugar (g) - 50"));
        assert!(text.contains("- egg (pcs) - 2"));
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_total_equals_sum_of_rows() {
        let rows: Vec<_> = (1..=20)
            .map(|recipe| row(recipe, 7, "milk", "ml", recipe as u32 * 10))
            .collect();
        let expected: u64 = rows.iter().map(|r| u64::from(r.amount)).sum();

        let items = aggregate(&rows);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].amount, expected);
    }

    #[test]
    fn test_same_name_different_unit_kept_apart() {
        let rows = vec![row(1, 1, "salt", "g", 5), row(2, 2, "salt", "pinch", 1)];
        let items = aggregate(&rows);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_ordered_by_name() {
        let rows = vec![
            row(1, 3, "zucchini", "pcs", 1),
            row(1, 1, "apple", "pcs", 2),
            row(1, 2, "milk", "ml", 300),
        ];
        let names: Vec<_> = aggregate(&rows).into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["apple", "milk", "zucchini"]);
    }

    #[test]
    fn test_empty_cart_renders_header_only() {
        let text = render(&aggregate(&Vec::<RecipeIngredient>::new()));
        assert_eq!(text, "Shopping list:\n\n");
    }

    #[test]
    fn test_large_totals_do_not_overflow() {
        let rows = vec![
            row(1, 1, "rice", "g", u32::MAX),
            row(2, 1, "rice", "g", u32::MAX),
        ];
        let items = aggregate(&rows);
        assert_eq!(items[0].amount, 2 * u64::from(u32::MAX));
    }
}
