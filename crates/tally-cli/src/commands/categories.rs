//! Category command implementations

use std::collections::HashMap;

use anyhow::{Context, Result};
use tally_core::models::{CategoryUpdate, NewCategory};
use tally_core::Database;

use super::truncate;

pub fn cmd_categories_list(db: &Database, owner: i64) -> Result<()> {
    let categories = db.list_categories(owner)?;
    let usage: HashMap<i64, usize> = db.category_usage(owner)?.into_iter().collect();

    if categories.is_empty() {
        println!("No categories yet. Run 'tally init' to seed the defaults.");
        return Ok(());
    }

    println!(
        "{:>5}  {:24} {:8} {:>6}  {}",
        "ID", "Name", "Color", "Count", ""
    );
    println!("{}", "─".repeat(56));

    for category in &categories {
        println!(
            "{:>5}  {:24} {:8} {:>6}  {}",
            category.id,
            truncate(&category.name, 24),
            category.color,
            usage.get(&category.id).copied().unwrap_or(0),
            if category.is_default { "default" } else { "" }
        );
    }

    Ok(())
}

pub fn cmd_categories_add(
    db: &Database,
    owner: i64,
    name: &str,
    color: Option<&str>,
    icon: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    let category = db
        .create_category(
            owner,
            &NewCategory {
                name: name.to_string(),
                description: description.map(String::from),
                color: color.map(String::from),
                icon: icon.map(String::from),
            },
        )
        .with_context(|| format!("Failed to create category '{}'", name))?;

    println!("✓ Created category: {} (id: {})", category.name, category.id);
    Ok(())
}

pub fn cmd_categories_edit(
    db: &Database,
    owner: i64,
    id: i64,
    name: Option<&str>,
    color: Option<&str>,
    icon: Option<&str>,
) -> Result<()> {
    if name.is_none() && color.is_none() && icon.is_none() {
        anyhow::bail!("Nothing to change. Pass --name, --color or --icon.");
    }

    let category = db
        .update_category(
            owner,
            id,
            &CategoryUpdate {
                name: name.map(String::from),
                description: None,
                color: color.map(String::from),
                icon: icon.map(|i| Some(i.to_string())),
            },
        )
        .with_context(|| format!("Failed to update category {}", id))?;

    println!("✓ Updated category: {} ({})", category.name, category.color);
    Ok(())
}

pub fn cmd_categories_delete(db: &Database, owner: i64, id: i64) -> Result<()> {
    db.delete_category(owner, id)
        .with_context(|| format!("Failed to delete category {}", id))?;
    println!("✓ Deleted category {}", id);
    println!("  Transactions keep their last known category name.");
    Ok(())
}
