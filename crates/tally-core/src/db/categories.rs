//! Category operations

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};

use super::{format_datetime, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Category, CategoryUpdate, NewCategory};

const CATEGORY_COLUMNS: &str =
    "id, owner_id, name, description, color, icon, is_default, created_at, updated_at";

impl Database {
    /// Seed the shared default categories (idempotent)
    pub fn seed_default_categories(&self) -> Result<usize> {
        let conn = self.conn()?;

        let defaults = [
            ("Food & Dining", "#f59e0b", "utensils"),
            ("Groceries", "#10b981", "shopping-cart"),
            ("Transportation", "#ef4444", "car"),
            ("Housing", "#6366f1", "home"),
            ("Utilities", "#8b5cf6", "bolt"),
            ("Healthcare", "#ec4899", "heart"),
            ("Shopping", "#14b8a6", "bag"),
            ("Entertainment", "#f97316", "film"),
            ("Travel", "#06b6d4", "plane"),
            ("Salary", "#22c55e", "wallet"),
            ("Other", "#9ca3af", "dots"),
        ];

        let mut created = 0;
        for (name, color, icon) in &defaults {
            let exists: bool = conn
                .query_row(
                    "SELECT 1 FROM categories WHERE owner_id IS NULL AND name = ?",
                    params![name],
                    |_| Ok(true),
                )
                .optional()?
                .unwrap_or(false);

            if !exists {
                conn.execute(
                    "INSERT INTO categories (owner_id, name, color, icon, is_default) VALUES (NULL, ?, ?, ?, 1)",
                    params![name, color, icon],
                )?;
                created += 1;
            }
        }

        if created > 0 {
            info!(created, "Seeded default categories");
        }
        Ok(created)
    }

    /// Create a category for `owner_id`.
    ///
    /// Names are unique per owner, shared defaults included (case-insensitive).
    pub fn create_category(&self, owner_id: i64, new: &NewCategory) -> Result<Category> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("category name is empty".to_string()));
        }
        if self.category_name_taken(owner_id, name, None)? {
            return Err(Error::Duplicate(format!("category '{}'", name)));
        }

        let color = new
            .color
            .clone()
            .unwrap_or_else(|| self.config().categories.default_color.clone());

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO categories (owner_id, name, description, color, icon, is_default)
            VALUES (?, ?, ?, ?, ?, 0)
            "#,
            params![owner_id, name, new.description, color, new.icon],
        )?;
        let id = conn.last_insert_rowid();
        info!(owner_id, category_id = id, name, "Category created");

        self.get_category(owner_id, id)?
            .ok_or_else(|| Error::NotFound(format!("category {}", id)))
    }

    fn category_name_taken(&self, owner_id: i64, name: &str, except: Option<i64>) -> Result<bool> {
        let conn = self.conn()?;
        let taken = conn
            .query_row(
                r#"
                SELECT 1 FROM categories
                WHERE name = ? COLLATE NOCASE
                  AND (owner_id = ? OR is_default = 1)
                  AND id != IFNULL(?, -1)
                "#,
                params![name, owner_id, except],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(taken)
    }

    /// Get a category visible to `owner_id` (their own or a default)
    pub fn get_category(&self, owner_id: i64, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM categories WHERE id = ? AND (owner_id = ? OR is_default = 1)",
            CATEGORY_COLUMNS
        );
        let category = conn
            .query_row(&sql, params![id, owner_id], Self::row_to_category)
            .optional()?;
        Ok(category)
    }

    /// Categories visible to `owner_id`, ordered by name
    pub fn list_categories(&self, owner_id: i64) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM categories WHERE owner_id = ? OR is_default = 1 ORDER BY name COLLATE NOCASE, id",
            CATEGORY_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let categories = stmt
            .query_map(params![owner_id], Self::row_to_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Load an owner's own category for modification; defaults are read-only
    fn owned_category(&self, owner_id: i64, id: i64) -> Result<Category> {
        let category = self
            .get_category(owner_id, id)?
            .ok_or_else(|| Error::NotFound(format!("category {}", id)))?;
        if category.is_default {
            return Err(Error::InvalidData(format!(
                "category '{}' is a shared default and cannot be changed",
                category.name
            )));
        }
        Ok(category)
    }

    /// Partially update a category, then refresh the snapshots that reference it
    pub fn update_category(
        &self,
        owner_id: i64,
        id: i64,
        update: &CategoryUpdate,
    ) -> Result<Category> {
        let mut category = self.owned_category(owner_id, id)?;

        if let Some(name) = &update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::InvalidData("category name is empty".to_string()));
            }
            if self.category_name_taken(owner_id, name, Some(id))? {
                return Err(Error::Duplicate(format!("category '{}'", name)));
            }
            category.name = name.to_string();
        }
        if let Some(description) = &update.description {
            category.description = description.clone();
        }
        if let Some(color) = &update.color {
            category.color = color.clone();
        }
        if let Some(icon) = &update.icon {
            category.icon = icon.clone();
        }
        category.updated_at = Utc::now();

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE categories
            SET name = ?, description = ?, color = ?, icon = ?, updated_at = ?
            WHERE id = ?
            "#,
            params![
                category.name,
                category.description,
                category.color,
                category.icon,
                format_datetime(category.updated_at),
                id,
            ],
        )?;
        drop(conn);

        let refreshed = self.refresh_denormalized_category(id)?;
        info!(owner_id, category_id = id, refreshed, "Category updated");
        Ok(category)
    }

    /// Delete an owner's category.
    ///
    /// Transactions keep their category id and snapshot; reports fall back
    /// to the snapshot name once the live category is gone.
    pub fn delete_category(&self, owner_id: i64, id: i64) -> Result<()> {
        self.owned_category(owner_id, id)?;
        let conn = self.conn()?;
        conn.execute("DELETE FROM categories WHERE id = ?", params![id])?;
        info!(owner_id, category_id = id, "Category deleted");
        Ok(())
    }

    /// Rewrite the snapshot columns of every transaction referencing a category.
    ///
    /// Returns the number of transactions changed. A deleted category leaves
    /// snapshots as they are.
    pub fn refresh_denormalized_category(&self, category_id: i64) -> Result<usize> {
        let conn = self.conn()?;
        let live: Option<(String, String, Option<String>)> = conn
            .query_row(
                "SELECT name, color, icon FROM categories WHERE id = ?",
                params![category_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((name, color, icon)) = live else {
            debug!(category_id, "Category gone; snapshots left as they are");
            return Ok(0);
        };

        let changed = conn.execute(
            r#"
            UPDATE transactions
            SET category_name = ?1, category_color = ?2, category_icon = ?3
            WHERE category_id = ?4
              AND (category_name IS NOT ?1 OR category_color IS NOT ?2 OR category_icon IS NOT ?3)
            "#,
            params![name, color, icon, category_id],
        )?;
        debug!(category_id, changed, "Refreshed category snapshots");
        Ok(changed)
    }

    pub(crate) fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
        let created_at_str: String = row.get(7)?;
        let updated_at_str: String = row.get(8)?;
        Ok(Category {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            color: row.get(4)?,
            icon: row.get(5)?,
            is_default: row.get(6)?,
            created_at: parse_datetime(&created_at_str),
            updated_at: parse_datetime(&updated_at_str),
        })
    }
}
