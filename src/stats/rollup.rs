//! Per-user, per-category rollup over a period.

use serde::Serialize;

use crate::format::format_duration;
use crate::models::{Role, User};

/// One `(user, category)` group from the ledger: summed duration and count.
#[derive(Debug, Clone)]
pub struct RollupRow {
    pub user_id: String,
    pub category_id: String,
    pub category_name: String,
    pub category_color: String,
    pub entry_count: i64,
    pub total_seconds: i64,
}

/// A category's share of one user's time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category_id: String,
    pub category_name: String,
    pub category_color: String,
    pub total_seconds: i64,
    pub entry_count: i64,
}

/// One user's totals for the period, broken down by category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub user_role: Role,
    pub total_seconds: i64,
    pub total_display: String,
    pub entry_count: i64,
    pub categories: Vec<CategoryStats>,
}

/// Fold grouped rows into per-user stats.
///
/// Every user in `roster` appears exactly once, with zero totals when they
/// have no rows. Rows for users missing from the roster are dropped. Users are
/// ordered by total seconds descending; ties keep roster order. Categories
/// within a user are ordered by total seconds descending.
pub fn build_rollup(roster: &[User], rows: Vec<RollupRow>) -> Vec<UserStats> {
    let mut stats: Vec<UserStats> = roster
        .iter()
        .map(|user| UserStats {
            user_id: user.id.clone(),
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            user_role: user.role,
            total_seconds: 0,
            total_display: String::new(),
            entry_count: 0,
            categories: Vec::new(),
        })
        .collect();

    for row in rows {
        let Some(user) = stats.iter_mut().find(|s| s.user_id == row.user_id) else {
            tracing::debug!("Skipping rollup row for unknown user {}", row.user_id);
            continue;
        };
        user.total_seconds += row.total_seconds;
        user.entry_count += row.entry_count;
        user.categories.push(CategoryStats {
            category_id: row.category_id,
            category_name: row.category_name,
            category_color: row.category_color,
            total_seconds: row.total_seconds,
            entry_count: row.entry_count,
        });
    }

    for user in &mut stats {
        user.categories
            .sort_by(|a, b| b.total_seconds.cmp(&a.total_seconds));
        user.total_display = format_duration(user.total_seconds);
    }

    // Stable, so equal totals keep roster order.
    stats.sort_by(|a, b| b.total_seconds.cmp(&a.total_seconds));
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            name: name.to_string(),
            role: Role::Member,
            created_at: "2026-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    fn row(user_id: &str, category_id: &str, count: i64, total: i64) -> RollupRow {
        RollupRow {
            user_id: user_id.to_string(),
            category_id: category_id.to_string(),
            category_name: category_id.to_uppercase(),
            category_color: "#fff".to_string(),
            entry_count: count,
            total_seconds: total,
        }
    }

    #[test]
    fn test_no_rows_lists_every_user_with_zero() {
        let roster = vec![user("u1", "Ada"), user("u2", "Bob")];
        let stats = build_rollup(&roster, Vec::new());

        assert_eq!(stats.len(), 2);
        for s in &stats {
            assert_eq!(s.total_seconds, 0);
            assert_eq!(s.entry_count, 0);
            assert!(s.categories.is_empty());
            assert_eq!(s.total_display, "0s");
        }
        assert_eq!(stats[0].user_id, "u1");
        assert_eq!(stats[1].user_id, "u2");
    }

    #[test]
    fn test_users_sorted_by_total_descending() {
        let roster = vec![user("u1", "Ada"), user("u2", "Bob"), user("u3", "Cy")];
        let rows = vec![
            row("u1", "dev", 1, 600),
            row("u2", "dev", 2, 3600),
            row("u2", "meet", 1, 1200),
        ];
        let stats = build_rollup(&roster, rows);

        let order: Vec<&str> = stats.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(order, vec!["u2", "u1", "u3"]);
        assert_eq!(stats[0].total_seconds, 4800);
        assert_eq!(stats[0].entry_count, 3);
        assert_eq!(stats[0].total_display, "1h 20m");
        assert_eq!(stats[2].total_seconds, 0);
    }

    #[test]
    fn test_categories_sorted_by_total_descending() {
        let roster = vec![user("u1", "Ada")];
        let rows = vec![
            row("u1", "meet", 1, 100),
            row("u1", "dev", 3, 900),
            row("u1", "admin", 1, 300),
        ];
        let stats = build_rollup(&roster, rows);

        let cats: Vec<&str> = stats[0]
            .categories
            .iter()
            .map(|c| c.category_id.as_str())
            .collect();
        assert_eq!(cats, vec!["dev", "admin", "meet"]);
    }

    #[test]
    fn test_rows_for_unknown_users_are_ignored() {
        let roster = vec![user("u1", "Ada")];
        let stats = build_rollup(&roster, vec![row("ghost", "dev", 1, 50)]);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total_seconds, 0);
    }
}
