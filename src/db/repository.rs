use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{NewShow, Show, User};

use super::schema::SCHEMA;

/// Rows removed by a schedule flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PurgeStats {
    pub shows: usize,
    pub subscriptions: usize,
}

#[derive(Clone)]
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }

    // User operations

    pub async fn insert_user(&self, id: i64, username: &str, first_name: &str) -> Result<()> {
        let username = username.to_string();
        let first_name = first_name.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO users (id, username, first_name) VALUES (?1, ?2, ?3)",
                    params![id, username, first_name],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get_username_by_id(&self, id: i64) -> Result<String> {
        let username = self
            .conn
            .call(move |conn| {
                let username = conn
                    .query_row(
                        "SELECT username FROM users WHERE id = ?1",
                        params![id],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(username)
            })
            .await?;
        username.ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .call(move |conn| {
                let user = conn
                    .query_row(
                        "SELECT id, username, first_name, created_at FROM users WHERE id = ?1",
                        params![id],
                        user_from_row,
                    )
                    .optional()?;
                Ok(user)
            })
            .await?;
        Ok(user)
    }

    pub async fn check_user_exists(&self, id: i64) -> Result<bool> {
        let exists = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM users WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await?;
        Ok(exists)
    }

    pub async fn list_all_users(&self) -> Result<Vec<i64>> {
        let ids = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT id FROM users ORDER BY id")?;
                let ids = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<i64>, _>>()?;
                Ok(ids)
            })
            .await?;
        Ok(ids)
    }

    // Show operations

    pub async fn insert_show(&self, show: NewShow) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO shows (id, title, link, airing_day, airing_time) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![show.id, show.title, show.link, show.airing_day, show.airing_time],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get_show_id_by_title(&self, title: &str) -> Result<Option<i64>> {
        let title = title.to_string();
        let id = self
            .conn
            .call(move |conn| {
                let id = conn
                    .query_row(
                        "SELECT id FROM shows WHERE title = ?1",
                        params![title],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(id)
            })
            .await?;
        Ok(id)
    }

    pub async fn get_show_link_by_title(&self, title: &str) -> Result<Option<String>> {
        let title = title.to_string();
        let link = self
            .conn
            .call(move |conn| {
                let link = conn
                    .query_row(
                        "SELECT link FROM shows WHERE title = ?1",
                        params![title],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(link)
            })
            .await?;
        Ok(link)
    }

    pub async fn list_all_show_titles(&self) -> Result<HashSet<String>> {
        let titles = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT title FROM shows")?;
                let titles = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<HashSet<String>, _>>()?;
                Ok(titles)
            })
            .await?;
        Ok(titles)
    }

    pub async fn list_shows(&self) -> Result<Vec<Show>> {
        let shows = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, title, link, airing_day, airing_time FROM shows ORDER BY title",
                )?;
                let shows = stmt
                    .query_map([], show_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(shows)
            })
            .await?;
        Ok(shows)
    }

    // Subscription operations

    pub async fn insert_subscription(&self, user_id: i64, show_id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO subscriptions (user_id, show_id) VALUES (?1, ?2)",
                    params![user_id, show_id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Fails with `NotFound` when the pair is not subscribed; check first.
    pub async fn remove_subscription(&self, user_id: i64, show_id: i64) -> Result<()> {
        let removed = self
            .conn
            .call(move |conn| {
                let removed = conn.execute(
                    "DELETE FROM subscriptions WHERE user_id = ?1 AND show_id = ?2",
                    params![user_id, show_id],
                )?;
                Ok(removed)
            })
            .await?;

        if removed == 0 {
            return Err(AppError::NotFound(format!(
                "subscription of user {} to show {}",
                user_id, show_id
            )));
        }
        Ok(())
    }

    pub async fn check_subscribed(&self, user_id: i64, show_id: i64) -> Result<bool> {
        let exists = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM subscriptions WHERE user_id = ?1 AND show_id = ?2",
                    params![user_id, show_id],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await?;
        Ok(exists)
    }

    pub async fn list_subscribers(&self, show_id: i64) -> Result<Vec<i64>> {
        let ids = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT user_id FROM subscriptions WHERE show_id = ?1 ORDER BY user_id",
                )?;
                let ids = stmt
                    .query_map(params![show_id], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<i64>, _>>()?;
                Ok(ids)
            })
            .await?;
        Ok(ids)
    }

    /// Titles of the shows a user follows that are still in the catalog.
    pub async fn list_subscriptions(&self, user_id: i64) -> Result<Vec<String>> {
        let titles = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT s.title
                       FROM subscriptions sub
                       JOIN shows s ON s.id = sub.show_id
                       WHERE sub.user_id = ?1
                       ORDER BY s.title"#,
                )?;
                let titles = stmt
                    .query_map(params![user_id], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<String>, _>>()?;
                Ok(titles)
            })
            .await?;
        Ok(titles)
    }

    /// Delete every show and every subscription in one transaction.
    pub async fn purge_schedule_data(&self) -> Result<PurgeStats> {
        let stats = self
            .conn
            .call(|conn| {
                let tx = conn.transaction()?;
                let subscriptions = tx.execute("DELETE FROM subscriptions", [])?;
                let shows = tx.execute("DELETE FROM shows", [])?;
                tx.commit()?;
                Ok(PurgeStats {
                    shows,
                    subscriptions,
                })
            })
            .await?;
        Ok(stats)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite datetime('now'), e.g. "2026-01-11 12:34:56"
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        created_at: row
            .get::<_, String>(3)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    })
}

fn show_from_row(row: &Row) -> rusqlite::Result<Show> {
    Ok(Show {
        id: row.get(0)?,
        title: row.get(1)?,
        link: row.get(2)?,
        airing_day: row.get(3)?,
        airing_time: row.get(4)?,
    })
}
