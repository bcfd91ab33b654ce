use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

use super::dto::UpdateTodo;

/// A todo owned by exactly one user. `completed_at` is epoch milliseconds
/// and is `NULL` whenever `completed` is false.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub text: String,
    pub completed: bool,
    pub completed_at: Option<i64>,
    pub creator: Uuid,
}

fn epoch_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

fn normalized_text(text: &str) -> Result<&str, ApiError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::Validation("text must not be empty".into()));
    }
    Ok(text)
}

impl Todo {
    pub async fn create(db: &PgPool, creator: Uuid, text: &str) -> Result<Todo, ApiError> {
        let text = normalized_text(text)?;
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (text, creator)
            VALUES ($1, $2)
            RETURNING id, text, completed, completed_at, creator
            "#,
        )
        .bind(text)
        .bind(creator)
        .fetch_one(db)
        .await?;
        Ok(todo)
    }

    pub async fn list_by_creator(db: &PgPool, creator: Uuid) -> Result<Vec<Todo>, ApiError> {
        let rows = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, text, completed, completed_at, creator
            FROM todos
            WHERE creator = $1
            "#,
        )
        .bind(creator)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Ownership-scoped lookup. A missing todo and someone else's todo are
    /// the same `None` to the caller.
    pub async fn find_by_id_and_creator(
        db: &PgPool,
        id: Uuid,
        creator: Uuid,
    ) -> Result<Option<Todo>, ApiError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, text, completed, completed_at, creator
            FROM todos
            WHERE id = $1 AND creator = $2
            "#,
        )
        .bind(id)
        .bind(creator)
        .fetch_optional(db)
        .await?;
        Ok(todo)
    }

    /// Apply a partial update in a single ownership-scoped statement.
    ///
    /// The completion invariant lives in the SQL so there is no
    /// read-modify-write window: becoming completed stamps the current
    /// time, un-completing clears the stamp, and a re-patch of an
    /// already-completed todo keeps the original stamp. The caller can
    /// never supply `completed_at`.
    pub async fn update_by_id_and_creator(
        db: &PgPool,
        id: Uuid,
        creator: Uuid,
        patch: &UpdateTodo,
    ) -> Result<Option<Todo>, ApiError> {
        let text = match patch.text.as_deref() {
            Some(t) => Some(normalized_text(t)?.to_string()),
            None => None,
        };
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
            SET text = COALESCE($3, text),
                completed = COALESCE($4, completed),
                completed_at = CASE
                    WHEN $4 AND NOT completed THEN $5
                    WHEN $4 THEN completed_at
                    WHEN NOT $4 THEN NULL
                    ELSE completed_at
                END
            WHERE id = $1 AND creator = $2
            RETURNING id, text, completed, completed_at, creator
            "#,
        )
        .bind(id)
        .bind(creator)
        .bind(text)
        .bind(patch.completed)
        .bind(epoch_ms())
        .fetch_optional(db)
        .await?;
        Ok(todo)
    }

    /// Delete and return the record, or `None` when it does not exist or
    /// belongs to someone else.
    pub async fn delete_by_id_and_creator(
        db: &PgPool,
        id: Uuid,
        creator: Uuid,
    ) -> Result<Option<Todo>, ApiError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            DELETE FROM todos
            WHERE id = $1 AND creator = $2
            RETURNING id, text, completed, completed_at, creator
            "#,
        )
        .bind(id)
        .bind(creator)
        .fetch_optional(db)
        .await?;
        Ok(todo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_trimmed_and_must_be_non_empty() {
        assert_eq!(normalized_text("  buy milk ").unwrap(), "buy milk");
        assert!(matches!(
            normalized_text("   "),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(normalized_text(""), Err(ApiError::Validation(_))));
    }

    #[test]
    fn pending_todo_serializes_with_null_completed_at() {
        let todo = Todo {
            id: Uuid::new_v4(),
            text: "buy milk".into(),
            completed: false,
            completed_at: None,
            creator: Uuid::new_v4(),
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["text"], "buy milk");
        assert_eq!(json["completed"], false);
        assert!(json["completedAt"].is_null());
    }

    #[test]
    fn completed_todo_serializes_with_numeric_timestamp() {
        let todo = Todo {
            id: Uuid::new_v4(),
            text: "done".into(),
            completed: true,
            completed_at: Some(1_700_000_000_000),
            creator: Uuid::new_v4(),
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["completedAt"], 1_700_000_000_000i64);
    }

    #[test]
    fn epoch_ms_is_milliseconds() {
        let ms = epoch_ms();
        // Well past 2020 in ms, and far below any plausible ns value.
        assert!(ms > 1_577_836_800_000);
        assert!(ms < 100_000_000_000_000);
    }
}
