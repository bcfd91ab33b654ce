use serde::{Deserialize, Serialize};

use super::repo::Todo;

/// Request body for creating a todo.
#[derive(Debug, Deserialize)]
pub struct CreateTodo {
    pub text: String,
}

/// Partial update; omitted fields are left untouched. `completedAt` is
/// derived server-side and cannot be supplied.
#[derive(Debug, Deserialize)]
pub struct UpdateTodo {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct TodoList {
    pub todos: Vec<Todo>,
}

#[derive(Debug, Serialize)]
pub struct TodoEnvelope {
    pub todo: Todo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_accepts_partial_bodies() {
        let patch: UpdateTodo = serde_json::from_str(r#"{"completed":true}"#).unwrap();
        assert_eq!(patch.completed, Some(true));
        assert!(patch.text.is_none());

        let patch: UpdateTodo = serde_json::from_str(r#"{"text":"new text"}"#).unwrap();
        assert_eq!(patch.text.as_deref(), Some("new text"));
        assert!(patch.completed.is_none());

        let patch: UpdateTodo = serde_json::from_str("{}").unwrap();
        assert!(patch.text.is_none() && patch.completed.is_none());
    }

    #[test]
    fn supplied_completed_at_is_ignored_by_the_schema() {
        // Unknown fields are dropped at the boundary.
        let patch: UpdateTodo =
            serde_json::from_str(r#"{"completed":true,"completedAt":123}"#).unwrap();
        assert_eq!(patch.completed, Some(true));
    }
}
