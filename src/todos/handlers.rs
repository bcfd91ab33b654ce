use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{auth::extractors::AuthSession, error::ApiError, state::AppState};

use super::{
    dto::{CreateTodo, TodoEnvelope, TodoList, UpdateTodo},
    repo::Todo,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/todos", post(create_todo).get(list_todos))
        .route(
            "/todos/:id",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
}

/// An id that does not even parse is treated like any other miss, so the
/// response never reveals what a well-formed id looks like.
fn parse_todo_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::NotFound)
}

#[instrument(skip(state, session, payload))]
pub async fn create_todo(
    State(state): State<AppState>,
    session: AuthSession,
    Json(payload): Json<CreateTodo>,
) -> Result<Json<Todo>, ApiError> {
    let todo = Todo::create(&state.db, session.user.id, &payload.text).await?;
    info!(todo_id = %todo.id, user_id = %session.user.id, "todo created");
    Ok(Json(todo))
}

#[instrument(skip(state, session))]
pub async fn list_todos(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<TodoList>, ApiError> {
    let todos = Todo::list_by_creator(&state.db, session.user.id).await?;
    Ok(Json(TodoList { todos }))
}

#[instrument(skip(state, session))]
pub async fn get_todo(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
) -> Result<Json<TodoEnvelope>, ApiError> {
    let id = parse_todo_id(&id)?;
    let todo = Todo::find_by_id_and_creator(&state.db, id, session.user.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(TodoEnvelope { todo }))
}

#[instrument(skip(state, session, payload))]
pub async fn update_todo(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTodo>,
) -> Result<Json<TodoEnvelope>, ApiError> {
    let id = parse_todo_id(&id)?;
    let todo = Todo::update_by_id_and_creator(&state.db, id, session.user.id, &payload)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(TodoEnvelope { todo }))
}

#[instrument(skip(state, session))]
pub async fn delete_todo(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
) -> Result<Json<TodoEnvelope>, ApiError> {
    let id = parse_todo_id(&id)?;
    let todo = Todo::delete_by_id_and_creator(&state.db, id, session.user.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(todo_id = %todo.id, user_id = %session.user.id, "todo deleted");
    Ok(Json(TodoEnvelope { todo }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse};

    #[test]
    fn malformed_id_reads_as_not_found() {
        let err = parse_todo_id("123").unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn well_formed_id_parses() {
        let id = Uuid::new_v4();
        assert_eq!(parse_todo_id(&id.to_string()).unwrap(), id);
    }
}
