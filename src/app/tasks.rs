// Task API calls and the client-side rules around them.
// Philosophy of task CRUD lives here; list-screen state lives in task_list.

use std::sync::Arc;

use chrono::DateTime;

use crate::app::api::{ApiClient, ApiError};
use crate::app::models::{
    ApiResponse, CreateTaskRequest, MessageResponse, TaskResponse, TasksResponse,
    UpdateTaskRequest,
};

pub const TITLE_MAX_LEN: usize = 200;
pub const DESCRIPTION_MAX_LEN: usize = 1000;

pub struct TaskService {
    api: Arc<ApiClient>,
}

impl TaskService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    // READ: one page of the user's tasks plus the total count
    pub async fn list_tasks(
        &self,
        user_id: &str,
        first: u32,
        rows: u32,
    ) -> Result<ApiResponse<TasksResponse>, ApiError> {
        self.api
            .get(&format!("/tasks/user/{user_id}/{first}/{rows}"))
            .await
    }

    // READ: a single task by id. No screen calls this yet; kept for parity
    // with the server surface.
    #[allow(dead_code)]
    pub async fn get_task(&self, task_id: &str) -> Result<ApiResponse<TaskResponse>, ApiError> {
        self.api.get(&format!("/tasks/task/{task_id}")).await
    }

    // CREATE
    pub async fn create_task(
        &self,
        task: &CreateTaskRequest,
    ) -> Result<ApiResponse<TaskResponse>, ApiError> {
        self.api.post("/tasks", task).await
    }

    // UPDATE: also used for completion toggling
    pub async fn update_task(
        &self,
        task_id: &str,
        update: &UpdateTaskRequest,
    ) -> Result<ApiResponse<TaskResponse>, ApiError> {
        self.api.put(&format!("/tasks/{task_id}"), update).await
    }

    // DELETE: the owning user travels in the decorated headers, not the path
    pub async fn delete_task(
        &self,
        task_id: &str,
        _user_id: &str,
    ) -> Result<ApiResponse<MessageResponse>, ApiError> {
        self.api.delete(&format!("/tasks/{task_id}")).await
    }
}

// Validate a task before it goes anywhere near the network.
// Returns human-readable messages; an empty list means the data is valid.
pub fn validate_task_data(task: &CreateTaskRequest) -> Vec<String> {
    let mut errors = Vec::new();

    let title = task.title.trim();
    if title.is_empty() {
        errors.push("Title is required".to_string());
    }
    if title.chars().count() > TITLE_MAX_LEN {
        errors.push(format!(
            "Title cannot be longer than {TITLE_MAX_LEN} characters"
        ));
    }
    if task.description.chars().count() > DESCRIPTION_MAX_LEN {
        errors.push(format!(
            "Description cannot be longer than {DESCRIPTION_MAX_LEN} characters"
        ));
    }
    if task.user_id.is_empty() {
        errors.push("User id is required".to_string());
    }

    errors
}

// Format a server timestamp for task cards; falls back to the raw string
// when the server sends something unparseable.
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(when) => when.format("%d %b %Y %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}
