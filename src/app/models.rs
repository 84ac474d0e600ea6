use serde::{Deserialize, Serialize};

// Wire types for the tasks API. Field names on the wire are camelCase.

/// Uniform envelope wrapped around every API response.
///
/// A missing or `false` `success` flag is always treated as failure,
/// regardless of the HTTP status the body arrived with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub created_at: String,
    // Set by the server: true when the account pre-existed the login call.
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub user_id: String,
}

/// Payload of `GET /users/check/{email}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckUserData {
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub user: Option<User>,
}

/// Payload of `POST /users/find-or-create`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub user: User,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of the task list endpoint: one page plus the total count.
#[derive(Debug, Clone, Deserialize)]
pub struct TasksResponse {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub count: u32,
}

/// Payload of the single-task create/update endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskResponse {
    pub task: Task,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of `DELETE /tasks/{taskId}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
    pub user_id: String,
}

// Unset fields are omitted from the JSON body so the server only
// touches what the client actually changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}
