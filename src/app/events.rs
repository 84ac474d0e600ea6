// Commands emitted by the screens and the completion events their network
// calls produce. The UI loop stays single threaded: requests are spawned on
// the runtime and their results come back over a channel, in completion
// order. Out-of-order completions are not reconciled.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::error;

use crate::app::api::ApiError;
use crate::app::auth::AuthService;
use crate::app::models::{
    ApiResponse, CheckUserData, CreateTaskRequest, MessageResponse, TaskResponse, TasksResponse,
    UpdateTaskRequest, UserResponse,
};
use crate::app::tasks::TaskService;

// A network call requested by a screen handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CheckUser {
        email: String,
    },
    Login {
        email: String,
    },
    LoadTasks {
        user_id: String,
        first: u32,
        rows: u32,
    },
    CreateTask(CreateTaskRequest),
    UpdateTask {
        task_id: String,
        update: UpdateTaskRequest,
        // Form submissions close the dialog and toast; toggles only
        // refresh the badge counts.
        from_form: bool,
    },
    DeleteTask {
        task_id: String,
        user_id: String,
    },
}

// Completion of a network call, delivered back to the UI loop.
pub enum AppEvent {
    UserChecked(Result<ApiResponse<CheckUserData>, ApiError>),
    LoggedIn(Result<ApiResponse<UserResponse>, ApiError>),
    TasksLoaded(Result<ApiResponse<TasksResponse>, ApiError>),
    TaskCreated(Result<ApiResponse<TaskResponse>, ApiError>),
    TaskUpdated {
        from_form: bool,
        result: Result<ApiResponse<TaskResponse>, ApiError>,
    },
    TaskDeleted(Result<ApiResponse<MessageResponse>, ApiError>),
}

// Executes commands by spawning the matching request future. Dropping the
// receiver side (on quit) makes the sends no-ops, which is all the
// cancellation this client needs.
pub struct CommandRunner {
    handle: Handle,
    tx: UnboundedSender<AppEvent>,
    auth: Arc<AuthService>,
    tasks: Arc<TaskService>,
}

impl CommandRunner {
    pub fn new(
        handle: Handle,
        tx: UnboundedSender<AppEvent>,
        auth: Arc<AuthService>,
        tasks: Arc<TaskService>,
    ) -> Self {
        Self {
            handle,
            tx,
            auth,
            tasks,
        }
    }

    pub fn dispatch(&self, command: Command) {
        let tx = self.tx.clone();
        match command {
            Command::CheckUser { email } => {
                let auth = Arc::clone(&self.auth);
                self.handle.spawn(async move {
                    let result = auth.check_user_exists(&email).await;
                    log_transport_failure("check user", &result);
                    let _ = tx.send(AppEvent::UserChecked(result));
                });
            }
            Command::Login { email } => {
                let auth = Arc::clone(&self.auth);
                self.handle.spawn(async move {
                    let result = auth.login(&email).await;
                    log_transport_failure("login", &result);
                    let _ = tx.send(AppEvent::LoggedIn(result));
                });
            }
            Command::LoadTasks {
                user_id,
                first,
                rows,
            } => {
                let tasks = Arc::clone(&self.tasks);
                self.handle.spawn(async move {
                    let result = tasks.list_tasks(&user_id, first, rows).await;
                    log_transport_failure("load tasks", &result);
                    let _ = tx.send(AppEvent::TasksLoaded(result));
                });
            }
            Command::CreateTask(task) => {
                let tasks = Arc::clone(&self.tasks);
                self.handle.spawn(async move {
                    let result = tasks.create_task(&task).await;
                    log_transport_failure("create task", &result);
                    let _ = tx.send(AppEvent::TaskCreated(result));
                });
            }
            Command::UpdateTask {
                task_id,
                update,
                from_form,
            } => {
                let tasks = Arc::clone(&self.tasks);
                self.handle.spawn(async move {
                    let result = tasks.update_task(&task_id, &update).await;
                    log_transport_failure("update task", &result);
                    let _ = tx.send(AppEvent::TaskUpdated { from_form, result });
                });
            }
            Command::DeleteTask { task_id, user_id } => {
                let tasks = Arc::clone(&self.tasks);
                self.handle.spawn(async move {
                    let result = tasks.delete_task(&task_id, &user_id).await;
                    log_transport_failure("delete task", &result);
                    let _ = tx.send(AppEvent::TaskDeleted(result));
                });
            }
        }
    }
}

fn log_transport_failure<T>(operation: &str, result: &Result<T, ApiError>) {
    if let Err(err) = result {
        error!(operation, %err, "API call failed");
    }
}
