use std::path::PathBuf;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development; override via
/// environment variables (or a `.env` file) per deployment environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the tasks API (default: `http://localhost:3000/api`).
    pub api_url: String,
    /// Path of the persisted session file (default: `session.json`).
    pub session_file: PathBuf,
    /// Path of the diagnostic log file (default: `taskpad.log`).
    /// The terminal itself is owned by the UI, so logs go to a file.
    pub log_file: PathBuf,
    /// Task list page size, fixed for the whole session (default: `6`).
    pub page_size: u32,
}

impl Config {
    /// Load configuration from the environment with defaults.
    ///
    /// | Env Var                 | Default                     |
    /// |-------------------------|-----------------------------|
    /// | `TASKPAD_API_URL`       | `http://localhost:3000/api` |
    /// | `TASKPAD_SESSION_FILE`  | `session.json`              |
    /// | `TASKPAD_LOG_FILE`      | `taskpad.log`               |
    /// | `TASKPAD_PAGE_SIZE`     | `6`                         |
    pub fn from_env() -> Self {
        let api_url = std::env::var("TASKPAD_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api".into());

        let session_file = std::env::var("TASKPAD_SESSION_FILE")
            .unwrap_or_else(|_| "session.json".into())
            .into();

        let log_file = std::env::var("TASKPAD_LOG_FILE")
            .unwrap_or_else(|_| "taskpad.log".into())
            .into();

        let page_size = std::env::var("TASKPAD_PAGE_SIZE")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .filter(|&size| size > 0)
            .unwrap_or(6);

        Self {
            api_url,
            session_file,
            log_file,
            page_size,
        }
    }
}
