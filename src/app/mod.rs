pub mod api;
pub mod auth;
pub mod config;
pub mod events;
pub mod models;
pub mod session;
pub mod task_edit;
pub mod task_list;
pub mod tasks;
pub mod ui;
