use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::error;

use crate::app::auth::{LoginPhase, LoginScreen};
use crate::app::events::{AppEvent, Command, CommandRunner};
use crate::app::models::{CreateTaskRequest, Task, UpdateTaskRequest};
use crate::app::session::SessionStore;
use crate::app::task_edit::{get_task_edit_ui, TaskEditDialogState};
use crate::app::task_list::{
    get_instructions_ui, get_list_items_ui, get_statistics_ui, TaskListScreen, TaskTab,
};
use crate::app::tasks::validate_task_data;

const CONNECTION_ERROR: &str = "Connection error. Try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Tasks,
}

// What a key press asks the loop to do
#[derive(Debug, PartialEq)]
pub enum Action {
    Quit,
    Run(Command),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

// Transient notification shown on the status line until it expires
pub struct Toast {
    pub text: String,
    pub kind: ToastKind,
    expires_at: Instant,
}

pub struct App {
    pub screen: Screen,
    pub login: LoginScreen,
    pub tasks: TaskListScreen,
    pub dialog: TaskEditDialogState,
    pub toast: Option<Toast>,
    session: Arc<SessionStore>,
    page_size: u32,
}

impl App {
    pub fn new(session: Arc<SessionStore>, page_size: u32) -> App {
        App {
            screen: Screen::Login,
            login: LoginScreen::default(),
            tasks: TaskListScreen::new(page_size),
            dialog: TaskEditDialogState::default(),
            toast: None,
            session,
            page_size,
        }
    }

    // A valid persisted session skips the login form entirely
    pub fn on_start(&mut self) -> Option<Command> {
        if self.session.is_authenticated() {
            self.screen = Screen::Tasks;
            self.reload_tasks()
        } else {
            None
        }
    }

    fn notify_info(&mut self, text: impl Into<String>) {
        self.toast = Some(Toast {
            text: text.into(),
            kind: ToastKind::Info,
            expires_at: Instant::now() + Duration::from_secs(3),
        });
    }

    fn notify_error(&mut self, text: impl Into<String>) {
        self.toast = Some(Toast {
            text: text.into(),
            kind: ToastKind::Error,
            expires_at: Instant::now() + Duration::from_secs(5),
        });
    }

    pub fn prune_toast(&mut self) {
        if let Some(toast) = &self.toast {
            if Instant::now() >= toast.expires_at {
                self.toast = None;
            }
        }
    }

    // Reload the current page for the current user. Losing the session
    // mid-flight redirects back to the login screen.
    fn reload_tasks(&mut self) -> Option<Command> {
        match self.session.current_user() {
            Some(user) => {
                self.tasks.is_loading = true;
                Some(Command::LoadTasks {
                    user_id: user.id,
                    first: self.tasks.first,
                    rows: self.tasks.rows,
                })
            }
            None => {
                self.screen = Screen::Login;
                None
            }
        }
    }

    fn logout(&mut self) {
        self.session.logout();
        self.login = LoginScreen::default();
        self.tasks = TaskListScreen::new(self.page_size);
        self.dialog = TaskEditDialogState::default();
        self.screen = Screen::Login;
    }

    // Handle input for whichever screen or modal is active
    pub fn handle_key(&mut self, key: KeyCode) -> Option<Action> {
        match self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Tasks => self.handle_tasks_key(key),
        }
    }

    fn handle_login_key(&mut self, key: KeyCode) -> Option<Action> {
        if self.login.phase == LoginPhase::Confirming {
            // "Create this account automatically?"
            return match key {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.login.accept_confirmation().map(Action::Run)
                }
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.login.decline_confirmation();
                    None
                }
                _ => None,
            };
        }

        match key {
            KeyCode::Esc => Some(Action::Quit),
            KeyCode::Enter => self.login.submit().map(Action::Run),
            KeyCode::Backspace => {
                self.login.delete_char();
                None
            }
            KeyCode::Char(to_insert) => {
                self.login.input(to_insert);
                None
            }
            _ => None,
        }
    }

    fn handle_tasks_key(&mut self, key: KeyCode) -> Option<Action> {
        if self.dialog.dialog_active {
            // Handle input for the task add/edit dialog
            match key {
                KeyCode::Down => self.dialog.move_cursor_down(),
                KeyCode::Up => self.dialog.move_cursor_up(),
                KeyCode::Left => self.dialog.move_cursor_left(),
                KeyCode::Right => self.dialog.move_cursor_right(),
                KeyCode::Esc => self.dialog.close(),
                KeyCode::Backspace => self.dialog.delete_char(),
                KeyCode::Enter => return self.submit_task_form().map(Action::Run),
                KeyCode::Char(to_insert) => self.dialog.input(to_insert),
                _ => {}
            }
            return None;
        }

        if self.tasks.confirm_delete.is_some() {
            // "Are you sure you want to delete the task?"
            return match key {
                KeyCode::Char('y') | KeyCode::Enter => self.confirm_delete().map(Action::Run),
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.tasks.decline_delete();
                    None
                }
                _ => None,
            };
        }

        // Handle input for the task list navigation and state changes
        match key {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Down => {
                self.tasks.next();
                None
            }
            KeyCode::Up => {
                self.tasks.previous();
                None
            }
            KeyCode::Left => {
                self.tasks.unselect();
                None
            }
            KeyCode::Tab => {
                self.tasks.switch_tab();
                None
            }
            KeyCode::Enter => self.toggle_selected().map(Action::Run),
            KeyCode::Char('a') => {
                self.dialog.create_a_new_task();
                None
            }
            KeyCode::Char('e') => {
                if let Some(task) = self.tasks.selected_task() {
                    let task = task.clone();
                    self.dialog.edit_task(&task);
                }
                None
            }
            KeyCode::Char('x') => {
                self.tasks.request_delete();
                None
            }
            KeyCode::Char('n') => {
                if self.tasks.page_forward() {
                    self.reload_tasks().map(Action::Run)
                } else {
                    None
                }
            }
            KeyCode::Char('p') => {
                if self.tasks.page_back() {
                    self.reload_tasks().map(Action::Run)
                } else {
                    None
                }
            }
            KeyCode::Char('r') => self.reload_tasks().map(Action::Run),
            KeyCode::Char('l') => {
                self.logout();
                None
            }
            _ => None,
        }
    }

    // Toggling builds a copy of the task with the flag inverted and sends
    // it through the same update call the form uses
    fn toggle_selected(&mut self) -> Option<Command> {
        let task = self.tasks.selected_task()?.clone();
        Some(Command::UpdateTask {
            task_id: task.id.clone(),
            update: UpdateTaskRequest {
                title: Some(task.title),
                description: Some(task.description),
                completed: Some(!task.completed),
            },
            from_form: false,
        })
    }

    fn confirm_delete(&mut self) -> Option<Command> {
        let task = self.tasks.take_confirmed_delete()?;
        let user = self.session.current_user()?;
        Some(Command::DeleteTask {
            task_id: task.id,
            user_id: user.id,
        })
    }

    // Validate and submit the dialog form, for both create and edit.
    // Validation failures surface the first error and skip the network.
    fn submit_task_form(&mut self) -> Option<Command> {
        let user = match self.session.current_user() {
            Some(user) => user,
            None => {
                self.screen = Screen::Login;
                return None;
            }
        };

        let values = self.dialog.form_values();
        let request = CreateTaskRequest {
            title: values.title,
            description: values.description,
            user_id: user.id,
        };

        let errors = validate_task_data(&request);
        if let Some(first) = errors.into_iter().next() {
            self.dialog.error_message = Some(first.clone());
            self.notify_error(first);
            self.tasks.is_submitting = false;
            return None;
        }

        self.dialog.error_message = None;
        self.tasks.is_submitting = true;
        match self.dialog.editing() {
            Some(task) => Some(Command::UpdateTask {
                task_id: task.id.clone(),
                update: UpdateTaskRequest {
                    title: Some(request.title),
                    description: Some(request.description),
                    completed: Some(task.completed),
                },
                from_form: true,
            }),
            None => Some(Command::CreateTask(request)),
        }
    }

    // Handle a completed network call. Every exit path clears the busy
    // flag it belongs to; failed mutations resync with a full reload.
    pub fn handle_event(&mut self, event: AppEvent) -> Option<Command> {
        match event {
            AppEvent::UserChecked(result) => {
                match result {
                    Ok(response) => {
                        if !response.success {
                            self.notify_error(CONNECTION_ERROR);
                            self.login.phase = LoginPhase::Idle;
                            return None;
                        }
                        if response.data.map_or(false, |data| data.exists) {
                            self.login.phase = LoginPhase::Submitting;
                            return Some(Command::Login {
                                email: self.login.email.trim().to_string(),
                            });
                        }
                        // Unknown email: ask before auto-creating
                        self.login.phase = LoginPhase::Confirming;
                    }
                    Err(err) => {
                        error!(%err, "user existence check failed");
                        self.notify_error(CONNECTION_ERROR);
                        self.login.phase = LoginPhase::Idle;
                    }
                }
                None
            }

            AppEvent::LoggedIn(result) => {
                self.login.phase = LoginPhase::Idle;
                match result {
                    Ok(response) => match (response.success, response.data) {
                        (true, Some(data)) => {
                            if data.user.exists {
                                self.notify_info("Welcome back!");
                            } else {
                                self.notify_info("Account created successfully!");
                            }
                            self.screen = Screen::Tasks;
                            self.tasks = TaskListScreen::new(self.page_size);
                            self.reload_tasks()
                        }
                        (_, _) => {
                            self.notify_error(
                                response.error.unwrap_or_else(|| "Login failed".into()),
                            );
                            None
                        }
                    },
                    Err(err) => {
                        error!(%err, "login failed");
                        self.notify_error(CONNECTION_ERROR);
                        None
                    }
                }
            }

            AppEvent::TasksLoaded(result) => {
                self.tasks.is_loading = false;
                match result {
                    Ok(response) => match (response.success, response.data) {
                        (true, Some(data)) => self.tasks.apply_loaded(data),
                        (_, _) => self.notify_error(
                            response.error.unwrap_or_else(|| "Failed to load tasks".into()),
                        ),
                    },
                    Err(err) => {
                        error!(%err, "task load failed");
                        self.notify_error(CONNECTION_ERROR);
                    }
                }
                None
            }

            AppEvent::TaskCreated(result) => {
                self.tasks.is_submitting = false;
                match result {
                    Ok(response) if response.success => {
                        self.dialog.reset();
                        self.dialog.close();
                        let text = response
                            .data
                            .and_then(|data| data.message)
                            .unwrap_or_else(|| "Task created successfully".into());
                        self.notify_info(text);
                        self.reload_tasks()
                    }
                    Ok(response) => {
                        // Dialog stays open so the input is not lost
                        let text = response
                            .error
                            .unwrap_or_else(|| "Failed to create the task".into());
                        self.dialog.error_message = Some(text.clone());
                        self.notify_error(text);
                        None
                    }
                    Err(err) => {
                        error!(%err, "task create failed");
                        self.notify_error(CONNECTION_ERROR);
                        None
                    }
                }
            }

            AppEvent::TaskUpdated { from_form, result } => match result {
                Ok(response) => match (response.success, response.data) {
                    (true, Some(data)) => {
                        self.tasks.splice_updated(data.task);
                        if from_form {
                            self.tasks.is_submitting = false;
                            self.dialog.close();
                            self.notify_info(
                                data.message
                                    .unwrap_or_else(|| "Task updated successfully".into()),
                            );
                        } else {
                            // Lightweight toggle: only the badges refresh
                            self.tasks.refresh_badges();
                        }
                        None
                    }
                    (_, _) => {
                        self.tasks.is_submitting = false;
                        self.notify_error(
                            response
                                .error
                                .unwrap_or_else(|| "Failed to update the task".into()),
                        );
                        self.reload_tasks()
                    }
                },
                Err(err) => {
                    error!(%err, "task update failed");
                    self.tasks.is_submitting = false;
                    self.notify_error(CONNECTION_ERROR);
                    self.reload_tasks()
                }
            },

            AppEvent::TaskDeleted(result) => match result {
                Ok(response) if response.success => {
                    let text = response
                        .data
                        .and_then(|data| data.message)
                        .unwrap_or_else(|| "Task deleted successfully".into());
                    self.notify_info(text);
                    self.reload_tasks()
                }
                Ok(response) => {
                    self.notify_error(
                        response
                            .error
                            .unwrap_or_else(|| "Failed to delete the task".into()),
                    );
                    None
                }
                Err(err) => {
                    error!(%err, "task delete failed");
                    self.notify_error(CONNECTION_ERROR);
                    None
                }
            },
        }
    }
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runner: &CommandRunner,
    rx: &mut UnboundedReceiver<AppEvent>,
    tick_rate: Duration,
) -> io::Result<()> {
    if let Some(command) = app.on_start() {
        runner.dispatch(command);
    }

    loop {
        app.prune_toast();
        terminal.draw(|f| draw_ui(f, &mut app))?;

        // Drain completed network calls, in completion order
        while let Ok(event) = rx.try_recv() {
            if let Some(command) = app.handle_event(event) {
                runner.dispatch(command);
            }
        }

        if crossterm::event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match app.handle_key(key.code) {
                        Some(Action::Quit) => return Ok(()),
                        Some(Action::Run(command)) => runner.dispatch(command),
                        None => {}
                    }
                }
            }
        }
    }
}

// Draws the whole user interface
fn draw_ui(f: &mut Frame, app: &mut App) {
    // Main area plus a one-line status bar for notifications
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(f.size());

    match app.screen {
        Screen::Login => draw_login(f, app, outer[0]),
        Screen::Tasks => draw_tasks(f, app, outer[0]),
    }

    draw_status_line(f, app, outer[1]);
}

fn draw_login(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::raw(""),
        Line::from(vec![
            Span::from("Email: "),
            Span::from(app.login.email.as_str()).fg(Color::White),
            Span::styled(" ", Style::new().fg(Color::Black).bg(Color::White)),
        ]),
        Line::raw(""),
    ];

    match app.login.phase {
        LoginPhase::Checking => lines.push(Line::styled(
            "Checking account...",
            Style::new().fg(Color::Yellow),
        )),
        LoginPhase::Submitting => {
            lines.push(Line::styled("Signing in...", Style::new().fg(Color::Yellow)));
        }
        LoginPhase::Confirming => {
            lines.push(Line::styled(
                "No account found for this email.",
                Style::new().fg(Color::Yellow),
            ));
            lines.push(Line::styled(
                "Create your account automatically? (y/n)",
                Style::new().fg(Color::Yellow),
            ));
        }
        LoginPhase::Idle => {}
    }

    if let Some(ref error) = app.login.error {
        lines.push(Line::styled(error.as_str(), Style::new().fg(Color::Red)));
    }

    lines.push(Line::raw(""));
    lines.push(Line::raw("Enter - sign in, Esc - quit"));

    let login = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Sign in"))
        .style(Style::new().white());

    f.render_widget(login, centered(area, 60, 10));
}

fn draw_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    // Two chunks of screen in 60-40 ratio
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    // DRAW LEFT PART
    // The visible tasks of the active tab, with badge counts in the title
    let title = format!(
        "{} Pending ({}) | Completed ({}) {}",
        if app.tasks.tab == TaskTab::Pending { ">" } else { " " },
        app.tasks.badge_pending,
        app.tasks.badge_completed,
        if app.tasks.is_loading { "- loading..." } else { "" },
    );

    // Filter over the field directly so the list items can borrow the
    // tasks while the selection state is borrowed mutably below
    let visible: Vec<&Task> = match app.tasks.tab {
        TaskTab::Pending => app.tasks.tasks.iter().filter(|t| !t.completed).collect(),
        TaskTab::Completed => app.tasks.tasks.iter().filter(|t| t.completed).collect(),
    };
    let task_list = List::new(get_list_items_ui(&visible))
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    f.render_stateful_widget(task_list, chunks[0], &mut app.tasks.state);

    // DRAW RIGHT PART
    if app.dialog.dialog_active {
        let dialog_title = if app.dialog.is_edit() {
            "Edit Task"
        } else {
            "Add Task"
        };
        let add_or_edit = Paragraph::new(get_task_edit_ui(&app.dialog))
            .block(Block::new().title(dialog_title).borders(Borders::ALL))
            .style(Style::new().white());

        f.render_widget(add_or_edit, chunks[1]);
    } else if let Some(ref target) = app.tasks.confirm_delete {
        let confirm = Paragraph::new(vec![
            Line::raw(""),
            Line::from(format!("Delete \"{}\"?", target.title)),
            Line::raw(""),
            Line::styled("y - delete, n - cancel", Style::new().fg(Color::Yellow)),
        ])
        .block(Block::new().title("Confirm").borders(Borders::ALL))
        .style(Style::new().white());

        f.render_widget(confirm, chunks[1]);
    } else {
        // Statistics and instructions in vertically split layout
        let right_side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        let instructions = Paragraph::new(get_instructions_ui())
            .block(Block::new().title("Commands").borders(Borders::ALL))
            .style(Style::new().white());

        let statistics = Paragraph::new(get_statistics_ui(&app.tasks))
            .block(Block::new().title("Statistics").borders(Borders::ALL))
            .style(Style::new().white());

        f.render_widget(instructions, right_side[0]);
        f.render_widget(statistics, right_side[1]);
    }
}

fn draw_status_line(f: &mut Frame, app: &App, area: Rect) {
    let Some(ref toast) = app.toast else {
        return;
    };

    let style = match toast.kind {
        ToastKind::Info => Style::new().fg(Color::Green),
        ToastKind::Error => Style::new().fg(Color::Red),
    };
    f.render_widget(Paragraph::new(toast.text.as_str()).style(style), area);
}

// A centered rect of at most width x height inside the given area
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::app::api::ApiError;
    use crate::app::models::{
        ApiResponse, CheckUserData, Task, TaskResponse, TasksResponse, User, UserResponse,
    };
    use tempfile::TempDir;

    fn user() -> User {
        User {
            id: "u1".into(),
            email: "user@example.com".into(),
            created_at: "2024-05-01T10:00:00Z".into(),
            exists: true,
            token: "tok".into(),
        }
    }

    fn task(id: &str, completed: bool) -> Task {
        Task {
            id: id.into(),
            title: format!("task {id}"),
            description: String::new(),
            completed,
            created_at: None,
            updated_at: None,
            user_id: "u1".into(),
        }
    }

    fn ok<T>(data: T) -> Result<ApiResponse<T>, ApiError> {
        Ok(ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        })
    }

    fn failed<T>(error: &str) -> Result<ApiResponse<T>, ApiError> {
        Ok(ApiResponse {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        })
    }

    fn transport_err<T>() -> Result<ApiResponse<T>, ApiError> {
        Err(ApiError::Status {
            status: 500,
            body: "unreachable".into(),
        })
    }

    fn test_app(authenticated: bool) -> (App, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let session = Arc::new(SessionStore::load(dir.path().join("session.json")));
        if authenticated {
            session.set_current_user(user());
        }
        (App::new(session, 6), dir)
    }

    fn app_with_tasks(tasks: Vec<Task>) -> (App, TempDir) {
        let (mut app, dir) = test_app(true);
        app.on_start();
        let count = tasks.len() as u32;
        app.handle_event(AppEvent::TasksLoaded(ok(TasksResponse { tasks, count })));
        (app, dir)
    }

    #[test]
    fn start_unauthenticated_shows_the_login_form() {
        let (mut app, _dir) = test_app(false);
        assert!(app.on_start().is_none());
        assert_eq!(app.screen, Screen::Login);
    }

    #[test]
    fn start_with_a_session_skips_the_form() {
        let (mut app, _dir) = test_app(true);
        let command = app.on_start();
        assert_eq!(app.screen, Screen::Tasks);
        assert_eq!(
            command,
            Some(Command::LoadTasks {
                user_id: "u1".into(),
                first: 0,
                rows: 6
            })
        );
        assert!(app.tasks.is_loading);
    }

    #[test]
    fn unknown_email_requires_confirmation_and_decline_is_silent() {
        let (mut app, _dir) = test_app(false);
        app.login.email = "notfound@x.com".into();
        assert!(matches!(
            app.handle_key(KeyCode::Enter),
            Some(Action::Run(Command::CheckUser { .. }))
        ));

        let command = app.handle_event(AppEvent::UserChecked(ok(CheckUserData {
            exists: false,
            user: None,
        })));
        assert!(command.is_none());
        assert_eq!(app.login.phase, LoginPhase::Confirming);

        // Declining issues no login call and shows no notification
        assert!(app.handle_key(KeyCode::Char('n')).is_none());
        assert_eq!(app.login.phase, LoginPhase::Idle);
        assert!(app.toast.is_none());
    }

    #[test]
    fn accepted_confirmation_issues_the_login() {
        let (mut app, _dir) = test_app(false);
        app.login.email = "notfound@x.com".into();
        app.handle_key(KeyCode::Enter);
        app.handle_event(AppEvent::UserChecked(ok(CheckUserData {
            exists: false,
            user: None,
        })));

        assert_eq!(
            app.handle_key(KeyCode::Char('y')),
            Some(Action::Run(Command::Login {
                email: "notfound@x.com".into()
            }))
        );
    }

    #[test]
    fn existing_email_logs_in_without_confirmation() {
        let (mut app, _dir) = test_app(false);
        app.login.email = "user@example.com".into();
        app.handle_key(KeyCode::Enter);

        let command = app.handle_event(AppEvent::UserChecked(ok(CheckUserData {
            exists: true,
            user: Some(user()),
        })));
        assert_eq!(
            command,
            Some(Command::Login {
                email: "user@example.com".into()
            })
        );
        assert_eq!(app.login.phase, LoginPhase::Submitting);
    }

    #[test]
    fn failed_existence_check_aborts_with_a_connection_error() {
        let (mut app, _dir) = test_app(false);
        app.login.email = "user@example.com".into();
        app.handle_key(KeyCode::Enter);

        let command = app.handle_event(AppEvent::UserChecked(transport_err()));
        assert!(command.is_none());
        assert_eq!(app.login.phase, LoginPhase::Idle);
        let toast = app.toast.as_ref().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.text, CONNECTION_ERROR);
    }

    #[test]
    fn unsuccessful_check_envelope_is_treated_like_a_connection_error() {
        let (mut app, _dir) = test_app(false);
        app.login.email = "user@example.com".into();
        app.handle_key(KeyCode::Enter);

        let command = app.handle_event(AppEvent::UserChecked(failed("nope")));
        assert!(command.is_none());
        assert_eq!(app.login.phase, LoginPhase::Idle);
        assert_eq!(app.toast.as_ref().unwrap().text, CONNECTION_ERROR);
    }

    #[test]
    fn successful_login_navigates_to_the_task_view() {
        let (mut app, _dir) = test_app(false);
        // The login service persists the session before the event arrives
        app.session.set_current_user(user());

        let command = app.handle_event(AppEvent::LoggedIn(ok(UserResponse {
            user: user(),
            token: "tok".into(),
            message: None,
        })));

        assert_eq!(app.screen, Screen::Tasks);
        assert_matches!(command, Some(Command::LoadTasks { .. }));
        assert_eq!(app.toast.as_ref().unwrap().text, "Welcome back!");
    }

    #[test]
    fn first_login_announces_the_created_account() {
        let (mut app, _dir) = test_app(false);
        let mut created = user();
        created.exists = false;
        app.session.set_current_user(created.clone());

        app.handle_event(AppEvent::LoggedIn(ok(UserResponse {
            user: created,
            token: "tok".into(),
            message: None,
        })));
        assert_eq!(
            app.toast.as_ref().unwrap().text,
            "Account created successfully!"
        );
    }

    #[test]
    fn login_failure_surfaces_the_server_error() {
        let (mut app, _dir) = test_app(false);
        app.handle_event(AppEvent::LoggedIn(failed("email is blocked")));

        assert_eq!(app.screen, Screen::Login);
        assert_eq!(app.login.phase, LoginPhase::Idle);
        assert_eq!(app.toast.as_ref().unwrap().text, "email is blocked");
    }

    #[test]
    fn empty_title_create_never_reaches_the_network() {
        let (mut app, _dir) = app_with_tasks(vec![]);
        app.handle_key(KeyCode::Char('a'));
        assert!(app.dialog.dialog_active);

        assert!(app.handle_key(KeyCode::Enter).is_none());
        assert!(app.dialog.dialog_active);
        assert!(!app.tasks.is_submitting);
        assert_eq!(app.toast.as_ref().unwrap().text, "Title is required");
    }

    #[test]
    fn valid_form_submits_a_create() {
        let (mut app, _dir) = app_with_tasks(vec![]);
        app.handle_key(KeyCode::Char('a'));
        for c in "Buy milk".chars() {
            app.handle_key(KeyCode::Char(c));
        }

        let action = app.handle_key(KeyCode::Enter);
        match action {
            Some(Action::Run(Command::CreateTask(request))) => {
                assert_eq!(request.title, "Buy milk");
                assert_eq!(request.user_id, "u1");
            }
            other => panic!("expected a create command, got {other:?}"),
        }
        assert!(app.tasks.is_submitting);
    }

    #[test]
    fn successful_create_reloads_and_closes_the_dialog() {
        let (mut app, _dir) = app_with_tasks(vec![]);
        app.handle_key(KeyCode::Char('a'));
        app.tasks.is_submitting = true;

        let command = app.handle_event(AppEvent::TaskCreated(ok(TaskResponse {
            task: task("t1", false),
            message: None,
        })));

        assert_matches!(command, Some(Command::LoadTasks { .. }));
        assert!(!app.dialog.dialog_active);
        assert!(!app.tasks.is_submitting);
        assert_eq!(app.toast.as_ref().unwrap().kind, ToastKind::Info);
    }

    #[test]
    fn failed_create_keeps_the_dialog_open() {
        let (mut app, _dir) = app_with_tasks(vec![]);
        app.handle_key(KeyCode::Char('a'));
        app.tasks.is_submitting = true;

        let command = app.handle_event(AppEvent::TaskCreated(failed("duplicate title")));
        assert!(command.is_none());
        assert!(app.dialog.dialog_active);
        assert!(!app.tasks.is_submitting);
        assert_eq!(app.toast.as_ref().unwrap().text, "duplicate title");
    }

    #[test]
    fn enter_toggles_the_selected_task() {
        let (mut app, _dir) = app_with_tasks(vec![task("t1", false)]);
        app.handle_key(KeyCode::Down);

        let action = app.handle_key(KeyCode::Enter);
        match action {
            Some(Action::Run(Command::UpdateTask {
                task_id,
                update,
                from_form,
            })) => {
                assert_eq!(task_id, "t1");
                assert_eq!(update.completed, Some(true));
                assert!(!from_form);
            }
            other => panic!("expected an update command, got {other:?}"),
        }
    }

    #[test]
    fn toggle_completion_only_refreshes_the_badges() {
        let (mut app, _dir) = app_with_tasks(vec![task("t1", false)]);

        let mut toggled = task("t1", false);
        toggled.completed = true;
        let command = app.handle_event(AppEvent::TaskUpdated {
            from_form: false,
            result: ok(TaskResponse {
                task: toggled,
                message: None,
            }),
        });

        // No reload and no toast for the lightweight path
        assert!(command.is_none());
        assert!(app.toast.is_none());
        assert_eq!(app.tasks.badge_completed, 1);
        assert_eq!(app.tasks.badge_pending, 0);
    }

    #[test]
    fn form_update_success_closes_the_dialog_and_toasts() {
        let (mut app, _dir) = app_with_tasks(vec![task("t1", false)]);
        app.tasks.next();
        let target = task("t1", false);
        app.dialog.edit_task(&target);
        app.tasks.is_submitting = true;

        let mut renamed = task("t1", false);
        renamed.title = "renamed".into();
        let command = app.handle_event(AppEvent::TaskUpdated {
            from_form: true,
            result: ok(TaskResponse {
                task: renamed,
                message: None,
            }),
        });

        assert!(command.is_none());
        assert!(!app.dialog.dialog_active);
        assert!(!app.tasks.is_submitting);
        assert_eq!(app.tasks.tasks[0].title, "renamed");
    }

    #[test]
    fn failed_update_clears_submitting_and_resyncs() {
        let (mut app, _dir) = app_with_tasks(vec![task("t1", false)]);
        app.tasks.is_submitting = true;

        let command = app.handle_event(AppEvent::TaskUpdated {
            from_form: true,
            result: failed("conflict"),
        });

        assert!(!app.tasks.is_submitting);
        assert!(matches!(command, Some(Command::LoadTasks { .. })));
        assert_eq!(app.toast.as_ref().unwrap().text, "conflict");
        // The in-memory list stays untouched until the reload lands
        assert_eq!(app.tasks.tasks.len(), 1);
        assert!(!app.tasks.tasks[0].completed);
    }

    #[test]
    fn transport_failure_on_update_also_resyncs() {
        let (mut app, _dir) = app_with_tasks(vec![task("t1", false)]);
        app.tasks.is_submitting = true;

        let command = app.handle_event(AppEvent::TaskUpdated {
            from_form: false,
            result: transport_err(),
        });

        assert!(!app.tasks.is_submitting);
        assert!(matches!(command, Some(Command::LoadTasks { .. })));
        assert_eq!(app.toast.as_ref().unwrap().text, CONNECTION_ERROR);
    }

    #[test]
    fn delete_asks_for_confirmation_first() {
        let (mut app, _dir) = app_with_tasks(vec![task("t1", false)]);
        app.handle_key(KeyCode::Down);
        assert!(app.handle_key(KeyCode::Char('x')).is_none());
        assert!(app.tasks.confirm_delete.is_some());

        // Declining leaves the list unchanged
        assert!(app.handle_key(KeyCode::Char('n')).is_none());
        assert!(app.tasks.confirm_delete.is_none());
        assert_eq!(app.tasks.tasks.len(), 1);
    }

    #[test]
    fn confirmed_delete_issues_the_call_and_success_reloads() {
        let (mut app, _dir) = app_with_tasks(vec![task("t1", false)]);
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Char('x'));

        assert_eq!(
            app.handle_key(KeyCode::Char('y')),
            Some(Action::Run(Command::DeleteTask {
                task_id: "t1".into(),
                user_id: "u1".into()
            }))
        );

        let command = app.handle_event(AppEvent::TaskDeleted(ok(
            crate::app::models::MessageResponse { message: None },
        )));
        assert!(matches!(command, Some(Command::LoadTasks { .. })));
    }

    #[test]
    fn failed_delete_leaves_state_unchanged() {
        let (mut app, _dir) = app_with_tasks(vec![task("t1", false)]);

        let command = app.handle_event(AppEvent::TaskDeleted(failed("not yours")));
        assert!(command.is_none());
        assert_eq!(app.tasks.tasks.len(), 1);
        assert_eq!(app.toast.as_ref().unwrap().text, "not yours");
    }

    #[test]
    fn page_change_triggers_a_reload() {
        let (mut app, _dir) = app_with_tasks(vec![task("t1", false)]);
        app.tasks.total_count = 20;

        match app.handle_key(KeyCode::Char('n')) {
            Some(Action::Run(Command::LoadTasks { first, .. })) => assert_eq!(first, 6),
            other => panic!("expected a reload, got {other:?}"),
        }

        // On the last page forward is a no-op
        app.tasks.first = 18;
        assert!(app.handle_key(KeyCode::Char('n')).is_none());
    }

    #[test]
    fn logout_returns_to_the_login_screen() {
        let (mut app, _dir) = app_with_tasks(vec![task("t1", false)]);
        assert!(app.handle_key(KeyCode::Char('l')).is_none());

        assert_eq!(app.screen, Screen::Login);
        assert!(!app.session.is_authenticated());
        assert!(app.tasks.tasks.is_empty());
    }
}
