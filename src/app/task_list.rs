use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::*;

use crate::app::models::{Task, TasksResponse};
use crate::app::tasks::format_timestamp;

// The two filter tabs of the list screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTab {
    Pending,
    Completed,
}

// State of the task list screen: the current page of tasks plus the
// pagination, filter and in-flight flags around it
pub struct TaskListScreen {
    pub state: ListState,
    pub tasks: Vec<Task>,
    pub tab: TaskTab,
    pub is_loading: bool,
    pub is_submitting: bool,
    // Pagination: offset of the first item, fixed page size, server total
    pub first: u32,
    pub rows: u32,
    pub total_count: u32,
    // Badge counts are cached and refreshed on load and on lightweight
    // toggles; form updates and failures resync with a full reload instead
    pub badge_pending: usize,
    pub badge_completed: usize,
    // Task awaiting delete confirmation, if any
    pub confirm_delete: Option<Task>,
}

impl TaskListScreen {
    pub fn new(rows: u32) -> Self {
        Self {
            state: ListState::default(),
            tasks: Vec::new(),
            tab: TaskTab::Pending,
            is_loading: false,
            is_submitting: false,
            first: 0,
            rows,
            total_count: 0,
            badge_pending: 0,
            badge_completed: 0,
            confirm_delete: None,
        }
    }

    // Derived views: recomputed from the in-memory list on demand

    pub fn pending_tasks(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|task| !task.completed).collect()
    }

    pub fn completed_tasks(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|task| task.completed).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.completed).count()
    }

    // The tasks shown by the active tab
    pub fn visible_tasks(&self) -> Vec<&Task> {
        match self.tab {
            TaskTab::Pending => self.pending_tasks(),
            TaskTab::Completed => self.completed_tasks(),
        }
    }

    pub fn switch_tab(&mut self) {
        self.tab = match self.tab {
            TaskTab::Pending => TaskTab::Completed,
            TaskTab::Completed => TaskTab::Pending,
        };
        self.state.select(None);
    }

    // Move the selection to the next visible item
    pub fn next(&mut self) {
        let len = self.visible_tasks().len();
        let i = match self.state.selected() {
            Some(i) => {
                if len == 0 || i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    // Move the selection to the previous visible item
    pub fn previous(&mut self) {
        let len = self.visible_tasks().len();
        let i = match self.state.selected() {
            Some(i) => {
                if len == 0 {
                    0
                } else if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn unselect(&mut self) {
        self.state.select(None);
    }

    // Get the selected task
    pub fn selected_task(&self) -> Option<&Task> {
        self.state
            .selected()
            .and_then(|i| self.visible_tasks().get(i).copied())
    }

    // Replace the page with a fresh server load. Every load lands back on
    // the Pending tab, like the original view.
    pub fn apply_loaded(&mut self, data: TasksResponse) {
        self.is_loading = false;
        self.tasks = data.tasks;
        self.total_count = data.count;
        self.tab = TaskTab::Pending;
        self.state.select(None);
        self.refresh_badges();
    }

    // Splice a server-confirmed update into the list by identifier
    pub fn splice_updated(&mut self, updated: Task) -> bool {
        match self.tasks.iter_mut().find(|task| task.id == updated.id) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        }
    }

    pub fn refresh_badges(&mut self) {
        self.badge_pending = self.pending_count();
        self.badge_completed = self.completed_count();
    }

    // Pagination: returns true when the offset changed and a reload is due

    pub fn page_forward(&mut self) -> bool {
        if self.first + self.rows < self.total_count {
            self.first += self.rows;
            true
        } else {
            false
        }
    }

    pub fn page_back(&mut self) -> bool {
        if self.first > 0 {
            self.first = self.first.saturating_sub(self.rows);
            true
        } else {
            false
        }
    }

    // Destructive actions go through an explicit confirmation step

    pub fn request_delete(&mut self) {
        self.confirm_delete = self.selected_task().cloned();
    }

    pub fn decline_delete(&mut self) {
        self.confirm_delete = None;
    }

    pub fn take_confirmed_delete(&mut self) -> Option<Task> {
        self.confirm_delete.take()
    }
}

// Build the UI (list) for the visible tasks
pub fn get_list_items_ui<'a>(tasks: &[&'a Task]) -> Vec<ListItem<'a>> {
    tasks
        .iter()
        .map(|task| {
            let mut lines = Vec::new();

            lines.push(Line::from(vec![
                Span::from(if task.completed { "[x] " } else { "[ ] " }),
                Span::from(task.title.as_str()).fg(if task.completed {
                    Color::Green
                } else {
                    Color::White
                }),
            ]));

            let mut detail = format!("    {}", task.description);
            if let Some(ref created_at) = task.created_at {
                detail.push_str(&format!("  ({})", format_timestamp(created_at)));
            }
            lines.push(Line::from(Span::styled(
                detail,
                Style::default().fg(Color::DarkGray),
            )));

            ListItem::new(lines).style(Style::default().fg(Color::White))
        })
        .collect()
}

// Build the UI (lines) for the statistics infobox
pub fn get_statistics_ui(screen: &TaskListScreen) -> Vec<Line<'_>> {
    vec![
        Line::from(format!("Total on server: {}", screen.total_count)),
        Line::from(format!("Pending:   {}", screen.badge_pending)),
        Line::from(format!("Completed: {}", screen.badge_completed)),
        Line::from(format!(
            "Page: {}/{}",
            screen.first / screen.rows + 1,
            screen.total_count.div_ceil(screen.rows).max(1),
        )),
    ]
}

// Build the UI (lines) for the instructions infobox
pub fn get_instructions_ui<'a>() -> Vec<Line<'a>> {
    vec![
        "Enter - toggle do/done".into(),
        "Tab - pending/completed".into(),
        "a - add a task".into(),
        "e - edit a task".into(),
        "x - delete a task".into(),
        "n/p - next/prev page".into(),
        "r - reload".into(),
        "l - log out".into(),
        "q - quit".into(),
    ]
}
