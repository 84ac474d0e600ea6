use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::app::models::Task;

// State object for the task add/edit dialog
// Keeps track of the dialog visibility and the content being edited
#[derive(Default)]
pub struct TaskEditDialogState {
    pub dialog_active: bool,
    pub error_message: Option<String>,
    editing: Option<Task>,
    content: TaskEditDialogContent,
    cursor_position: (usize, usize),
}

#[derive(Default)]
struct TaskEditDialogContent {
    title: String,
    description: String,
}

// Trimmed form values handed to the list screen on submit
pub struct TaskFormValues {
    pub title: String,
    pub description: String,
}

impl TaskEditDialogState {
    // Opens the dialog and prepares to accept input for a new task
    pub fn create_a_new_task(&mut self) {
        self.dialog_active = true;
        self.editing = None;
        self.error_message = None;
        self.content = TaskEditDialogContent::default();
        self.cursor_position = (0, 0);
    }

    // Opens the dialog prefilled with an existing task
    pub fn edit_task(&mut self, task: &Task) {
        self.dialog_active = true;
        self.error_message = None;
        self.content = TaskEditDialogContent {
            title: task.title.clone(),
            description: task.description.clone(),
        };
        self.cursor_position = (task.title.chars().count(), 0);
        self.editing = Some(task.clone());
    }

    pub fn close(&mut self) {
        self.dialog_active = false;
        self.error_message = None;
    }

    // Clear the form after a successful create
    pub fn reset(&mut self) {
        self.content = TaskEditDialogContent::default();
        self.cursor_position = (0, 0);
        self.error_message = None;
    }

    // The task being edited, or None when creating
    pub fn editing(&self) -> Option<&Task> {
        self.editing.as_ref()
    }

    pub fn form_values(&self) -> TaskFormValues {
        TaskFormValues {
            title: self.content.title.trim().to_string(),
            description: self.content.description.trim().to_string(),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    // Move the cursor one line below, clamping the column to the new line
    pub fn move_cursor_down(&mut self) {
        let (x, y) = self.cursor_position;
        let future_y = (y + 1).min(1);
        self.cursor_position = (x.min(self.line_len(future_y)), future_y);
    }

    // Move the cursor one line above, clamping the column to the new line
    pub fn move_cursor_up(&mut self) {
        let (x, y) = self.cursor_position;
        if y > 0 {
            let future_y = y - 1;
            self.cursor_position = (x.min(self.line_len(future_y)), future_y);
        }
    }

    pub fn move_cursor_left(&mut self) {
        let (x, y) = self.cursor_position;
        if x > 0 {
            self.cursor_position = (x - 1, y);
        }
    }

    pub fn move_cursor_right(&mut self) {
        let (x, y) = self.cursor_position;
        self.cursor_position = ((x + 1).min(self.line_len(y)), y);
    }

    // Delete the char before the cursor on the active field
    pub fn delete_char(&mut self) {
        let (x, y) = self.cursor_position;
        if x == 0 {
            return;
        }

        let field = self.field_mut(y);
        let byte = byte_index(field, x - 1);
        field.remove(byte);
        self.move_cursor_left();
    }

    // Insert a char at the cursor position of the active field
    pub fn input(&mut self, to_insert: char) {
        let (x, y) = self.cursor_position;
        let field = self.field_mut(y);
        let byte = byte_index(field, x);
        field.insert(byte, to_insert);
        self.move_cursor_right();
    }

    fn line_len(&self, y: usize) -> usize {
        match y {
            0 => self.content.title.chars().count(),
            _ => self.content.description.chars().count(),
        }
    }

    fn field_mut(&mut self, y: usize) -> &mut String {
        match y {
            0 => &mut self.content.title,
            _ => &mut self.content.description,
        }
    }
}

// Maps a char position to the byte offset where it starts
fn byte_index(value: &str, char_pos: usize) -> usize {
    value
        .char_indices()
        .nth(char_pos)
        .map_or(value.len(), |(idx, _)| idx)
}

// Returns the UI content for the task add/edit dialog
pub fn get_task_edit_ui(dialog: &TaskEditDialogState) -> Vec<Line<'_>> {
    const GRAY_TEXT: Style = Style::new().fg(Color::DarkGray);
    const WHITE_TEXT: Style = Style::new().fg(Color::White);
    const BLACK_ON_WHITE: Style = Style::new().fg(Color::Black).bg(Color::White);

    struct InputLine<'a> {
        prefix: &'a str,
        placeholder: &'a str,
        value: &'a str,
    }

    let lines = [
        InputLine {
            prefix: "Title:       ",
            placeholder: "My task name",
            value: &dialog.content.title,
        },
        InputLine {
            prefix: "Description: ",
            placeholder: "My description",
            value: &dialog.content.description,
        },
    ];

    let cursor = dialog.cursor_position;
    let mut text = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let mut spans = vec![Span::styled(line.prefix, WHITE_TEXT)];

        if line.value.is_empty() {
            // Empty field shows its placeholder
            if cursor.1 == i {
                spans.push(Span::styled(
                    line.placeholder.chars().take(1).collect::<String>(),
                    BLACK_ON_WHITE,
                ));
                spans.push(Span::styled(
                    line.placeholder.chars().skip(1).collect::<String>(),
                    GRAY_TEXT,
                ));
            } else {
                spans.push(Span::styled(line.placeholder, GRAY_TEXT));
            }
        } else if cursor.1 == i {
            // The char under the cursor is highlighted
            spans.push(Span::styled(
                line.value.chars().take(cursor.0).collect::<String>(),
                WHITE_TEXT,
            ));
            spans.push(Span::styled(
                line.value.chars().skip(cursor.0).take(1).collect::<String>(),
                BLACK_ON_WHITE,
            ));
            spans.push(Span::styled(
                line.value.chars().skip(cursor.0 + 1).collect::<String>(),
                WHITE_TEXT,
            ));

            if cursor.0 == line.value.chars().count() {
                spans.push(Span::styled(" ", BLACK_ON_WHITE));
            }
        } else {
            spans.push(Span::styled(line.value, WHITE_TEXT));
        }

        text.push(Line::from(spans));
    }

    text.push(Line::raw(""));

    if let Some(ref error_message) = dialog.error_message {
        text.push(Line::from(Span::styled(
            error_message.as_str(),
            Style::new().fg(Color::Red),
        )));
        text.push(Line::raw(""));
    }

    text.push(Line::from(Span::styled(
        "Enter - save, Esc - cancel",
        WHITE_TEXT,
    )));

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            id: "t1".into(),
            title: "Water plants".into(),
            description: "balcony".into(),
            completed: false,
            created_at: None,
            updated_at: None,
            user_id: "u1".into(),
        }
    }

    #[test]
    fn create_mode_starts_empty() {
        let mut dialog = TaskEditDialogState::default();
        dialog.create_a_new_task();

        assert!(dialog.dialog_active);
        assert!(!dialog.is_edit());
        assert!(dialog.form_values().title.is_empty());
    }

    #[test]
    fn edit_mode_prefills_the_form() {
        let mut dialog = TaskEditDialogState::default();
        dialog.edit_task(&sample_task());

        assert!(dialog.is_edit());
        let values = dialog.form_values();
        assert_eq!(values.title, "Water plants");
        assert_eq!(values.description, "balcony");
    }

    #[test]
    fn typing_and_deleting_edits_the_active_field() {
        let mut dialog = TaskEditDialogState::default();
        dialog.create_a_new_task();

        for c in "abc".chars() {
            dialog.input(c);
        }
        dialog.delete_char();
        assert_eq!(dialog.form_values().title, "ab");

        dialog.move_cursor_down();
        dialog.input('d');
        assert_eq!(dialog.form_values().description, "d");
    }

    #[test]
    fn multibyte_input_keeps_byte_offsets_straight() {
        let mut dialog = TaskEditDialogState::default();
        dialog.create_a_new_task();

        for c in "héllo".chars() {
            dialog.input(c);
        }
        dialog.move_cursor_left();
        dialog.delete_char();
        assert_eq!(dialog.form_values().title, "hélo");
    }

    #[test]
    fn form_values_are_trimmed() {
        let mut dialog = TaskEditDialogState::default();
        dialog.create_a_new_task();

        for c in "  hi  ".chars() {
            dialog.input(c);
        }
        assert_eq!(dialog.form_values().title, "hi");
    }
}
