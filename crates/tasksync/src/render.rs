//! Plain-text rendering of a [`SessionView`].

use std::fmt::Write;

use tasksync_app::SessionView;

/// Render the task list, the placeholder, the footer and the error line.
pub fn render(view: &SessionView) -> String {
    let mut out = String::new();

    for row in &view.rows {
        let mark = if row.task.completed { 'x' } else { ' ' };
        let _ = write!(out, "[{mark}] {:>4}  {}", row.task.id, row.task.title);
        if row.busy {
            out.push_str("  (saving)");
        }
        out.push('\n');
    }
    if let Some(placeholder) = &view.placeholder {
        let _ = writeln!(out, "[ ]    …  {}  (saving)", placeholder.title);
    }

    if view.show_footer() {
        let _ = write!(out, "{} items left  [{}]", view.items_left(), view.filter);
        if view.can_clear_completed() {
            out.push_str("  clear-completed available");
        }
        out.push('\n');
    }

    if let Some(error) = view.error {
        let _ = writeln!(out, "error: {error}");
    }
    out
}
