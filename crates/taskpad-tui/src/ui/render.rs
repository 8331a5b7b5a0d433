use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::app::{App, AppState, FormFocus, NewTodoFocus, Screen};
use crate::utils::{age_display, truncate_string};

use super::styles;

/// Width of the login/register and other fixed dialogs
const DIALOG_WIDTH: u16 = 46;

const TOAST_WIDTH: u16 = 44;

/// Visible width of a form input field
const FIELD_WIDTH: usize = 20;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    match app.screen {
        Screen::Login | Screen::Register => render_form(frame, app),
        Screen::Home => render_home(frame, app, chunks[1]),
    }
    render_status_bar(frame, app, chunks[2]);

    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::CreatingTodo => render_new_todo_overlay(frame, app),
        AppState::Normal | AppState::Quitting => {}
    }

    // Toasts sit above everything else
    render_toasts(frame, app);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  taskpad";
    let right = if app.screen == Screen::Home {
        let (open, in_progress, done) = app.todo_counts();
        format!(
            "{} open | {} in progress | {} done   [?] Help",
            open, in_progress, done
        )
    } else {
        app.api_url().to_string()
    };

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + right.chars().count() + 2),
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

// ===== Login / Register =====

fn form_field<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { " " };
    Line::from(vec![
        Span::raw("    "),
        Span::styled(label, styles::muted_style()),
        Span::styled("[", styles::muted_style()),
        Span::styled(format!("{:<width$}{}", value, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn form_button<'a>(label: &str, focused: bool, indent: usize) -> Line<'a> {
    let (text, style) = if focused {
        (format!(" ▶ {} ◀ ", label), styles::selected_style())
    } else {
        (format!("   {}   ", label), styles::list_item_style())
    };
    Line::from(vec![
        Span::raw(format!("{}[", " ".repeat(indent))),
        Span::styled(text, style),
        Span::raw("]"),
    ])
}

fn render_form(frame: &mut Frame, app: &App) {
    let registering = app.screen == Screen::Register;
    let height = if app.form_error.is_some() { 13 } else { 11 };
    let area = centered_rect_fixed(DIALOG_WIDTH, height, frame.area());
    frame.render_widget(Clear, area);

    let heading = if registering {
        "Create an account"
    } else {
        "Sign in"
    };

    // Keep the tail of long input visible while typing
    let username: String = {
        let count = app.form_username.chars().count();
        app.form_username
            .chars()
            .skip(count.saturating_sub(FIELD_WIDTH))
            .collect()
    };
    let password = "*".repeat(app.form_password.chars().count().min(FIELD_WIDTH));

    let mut lines = vec![
        Line::from(Span::styled(format!("  {}", heading), styles::title_style())),
        Line::from(""),
        form_field("Username: ", username, app.form_focus == FormFocus::Username),
        form_field("Password: ", password, app.form_focus == FormFocus::Password),
        Line::from(""),
    ];

    let submit = match (registering, app.form_busy) {
        (_, true) => "Working...",
        (true, false) => "Register",
        (false, false) => "Login",
    };
    lines.push(form_button(submit, app.form_focus == FormFocus::Submit, 12));

    let switch = if registering {
        "Back to sign in"
    } else {
        "Create an account"
    };
    lines.push(form_button(switch, app.form_focus == FormFocus::Switch, 8));

    if let Some(ref error) = app.form_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

// ===== Home =====

fn render_home(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_todo_table(frame, app, chunks[0]);
    render_todo_detail(frame, app, chunks[1]);
}

fn render_todo_table(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new([Cell::from("#"), Cell::from("Title"), Cell::from("Status")])
        .style(styles::title_style())
        .height(1);

    let title_width = (area.width as usize).saturating_sub(24);
    let rows: Vec<Row> = app
        .todos
        .iter()
        .enumerate()
        .map(|(i, todo)| {
            let style = if i == app.selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(format!("{:>4}", todo.id)),
                Cell::from(truncate_string(&todo.title, title_width)),
                Cell::from(Span::styled(
                    todo.display_status().to_string(),
                    styles::status_style(&todo.status),
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Fill(1),
        Constraint::Length(12),
    ];

    let title = if app.loading && app.todos.is_empty() {
        " Todos (loading...) ".to_string()
    } else {
        format!(" Todos ({}) ", app.todos.len())
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !app.todos.is_empty() {
        state.select(Some(app.selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_todo_detail(frame: &mut Frame, app: &App, area: Rect) {
    let content = match app.selected_todo() {
        Some(todo) => {
            let description = if todo.description.is_empty() {
                "-"
            } else {
                todo.description.as_str()
            };
            let mut lines = vec![
                Line::from(Span::styled(todo.title.clone(), styles::title_style())),
                Line::from(""),
                Line::from(vec![
                    Span::styled("Status:  ", styles::muted_style()),
                    Span::styled(
                        todo.display_status().to_string(),
                        styles::status_style(&todo.status),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Id:      ", styles::muted_style()),
                    Span::raw(todo.id.to_string()),
                ]),
                Line::from(""),
                Line::from(Span::styled("Description", styles::highlight_style())),
                Line::from(description.to_string()),
            ];
            if !todo.extra.is_empty() {
                lines.push(Line::from(""));
                for (key, value) in &todo.extra {
                    let value = value
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| value.to_string());
                    lines.push(Line::from(vec![
                        Span::styled(format!("{}: ", key), styles::muted_style()),
                        Span::raw(value),
                    ]));
                }
            }
            lines
        }
        None => vec![Line::from(Span::styled(
            "No todos yet. Press [n] to add one.",
            styles::muted_style(),
        ))],
    };

    let block = Block::default()
        .title(" Details ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(
        Paragraph::new(content).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.screen {
        Screen::Home => "[n]ew [s]tatus [d]elete [r]efresh [o] logout [q]uit",
        Screen::Login | Screen::Register => "[Tab] next field | [Esc] back",
    };

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if let Some(loaded_at) = app.todos_loaded_at {
        format!(" Updated {} ", age_display(loaded_at, Local::now()))
    } else {
        String::new()
    };
    let left_style = if app.status_message.is_some() && !app.loading {
        styles::error_style()
    } else {
        styles::muted_style()
    };

    let right_text = format!(" {} ", shortcuts);
    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

// ===== Overlays =====

fn render_toasts(frame: &mut Frame, app: &App) {
    let screen = frame.area();
    let mut y = screen.y + 1;

    for active in &app.toasts {
        let toast = &active.toast;
        let style = styles::toast_style(toast.level);
        let height = if toast.title.is_empty() { 3 } else { 4 };
        if y + height > screen.y + screen.height {
            break;
        }
        let width = TOAST_WIDTH.min(screen.width);
        let area = Rect::new(screen.x + (screen.width - width) / 2, y, width, height);
        frame.render_widget(Clear, area);

        let inner_width = (width as usize).saturating_sub(4);
        let mut lines = Vec::new();
        if !toast.title.is_empty() {
            lines.push(Line::from(Span::styled(
                format!(" {}", truncate_string(&toast.title, inner_width)),
                style.add_modifier(Modifier::BOLD),
            )));
        }
        lines.push(Line::from(Span::styled(
            format!(" {}", truncate_string(&toast.message, inner_width)),
            style,
        )));

        let block = Block::default().borders(Borders::ALL).border_style(style);
        frame.render_widget(Paragraph::new(lines).block(block), area);
        y += height;
    }
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(DIALOG_WIDTH + 4, 20, frame.area());
    frame.render_widget(Clear, area);

    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), styles::help_key_style()),
            Span::styled(desc, styles::help_desc_style()),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled("  taskpad", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", env!("CARGO_PKG_VERSION")),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        key("↑/↓ j/k", "Move selection"),
        key("PgUp/PgDn", "Move a page"),
        key("Esc", "Dismiss notices / close dialog"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        key("n", "New todo"),
        key("s / Enter", "Advance status"),
        key("d", "Delete todo"),
        key("r", "Reload from server"),
        key("o", "Log out"),
        key("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_new_todo_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(DIALOG_WIDTH + 14, 12, frame.area());
    frame.render_widget(Clear, area);

    let field_style = |focused: bool| {
        if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        }
    };
    let title_focused = app.new_focus == NewTodoFocus::Title;
    let cursor = |focused: bool| if focused { "▌" } else { "" };

    let lines = vec![
        Line::from(Span::styled("  New todo", styles::title_style())),
        Line::from(""),
        Line::from(Span::styled("  Title", styles::muted_style())),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                format!("{}{}", app.new_title, cursor(title_focused)),
                field_style(title_focused),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled("  Description", styles::muted_style())),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                format!("{}{}", app.new_description, cursor(!title_focused)),
                field_style(!title_focused),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  [Tab]", styles::help_key_style()),
            Span::styled(" switch field  ", styles::muted_style()),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" save  ", styles::muted_style()),
            Span::styled("[Esc]", styles::help_key_style()),
            Span::styled(" cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(DIALOG_WIDTH, 7, frame.area());
    frame.render_widget(Clear, area);

    let title = app
        .selected_todo()
        .map(|t| truncate_string(&t.title, DIALOG_WIDTH as usize - 8))
        .unwrap_or_default();

    let lines = vec![
        Line::from(Span::styled("   Delete this todo?", styles::highlight_style())),
        Line::from(Span::styled(format!("   {}", title), styles::list_item_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to delete, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(DIALOG_WIDTH, 6, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
