//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes. API calls are started here and finish in the
//! background; their results arrive through `App::tick`.

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_description_char, can_add_password_char, can_add_title_char, can_add_username_char,
    App, AppState, FormFocus, NewTodoFocus, Screen, PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    // Esc closes toasts before it does anything else
    if key.code == KeyCode::Esc && app.dismiss_toasts() {
        return false;
    }

    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return false;
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return true;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return false;
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.delete_selected(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return false;
        }
        AppState::CreatingTodo => {
            handle_new_todo_input(app, key);
            return false;
        }
        AppState::Quitting => return true,
        AppState::Normal => {}
    }

    match app.screen {
        Screen::Login | Screen::Register => handle_form_input(app, key),
        Screen::Home => handle_home_input(app, key),
    }
}

/// Login and register forms share one layout
fn handle_form_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            if app.screen == Screen::Register {
                app.screen = Screen::Login;
                app.form_error = None;
                app.form_focus = FormFocus::Username;
            } else {
                app.state = AppState::Quitting;
                return true;
            }
        }
        KeyCode::Down | KeyCode::Tab => app.form_focus = app.form_focus.next(),
        KeyCode::Up | KeyCode::BackTab => app.form_focus = app.form_focus.prev(),
        KeyCode::Enter => match app.form_focus {
            FormFocus::Username | FormFocus::Password => app.form_focus = app.form_focus.next(),
            FormFocus::Submit => {
                if app.screen == Screen::Register {
                    app.submit_register();
                } else {
                    app.submit_login();
                }
            }
            FormFocus::Switch => {
                if app.screen == Screen::Register {
                    app.screen = Screen::Login;
                    app.form_error = None;
                    app.form_focus = FormFocus::Username;
                } else {
                    app.show_register();
                }
            }
        },
        KeyCode::Backspace => match app.form_focus {
            FormFocus::Username => {
                app.form_username.pop();
            }
            FormFocus::Password => {
                app.form_password.pop();
            }
            FormFocus::Submit | FormFocus::Switch => {}
        },
        KeyCode::Char(c) => match app.form_focus {
            FormFocus::Username => {
                if can_add_username_char(app.form_username.chars().count(), c) {
                    app.form_username.push(c);
                }
            }
            FormFocus::Password => {
                if can_add_password_char(app.form_password.chars().count(), c) {
                    app.form_password.push(c);
                }
            }
            FormFocus::Submit | FormFocus::Switch => {}
        },
        _ => {}
    }
    false
}

fn handle_home_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('r') => app.refresh_todos(),
        KeyCode::Char('n') => app.start_new_todo(),
        KeyCode::Char('s') | KeyCode::Enter => app.cycle_selected_status(),
        KeyCode::Char('d') | KeyCode::Delete => {
            if app.selected_todo().is_some() {
                app.state = AppState::ConfirmingDelete;
            }
        }
        KeyCode::Char('o') => app.logout(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(1),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(1),
        KeyCode::PageDown => app.select_next(PAGE_SCROLL_SIZE),
        KeyCode::PageUp => app.select_prev(PAGE_SCROLL_SIZE),
        KeyCode::Home => app.selection = 0,
        KeyCode::End => app.selection = app.todos.len().saturating_sub(1),
        _ => {}
    }
    false
}

fn handle_new_todo_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.state = AppState::Normal,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
            app.new_focus = match app.new_focus {
                NewTodoFocus::Title => NewTodoFocus::Description,
                NewTodoFocus::Description => NewTodoFocus::Title,
            };
        }
        KeyCode::Enter => match app.new_focus {
            NewTodoFocus::Title => app.new_focus = NewTodoFocus::Description,
            NewTodoFocus::Description => {
                app.submit_new_todo();
            }
        },
        KeyCode::Backspace => {
            match app.new_focus {
                NewTodoFocus::Title => app.new_title.pop(),
                NewTodoFocus::Description => app.new_description.pop(),
            };
        }
        KeyCode::Char(c) => match app.new_focus {
            NewTodoFocus::Title => {
                if can_add_title_char(app.new_title.chars().count(), c) {
                    app.new_title.push(c);
                }
            }
            NewTodoFocus::Description => {
                if can_add_description_char(app.new_description.chars().count(), c) {
                    app.new_description.push(c);
                }
            }
        },
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crossterm::event::KeyModifiers;
    use taskpad_core::auth::MemoryStore;
    use taskpad_core::Config;

    fn app() -> App {
        App::with_storage(Config::default(), Arc::new(MemoryStore::new())).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_input(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_form_typing_and_focus() {
        let mut app = app();
        type_text(&mut app, "alice");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "pw\x07d");
        press(&mut app, KeyCode::Backspace);

        assert_eq!(app.form_username, "alice");
        assert_eq!(app.form_password, "pw");
        assert_eq!(app.form_focus, FormFocus::Password);
    }

    #[test]
    fn test_q_is_text_on_login_form() {
        let mut app = app();
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.form_username, "q");
    }

    #[test]
    fn test_switch_to_register_and_back() {
        let mut app = app();
        app.form_focus = FormFocus::Switch;
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Register);
        assert_eq!(app.form_focus, FormFocus::Username);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen, Screen::Login);
        assert!(press(&mut app, KeyCode::Esc));
    }

    #[test]
    fn test_home_quit_needs_confirmation() {
        let mut app = app();
        app.screen = Screen::Home;
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert!(!press(&mut app, KeyCode::Char('n')));
        assert_eq!(app.state, AppState::Normal);
        press(&mut app, KeyCode::Char('q'));
        assert!(press(&mut app, KeyCode::Char('y')));
    }

    #[test]
    fn test_delete_needs_a_selection() {
        let mut app = app();
        app.screen = Screen::Home;
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.state, AppState::Normal);
    }

    #[test]
    fn test_new_todo_form() {
        let mut app = app();
        app.screen = Screen::Home;
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state, AppState::CreatingTodo);

        type_text(&mut app, "Buy milk");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.new_focus, NewTodoFocus::Description);
        type_text(&mut app, "2 litres");

        assert_eq!(app.new_title, "Buy milk");
        assert_eq!(app.new_description, "2 litres");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Normal);
    }

    #[test]
    fn test_help_overlay_toggles() {
        let mut app = app();
        app.screen = Screen::Home;
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.state, AppState::ShowingHelp);
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.state, AppState::Normal);
    }
}
