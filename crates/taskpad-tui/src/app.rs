//! Application state management for taskpad.
//!
//! This module contains the core `App` struct that owns the UI state, the API
//! client and the channels that connect them: UI events requested by the core
//! (toasts, navigation), the credential stream, and results coming back from
//! background API tasks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Local};
use taskpad_core::auth::{KeyValueStore, SessionStore};
use taskpad_core::models::{next_status, STATUS_OPEN};
use taskpad_core::{ApiClient, ApiError, ChannelFeedback, Config, Route, TodoItem, Toast, UiEvent};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

const MAX_TITLE_LENGTH: usize = 100;

const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Lifetime of toasts raised by the app itself rather than the core
const LOCAL_TOAST_MS: u64 = 2000;

// ============================================================================
// UI State Types
// ============================================================================

/// Top-level screen, switched by navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    Home,
}

/// Overlay state on top of the current screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    CreatingTodo,
    ConfirmingDelete,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Focus within the login and register forms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    Username,
    Password,
    Submit,
    /// Link to the other form (register from login and back)
    Switch,
}

impl FormFocus {
    pub fn next(self) -> Self {
        match self {
            FormFocus::Username => FormFocus::Password,
            FormFocus::Password => FormFocus::Submit,
            FormFocus::Submit => FormFocus::Switch,
            FormFocus::Switch => FormFocus::Username,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FormFocus::Username => FormFocus::Switch,
            FormFocus::Password => FormFocus::Username,
            FormFocus::Submit => FormFocus::Password,
            FormFocus::Switch => FormFocus::Submit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewTodoFocus {
    Title,
    Description,
}

/// A toast currently on screen
pub struct ActiveToast {
    pub toast: Toast,
    shown_at: Instant,
    dismissed: Option<oneshot::Sender<()>>,
}

impl ActiveToast {
    fn new(toast: Toast, dismissed: Option<oneshot::Sender<()>>) -> Self {
        Self {
            toast,
            shown_at: Instant::now(),
            dismissed,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= self.toast.timeout
    }

    fn dismiss(mut self) {
        if let Some(tx) = self.dismissed.take() {
            // Receiver gone means nobody is waiting any more
            let _ = tx.send(());
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned API calls.
enum TaskResult {
    LoggedIn { username: String },
    LoginFailed,
    Registered { username: String },
    RegisterFailed,
    Todos(Result<Vec<TodoItem>, ApiError>),
    Created(Result<TodoItem, ApiError>),
    StatusUpdated(i64, Result<TodoItem, ApiError>),
    Deleted(i64, Result<bool, ApiError>),
}

impl TaskResult {
    /// Todo data fetched or changed under one particular credential
    fn is_session_data(&self) -> bool {
        matches!(
            self,
            TaskResult::Todos(_)
                | TaskResult::Created(_)
                | TaskResult::StatusUpdated(..)
                | TaskResult::Deleted(..)
        )
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    pub config: Config,
    api: ApiClient,

    // Channels from the core and from background tasks
    ui_rx: mpsc::UnboundedReceiver<UiEvent>,
    credential_rx: watch::Receiver<String>,
    task_rx: mpsc::Receiver<(u64, TaskResult)>,
    task_tx: mpsc::Sender<(u64, TaskResult)>,
    /// Bumped on every credential change; todo results from an older
    /// session are dropped
    session_epoch: u64,

    // UI State
    pub screen: Screen,
    pub state: AppState,

    // Login/register form state
    pub form_username: String,
    pub form_password: String,
    pub form_focus: FormFocus,
    pub form_error: Option<String>,
    /// A login or register request is in flight
    pub form_busy: bool,

    // Todo list
    pub todos: Vec<TodoItem>,
    pub selection: usize,
    pub loading: bool,
    pub todos_loaded_at: Option<DateTime<Local>>,

    // New todo form
    pub new_title: String,
    pub new_description: String,
    pub new_focus: NewTodoFocus,

    pub toasts: Vec<ActiveToast>,
    pub status_message: Option<String>,
}

impl App {
    /// Create the app with the storage backend named in the config
    pub fn new(config: Config) -> Result<Self> {
        let storage = config.open_storage()?;
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: Config, storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let session = Arc::new(SessionStore::new(storage));
        let credential_rx = session.observe_credential();
        let (feedback, ui_rx) = ChannelFeedback::new();
        let api_url = config.api_base_url();
        let api = ApiClient::new(
            &api_url,
            config.request_timeout(),
            session,
            Arc::new(feedback),
        )?;
        info!(api_url = %api_url, "API client ready");

        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let form_username = config.last_username.clone().unwrap_or_default();
        let form_focus = if form_username.is_empty() {
            FormFocus::Username
        } else {
            FormFocus::Password
        };

        Ok(Self {
            config,
            api,
            ui_rx,
            credential_rx,
            task_rx,
            task_tx,
            session_epoch: 0,
            screen: Screen::Login,
            state: AppState::Normal,
            form_username,
            form_password: String::new(),
            form_focus,
            form_error: None,
            form_busy: false,
            todos: Vec::new(),
            selection: 0,
            loading: false,
            todos_loaded_at: None,
            new_title: String::new(),
            new_description: String::new(),
            new_focus: NewTodoFocus::Title,
            toasts: Vec::new(),
            status_message: None,
        })
    }

    /// Restore the saved session in the background. The login screen shows
    /// until the server has confirmed the token.
    pub fn start(&self) {
        let api = self.api.clone();
        tokio::spawn(async move {
            api.restore_session().await;
        });
    }

    pub fn api_url(&self) -> &str {
        self.api.base_url()
    }

    // =========================================================================
    // Event Processing
    // =========================================================================

    /// Drain everything that arrived since the last frame
    pub fn tick(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.handle_ui_event(event);
        }

        if self.credential_rx.has_changed().unwrap_or(false) {
            let authenticated = !self.credential_rx.borrow_and_update().is_empty();
            self.on_credential_changed(authenticated);
        }

        while let Ok((epoch, result)) = self.task_rx.try_recv() {
            self.receive_task_result(epoch, result);
        }

        self.expire_toasts(Instant::now());
    }

    fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Toast { toast, dismissed } => {
                self.toasts.push(ActiveToast::new(toast, Some(dismissed)));
            }
            UiEvent::Navigate(route) => self.navigate(route),
        }
    }

    fn navigate(&mut self, route: Route) {
        debug!(?route, "Navigating");
        match route {
            Route::Home => {
                self.screen = Screen::Home;
                self.state = AppState::Normal;
                self.refresh_todos();
            }
            Route::Login => self.show_login(),
        }
    }

    /// Keep the screen in step with the session. A login in flight navigates
    /// on its own once its toast is gone, so it is left alone here.
    fn on_credential_changed(&mut self, authenticated: bool) {
        debug!(authenticated, "Credential changed");
        self.begin_session_epoch();
        if authenticated {
            if self.screen != Screen::Home && !self.form_busy {
                self.screen = Screen::Home;
                self.state = AppState::Normal;
                self.refresh_todos();
            }
        } else if self.screen == Screen::Home {
            self.show_login();
        }
    }

    /// Forget requests made under the previous credential
    fn begin_session_epoch(&mut self) {
        self.session_epoch += 1;
        self.loading = false;
        self.status_message = None;
    }

    fn show_login(&mut self) {
        self.begin_session_epoch();
        self.screen = Screen::Login;
        self.state = AppState::Normal;
        self.todos.clear();
        self.selection = 0;
        self.todos_loaded_at = None;
        self.form_password.clear();
        self.form_error = None;
        self.form_focus = if self.form_username.is_empty() {
            FormFocus::Username
        } else {
            FormFocus::Password
        };
    }

    pub fn show_register(&mut self) {
        self.screen = Screen::Register;
        self.form_password.clear();
        self.form_error = None;
        self.form_focus = FormFocus::Username;
    }

    fn receive_task_result(&mut self, epoch: u64, result: TaskResult) {
        if epoch != self.session_epoch && result.is_session_data() {
            debug!(epoch, current = self.session_epoch, "Dropping result from an earlier session");
            return;
        }
        self.process_task_result(result);
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::LoggedIn { username } => {
                self.form_busy = false;
                self.form_password.clear();
                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
            }
            TaskResult::LoginFailed | TaskResult::RegisterFailed => {
                self.form_busy = false;
            }
            TaskResult::Registered { username } => {
                self.form_busy = false;
                self.form_username = username;
                self.show_login();
                self.push_local_toast(Toast::success(
                    "Account created, please sign in",
                    Duration::from_millis(LOCAL_TOAST_MS),
                ));
            }
            TaskResult::Todos(result) => {
                self.loading = false;
                match result {
                    Ok(todos) => {
                        self.todos = todos;
                        self.clamp_selection();
                        self.todos_loaded_at = Some(Local::now());
                        self.status_message = None;
                    }
                    Err(e) => self.report_error("Failed to load todos", &e),
                }
            }
            TaskResult::Created(result) => match result {
                Ok(todo) => {
                    self.todos.push(todo);
                    self.selection = self.todos.len() - 1;
                    self.status_message = None;
                }
                Err(e) => self.report_error("Failed to create todo", &e),
            },
            TaskResult::StatusUpdated(id, result) => match result {
                Ok(updated) => {
                    if let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) {
                        *todo = updated;
                    }
                }
                Err(e) => self.report_error("Failed to update status", &e),
            },
            TaskResult::Deleted(id, result) => match result {
                Ok(true) => {
                    self.todos.retain(|t| t.id != id);
                    self.clamp_selection();
                }
                Ok(false) => {
                    self.status_message = Some("Server did not confirm the delete".to_string());
                }
                Err(e) => self.report_error("Failed to delete todo", &e),
            },
        }
    }

    /// Show a failure from a call that hands its errors back to us
    fn report_error(&mut self, context: &str, error: &ApiError) {
        warn!(error = %error, "{}", context);
        let detail = if error.is_unauthorized() {
            "Session expired. Please log in again.".to_string()
        } else {
            error.user_message()
        };
        self.status_message = Some(format!("{}: {}", context, detail));
    }

    fn push_local_toast(&mut self, toast: Toast) {
        self.toasts.push(ActiveToast::new(toast, None));
    }

    fn expire_toasts(&mut self, now: Instant) {
        let (expired, live): (Vec<_>, Vec<_>) =
            self.toasts.drain(..).partition(|t| t.is_expired(now));
        self.toasts = live;
        for toast in expired {
            toast.dismiss();
        }
    }

    /// Dismiss every visible toast. Returns false if there were none.
    pub fn dismiss_toasts(&mut self) -> bool {
        if self.toasts.is_empty() {
            return false;
        }
        for toast in self.toasts.drain(..) {
            toast.dismiss();
        }
        true
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Submit the login form
    pub fn submit_login(&mut self) {
        if !self.validate_form() {
            return;
        }
        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let epoch = self.session_epoch;
        let username = self.form_username.clone();
        let password = self.form_password.clone();
        tokio::spawn(async move {
            let result = if api.login(&username, &password).await {
                TaskResult::LoggedIn { username }
            } else {
                TaskResult::LoginFailed
            };
            Self::send_result(&tx, epoch, result).await;
        });
    }

    /// Submit the register form
    pub fn submit_register(&mut self) {
        if !self.validate_form() {
            return;
        }
        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let epoch = self.session_epoch;
        let username = self.form_username.clone();
        let password = self.form_password.clone();
        tokio::spawn(async move {
            let result = match api.register(&username, &password).await {
                Some(_) => TaskResult::Registered { username },
                None => TaskResult::RegisterFailed,
            };
            Self::send_result(&tx, epoch, result).await;
        });
    }

    fn validate_form(&mut self) -> bool {
        if self.form_busy {
            return false;
        }
        if self.form_username.trim().is_empty() || self.form_password.is_empty() {
            self.form_error = Some("Username and password required".to_string());
            return false;
        }
        self.form_error = None;
        self.form_busy = true;
        true
    }

    pub fn refresh_todos(&mut self) {
        if self.loading {
            return;
        }
        self.loading = true;
        self.status_message = Some("Loading todos...".to_string());
        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let epoch = self.session_epoch;
        tokio::spawn(async move {
            let result = api.list_todos().await;
            Self::send_result(&tx, epoch, TaskResult::Todos(result)).await;
        });
    }

    pub fn start_new_todo(&mut self) {
        self.new_title.clear();
        self.new_description.clear();
        self.new_focus = NewTodoFocus::Title;
        self.state = AppState::CreatingTodo;
    }

    /// Submit the new todo form. Returns false if the title is missing.
    pub fn submit_new_todo(&mut self) -> bool {
        let title = self.new_title.trim().to_string();
        if title.is_empty() {
            self.status_message = Some("A todo needs a title".to_string());
            return false;
        }
        let description = self.new_description.trim().to_string();
        self.state = AppState::Normal;

        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let epoch = self.session_epoch;
        tokio::spawn(async move {
            let result = api.create_todo(&title, &description).await;
            Self::send_result(&tx, epoch, TaskResult::Created(result)).await;
        });
        true
    }

    /// Move the selected todo to the next status
    pub fn cycle_selected_status(&mut self) {
        let Some(todo) = self.selected_todo() else {
            return;
        };
        let id = todo.id;
        let status = next_status(&todo.status);

        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let epoch = self.session_epoch;
        tokio::spawn(async move {
            let result = api.update_status(status, id).await;
            Self::send_result(&tx, epoch, TaskResult::StatusUpdated(id, result)).await;
        });
    }

    pub fn delete_selected(&mut self) {
        self.state = AppState::Normal;
        let Some(id) = self.selected_todo().map(|t| t.id) else {
            return;
        };
        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let epoch = self.session_epoch;
        tokio::spawn(async move {
            let result = api.delete_todo(id).await;
            Self::send_result(&tx, epoch, TaskResult::Deleted(id, result)).await;
        });
    }

    pub fn logout(&mut self) {
        let api = self.api.clone();
        tokio::spawn(async move {
            api.logout().await;
        });
    }

    async fn send_result(tx: &mpsc::Sender<(u64, TaskResult)>, epoch: u64, result: TaskResult) {
        if tx.send((epoch, result)).await.is_err() {
            debug!("App closed before task result arrived");
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn selected_todo(&self) -> Option<&TodoItem> {
        self.todos.get(self.selection)
    }

    pub fn select_next(&mut self, step: usize) {
        let max_index = self.todos.len().saturating_sub(1);
        self.selection = (self.selection + step).min(max_index);
    }

    pub fn select_prev(&mut self, step: usize) {
        self.selection = self.selection.saturating_sub(step);
    }

    fn clamp_selection(&mut self) {
        self.selection = self.selection.min(self.todos.len().saturating_sub(1));
    }

    /// Counts of (open, in progress or other, done) todos for the title bar
    pub fn todo_counts(&self) -> (usize, usize, usize) {
        let done = self.todos.iter().filter(|t| t.is_done()).count();
        let open = self
            .todos
            .iter()
            .filter(|t| t.status == STATUS_OPEN)
            .count();
        (open, self.todos.len() - open - done, done)
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_title_char(current_len: usize, c: char) -> bool {
    current_len < MAX_TITLE_LENGTH && is_valid_input_char(c)
}

pub fn can_add_description_char(current_len: usize, c: char) -> bool {
    current_len < MAX_DESCRIPTION_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
