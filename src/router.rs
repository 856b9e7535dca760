//! Which screen is showing, and the signed-in flag that gates all of them.

use crate::error::NavigationError;
use crate::task::TaskId;

/// Views reachable while signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Dashboard,
    List,
    /// `None` creates a new task, `Some(id)` edits an existing one.
    Editor(Option<TaskId>),
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::List => "list",
            View::Editor(None) => "new task",
            View::Editor(Some(_)) => "task editor",
        }
    }
}

/// What is actually on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Dashboard,
    List,
    Editor,
}

/// Router state owned by the application root. Nothing here is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    authenticated: bool,
    view: View,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn screen(&self) -> Screen {
        if !self.authenticated {
            return Screen::Landing;
        }
        match self.view {
            View::Dashboard => Screen::Dashboard,
            View::List => Screen::List,
            View::Editor(_) => Screen::Editor,
        }
    }

    /// Sign in. There is no credential check.
    pub fn login(&mut self) {
        self.authenticated = true;
    }

    /// Sign out and drop back to the dashboard, discarding any open editor.
    pub fn logout(&mut self) {
        self.authenticated = false;
        self.view = View::Dashboard;
    }

    pub fn show_dashboard(&mut self) -> Result<(), NavigationError> {
        self.go(View::Dashboard)
    }

    pub fn show_list(&mut self) -> Result<(), NavigationError> {
        self.go(View::List)
    }

    pub fn open_new(&mut self) -> Result<(), NavigationError> {
        self.go(View::Editor(None))
    }

    pub fn open_edit(&mut self, id: TaskId) -> Result<(), NavigationError> {
        self.go(View::Editor(Some(id)))
    }

    /// Leave the editor after save, delete or cancel.
    pub fn close_editor(&mut self) -> Result<(), NavigationError> {
        match self.view {
            View::Editor(_) => self.go(View::List),
            _ => Err(self.rejected(&View::List)),
        }
    }

    fn go(&mut self, to: View) -> Result<(), NavigationError> {
        if !self.authenticated {
            return Err(NavigationError::NotAuthenticated);
        }
        let allowed = match (&self.view, &to) {
            (View::Dashboard, View::List) | (View::List, View::Dashboard) => true,
            (View::Dashboard, View::Editor(None)) | (View::List, View::Editor(None)) => true,
            (View::List, View::Editor(Some(_))) => true,
            (View::Editor(_), View::List) => true,
            // Re-selecting the current tab is harmless.
            (View::Dashboard, View::Dashboard) | (View::List, View::List) => true,
            _ => false,
        };
        if !allowed {
            return Err(self.rejected(&to));
        }
        self.view = to;
        Ok(())
    }

    fn rejected(&self, to: &View) -> NavigationError {
        NavigationError::Invalid { from: self.view.name(), to: to.name() }
    }
}
