use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use jiff::tz::TimeZone;

use crate::{
    models::Movie,
    tui::{
        filter::{FilterForm, MovieFilter},
        form::{FormFocus, FormMode, MovieForm},
        worker::{Request, Response, SubmitError},
    },
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BottomButton {
    Add,
    Filter,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MainFocus {
    Table,
    Buttons(BottomButton),
}

/// Pages stacked over `main`. Only the topmost one receives keys.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Modal {
    Add,
    Filter,
    Warning,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WarningChoice {
    Yes,
    No,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WarningKind {
    Notice(String),
    ConfirmDelete { id: i32, title: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Warning {
    pub kind: WarningKind,
    pub choice: WarningChoice,
}

impl Warning {
    pub fn message(&self) -> String {
        match &self.kind {
            WarningKind::Notice(msg) => msg.clone(),
            WarningKind::ConfirmDelete { title, .. } => format!("Delete \"{title}\"?"),
        }
    }
}

/// Whole client state. Key events and worker responses go in, requests come out.
#[derive(Debug)]
pub struct App {
    pub movies: Vec<Movie>,
    pub filter: MovieFilter,
    /// Index into the filtered rows.
    pub selected: usize,
    pub main_focus: MainFocus,
    pub pages: Vec<Modal>,
    pub form: MovieForm,
    pub filter_form: FilterForm,
    pub warning: Option<Warning>,
    pub status: Option<String>,
    pub loading: bool,
    pub running: bool,
    /// Zone for the Date Added column, resolved once at startup.
    pub time_zone: TimeZone,
    fetch_limit: u64,
}

impl App {
    pub fn new(fetch_limit: u64) -> Self {
        Self {
            movies: Vec::new(),
            filter: MovieFilter::default(),
            selected: 0,
            main_focus: MainFocus::Table,
            pages: Vec::new(),
            form: MovieForm::new(),
            filter_form: FilterForm::new(),
            warning: None,
            status: None,
            loading: false,
            running: true,
            time_zone: TimeZone::system(),
            fetch_limit,
        }
    }

    pub fn refresh(&mut self) -> Request {
        self.loading = true;
        Request::Fetch { limit: self.fetch_limit, skip: 0 }
    }

    pub fn visible(&self) -> Vec<&Movie> {
        self.movies.iter().filter(|m| self.filter.matches(m)).collect()
    }

    pub fn selected_movie(&self) -> Option<&Movie> {
        self.visible().get(self.selected).copied()
    }

    pub fn top(&self) -> Option<Modal> {
        self.pages.last().copied()
    }

    pub fn header(&self) -> String {
        let shown = self.visible().len();
        let mut line = if self.filter.is_empty() {
            format!("Movie Catalog | {} movies", self.movies.len())
        } else {
            format!("Movie Catalog | {shown} of {} movies (filtered)", self.movies.len())
        };
        if self.loading {
            line.push_str(" | loading...");
        } else if let Some(status) = &self.status {
            line.push_str(" | ");
            line.push_str(status);
        }
        line
    }

    /// Surfaces a message in the warning modal.
    pub fn notify(&mut self, msg: impl Into<String>) {
        self.warning =
            Some(Warning { kind: WarningKind::Notice(msg.into()), choice: WarningChoice::Yes });
        self.show(Modal::Warning);
    }

    /// The worker refused a request, so nothing is in flight for it.
    pub fn submit_failed(&mut self, err: &SubmitError) {
        self.loading = false;
        self.notify(err.to_string());
    }

    pub fn apply(&mut self, response: Response) -> Option<Request> {
        match response {
            Response::Movies(movies) => {
                self.loading = false;
                self.movies = movies;
                self.clamp_selection();
                None
            },
            Response::Ack(ack) => {
                self.status = Some(ack);
                Some(self.refresh())
            },
            Response::Failed(msg) => {
                // Table keeps whatever it showed before.
                self.loading = false;
                self.notify(msg);
                None
            },
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Request> {
        if is_ctrl(&key, 'c') {
            self.running = false;
            return None;
        }

        match self.top() {
            None => self.main_key(key),
            Some(Modal::Add) => self.form_key(key),
            Some(Modal::Filter) => self.filter_key(key),
            Some(Modal::Warning) => self.warning_key(key),
        }
    }

    fn main_key(&mut self, key: KeyEvent) -> Option<Request> {
        if is_ctrl(&key, 'j') {
            if self.main_focus == MainFocus::Table {
                self.main_focus = MainFocus::Buttons(BottomButton::Add);
            }
            return None;
        }
        if is_ctrl(&key, 'k') {
            self.main_focus = MainFocus::Table;
            return None;
        }

        match self.main_focus {
            MainFocus::Table => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    self.selected = self.selected.saturating_sub(1);
                },
                KeyCode::Down | KeyCode::Char('j') => {
                    let last = self.visible().len().saturating_sub(1);
                    self.selected = (self.selected + 1).min(last);
                },
                KeyCode::Home => self.selected = 0,
                KeyCode::End => self.selected = self.visible().len().saturating_sub(1),
                KeyCode::Enter | KeyCode::Char('e') => self.open_edit(),
                KeyCode::Delete | KeyCode::Char('d') => self.confirm_delete(),
                KeyCode::Char('r') => return Some(self.refresh()),
                _ => {},
            },
            MainFocus::Buttons(button) => match key.code {
                KeyCode::Left | KeyCode::Char('h') => {
                    self.main_focus = MainFocus::Buttons(BottomButton::Add);
                },
                KeyCode::Right | KeyCode::Char('l') => {
                    self.main_focus = MainFocus::Buttons(BottomButton::Filter);
                },
                KeyCode::Enter => match button {
                    BottomButton::Add => self.open_add(),
                    BottomButton::Filter => self.open_filter(),
                },
                _ => {},
            },
        }
        None
    }

    fn form_key(&mut self, key: KeyEvent) -> Option<Request> {
        if is_down(&key) {
            self.form.focus_next();
            return None;
        }
        if is_up(&key) {
            self.form.focus_prev();
            return None;
        }

        match key.code {
            KeyCode::Esc => self.close_form(),
            KeyCode::Enter => match self.form.focus {
                FormFocus::Button => return self.submit_form(),
                FormFocus::Item(_) => self.form.focus_next(),
            },
            KeyCode::Backspace => {
                if let Some(field) = self.form.focused_field() {
                    field.backspace();
                }
            },
            KeyCode::Char(c) if is_plain(&key) => {
                if let Some(field) = self.form.focused_field() {
                    field.insert(c);
                }
            },
            _ => {},
        }
        None
    }

    fn filter_key(&mut self, key: KeyEvent) -> Option<Request> {
        if is_down(&key) {
            self.filter_form.focus_next();
            return None;
        }
        if is_up(&key) {
            self.filter_form.focus_prev();
            return None;
        }

        match key.code {
            KeyCode::Esc => self.hide(Modal::Filter),
            KeyCode::Enter => match self.filter_form.focus {
                FormFocus::Button => {
                    self.filter = self.filter_form.to_filter();
                    self.selected = 0;
                    self.hide(Modal::Filter);
                    self.main_focus = MainFocus::Table;
                },
                FormFocus::Item(_) => self.filter_form.focus_next(),
            },
            KeyCode::Backspace => {
                if let Some(field) = self.filter_form.focused_field() {
                    field.backspace();
                }
            },
            KeyCode::Char(c) if is_plain(&key) => {
                if let Some(field) = self.filter_form.focused_field() {
                    field.insert(c);
                }
            },
            _ => {},
        }
        None
    }

    fn warning_key(&mut self, key: KeyEvent) -> Option<Request> {
        let Some(warning) = self.warning.as_mut() else {
            self.hide(Modal::Warning);
            return None;
        };

        match key.code {
            KeyCode::Left | KeyCode::Char('h') => warning.choice = WarningChoice::Yes,
            KeyCode::Right | KeyCode::Char('l') => warning.choice = WarningChoice::No,
            KeyCode::Esc => self.dismiss_warning(),
            KeyCode::Enter => {
                let request = match (&warning.kind, warning.choice) {
                    (WarningKind::ConfirmDelete { id, .. }, WarningChoice::Yes) => {
                        Some(Request::Delete(*id))
                    },
                    _ => None,
                };
                self.dismiss_warning();
                return request;
            },
            _ => {},
        }
        None
    }

    fn open_add(&mut self) {
        self.form.clear();
        self.show(Modal::Add);
    }

    fn open_edit(&mut self) {
        let Some(movie) = self.selected_movie().cloned() else {
            return;
        };
        self.form.load(&movie);
        self.show(Modal::Add);
    }

    fn open_filter(&mut self) {
        self.filter_form.load(&self.filter);
        self.show(Modal::Filter);
    }

    fn confirm_delete(&mut self) {
        let Some(kind) = self
            .selected_movie()
            .map(|m| WarningKind::ConfirmDelete { id: m.id, title: m.title.clone() })
        else {
            return;
        };
        self.warning = Some(Warning { kind, choice: WarningChoice::Yes });
        self.show(Modal::Warning);
    }

    fn submit_form(&mut self) -> Option<Request> {
        let movie = self.form.to_movie()?;
        let request = match self.form.mode {
            FormMode::Add => Request::Add(movie),
            FormMode::Edit(id) => Request::Update(id, movie),
        };
        self.close_form();
        Some(request)
    }

    fn close_form(&mut self) {
        self.form.clear();
        self.hide(Modal::Add);
        self.main_focus = MainFocus::Table;
    }

    fn dismiss_warning(&mut self) {
        self.warning = None;
        self.hide(Modal::Warning);
    }

    fn show(&mut self, modal: Modal) {
        self.pages.retain(|m| *m != modal);
        self.pages.push(modal);
    }

    fn hide(&mut self, modal: Modal) {
        self.pages.retain(|m| *m != modal);
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

fn is_plain(key: &KeyEvent) -> bool {
    !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

fn is_down(key: &KeyEvent) -> bool {
    is_ctrl(key, 'j') || matches!(key.code, KeyCode::Down | KeyCode::Tab)
}

fn is_up(key: &KeyEvent) -> bool {
    is_ctrl(key, 'k') || matches!(key.code, KeyCode::Up | KeyCode::BackTab)
}
