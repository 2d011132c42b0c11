use crate::models::Movie;

/// Live-acceptance predicate: sees the prospective buffer, decides whether to keep it.
pub type Acceptor = fn(&str) -> bool;

pub fn accept_any(_: &str) -> bool {
    true
}

/// Empty is accepted so a field can always be cleared.
pub fn accept_year(text: &str) -> bool {
    text.is_empty() || text.parse::<i32>().is_ok()
}

pub fn accept_rating(text: &str) -> bool {
    text.is_empty() || text.parse::<i32>().is_ok_and(|v| (1..=10).contains(&v))
}

/// A float in (0, 10] with at most one digit after the decimal point.
pub fn accept_imdb_rating(text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    if !text.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return false;
    }
    if let Some((_, decimals)) = text.split_once('.') {
        if decimals.len() > 1 {
            return false;
        }
    }
    text.parse::<f32>().is_ok_and(|v| v > 0.0 && v <= 10.0)
}

/// Splits a comma separated list, trimming spaces and dropping empty pieces.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(|piece| piece.trim_matches(' '))
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Debug)]
pub struct InputField {
    pub label: &'static str,
    text: String,
    accept: Acceptor,
}

impl InputField {
    pub fn new(label: &'static str, accept: Acceptor) -> Self {
        Self { label, text: String::new(), accept }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns false and leaves the buffer alone when the keystroke is rejected.
    pub fn insert(&mut self, c: char) -> bool {
        let mut next = self.text.clone();
        next.push(c);
        self.replace(next)
    }

    pub fn backspace(&mut self) -> bool {
        let mut next = self.text.clone();
        if next.pop().is_none() {
            return false;
        }
        self.replace(next)
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        self.replace(text.into())
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    fn replace(&mut self, next: String) -> bool {
        if (self.accept)(&next) {
            self.text = next;
            true
        } else {
            false
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FormFocus {
    Item(usize),
    Button,
}

/// Moves down through `len` items; past the last item the button takes focus
/// only while enabled, otherwise focus wraps to the first item.
pub fn focus_next(focus: FormFocus, len: usize, button_enabled: bool) -> FormFocus {
    match focus {
        FormFocus::Item(i) if i + 1 < len => FormFocus::Item(i + 1),
        FormFocus::Item(_) if button_enabled => FormFocus::Button,
        _ => FormFocus::Item(0),
    }
}

pub fn focus_prev(focus: FormFocus, len: usize, button_enabled: bool) -> FormFocus {
    match focus {
        FormFocus::Item(i) if i > 0 => FormFocus::Item(i - 1),
        FormFocus::Item(_) if button_enabled => FormFocus::Button,
        _ => FormFocus::Item(len - 1),
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FormMode {
    Add,
    Edit(i32),
}

pub const TITLE: usize = 0;
pub const YEAR: usize = 1;
pub const RATING: usize = 2;
pub const IMDB_RATING: usize = 3;
pub const GENRES: usize = 4;
pub const DIRECTORS: usize = 5;

pub const LIST_HINT: &str =
    "For adding multiple genres or directors, separate each value with a comma ','";

#[derive(Clone, Debug)]
pub struct MovieForm {
    pub mode: FormMode,
    pub fields: [InputField; 6],
    pub focus: FormFocus,
}

impl Default for MovieForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MovieForm {
    pub fn new() -> Self {
        Self {
            mode: FormMode::Add,
            fields: [
                InputField::new("Title: ", accept_any),
                InputField::new("Year: ", accept_year),
                InputField::new("Your Rating: ", accept_rating),
                InputField::new("IMDB Rating: ", accept_imdb_rating),
                InputField::new("Genres: ", accept_any),
                InputField::new("Directors: ", accept_any),
            ],
            focus: FormFocus::Item(0),
        }
    }

    /// Prefills every field from an existing movie for editing.
    pub fn load(&mut self, movie: &Movie) {
        self.clear();
        self.mode = FormMode::Edit(movie.id);
        self.fields[TITLE].set_text(movie.title.clone());
        self.fields[YEAR].set_text(movie.year.to_string());
        if let Some(rating) = movie.rating {
            self.fields[RATING].set_text(rating.to_string());
        }
        if let Some(imdb) = movie.imdb_rating {
            self.fields[IMDB_RATING].set_text(format!("{imdb:.1}"));
        }
        self.fields[GENRES].set_text(movie.genres.join(", "));
        self.fields[DIRECTORS].set_text(movie.directors.join(", "));
    }

    pub fn button_label(&self) -> &'static str {
        match self.mode {
            FormMode::Add => "Add",
            FormMode::Edit(_) => "Save",
        }
    }

    /// Title and Year are the minimum for a submission.
    pub fn submit_enabled(&self) -> bool {
        !self.fields[TITLE].text().is_empty() && self.fields[YEAR].text().parse::<i32>().is_ok()
    }

    pub fn focus_next(&mut self) {
        self.focus = focus_next(self.focus, self.fields.len(), self.submit_enabled());
    }

    pub fn focus_prev(&mut self) {
        self.focus = focus_prev(self.focus, self.fields.len(), self.submit_enabled());
    }

    pub fn focused_field(&mut self) -> Option<&mut InputField> {
        match self.focus {
            FormFocus::Item(i) => self.fields.get_mut(i),
            FormFocus::Button => None,
        }
    }

    /// Empties every field and resets to add mode; the button is disabled as a result.
    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.clear();
        }
        self.mode = FormMode::Add;
        self.focus = FormFocus::Item(0);
    }

    pub fn to_movie(&self) -> Option<Movie> {
        if !self.submit_enabled() {
            return None;
        }
        let id = match self.mode {
            FormMode::Add => 0,
            FormMode::Edit(id) => id,
        };
        Some(Movie {
            id,
            date: 0,
            title: self.fields[TITLE].text().to_string(),
            year: self.fields[YEAR].text().parse().ok()?,
            rating: self.fields[RATING].text().parse().ok(),
            imdb_rating: self.fields[IMDB_RATING].text().parse().ok(),
            genres: split_list(self.fields[GENRES].text()),
            directors: split_list(self.fields[DIRECTORS].text()),
        })
    }
}
