use crate::{
    models::Movie,
    tui::form::{FormFocus, InputField, accept_any, accept_year, focus_next, focus_prev},
};

/// Active table filter; every criterion is optional and they combine with AND.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovieFilter {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub director: Option<String>,
}

impl MovieFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, movie: &Movie) -> bool {
        if let Some(title) = &self.title {
            if !contains_ci(&movie.title, title) {
                return false;
            }
        }
        if let Some(year) = self.year {
            if movie.year != year {
                return false;
            }
        }
        if let Some(genre) = &self.genre {
            if !movie.genres.iter().any(|g| contains_ci(g, genre)) {
                return false;
            }
        }
        if let Some(director) = &self.director {
            if !movie.directors.iter().any(|d| contains_ci(d, director)) {
                return false;
            }
        }
        true
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[derive(Clone, Debug)]
pub struct FilterForm {
    pub fields: [InputField; 4],
    pub focus: FormFocus,
}

impl Default for FilterForm {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterForm {
    pub fn new() -> Self {
        Self {
            fields: [
                InputField::new("Title: ", accept_any),
                InputField::new("Year: ", accept_year),
                InputField::new("Genre: ", accept_any),
                InputField::new("Director: ", accept_any),
            ],
            focus: FormFocus::Item(0),
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = focus_next(self.focus, self.fields.len(), true);
    }

    pub fn focus_prev(&mut self) {
        self.focus = focus_prev(self.focus, self.fields.len(), true);
    }

    pub fn focused_field(&mut self) -> Option<&mut InputField> {
        match self.focus {
            FormFocus::Item(i) => self.fields.get_mut(i),
            FormFocus::Button => None,
        }
    }

    pub fn to_filter(&self) -> MovieFilter {
        MovieFilter {
            title: non_empty(self.fields[0].text()),
            year: self.fields[1].text().parse().ok(),
            genre: non_empty(self.fields[2].text()),
            director: non_empty(self.fields[3].text()),
        }
    }

    /// Resets the fields to reflect `filter`, discarding unapplied edits.
    pub fn load(&mut self, filter: &MovieFilter) {
        for field in &mut self.fields {
            field.clear();
        }
        self.fields[0].set_text(filter.title.clone().unwrap_or_default());
        self.fields[1].set_text(filter.year.map(|y| y.to_string()).unwrap_or_default());
        self.fields[2].set_text(filter.genre.clone().unwrap_or_default());
        self.fields[3].set_text(filter.director.clone().unwrap_or_default());
        self.focus = FormFocus::Item(0);
    }
}
