use serde::{Deserialize, Serialize};

/// Wire shape of a movie, shared by the service and the terminal client.
///
/// Field names are part of the contract and stay capitalized.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "ID", default)]
    pub id: i32,
    #[serde(rename = "Date", default)]
    pub date: i64,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Rating", default)]
    pub rating: Option<i32>,
    #[serde(rename = "ImdbRating", default)]
    pub imdb_rating: Option<f32>,
    #[serde(rename = "Genres", default)]
    pub genres: Vec<String>,
    #[serde(rename = "Directors", default)]
    pub directors: Vec<String>,
}

impl Movie {
    /// Checks the fields a client controls. Names are kept byte-exact.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.is_empty() {
            return Err("Title is required".to_string());
        }
        if let Some(rating) = self.rating {
            if !(1..=10).contains(&rating) {
                return Err("Rating must be between 1 and 10".to_string());
            }
        }
        if let Some(imdb) = self.imdb_rating {
            if !(imdb > 0.0 && imdb <= 10.0) {
                return Err("ImdbRating must be greater than 0 and at most 10".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub skip: u64,
}

impl ListQuery {
    /// SQLite binds LIMIT and OFFSET as signed 64-bit integers.
    pub fn in_range(&self) -> bool {
        i64::try_from(self.limit).is_ok() && i64::try_from(self.skip).is_ok()
    }
}

fn default_limit() -> u64 {
    100
}

/// Distinct names in first-seen order.
pub fn unique_names(names: &[String]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(&name.as_str()) {
            out.push(name);
        }
    }
    out
}
