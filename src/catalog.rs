use std::collections::HashMap;

use anyhow::Context;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::OnConflict,
};
use tracing::{debug, warn};

use crate::{
    entities::{director, genre, movie, movie_director, movie_genre},
    error::AppResult,
    models::{Movie, unique_names},
};

/// SQLite caps bound parameters per statement; id lists are split to stay under it.
const ID_CHUNK: usize = 500;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
}

#[derive(Clone)]
pub struct Catalog {
    db: DatabaseConnection,
}

impl Catalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn list(&self, limit: u64, skip: u64) -> AppResult<Vec<Movie>> {
        let rows = movie::Entity::find()
            .order_by_asc(movie::Column::Id)
            .limit(limit)
            .offset(skip)
            .all(&self.db)
            .await?;

        self.hydrate(rows).await
    }

    pub async fn find(&self, id: i32) -> AppResult<Option<Movie>> {
        let Some(row) = movie::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![row]).await?.pop())
    }

    /// Inserts the movie row and its links in one transaction, returning the new id.
    pub async fn create(&self, input: &Movie) -> AppResult<i32> {
        let now = now_sec();
        let txn = self.db.begin().await?;

        let result: AppResult<i32> = async {
            let model = movie::ActiveModel {
                id: Default::default(),
                date: Set(now),
                title: Set(input.title.clone()),
                year: Set(input.year),
                rating: Set(input.rating),
                imdb_rating: Set(input.imdb_rating),
            };
            let id = movie::Entity::insert(model).exec(&txn).await?.last_insert_id;

            sync_genres(&txn, id, &input.genres).await?;
            sync_directors(&txn, id, &input.directors).await?;
            Ok(id)
        }
        .await;

        finish(txn, result).await
    }

    /// Replaces scalar fields and brings both association sets in line with `input`.
    ///
    /// `date` is never touched. An unknown id writes nothing.
    pub async fn update(&self, id: i32, input: &Movie) -> AppResult<UpdateOutcome> {
        let txn = self.db.begin().await?;

        let result: AppResult<UpdateOutcome> = async {
            let Some(existing) = movie::Entity::find_by_id(id).one(&txn).await? else {
                return Ok(UpdateOutcome::NotFound);
            };

            let mut active: movie::ActiveModel = existing.into();
            active.title = Set(input.title.clone());
            active.year = Set(input.year);
            active.rating = Set(input.rating);
            active.imdb_rating = Set(input.imdb_rating);
            active.update(&txn).await?;

            sync_genres(&txn, id, &input.genres).await?;
            sync_directors(&txn, id, &input.directors).await?;
            Ok(UpdateOutcome::Updated)
        }
        .await;

        finish(txn, result).await
    }

    /// Removes the movie and every link row pointing at it. Returns whether a row existed.
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let txn = self.db.begin().await?;

        let result: AppResult<bool> = async {
            movie_genre::Entity::delete_many()
                .filter(movie_genre::Column::MovieId.eq(id))
                .exec(&txn)
                .await?;
            movie_director::Entity::delete_many()
                .filter(movie_director::Column::MovieId.eq(id))
                .exec(&txn)
                .await?;
            let res = movie::Entity::delete_by_id(id).exec(&txn).await?;
            Ok(res.rows_affected > 0)
        }
        .await;

        finish(txn, result).await
    }

    async fn hydrate(&self, rows: Vec<movie::Model>) -> AppResult<Vec<Movie>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|m| m.id).collect();
        let mut genres: HashMap<i32, Vec<String>> = HashMap::new();
        let mut directors: HashMap<i32, Vec<String>> = HashMap::new();

        for chunk in ids.chunks(ID_CHUNK) {
            let links = movie_genre::Entity::find()
                .filter(movie_genre::Column::MovieId.is_in(chunk.to_vec()))
                .find_also_related(genre::Entity)
                .order_by_asc(genre::Column::Name)
                .all(&self.db)
                .await?;
            for (link, genre) in links {
                if let Some(genre) = genre {
                    genres.entry(link.movie_id).or_default().push(genre.name);
                }
            }

            let links = movie_director::Entity::find()
                .filter(movie_director::Column::MovieId.is_in(chunk.to_vec()))
                .find_also_related(director::Entity)
                .order_by_asc(director::Column::Name)
                .all(&self.db)
                .await?;
            for (link, director) in links {
                if let Some(director) = director {
                    directors.entry(link.movie_id).or_default().push(director.name);
                }
            }
        }

        Ok(rows
            .into_iter()
            .map(|m| Movie {
                id: m.id,
                date: m.date,
                title: m.title,
                year: m.year,
                rating: m.rating,
                imdb_rating: m.imdb_rating,
                genres: genres.remove(&m.id).unwrap_or_default(),
                directors: directors.remove(&m.id).unwrap_or_default(),
            })
            .collect())
    }
}

/// Upserts each named genre and its link, then prunes links not named.
async fn sync_genres(txn: &DatabaseTransaction, movie_id: i32, names: &[String]) -> AppResult<()> {
    let mut keep = Vec::new();

    for name in unique_names(names) {
        genre::Entity::insert(genre::ActiveModel {
            id: Default::default(),
            name: Set(name.to_string()),
        })
        .on_conflict(OnConflict::column(genre::Column::Name).do_nothing().to_owned())
        .exec_without_returning(txn)
        .await?;

        let genre_id = genre::Entity::find()
            .filter(genre::Column::Name.eq(name))
            .one(txn)
            .await?
            .with_context(|| format!("genre {name:?} missing after insert"))?
            .id;

        movie_genre::Entity::insert(movie_genre::ActiveModel {
            movie_id: Set(movie_id),
            genre_id: Set(genre_id),
        })
        .on_conflict(
            OnConflict::columns([movie_genre::Column::MovieId, movie_genre::Column::GenreId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await?;

        keep.push(genre_id);
    }

    let mut prune =
        movie_genre::Entity::delete_many().filter(movie_genre::Column::MovieId.eq(movie_id));
    if !keep.is_empty() {
        prune = prune.filter(movie_genre::Column::GenreId.is_not_in(keep));
    }
    let pruned = prune.exec(txn).await?.rows_affected;
    debug!(movie_id, pruned, "synced genres");

    Ok(())
}

async fn sync_directors(
    txn: &DatabaseTransaction,
    movie_id: i32,
    names: &[String],
) -> AppResult<()> {
    let mut keep = Vec::new();

    for name in unique_names(names) {
        director::Entity::insert(director::ActiveModel {
            id: Default::default(),
            name: Set(name.to_string()),
        })
        .on_conflict(OnConflict::column(director::Column::Name).do_nothing().to_owned())
        .exec_without_returning(txn)
        .await?;

        let director_id = director::Entity::find()
            .filter(director::Column::Name.eq(name))
            .one(txn)
            .await?
            .with_context(|| format!("director {name:?} missing after insert"))?
            .id;

        movie_director::Entity::insert(movie_director::ActiveModel {
            movie_id: Set(movie_id),
            director_id: Set(director_id),
        })
        .on_conflict(
            OnConflict::columns([
                movie_director::Column::MovieId,
                movie_director::Column::DirectorId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(txn)
        .await?;

        keep.push(director_id);
    }

    let mut prune =
        movie_director::Entity::delete_many().filter(movie_director::Column::MovieId.eq(movie_id));
    if !keep.is_empty() {
        prune = prune.filter(movie_director::Column::DirectorId.is_not_in(keep));
    }
    let pruned = prune.exec(txn).await?.rows_affected;
    debug!(movie_id, pruned, "synced directors");

    Ok(())
}

async fn finish<T>(txn: DatabaseTransaction, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        },
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        },
    }
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use sea_orm::{ConnectionTrait, PaginatorTrait};

    use super::*;
    use crate::db;

    async fn catalog() -> Catalog {
        let db = db::connect_and_migrate("sqlite::memory:", 1).await.unwrap();
        Catalog::new(db)
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn set(items: &[String]) -> BTreeSet<String> {
        items.iter().cloned().collect()
    }

    fn dune() -> Movie {
        Movie {
            title: "Dune".into(),
            year: 2021,
            rating: Some(9),
            imdb_rating: Some(8.0),
            genres: names(&["Sci-Fi"]),
            directors: names(&["Villeneuve"]),
            ..Default::default()
        }
    }

    async fn genre_links(catalog: &Catalog, movie_id: i32) -> BTreeSet<String> {
        set(&catalog.find(movie_id).await.unwrap().unwrap().genres)
    }

    #[tokio::test]
    async fn create_then_list_preserves_fields() {
        let catalog = catalog().await;
        let id = catalog.create(&dune()).await.unwrap();

        let movies = catalog.list(10, 0).await.unwrap();
        assert_eq!(movies.len(), 1);

        let got = &movies[0];
        assert_eq!(got.id, id);
        assert!(got.date > 0);
        assert_eq!(got.title, "Dune");
        assert_eq!(got.year, 2021);
        assert_eq!(got.rating, Some(9));
        assert_eq!(got.imdb_rating, Some(8.0));
        assert_eq!(got.genres, names(&["Sci-Fi"]));
        assert_eq!(got.directors, names(&["Villeneuve"]));
    }

    #[tokio::test]
    async fn absent_ratings_stay_absent() {
        let catalog = catalog().await;
        let input = Movie { title: "Untitled".into(), year: 0, ..Default::default() };
        let id = catalog.create(&input).await.unwrap();

        let got = catalog.find(id).await.unwrap().unwrap();
        assert_eq!(got.rating, None);
        assert_eq!(got.imdb_rating, None);
        assert_eq!(got.year, 0);
    }

    #[tokio::test]
    async fn update_replaces_associations_and_keeps_old_genre_row() {
        let catalog = catalog().await;
        let id = catalog
            .create(&Movie { genres: names(&["A", "B"]), ..dune() })
            .await
            .unwrap();
        let before = catalog.find(id).await.unwrap().unwrap();

        let outcome = catalog
            .update(id, &Movie { genres: names(&["B", "C"]), ..dune() })
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated);

        assert_eq!(genre_links(&catalog, id).await, set(&names(&["B", "C"])));
        let a = genre::Entity::find()
            .filter(genre::Column::Name.eq("A"))
            .one(catalog.db())
            .await
            .unwrap();
        assert!(a.is_some());

        let after = catalog.find(id).await.unwrap().unwrap();
        assert_eq!(after.date, before.date);
    }

    #[tokio::test]
    async fn empty_lists_clear_links() {
        let catalog = catalog().await;
        let id = catalog.create(&dune()).await.unwrap();

        catalog
            .update(id, &Movie { genres: vec![], directors: vec![], ..dune() })
            .await
            .unwrap();

        let got = catalog.find(id).await.unwrap().unwrap();
        assert!(got.genres.is_empty());
        assert!(got.directors.is_empty());
    }

    #[tokio::test]
    async fn duplicate_names_collapse_to_one_link() {
        let catalog = catalog().await;
        let id = catalog
            .create(&Movie { genres: names(&["Drama", "Drama", "drama"]), ..dune() })
            .await
            .unwrap();

        let got = catalog.find(id).await.unwrap().unwrap();
        assert_eq!(got.genres, names(&["Drama", "drama"]));

        let links = movie_genre::Entity::find()
            .filter(movie_genre::Column::MovieId.eq(id))
            .count(catalog.db())
            .await
            .unwrap();
        assert_eq!(links, 2);
    }

    #[tokio::test]
    async fn directors_link_through_director_column() {
        let catalog = catalog().await;
        let id = catalog
            .create(&Movie { directors: names(&["Coen", "Coen Jr"]), ..dune() })
            .await
            .unwrap();
        catalog
            .update(id, &Movie { directors: names(&["Coen"]), ..dune() })
            .await
            .unwrap();

        let links = movie_director::Entity::find()
            .filter(movie_director::Column::MovieId.eq(id))
            .find_also_related(director::Entity)
            .all(catalog.db())
            .await
            .unwrap();
        let linked: Vec<String> =
            links.into_iter().filter_map(|(_, d)| d.map(|d| d.name)).collect();
        assert_eq!(linked, names(&["Coen"]));
    }

    #[tokio::test]
    async fn update_of_unknown_id_writes_nothing() {
        let catalog = catalog().await;

        let outcome = catalog.update(42, &dune()).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);

        assert_eq!(movie_genre::Entity::find().count(catalog.db()).await.unwrap(), 0);
        assert_eq!(genre::Entity::find().count(catalog.db()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_link_insert_rolls_back_everything() {
        let catalog = catalog().await;
        let id = catalog
            .create(&Movie { title: "Old".into(), genres: names(&["A"]), ..dune() })
            .await
            .unwrap();

        catalog
            .db()
            .execute_unprepared(
                "CREATE TRIGGER fail_second_genre_link BEFORE INSERT ON movies_genres \
                 WHEN NEW.genreId = (SELECT id FROM genres WHERE name = 'C') \
                 BEGIN SELECT RAISE(ABORT, 'injected failure'); END",
            )
            .await
            .unwrap();

        let err = catalog
            .update(id, &Movie { title: "New".into(), genres: names(&["B", "C"]), ..dune() })
            .await;
        assert!(err.is_err());

        let got = catalog.find(id).await.unwrap().unwrap();
        assert_eq!(got.title, "Old");
        assert_eq!(got.genres, names(&["A"]));

        let genre_count = genre::Entity::find().count(catalog.db()).await.unwrap();
        assert_eq!(genre_count, 1);
    }

    #[tokio::test]
    async fn delete_removes_links_but_not_names() {
        let catalog = catalog().await;
        let id = catalog.create(&dune()).await.unwrap();
        let genres_before = genre::Entity::find().count(catalog.db()).await.unwrap();
        let directors_before = director::Entity::find().count(catalog.db()).await.unwrap();

        assert!(catalog.delete(id).await.unwrap());
        assert!(!catalog.delete(id).await.unwrap());

        assert!(catalog.find(id).await.unwrap().is_none());
        assert_eq!(movie_genre::Entity::find().count(catalog.db()).await.unwrap(), 0);
        assert_eq!(movie_director::Entity::find().count(catalog.db()).await.unwrap(), 0);
        assert_eq!(genre::Entity::find().count(catalog.db()).await.unwrap(), genres_before);
        assert_eq!(director::Entity::find().count(catalog.db()).await.unwrap(), directors_before);
    }

    #[tokio::test]
    async fn link_rows_require_existing_movie() {
        let catalog = catalog().await;
        catalog.create(&dune()).await.unwrap();

        let orphan = catalog
            .db()
            .execute_unprepared("INSERT INTO movies_genres (movieId, genreId) VALUES (999, 1)")
            .await;
        assert!(orphan.is_err());
    }

    #[tokio::test]
    async fn final_sets_match_last_request_over_many_sequences() {
        let catalog = catalog().await;
        let pool = ["Action", "Drama", "Noir", "Comedy"];
        let id = catalog.create(&dune()).await.unwrap();
        let mut name_rows = genre::Entity::find().count(catalog.db()).await.unwrap();

        for mask in 0u32..16 {
            let wanted: Vec<String> = pool
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, g)| g.to_string())
                .collect();
            let directors: Vec<String> = wanted.iter().rev().map(|g| format!("{g} Director")).collect();

            catalog
                .update(id, &Movie { genres: wanted.clone(), directors: directors.clone(), ..dune() })
                .await
                .unwrap();

            let got = catalog.find(id).await.unwrap().unwrap();
            assert_eq!(set(&got.genres), set(&wanted), "mask {mask}");
            assert_eq!(set(&got.directors), set(&directors), "mask {mask}");

            let rows = genre::Entity::find().count(catalog.db()).await.unwrap();
            assert!(rows >= name_rows);
            name_rows = rows;
        }
    }

    #[tokio::test]
    async fn list_pages_by_id() {
        let catalog = catalog().await;
        for title in ["One", "Two", "Three"] {
            catalog.create(&Movie { title: title.into(), ..dune() }).await.unwrap();
        }

        let page: Vec<String> =
            catalog.list(2, 1).await.unwrap().into_iter().map(|m| m.title).collect();
        assert_eq!(page, names(&["Two", "Three"]));
        assert!(catalog.list(10, 3).await.unwrap().is_empty());
    }
}
