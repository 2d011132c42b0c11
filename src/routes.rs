use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    routing::{get, put},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    AppState,
    catalog::UpdateOutcome,
    error::{AppError, AppResult},
    models::{ListQuery, Movie},
};

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route("/movies/{id}", axum::routing::delete(delete_movie))
        .route("/update/{id}", put(update_movie))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any)),
        )
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Movie>>> {
    let Query(q) = query.map_err(|_| AppError::bad_request("Invalid query parameters"))?;
    if !q.in_range() {
        return Err(AppError::bad_request("Invalid query parameters"));
    }
    let movies = state.catalog.list(q.limit, q.skip).await?;
    Ok(Json(movies))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Movie>, JsonRejection>,
) -> AppResult<&'static str> {
    let movie = parse_body(body)?;
    let id = state.catalog.create(&movie).await?;
    info!(id, title = %movie.title, "movie added");
    Ok("Movie successfully added.")
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Json<Movie>, JsonRejection>,
) -> AppResult<&'static str> {
    let id = parse_id(id)?;
    let movie = parse_body(body)?;

    match state.catalog.update(id, &movie).await? {
        UpdateOutcome::Updated => info!(id, "movie updated"),
        UpdateOutcome::NotFound => warn!(id, "update for unknown movie ignored"),
    }
    Ok("Movie successfully updated.")
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
) -> AppResult<&'static str> {
    let id = parse_id(id)?;
    let existed = state.catalog.delete(id).await?;
    info!(id, existed, "movie deleted");
    Ok("Movie successfully deleted.")
}

fn parse_id(id: Result<Path<i32>, PathRejection>) -> AppResult<i32> {
    id.map(|Path(id)| id).map_err(|_| AppError::bad_request("Invalid movie ID"))
}

fn parse_body(body: Result<Json<Movie>, JsonRejection>) -> AppResult<Movie> {
    let Json(movie) = body.map_err(|_| AppError::bad_request("Invalid JSON"))?;
    movie.validate().map_err(AppError::BadRequest)?;
    Ok(movie)
}
