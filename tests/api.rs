use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use moviedb::{AppState, catalog::Catalog, config::Config, db, models::Movie};
use sea_orm::ConnectionTrait;
use tower::ServiceExt;

async fn setup() -> (Router, Catalog) {
    let db = db::connect_and_migrate("sqlite::memory:", 1).await.unwrap();
    let catalog = Catalog::new(db);
    let config = Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        database_url: "sqlite::memory:".into(),
        db_max_connections: 1,
    };
    let state = Arc::new(AppState { config: Arc::new(config), catalog: catalog.clone() });
    (moviedb::routes::app(state), catalog)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, String) {
    let mut req = Request::builder().method(method).uri(uri);
    if body.is_some() {
        req = req.header(header::CONTENT_TYPE, "application/json");
    }
    let req = req.body(Body::from(body.unwrap_or_default().to_string())).unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

const DUNE: &str = r#"{"Title":"Dune","Year":2021,"Rating":9,"ImdbRating":8.0,"Genres":["Sci-Fi"],"Directors":["Villeneuve"]}"#;

#[tokio::test]
async fn create_then_list() {
    let (app, _) = setup().await;

    let (status, body) = send(&app, "POST", "/movies", Some(DUNE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Movie successfully added.");

    let (status, body) = send(&app, "GET", "/movies?limit=10&skip=0", None).await;
    assert_eq!(status, StatusCode::OK);

    let movies: Vec<Movie> = serde_json::from_str(&body).unwrap();
    assert_eq!(movies.len(), 1);
    let dune = &movies[0];
    assert!(dune.date > 0);
    assert_eq!(dune.title, "Dune");
    assert_eq!(dune.year, 2021);
    assert_eq!(dune.rating, Some(9));
    assert_eq!(dune.imdb_rating, Some(8.0));
    assert_eq!(dune.genres, vec!["Sci-Fi"]);
    assert_eq!(dune.directors, vec!["Villeneuve"]);
}

#[tokio::test]
async fn list_uses_capitalized_field_names() {
    let (app, _) = setup().await;
    send(&app, "POST", "/movies", Some(r#"{"Title":"Blank","Year":-300}"#)).await;

    let (_, body) = send(&app, "GET", "/movies", None).await;
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    let movie = &value[0];

    for key in ["ID", "Date", "Title", "Year", "Rating", "ImdbRating", "Genres", "Directors"] {
        assert!(movie.get(key).is_some(), "missing {key}");
    }
    assert!(movie["Rating"].is_null());
    assert!(movie["ImdbRating"].is_null());
    assert_eq!(movie["Year"], -300);
}

#[tokio::test]
async fn update_replaces_genres() {
    let (app, catalog) = setup().await;
    send(&app, "POST", "/movies", Some(r#"{"Title":"X","Year":2000,"Genres":["A","B"]}"#)).await;

    let (status, body) = send(
        &app,
        "PUT",
        "/update/1",
        Some(r#"{"Title":"X","Year":2000,"Genres":["B","C"],"Directors":[]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Movie successfully updated.");

    let movie = catalog.find(1).await.unwrap().unwrap();
    assert_eq!(movie.genres, vec!["B", "C"]);

    let row = catalog
        .db()
        .query_one(sea_orm::Statement::from_string(
            catalog.db().get_database_backend(),
            "SELECT COUNT(*) FROM genres WHERE name = 'A'".to_string(),
        ))
        .await
        .unwrap()
        .unwrap();
    let count: i64 = row.try_get_by_index(0).unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn malformed_update_body_changes_nothing() {
    let (app, catalog) = setup().await;
    send(&app, "POST", "/movies", Some(DUNE)).await;
    let before = catalog.find(1).await.unwrap();

    let (status, body) = send(&app, "PUT", "/update/1", Some("{")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid JSON");

    assert_eq!(catalog.find(1).await.unwrap(), before);
}

#[tokio::test]
async fn bad_ids_and_queries_are_client_errors() {
    let (app, _) = setup().await;

    let (status, body) = send(&app, "PUT", "/update/abc", Some(DUNE)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid movie ID");

    let (status, _) = send(&app, "DELETE", "/movies/xyz", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/movies?limit=-1&skip=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid query parameters");

    let (status, _) = send(&app, "GET", "/movies?limit=ten", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/movies?limit=18446744073709551615&skip=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid query parameters");

    let (status, _) = send(&app, "GET", "/movies?limit=1&skip=9223372036854775808", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/movies?limit=9223372036854775807&skip=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn out_of_range_ratings_are_rejected() {
    let (app, _) = setup().await;

    for body in [
        r#"{"Title":"X","Year":2000,"Rating":0}"#,
        r#"{"Title":"X","Year":2000,"Rating":11}"#,
        r#"{"Title":"X","Year":2000,"ImdbRating":0.0}"#,
        r#"{"Title":"X","Year":2000,"ImdbRating":10.5}"#,
        r#"{"Title":"","Year":2000}"#,
    ] {
        let (status, _) = send(&app, "POST", "/movies", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }

    let (_, body) = send(&app, "GET", "/movies", None).await;
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn update_of_missing_movie_is_acknowledged() {
    let (app, catalog) = setup().await;

    let (status, body) = send(&app, "PUT", "/update/77", Some(DUNE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Movie successfully updated.");
    assert!(catalog.list(10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn store_failure_is_a_generic_500() {
    let (app, catalog) = setup().await;
    send(&app, "POST", "/movies", Some(DUNE)).await;

    catalog
        .db()
        .execute_unprepared(
            "CREATE TRIGGER reject_links BEFORE INSERT ON movies_genres \
             BEGIN SELECT RAISE(ABORT, 'constraint detail'); END",
        )
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        "/update/1",
        Some(r#"{"Title":"Changed","Year":1,"Genres":["Noir"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");
    assert!(!body.contains("constraint detail"));

    let movie = catalog.find(1).await.unwrap().unwrap();
    assert_eq!(movie.title, "Dune");
    assert_eq!(movie.genres, vec!["Sci-Fi"]);
}

#[tokio::test]
async fn delete_then_list_is_empty() {
    let (app, _) = setup().await;
    send(&app, "POST", "/movies", Some(DUNE)).await;

    let (status, body) = send(&app, "DELETE", "/movies/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Movie successfully deleted.");

    let (_, body) = send(&app, "GET", "/movies?limit=10&skip=0", None).await;
    assert_eq!(body, "[]");
}
