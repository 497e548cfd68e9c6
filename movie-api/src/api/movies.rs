//! Movie CRUD handlers
//!
//! Writes follow the same shape: build or load the movie, apply the request,
//! validate, then run the store call inside a transaction this handler owns.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use movie_common::moviestore::{commit_or_rollback, Datastore, Selector, Transactor};
use movie_common::time::format_rfc3339;
use movie_common::{Movie, User};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::context::{RequestContext, StandardResponse};
use crate::error::ApiError;
use crate::AppState;

/// Length of generated external IDs
pub const EXTERNAL_ID_LEN: usize = 15;

type ApiResult<T> = Result<Json<StandardResponse<T>>, ApiError>;

/// Body accepted by create and update
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieRequest {
    pub title: String,
    pub rated: String,
    /// RFC 3339
    pub release_date: String,
    pub run_time: i32,
    pub director: String,
    pub writer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MovieResponse {
    pub external_id: String,
    pub title: String,
    pub rated: String,
    pub release_date: String,
    pub run_time: i32,
    pub director: String,
    pub writer: String,
    pub create_username: String,
    pub create_timestamp: String,
    pub update_username: String,
    pub update_timestamp: String,
}

impl From<&Movie> for MovieResponse {
    fn from(m: &Movie) -> Self {
        Self {
            external_id: m.external_id.clone(),
            title: m.title.clone(),
            rated: m.rated.clone(),
            release_date: m.released.as_ref().map(format_rfc3339).unwrap_or_default(),
            run_time: m.run_time,
            director: m.director.clone(),
            writer: m.writer.clone(),
            create_username: m.create_user.email.clone(),
            create_timestamp: format_rfc3339(&m.create_time),
            update_username: m.update_user.email.clone(),
            update_timestamp: format_rfc3339(&m.update_time),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteMovieResponse {
    pub extl_id: String,
    pub deleted: bool,
}

/// Copy every mutable field from the request
///
/// An empty `release_date` clears the date so validation reports it.
fn apply_request(movie: &mut Movie, req: &MovieRequest) -> movie_common::Result<()> {
    if req.release_date.is_empty() {
        movie.released = None;
    } else {
        movie.set_released(&req.release_date)?;
    }

    movie
        .set_title(req.title.as_str())
        .set_rated(req.rated.as_str())
        .set_run_time(req.run_time)
        .set_director(req.director.as_str())
        .set_writer(req.writer.as_str());
    Ok(())
}

/// POST /api/v1/movies
pub async fn create_movie(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ctx: RequestContext,
    payload: Result<Json<MovieRequest>, JsonRejection>,
) -> ApiResult<MovieResponse> {
    let Json(req) = payload?;

    let extl_id = state.string_generator.generate(EXTERNAL_ID_LEN);
    let mut movie = Movie::new(Uuid::new_v4(), &extl_id, user)?;
    apply_request(&mut movie, &req)?;
    movie.is_valid()?;

    let mut tx = state.datastore.begin(&ctx.cancel).await?;
    let result = tx.create(&ctx.cancel, &movie).await;
    commit_or_rollback(tx, result).await?;

    info!(extl_id = %movie.external_id, "Created movie");
    Ok(ctx.respond(MovieResponse::from(&movie)))
}

/// PUT /api/v1/movies/:extl_id
///
/// Identity and create audit come from the stored movie.
pub async fn update_movie(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(extl_id): Path<String>,
    ctx: RequestContext,
    payload: Result<Json<MovieRequest>, JsonRejection>,
) -> ApiResult<MovieResponse> {
    let Json(req) = payload?;

    let mut movie = state.datastore.find_by_id(&ctx.cancel, &extl_id).await?;
    apply_request(&mut movie, &req)?;
    movie.set_update_user(user).set_update_time();
    movie.is_valid()?;

    let mut tx = state.datastore.begin(&ctx.cancel).await?;
    let result = tx.update(&ctx.cancel, &movie).await;
    commit_or_rollback(tx, result).await?;

    info!(extl_id = %movie.external_id, "Updated movie");
    Ok(ctx.respond(MovieResponse::from(&movie)))
}

/// DELETE /api/v1/movies/:extl_id
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(extl_id): Path<String>,
    ctx: RequestContext,
) -> ApiResult<DeleteMovieResponse> {
    let movie = state.datastore.find_by_id(&ctx.cancel, &extl_id).await?;

    let mut tx = state.datastore.begin(&ctx.cancel).await?;
    let result = tx.delete(&ctx.cancel, &movie).await;
    commit_or_rollback(tx, result).await?;

    info!(extl_id = %movie.external_id, "Deleted movie");
    Ok(ctx.respond(DeleteMovieResponse {
        extl_id: movie.external_id,
        deleted: true,
    }))
}

/// GET /api/v1/movies/:extl_id
pub async fn find_movie_by_id(
    State(state): State<AppState>,
    Path(extl_id): Path<String>,
    ctx: RequestContext,
) -> ApiResult<MovieResponse> {
    let movie = state.datastore.find_by_id(&ctx.cancel, &extl_id).await?;
    Ok(ctx.respond(MovieResponse::from(&movie)))
}

/// GET /api/v1/movies
pub async fn find_all_movies(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> ApiResult<Vec<MovieResponse>> {
    let movies = state.datastore.find_all(&ctx.cancel).await?;
    let data = movies.iter().map(MovieResponse::from).collect();
    Ok(ctx.respond(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use movie_common::ErrorKind;

    fn user() -> User {
        User {
            email: "foo@bar.com".to_string(),
            last_name: "Bar".to_string(),
            first_name: "Foo".to_string(),
            full_name: "Foo Bar".to_string(),
            ..User::default()
        }
    }

    fn request() -> MovieRequest {
        MovieRequest {
            title: "Repo Man".to_string(),
            rated: "R".to_string(),
            release_date: "1984-03-02T00:00:00Z".to_string(),
            run_time: 92,
            director: "Alex Cox".to_string(),
            writer: "Alex Cox".to_string(),
        }
    }

    #[test]
    fn test_apply_request_populates_movie() {
        let mut movie = Movie::new(Uuid::new_v4(), "abc", user()).unwrap();
        apply_request(&mut movie, &request()).unwrap();

        assert!(movie.is_valid().is_ok());
        assert_eq!(movie.title, "Repo Man");
        assert_eq!(movie.run_time, 92);
    }

    #[test]
    fn test_apply_request_bad_date() {
        let mut movie = Movie::new(Uuid::new_v4(), "abc", user()).unwrap();
        let req = MovieRequest {
            release_date: "March 2nd".to_string(),
            ..request()
        };

        let err = apply_request(&mut movie, &req).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.param(), Some("release_date"));
    }

    #[test]
    fn test_apply_request_empty_date_clears_released() {
        let mut movie = Movie::new(Uuid::new_v4(), "abc", user()).unwrap();
        apply_request(&mut movie, &request()).unwrap();

        let req = MovieRequest {
            release_date: String::new(),
            ..request()
        };
        apply_request(&mut movie, &req).unwrap();

        assert!(movie.released.is_none());
        assert_eq!(movie.is_valid().unwrap_err().param(), Some("release_date"));
    }

    #[test]
    fn test_response_field_names() {
        let mut movie = Movie::new(Uuid::new_v4(), "abc", user()).unwrap();
        apply_request(&mut movie, &request()).unwrap();

        let json = serde_json::to_value(MovieResponse::from(&movie)).unwrap();
        assert_eq!(json["external_id"], "abc");
        assert_eq!(json["release_date"], "1984-03-02T00:00:00Z");
        assert_eq!(json["create_username"], "foo@bar.com");
        assert!(json["update_timestamp"].is_string());
    }
}
