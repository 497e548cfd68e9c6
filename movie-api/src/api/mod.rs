//! HTTP API handlers for movie-api

pub mod auth;
pub mod context;
pub mod health;
pub mod movies;

pub use auth::access_token_middleware;
pub use context::{make_request_span, RequestContext, StandardResponse};
pub use health::health_routes;
pub use movies::{
    create_movie, delete_movie, find_all_movies, find_movie_by_id, update_movie,
    DeleteMovieResponse, MovieRequest, MovieResponse,
};
