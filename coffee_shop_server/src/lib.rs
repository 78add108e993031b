//! # Coffee shop server
//! This crate hosts the HTTP API for the coffee shop menu. It is responsible for:
//! Verifying the bearer tokens that Auth0 issues to baristas and managers.
//! Checking the permissions granted in those tokens against the permission each route requires.
//! Serving the menu, and letting authorised staff add, edit and remove drinks.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `GET /drinks`: The public menu.
//! * `GET /drinks-detail`: The menu including ingredient names. Requires `get:drinks-detail`.
//! * `POST /drinks`: Add a drink. Requires `post:drinks`.
//! * `PATCH /drinks/{id}`: Edit a drink. Requires `patch:drinks`.
//! * `DELETE /drinks/{id}`: Remove a drink. Requires `delete:drinks`.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;
