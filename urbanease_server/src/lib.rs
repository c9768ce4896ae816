//! # UrbanEase server
//! This crate puts the UrbanEase order engine on the network. It is responsible for:
//! * Authenticating callers with the access tokens issued by the storefront's auth service.
//! * Exposing checkout, order tracking, payments and the notification feed as a JSON API.
//! * Pushing order status changes and new notifications to connected clients over WebSockets.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/ws`: The realtime WebSocket endpoint. See [ws](ws/index.html).
//! * `/api/...`: The JSON API. Every route requires an `Authorization: Bearer` token. See
//!   [routes](routes/index.html).

pub mod audit;
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod ws;

#[cfg(test)]
mod endpoint_tests;
