//! # Cartwatch Gateway
//!
//! Axum HTTP surface for storefront cart events.
//!
//! - `POST /api/track-cart`: start tracking a cart
//! - `POST /api/checkout-started`: mark a cart as checked out
//! - `GET /api/carts`: live records (diagnostics)
//! - `GET /api/deliveries`: recent delivery outcomes
//! - `GET /health`

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
