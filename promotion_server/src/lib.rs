//! # Listing promotion server
//! This crate hosts the HTTP server for paid listing promotions. It is responsible for:
//! * Selling promotion packages to sellers, and opening PayOS checkouts for them.
//! * Receiving payment notifications from PayOS, on both the webhook and the return redirect, and activating (or
//!   cancelling) the matching promotion.
//! * Periodically expiring promotions that have run their course.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `GET /promotions/pricing`: The packages on sale.
//! * `GET /promotions/active?listing_id=`: Live promotions, optionally for one listing.
//! * `POST /api/promotions`: Request a promotion for one of your listings.
//! * `GET /api/promotions/mine`: Your promotions.
//! * `GET /api/promotions/{id}`: One of your promotions.
//! * `POST /api/payment/create/{id}`: Create a PayOS checkout link for a pending promotion.
//! * `POST /internal/promotions/activate`: HMAC-authenticated activation trigger.
//! * `GET /payment/callback`: The PayOS return redirect.
//! * `POST /payment/webhook`: The PayOS webhook. Optionally restricted to whitelisted addresses.
//!
//! Routes under `/api` need the seller id in the `X-Seller-Id` header.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
