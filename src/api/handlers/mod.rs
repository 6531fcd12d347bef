//! # HTTP handlers
//!
//! Thin adapters: extract, call one service method, wrap the result in
//! [`ApiResponse`](crate::models::ApiResponse).

pub mod auth;
pub mod books;
pub mod cart;
pub mod catalog;
pub mod health;
pub mod orders;
pub mod stats;
pub mod user;
