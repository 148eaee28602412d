//! # Repository Module
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product entry, edits and CSV upsert
//! - [`order::OrderRepository`] - Orders and the stock they move

pub mod order;
pub mod product;
