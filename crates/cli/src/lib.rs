//! Catalog client: HTTP client, form state and views for the book catalog.

pub mod client;
pub mod form;
pub mod views;
