//! # Yatube Core
//!
//! The domain layer of the Yatube blog.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, form validation, pagination and the view models handed to templates.

pub mod domain;
pub mod error;
pub mod pagination;
pub mod ports;
pub mod views;

pub use error::DomainError;
pub use pagination::{POSTS_PER_PAGE, Page, Paginator};
