//! # Yatube Shared
//!
//! Types exchanged with browsers: urlencoded form payloads, query parameters
//! and the error page context.

pub mod dto;
pub mod error_page;

pub use error_page::ErrorPage;
