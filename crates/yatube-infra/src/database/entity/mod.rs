//! SeaORM entities, one per table.

pub mod group;
pub mod post;
pub mod user;
