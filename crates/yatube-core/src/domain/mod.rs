//! Domain entities - the core business objects.

mod form;
mod group;
mod post;
mod user;

pub use form::{FormErrors, PostDraft};
pub use group::Group;
pub use post::Post;
pub use user::User;
