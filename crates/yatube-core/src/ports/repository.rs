use async_trait::async_trait;

use crate::domain::{Group, Post, User};
use crate::error::RepoError;

/// Generic repository trait defining the storage operations handlers rely on.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity. An entity with id `0` is inserted and returned with its
    /// assigned id; any other id updates the stored row.
    async fn save(&self, entity: T) -> Result<T, RepoError>;
}

/// Post repository.
///
/// Every listing is ordered most recent first: `pub_date` descending, then id
/// descending.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i64> {
    async fn list_latest(&self) -> Result<Vec<Post>, RepoError>;

    async fn list_by_group(&self, group_id: i64) -> Result<Vec<Post>, RepoError>;

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Post>, RepoError>;

    async fn count_by_author(&self, author_id: i64) -> Result<u64, RepoError>;
}

/// Group repository.
#[async_trait]
pub trait GroupRepository: BaseRepository<Group, i64> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;

    /// All groups ordered by title.
    async fn list_all(&self) -> Result<Vec<Group>, RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, i64> {
    /// Exact, case-sensitive username lookup.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}
