//! In-memory repositories - used when no database is configured and in tests.
//!
//! Data is lost on process restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use yatube_core::domain::{Group, Post, User};
use yatube_core::error::RepoError;
use yatube_core::ports::{BaseRepository, GroupRepository, PostRepository, UserRepository};

#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Clone> Table<T> {
    /// Insert when `id` is zero, otherwise replace an existing row.
    fn upsert(&mut self, id: i64, row: impl FnOnce(i64) -> T) -> Result<T, RepoError> {
        let id = if id == 0 {
            let id = self.next_id;
            self.next_id += 1;
            id
        } else if self.rows.contains_key(&id) {
            id
        } else {
            return Err(RepoError::NotFound);
        };

        let row = row(id);
        self.rows.insert(id, row.clone());
        Ok(row)
    }
}

/// Users, groups and posts held behind async `RwLock`s.
///
/// One store implements every repository port, so a single `Arc` can back all
/// three trait objects.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<Table<User>>,
    groups: RwLock<Table<Group>>,
    posts: RwLock<Table<Post>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn posts_where(&self, keep: impl Fn(&Post) -> bool) -> Vec<Post> {
        let table = self.posts.read().await;
        let mut posts: Vec<Post> = table.rows.values().filter(|p| keep(*p)).cloned().collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        posts
    }
}

#[async_trait]
impl BaseRepository<Post, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.rows.get(&id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        self.posts
            .write()
            .await
            .upsert(post.id, |id| Post { id, ..post })
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn list_latest(&self) -> Result<Vec<Post>, RepoError> {
        Ok(self.posts_where(|_| true).await)
    }

    async fn list_by_group(&self, group_id: i64) -> Result<Vec<Post>, RepoError> {
        Ok(self.posts_where(|p| p.group_id == Some(group_id)).await)
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Post>, RepoError> {
        Ok(self.posts_where(|p| p.author_id == author_id).await)
    }

    async fn count_by_author(&self, author_id: i64) -> Result<u64, RepoError> {
        let table = self.posts.read().await;
        Ok(table
            .rows
            .values()
            .filter(|p| p.author_id == author_id)
            .count() as u64)
    }
}

#[async_trait]
impl BaseRepository<Group, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, RepoError> {
        Ok(self.groups.read().await.rows.get(&id).cloned())
    }

    async fn save(&self, group: Group) -> Result<Group, RepoError> {
        let mut table = self.groups.write().await;

        if table
            .rows
            .values()
            .any(|g| g.slug == group.slug && g.id != group.id)
        {
            return Err(RepoError::Constraint(format!(
                "group slug {:?} already exists",
                group.slug
            )));
        }

        table.upsert(group.id, |id| Group { id, ..group })
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let table = self.groups.read().await;
        Ok(table.rows.values().find(|g| g.slug == slug).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Group>, RepoError> {
        let table = self.groups.read().await;
        let mut groups: Vec<Group> = table.rows.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }
}

#[async_trait]
impl BaseRepository<User, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.rows.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut table = self.users.write().await;

        if table
            .rows
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(RepoError::Constraint(format!(
                "username {:?} already exists",
                user.username
            )));
        }

        table.upsert(user.id, |id| User { id, ..user })
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let table = self.users.read().await;
        Ok(table.rows.values().find(|u| u.username == username).cloned())
    }
}
