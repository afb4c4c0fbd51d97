use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PostDraft;

/// Post entity - a text entry written by one author, optionally filed under a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Zero until the post has been saved.
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub group_id: Option<i64>,
}

impl Post {
    /// Create a new, unsaved post from a validated draft.
    pub fn new(author_id: i64, draft: PostDraft) -> Self {
        Self {
            id: 0,
            text: draft.text,
            pub_date: Utc::now(),
            author_id,
            group_id: draft.group_id,
        }
    }

    pub fn is_saved(&self) -> bool {
        self.id != 0
    }

    pub fn is_authored_by(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }

    /// Apply an edit. Only the text and group change; authorship and date stay.
    pub fn apply(&mut self, draft: PostDraft) {
        self.text = draft.text;
        self.group_id = draft.group_id;
    }
}
