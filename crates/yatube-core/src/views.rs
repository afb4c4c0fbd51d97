//! View models - the data each page template is rendered from.
//!
//! Building a context is a pure function of already-loaded domain data. Turning
//! it into markup is left to a [`crate::ports::TemplateRenderer`].

use serde::Serialize;

use crate::domain::{FormErrors, Group, Post, User};
use crate::pagination::{Page, Paginator};

/// A serializable context bound to one named template.
pub trait Template: Serialize {
    const NAME: &'static str;
}

/// Site-wide listing, `posts/index.html`.
#[derive(Debug, Serialize)]
pub struct IndexContext {
    pub title: String,
    pub page_obj: Page<Post>,
    pub posts: Vec<Post>,
}

impl IndexContext {
    pub fn new(posts: Vec<Post>, per_page: usize, page: Option<&str>) -> Self {
        let paginator = Paginator::new(posts, per_page);

        Self {
            title: "Latest updates on the site".to_string(),
            page_obj: paginator.get_page(page),
            posts: paginator.into_items(),
        }
    }
}

impl Template for IndexContext {
    const NAME: &'static str = "posts/index.html";
}

/// Listing scoped to one group, `posts/group_list.html`.
#[derive(Debug, Serialize)]
pub struct GroupListContext {
    pub title: String,
    pub group: Group,
    pub page_obj: Page<Post>,
    pub posts: Vec<Post>,
}

impl GroupListContext {
    pub fn new(group: Group, posts: Vec<Post>, per_page: usize, page: Option<&str>) -> Self {
        let paginator = Paginator::new(posts, per_page);

        Self {
            title: format!("Posts of the {} community", group.title),
            group,
            page_obj: paginator.get_page(page),
            posts: paginator.into_items(),
        }
    }
}

impl Template for GroupListContext {
    const NAME: &'static str = "posts/group_list.html";
}

/// Listing scoped to one author, `posts/profile.html`.
#[derive(Debug, Serialize)]
pub struct ProfileContext {
    pub author: User,
    pub page_obj: Page<Post>,
    pub posts: Vec<Post>,
}

impl ProfileContext {
    pub fn new(author: User, posts: Vec<Post>, per_page: usize, page: Option<&str>) -> Self {
        let paginator = Paginator::new(posts, per_page);

        Self {
            author,
            page_obj: paginator.get_page(page),
            posts: paginator.into_items(),
        }
    }
}

impl Template for ProfileContext {
    const NAME: &'static str = "posts/profile.html";
}

/// A single post, `posts/post_detail.html`.
#[derive(Debug, Serialize)]
pub struct PostDetailContext {
    pub post: Post,
    pub author: Option<User>,
    /// Total number of posts by this post's author.
    pub count: u64,
}

impl Template for PostDetailContext {
    const NAME: &'static str = "posts/post_detail.html";
}

/// Current values of the post form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostFormValues {
    pub text: String,
    pub group: Option<i64>,
}

impl From<&Post> for PostFormValues {
    fn from(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id,
        }
    }
}

/// Create and edit form, both `posts/create_post.html`.
#[derive(Debug, Serialize)]
pub struct PostFormContext {
    pub form: PostFormValues,
    pub errors: FormErrors,
    /// Choices for the group select.
    pub groups: Vec<Group>,
    pub is_edit: bool,
    /// Set when editing; the form posts back to this post's edit URL.
    pub post_id: Option<i64>,
}

impl PostFormContext {
    pub fn create(groups: Vec<Group>) -> Self {
        Self {
            form: PostFormValues::default(),
            errors: FormErrors::default(),
            groups,
            is_edit: false,
            post_id: None,
        }
    }

    /// Edit form pre-filled from `post`.
    pub fn edit(post: &Post, groups: Vec<Group>) -> Self {
        Self {
            form: PostFormValues::from(post),
            errors: FormErrors::default(),
            groups,
            is_edit: true,
            post_id: Some(post.id),
        }
    }

    /// Replace the form values with a rejected submission and its errors.
    pub fn with_submission(mut self, form: PostFormValues, errors: FormErrors) -> Self {
        self.form = form;
        self.errors = errors;
        self
    }
}

impl Template for PostFormContext {
    const NAME: &'static str = "posts/create_post.html";
}

/// `users/login.html`.
#[derive(Debug, Default, Serialize)]
pub struct LoginContext {
    pub username: String,
    pub next: Option<String>,
    pub error: Option<String>,
}

impl Template for LoginContext {
    const NAME: &'static str = "users/login.html";
}

/// `users/signup.html`.
#[derive(Debug, Default, Serialize)]
pub struct SignupContext {
    pub username: String,
    pub errors: FormErrors,
}

impl Template for SignupContext {
    const NAME: &'static str = "users/signup.html";
}

/// `users/logged_out.html`.
#[derive(Debug, Default, Serialize)]
pub struct LoggedOutContext {}

impl Template for LoggedOutContext {
    const NAME: &'static str = "users/logged_out.html";
}
