use std::{collections::BTreeMap, collections::BTreeSet, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::ApiError,
    filters::{BlogpostQuery, CommentQuery},
    models::{
        Blogpost, BlogpostChanges, Comment, CommentChanges, NewBlogpost, NewComment, NewUser, User,
    },
    pagination::{Listing, PageRequest},
    repository::Repository,
    search::{SearchIndex, SearchTarget, matches_all_terms},
};

#[derive(Default)]
struct State {
    next_id: i64,
    users: BTreeMap<i64, User>,
    blogposts: BTreeMap<i64, Blogpost>,
    comments: BTreeMap<i64, Comment>,
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn username(&self, user_id: i64) -> Result<String, ApiError> {
        self.users
            .get(&user_id)
            .map(|user| user.username.clone())
            .ok_or_else(|| ApiError::Internal(format!("user {user_id} does not exist")))
    }
}

/// MemoryStore
///
/// A `Repository` and `SearchIndex` held entirely in memory. Used when running
/// locally without `DATABASE_URL` and by the integration tests. Clones share
/// the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T: Clone>(rows: Vec<&T>, page: PageRequest) -> Listing<T> {
    let count = rows.len() as i64;
    let items = rows
        .into_iter()
        .skip(page.offset().max(0) as usize)
        .take(page.limit().max(0) as usize)
        .cloned()
        .collect();
    Listing { items, count }
}

#[async_trait]
impl Repository for MemoryStore {
    async fn get_user(&self, id: i64) -> Result<Option<User>, ApiError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn list_users(&self, page: PageRequest) -> Result<Listing<User>, ApiError> {
        let state = self.state.read().await;
        let mut rows: Vec<&User> = state.users.values().collect();
        rows.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(paginate(rows, page))
    }

    async fn create_user(&self, user: NewUser) -> Result<User, ApiError> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(ApiError::Conflict(
                "A user with that username already exists.".to_string(),
            ));
        }

        let id = state.allocate_id();
        let created = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            date_joined: Utc::now(),
        };
        state.users.insert(id, created.clone());
        Ok(created)
    }

    async fn list_blogposts(
        &self,
        query: &BlogpostQuery,
        page: PageRequest,
    ) -> Result<Listing<Blogpost>, ApiError> {
        let state = self.state.read().await;
        let rows: Vec<&Blogpost> = state
            .blogposts
            .values()
            .filter(|post| query.matches(post))
            .collect();
        Ok(paginate(rows, page))
    }

    async fn get_blogpost(&self, id: i64) -> Result<Option<Blogpost>, ApiError> {
        Ok(self.state.read().await.blogposts.get(&id).cloned())
    }

    async fn create_blogpost(&self, post: NewBlogpost) -> Result<Blogpost, ApiError> {
        let mut state = self.state.write().await;
        let author_username = state.username(post.author_id)?;
        let id = state.allocate_id();
        let now = Utc::now();

        let created = Blogpost {
            id,
            title: post.title,
            slug: post.slug,
            description: post.description,
            content: post.content,
            allow_comments: post.allow_comments,
            author_id: post.author_id,
            author_username,
            created: now,
            modified: now,
        };
        state.blogposts.insert(id, created.clone());
        Ok(created)
    }

    async fn update_blogpost(
        &self,
        id: i64,
        changes: BlogpostChanges,
    ) -> Result<Option<Blogpost>, ApiError> {
        let mut state = self.state.write().await;
        let Some(post) = state.blogposts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(description) = changes.description {
            post.description = description;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(allow_comments) = changes.allow_comments {
            post.allow_comments = allow_comments;
        }
        post.modified = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_blogpost(&self, id: i64) -> Result<bool, ApiError> {
        let mut state = self.state.write().await;
        if state.blogposts.remove(&id).is_none() {
            return Ok(false);
        }
        state.comments.retain(|_, comment| comment.blogpost_id != id);
        Ok(true)
    }

    async fn list_comments(
        &self,
        query: &CommentQuery,
        page: PageRequest,
    ) -> Result<Listing<Comment>, ApiError> {
        let state = self.state.read().await;
        let rows: Vec<&Comment> = state
            .comments
            .values()
            .filter(|comment| query.matches(comment))
            .collect();
        Ok(paginate(rows, page))
    }

    async fn comments_for_blogposts(&self, blogpost_ids: &[i64]) -> Result<Vec<Comment>, ApiError> {
        let state = self.state.read().await;
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|comment| blogpost_ids.contains(&comment.blogpost_id))
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, ApiError> {
        Ok(self.state.read().await.comments.get(&id).cloned())
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, ApiError> {
        let mut state = self.state.write().await;
        if !state.blogposts.contains_key(&comment.blogpost_id) {
            return Err(ApiError::missing_blogpost());
        }
        let author_username = state.username(comment.author_id)?;
        let id = state.allocate_id();
        let now = Utc::now();

        let created = Comment {
            id,
            content: comment.content,
            author_id: comment.author_id,
            author_username,
            blogpost_id: comment.blogpost_id,
            created: now,
            modified: now,
        };
        state.comments.insert(id, created.clone());
        Ok(created)
    }

    async fn update_comment(
        &self,
        id: i64,
        changes: CommentChanges,
    ) -> Result<Option<Comment>, ApiError> {
        let mut state = self.state.write().await;
        let Some(comment) = state.comments.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(content) = changes.content {
            comment.content = content;
        }
        comment.modified = Utc::now();
        Ok(Some(comment.clone()))
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, ApiError> {
        Ok(self.state.write().await.comments.remove(&id).is_some())
    }
}

/// Term matching over the same fields the Postgres `search_vector` columns index.
#[async_trait]
impl SearchIndex for MemoryStore {
    async fn search(&self, target: SearchTarget, query: &str) -> Result<BTreeSet<i64>, ApiError> {
        let state = self.state.read().await;
        let ids = match target {
            SearchTarget::Blogposts => state
                .blogposts
                .values()
                .filter(|post| {
                    let document = format!("{} {} {}", post.title, post.description, post.content);
                    matches_all_terms(query, &document)
                })
                .map(|post| post.id)
                .collect(),
            SearchTarget::Comments => state
                .comments
                .values()
                .filter(|comment| matches_all_terms(query, &comment.content))
                .map(|comment| comment.id)
                .collect(),
        };
        Ok(ids)
    }
}
