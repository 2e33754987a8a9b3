use crate::{
    error::ApiError,
    filters::{BlogpostQuery, CommentQuery, TimeBounds},
    models::{
        Blogpost, BlogpostChanges, Comment, CommentChanges, NewBlogpost, NewComment, NewUser, User,
    },
    pagination::{Listing, PageRequest},
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;

/// Repository Trait
///
/// The persistence contract used by the handlers and the `Actor` extractor.
/// Implemented by `PostgresRepository` and by the in-memory `MemoryStore`.
///
/// Ownership is *not* enforced here: the permission layer decides who may
/// write, the repository just executes.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: i64) -> Result<Option<User>, ApiError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError>;
    async fn list_users(&self, page: PageRequest) -> Result<Listing<User>, ApiError>;
    // Fails with `Conflict` when the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, ApiError>;

    // --- Blogposts ---
    async fn list_blogposts(
        &self,
        query: &BlogpostQuery,
        page: PageRequest,
    ) -> Result<Listing<Blogpost>, ApiError>;
    async fn get_blogpost(&self, id: i64) -> Result<Option<Blogpost>, ApiError>;
    async fn create_blogpost(&self, post: NewBlogpost) -> Result<Blogpost, ApiError>;
    // `None` when the blogpost does not exist. Bumps `modified`.
    async fn update_blogpost(
        &self,
        id: i64,
        changes: BlogpostChanges,
    ) -> Result<Option<Blogpost>, ApiError>;
    // Deletes the blogpost and its comments. False when nothing was deleted.
    async fn delete_blogpost(&self, id: i64) -> Result<bool, ApiError>;

    // --- Comments ---
    async fn list_comments(
        &self,
        query: &CommentQuery,
        page: PageRequest,
    ) -> Result<Listing<Comment>, ApiError>;
    /// All comments of the given blogposts, ordered by creation.
    async fn comments_for_blogposts(&self, blogpost_ids: &[i64]) -> Result<Vec<Comment>, ApiError>;
    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, ApiError>;
    async fn create_comment(&self, comment: NewComment) -> Result<Comment, ApiError>;
    async fn update_comment(
        &self,
        id: i64,
        changes: CommentChanges,
    ) -> Result<Option<Comment>, ApiError>;
    async fn delete_comment(&self, id: i64) -> Result<bool, ApiError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Every write is a single statement, so
/// each write request runs in exactly one implicit transaction.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const BLOGPOST_COLUMNS: &str = r#"
    b.id, b.title, b.slug, b.description, b.content, b.allow_comments,
    b.author_id, u.username AS author_username, b.created, b.modified
"#;

const COMMENT_COLUMNS: &str = r#"
    c.id, c.content, c.author_id, u.username AS author_username,
    c.blogpost_id, c.created, c.modified
"#;

/// Escapes LIKE metacharacters and wraps the needle in `%` for ILIKE.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_time_bounds(builder: &mut QueryBuilder<'_, Postgres>, alias: &str, time: &TimeBounds) {
    let bounds = [
        ("created", "<", time.created_lt),
        ("created", ">", time.created_gt),
        ("modified", "<", time.modified_lt),
        ("modified", ">", time.modified_gt),
    ];
    for (column, op, bound) in bounds {
        if let Some(bound) = bound {
            builder.push(format!(" AND {alias}.{column} {op} "));
            builder.push_bind(bound);
        }
    }
}

fn push_ilike(builder: &mut QueryBuilder<'_, Postgres>, column: &str, needle: Option<&str>) {
    if let Some(needle) = needle {
        builder.push(format!(" AND {column} ILIKE "));
        builder.push_bind(like_pattern(needle));
    }
}

/// Appends the WHERE conditions of a blogpost query (base query ends in `WHERE TRUE`).
fn push_blogpost_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &BlogpostQuery) {
    if let Some(id) = query.id {
        builder.push(" AND b.id = ");
        builder.push_bind(id);
    }
    push_time_bounds(builder, "b", &query.time);
    push_ilike(builder, "b.title", query.title_contains.as_deref());
    push_ilike(builder, "b.description", query.description_contains.as_deref());
    push_ilike(builder, "b.content", query.content_contains.as_deref());
    if let Some(author) = &query.author {
        builder.push(" AND u.username = ");
        builder.push_bind(author.clone());
    }
    if let Some(ids) = &query.search_ids {
        builder.push(" AND b.id = ANY(");
        builder.push_bind(ids.iter().copied().collect::<Vec<i64>>());
        builder.push(")");
    }
}

fn push_comment_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &CommentQuery) {
    if let Some(id) = query.id {
        builder.push(" AND c.id = ");
        builder.push_bind(id);
    }
    push_time_bounds(builder, "c", &query.time);
    push_ilike(builder, "c.content", query.content_contains.as_deref());
    if let Some(author) = &query.author {
        builder.push(" AND u.username = ");
        builder.push_bind(author.clone());
    }
    if let Some(blogpost) = query.blogpost {
        builder.push(" AND c.blogpost_id = ");
        builder.push_bind(blogpost);
    }
    if let Some(ids) = &query.search_ids {
        builder.push(" AND c.id = ANY(");
        builder.push_bind(ids.iter().copied().collect::<Vec<i64>>());
        builder.push(")");
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: i64) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, date_joined FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, date_joined FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self, page: PageRequest) -> Result<Listing<User>, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, User>(
            r#"SELECT id, username, email, password_hash, date_joined
               FROM users ORDER BY username LIMIT $1 OFFSET $2"#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Listing { items, count })
    }

    async fn create_user(&self, user: NewUser) -> Result<User, ApiError> {
        let created = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3)
               RETURNING id, username, email, password_hash, date_joined"#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// list_blogposts
    ///
    /// Builds the WHERE clause with `QueryBuilder` so every filter value is bound,
    /// never interpolated. The same clause drives the count and the page.
    async fn list_blogposts(
        &self,
        query: &BlogpostQuery,
        page: PageRequest,
    ) -> Result<Listing<Blogpost>, ApiError> {
        let mut count_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM blogposts b JOIN users u ON u.id = b.author_id WHERE TRUE",
        );
        push_blogpost_filters(&mut count_builder, query);
        let count: i64 = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {BLOGPOST_COLUMNS} FROM blogposts b JOIN users u ON u.id = b.author_id WHERE TRUE"
        ));
        push_blogpost_filters(&mut builder, query);
        builder.push(" ORDER BY b.id LIMIT ");
        builder.push_bind(page.limit());
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let items = builder
            .build_query_as::<Blogpost>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Listing { items, count })
    }

    async fn get_blogpost(&self, id: i64) -> Result<Option<Blogpost>, ApiError> {
        let post = sqlx::query_as::<_, Blogpost>(&format!(
            "SELECT {BLOGPOST_COLUMNS} FROM blogposts b JOIN users u ON u.id = b.author_id WHERE b.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    /// create_blogpost
    ///
    /// Inserts and joins the author in one statement (CTE), returning the full row.
    async fn create_blogpost(&self, post: NewBlogpost) -> Result<Blogpost, ApiError> {
        let created = sqlx::query_as::<_, Blogpost>(&format!(
            r#"
            WITH b AS (
                INSERT INTO blogposts (title, slug, description, content, allow_comments, author_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT {BLOGPOST_COLUMNS} FROM b JOIN users u ON u.id = b.author_id
            "#
        ))
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.description)
        .bind(&post.content)
        .bind(post.allow_comments)
        .bind(post.author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// update_blogpost
    ///
    /// `COALESCE` keeps the current value for every `None` in `changes`.
    async fn update_blogpost(
        &self,
        id: i64,
        changes: BlogpostChanges,
    ) -> Result<Option<Blogpost>, ApiError> {
        let updated = sqlx::query_as::<_, Blogpost>(&format!(
            r#"
            WITH b AS (
                UPDATE blogposts
                SET title = COALESCE($2, title),
                    description = COALESCE($3, description),
                    content = COALESCE($4, content),
                    allow_comments = COALESCE($5, allow_comments),
                    modified = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {BLOGPOST_COLUMNS} FROM b JOIN users u ON u.id = b.author_id
            "#
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.content)
        .bind(changes.allow_comments)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_blogpost(&self, id: i64) -> Result<bool, ApiError> {
        // Comments go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM blogposts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(
        &self,
        query: &CommentQuery,
        page: PageRequest,
    ) -> Result<Listing<Comment>, ApiError> {
        let mut count_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM comments c JOIN users u ON u.id = c.author_id WHERE TRUE",
        );
        push_comment_filters(&mut count_builder, query);
        let count: i64 = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c JOIN users u ON u.id = c.author_id WHERE TRUE"
        ));
        push_comment_filters(&mut builder, query);
        builder.push(" ORDER BY c.id LIMIT ");
        builder.push_bind(page.limit());
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let items = builder
            .build_query_as::<Comment>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Listing { items, count })
    }

    async fn comments_for_blogposts(&self, blogpost_ids: &[i64]) -> Result<Vec<Comment>, ApiError> {
        if blogpost_ids.is_empty() {
            return Ok(vec![]);
        }
        let comments = sqlx::query_as::<_, Comment>(&format!(
            r#"SELECT {COMMENT_COLUMNS} FROM comments c JOIN users u ON u.id = c.author_id
               WHERE c.blogpost_id = ANY($1) ORDER BY c.created, c.id"#
        ))
        .bind(blogpost_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, ApiError> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c JOIN users u ON u.id = c.author_id WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, ApiError> {
        let created = sqlx::query_as::<_, Comment>(&format!(
            r#"
            WITH c AS (
                INSERT INTO comments (content, author_id, blogpost_id) VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT {COMMENT_COLUMNS} FROM c JOIN users u ON u.id = c.author_id
            "#
        ))
        .bind(&comment.content)
        .bind(comment.author_id)
        .bind(comment.blogpost_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            // 23503: foreign_key_violation, the blogpost was deleted after the lookup
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503") => {
                ApiError::missing_blogpost()
            }
            _ => ApiError::from(err),
        })?;
        Ok(created)
    }

    async fn update_comment(
        &self,
        id: i64,
        changes: CommentChanges,
    ) -> Result<Option<Comment>, ApiError> {
        let updated = sqlx::query_as::<_, Comment>(&format!(
            r#"
            WITH c AS (
                UPDATE comments
                SET content = COALESCE($2, content),
                    modified = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {COMMENT_COLUMNS} FROM c JOIN users u ON u.id = c.author_id
            "#
        ))
        .bind(id)
        .bind(changes.content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
