//! Entity <-> wire mapping.
//!
//! Each entity has an explicit schema: an ordered list of fields with their
//! access mode and validation rule. Incoming payloads are checked against the
//! schema and turned into typed write models; rows are turned into
//! representations with hyperlinked references.

use serde_json::{Map, Value};

use crate::{
    error::{ApiError, FieldErrors, NON_FIELD_ERRORS},
    models::{
        Blogpost, BlogpostChanges, BlogpostInput, BlogpostResponse, Comment, CommentChanges,
        CommentResponse, User, UserResponse,
    },
};

pub const TITLE_MAX_LENGTH: usize = 255;

const READ_ONLY_CHANGED: &str = "This field is read-only and cannot be changed.";

// --- Hyperlinks ---

/// Links
///
/// Builds the absolute URLs used as identifiers in representations, and
/// resolves them back when a client sends one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Links {
    api_root: String,
}

impl Links {
    pub fn new(public_url: &str, api_prefix: &str) -> Self {
        Self {
            api_root: format!("{}{}", public_url.trim_end_matches('/'), api_prefix),
        }
    }

    pub fn root(&self) -> String {
        format!("{}/", self.api_root)
    }

    pub fn users(&self) -> String {
        format!("{}/users/", self.api_root)
    }

    pub fn user(&self, username: &str) -> String {
        format!("{}/users/{}/", self.api_root, username)
    }

    pub fn blogposts(&self) -> String {
        format!("{}/blogposts/", self.api_root)
    }

    pub fn blogpost(&self, id: i64) -> String {
        format!("{}/blogposts/{}/", self.api_root, id)
    }

    pub fn comments(&self) -> String {
        format!("{}/comments/", self.api_root)
    }

    pub fn comment(&self, id: i64) -> String {
        format!("{}/comments/{}/", self.api_root, id)
    }

    /// Resolves a blogpost hyperlink to its id. Only the path is compared, so
    /// links built for another host still resolve.
    pub fn parse_blogpost(&self, link: &str) -> Option<i64> {
        let path = strip_origin(link);
        let prefix = strip_origin(&self.blogposts());
        path.strip_prefix(prefix.as_str())?
            .trim_end_matches('/')
            .parse()
            .ok()
    }
}

fn strip_origin(url: &str) -> String {
    match url.split_once("://") {
        Some((_, rest)) => rest
            .find('/')
            .map_or_else(|| "/".to_string(), |idx| rest[idx..].to_string()),
        None => url.to_string(),
    }
}

// --- Slug ---

/// slugify
///
/// ASCII-only, lowercase, words joined by single hyphens.
/// `"Hello World"` becomes `"hello-world"`.
pub fn slugify(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(char::is_ascii)
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_ascii_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let mut slug = String::with_capacity(cleaned.len());
    let mut pending_hyphen = false;
    for c in cleaned.chars() {
        if c == '-' || c.is_ascii_whitespace() {
            pending_hyphen = true;
        } else {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        }
    }

    let slug = slug.trim_matches(|c| c == '-' || c == '_');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

// --- Schemas ---

/// How a field may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Server-computed; ignored on create, must not change on update.
    ReadOnly,
    ReadWrite,
    /// Writable on create only, read-only afterwards.
    CreateOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Not validated (read-only fields).
    Any,
    Text { required: bool, max_length: Option<usize> },
    Bool { required: bool },
    /// A hyperlink (or bare id) to another entity.
    Hyperlink { required: bool },
}

impl Rule {
    fn required(self) -> bool {
        match self {
            Rule::Any => false,
            Rule::Text { required, .. }
            | Rule::Bool { required }
            | Rule::Hyperlink { required } => required,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub access: Access,
    pub rule: Rule,
}

const fn field(name: &'static str, access: Access, rule: Rule) -> FieldSpec {
    FieldSpec { name, access, rule }
}

/// Blogpost fields, in representation order.
pub const BLOGPOST_SCHEMA: &[FieldSpec] = &[
    field("url", Access::ReadOnly, Rule::Any),
    field("id", Access::ReadOnly, Rule::Any),
    field(
        "title",
        Access::ReadWrite,
        Rule::Text { required: true, max_length: Some(TITLE_MAX_LENGTH) },
    ),
    field("slug", Access::ReadOnly, Rule::Any),
    field(
        "description",
        Access::ReadWrite,
        Rule::Text { required: true, max_length: None },
    ),
    field(
        "content",
        Access::ReadWrite,
        Rule::Text { required: true, max_length: None },
    ),
    field("allow_comments", Access::ReadWrite, Rule::Bool { required: false }),
    field("author", Access::ReadOnly, Rule::Any),
    field("created", Access::ReadOnly, Rule::Any),
    field("modified", Access::ReadOnly, Rule::Any),
    field("comments", Access::ReadOnly, Rule::Any),
];

/// Comment fields, in representation order.
pub const COMMENT_SCHEMA: &[FieldSpec] = &[
    field("url", Access::ReadOnly, Rule::Any),
    field("id", Access::ReadOnly, Rule::Any),
    field(
        "content",
        Access::ReadWrite,
        Rule::Text { required: true, max_length: None },
    ),
    field("author", Access::ReadOnly, Rule::Any),
    field("created", Access::ReadOnly, Rule::Any),
    field("modified", Access::ReadOnly, Rule::Any),
    field("blogpost", Access::CreateOnly, Rule::Hyperlink { required: true }),
];

/// What kind of write a payload is for.
#[derive(Debug, Clone, Copy)]
pub enum WriteMode<'a> {
    Create,
    /// PUT: every required writable field must be present.
    Update { current: &'a Value },
    /// PATCH: only the supplied fields are validated.
    PartialUpdate { current: &'a Value },
}

impl WriteMode<'_> {
    fn current(&self) -> Option<&Value> {
        match self {
            WriteMode::Create => None,
            WriteMode::Update { current } | WriteMode::PartialUpdate { current } => Some(current),
        }
    }
}

/// validate
///
/// Checks `payload` against `schema` and returns the accepted writable fields.
/// All field errors are collected before failing.
pub fn validate(
    schema: &[FieldSpec],
    payload: &Value,
    mode: WriteMode<'_>,
) -> Result<Map<String, Value>, ApiError> {
    let Some(object) = payload.as_object() else {
        return Err(ApiError::field(
            NON_FIELD_ERRORS,
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_type_name(payload)
            ),
        ));
    };

    let mut errors = FieldErrors::new();
    let mut accepted = Map::new();

    for spec in schema {
        let writable = match spec.access {
            Access::ReadWrite => true,
            Access::CreateOnly => matches!(mode, WriteMode::Create),
            Access::ReadOnly => false,
        };
        let supplied = object.get(spec.name);

        if !writable {
            // Read-only on create: silently ignored. On update: an echo of the
            // current value is fine, anything else is rejected.
            if let (Some(value), Some(current)) = (supplied, mode.current()) {
                if current.get(spec.name) != Some(value) {
                    errors.add(spec.name, READ_ONLY_CHANGED);
                }
            }
            continue;
        }

        match supplied {
            None => {
                if spec.rule.required() && !matches!(mode, WriteMode::PartialUpdate { .. }) {
                    errors.add(spec.name, "This field is required.");
                }
            }
            Some(value) => match check_rule(spec.rule, value) {
                Ok(()) => {
                    accepted.insert(spec.name.to_string(), value.clone());
                }
                Err(message) => errors.add(spec.name, message),
            },
        }
    }

    errors.into_result()?;
    Ok(accepted)
}

fn check_rule(rule: Rule, value: &Value) -> Result<(), String> {
    if value.is_null() {
        return Err("This field may not be null.".to_string());
    }

    match rule {
        Rule::Any => Ok(()),
        Rule::Text { required, max_length } => {
            let text = value
                .as_str()
                .ok_or_else(|| "Not a valid string.".to_string())?;
            if required && text.trim().is_empty() {
                return Err("This field may not be blank.".to_string());
            }
            match max_length {
                Some(max) if text.chars().count() > max => Err(format!(
                    "Ensure this field has no more than {max} characters."
                )),
                _ => Ok(()),
            }
        }
        Rule::Bool { .. } => value
            .is_boolean()
            .then_some(())
            .ok_or_else(|| "Must be a valid boolean.".to_string()),
        Rule::Hyperlink { .. } => {
            if value.is_string() || value.is_i64() || value.is_u64() {
                Ok(())
            } else {
                Err(format!(
                    "Incorrect type. Expected URL string, received {}.",
                    json_type_name(value)
                ))
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn into_model<T: serde::de::DeserializeOwned>(accepted: Map<String, Value>) -> Result<T, ApiError> {
    serde_json::from_value(Value::Object(accepted))
        .map_err(|e| ApiError::field(NON_FIELD_ERRORS, e.to_string()))
}

fn to_value<T: serde::Serialize>(repr: &T) -> Result<Value, ApiError> {
    serde_json::to_value(repr).map_err(|e| ApiError::Internal(e.to_string()))
}

// --- Blogpost ---

pub struct BlogpostSerializer;

impl BlogpostSerializer {
    /// Representation of a blogpost with its (already ordered) comments.
    pub fn represent(post: &Blogpost, comments: &[Comment], links: &Links) -> BlogpostResponse {
        BlogpostResponse {
            url: links.blogpost(post.id),
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            description: post.description.clone(),
            content: post.content.clone(),
            allow_comments: post.allow_comments,
            author: links.user(&post.author_username),
            created: post.created,
            modified: post.modified,
            comments: comments
                .iter()
                .map(|comment| CommentSerializer::represent(comment, links))
                .collect(),
        }
    }

    pub fn validate_create(payload: &Value) -> Result<BlogpostInput, ApiError> {
        into_model(validate(BLOGPOST_SCHEMA, payload, WriteMode::Create)?)
    }

    /// PUT when `partial` is false, PATCH otherwise.
    pub fn validate_update(
        payload: &Value,
        current: &BlogpostResponse,
        partial: bool,
    ) -> Result<BlogpostChanges, ApiError> {
        let current = to_value(current)?;
        let mode = if partial {
            WriteMode::PartialUpdate { current: &current }
        } else {
            WriteMode::Update { current: &current }
        };
        into_model(validate(BLOGPOST_SCHEMA, payload, mode)?)
    }
}

// --- Comment ---

/// CommentDraft
///
/// A validated comment creation whose blogpost reference still has to be
/// checked for existence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub content: String,
    pub blogpost_id: i64,
}

pub struct CommentSerializer;

impl CommentSerializer {
    pub fn represent(comment: &Comment, links: &Links) -> CommentResponse {
        CommentResponse {
            url: links.comment(comment.id),
            id: comment.id,
            content: comment.content.clone(),
            author: links.user(&comment.author_username),
            created: comment.created,
            modified: comment.modified,
            blogpost: links.blogpost(comment.blogpost_id),
        }
    }

    pub fn validate_create(payload: &Value, links: &Links) -> Result<CommentDraft, ApiError> {
        let accepted = validate(COMMENT_SCHEMA, payload, WriteMode::Create)?;

        let content = accepted
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let blogpost_id = accepted
            .get("blogpost")
            .and_then(|value| resolve_blogpost(value, links))
            .ok_or_else(|| ApiError::field("blogpost", "Invalid hyperlink - No URL match."))?;

        Ok(CommentDraft {
            content,
            blogpost_id,
        })
    }

    /// PUT when `partial` is false, PATCH otherwise. A `blogpost` reference
    /// that resolves to the current blogpost counts as unchanged, whatever
    /// form it was sent in.
    pub fn validate_update(
        payload: &Value,
        current: &CommentResponse,
        links: &Links,
        partial: bool,
    ) -> Result<CommentChanges, ApiError> {
        let mut payload = payload.clone();
        if let Some(object) = payload.as_object_mut() {
            let current_id = links.parse_blogpost(&current.blogpost);
            if let Some(supplied) = object.get_mut("blogpost") {
                if current_id.is_some() && resolve_blogpost(supplied, links) == current_id {
                    *supplied = Value::String(current.blogpost.clone());
                }
            }
        }

        let current = to_value(current)?;
        let mode = if partial {
            WriteMode::PartialUpdate { current: &current }
        } else {
            WriteMode::Update { current: &current }
        };
        into_model(validate(COMMENT_SCHEMA, &payload, mode)?)
    }
}

/// A blogpost reference is either its hyperlink or its bare id.
fn resolve_blogpost(value: &Value, links: &Links) -> Option<i64> {
    match value {
        Value::String(link) => links.parse_blogpost(link).or_else(|| link.parse().ok()),
        Value::Number(id) => id.as_i64(),
        _ => None,
    }
}

// --- User ---

pub struct UserSerializer;

impl UserSerializer {
    pub fn represent(user: &User, links: &Links) -> UserResponse {
        UserResponse {
            url: links.user(&user.username),
            username: user.username.clone(),
        }
    }
}
