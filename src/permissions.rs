//! Per-request authorization predicates.
//!
//! A resource endpoint composes policies into a [`PermissionSet`]. The set is
//! evaluated in order and stops at the first denial. View-level checks run
//! before the target is loaded; object-level checks run against the loaded
//! target.

use crate::{
    auth::Actor,
    error::ApiError,
    models::{Blogpost, Comment},
};

/// The CRUD action a request maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
}

impl Action {
    /// Read actions never change state.
    pub fn is_safe(self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }

    pub fn is_mutation(self) -> bool {
        matches!(self, Action::Update | Action::PartialUpdate | Action::Destroy)
    }
}

/// Entities that record the user who created them.
pub trait Authored {
    fn author_id(&self) -> i64;
}

impl Authored for Blogpost {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

/// Permission
///
/// A predicate over (actor, action) and optionally the target entity. Both
/// methods allow by default so a policy only overrides the stage it cares about.
pub trait Permission<T>: Send + Sync {
    fn name(&self) -> &'static str;

    fn has_permission(&self, _actor: &Actor, _action: Action) -> bool {
        true
    }

    fn has_object_permission(&self, _actor: &Actor, _action: Action, _target: &T) -> bool {
        true
    }
}

/// Reads are open to everyone; writes need an authenticated actor.
pub struct ReadOrAuthenticatedWrite;

impl<T> Permission<T> for ReadOrAuthenticatedWrite {
    fn name(&self) -> &'static str {
        "ReadOrAuthenticatedWrite"
    }

    fn has_permission(&self, actor: &Actor, action: Action) -> bool {
        action.is_safe() || actor.is_authenticated()
    }
}

/// Only the author may update or delete the target.
pub struct AuthorOrReadOnly;

impl<T: Authored> Permission<T> for AuthorOrReadOnly {
    fn name(&self) -> &'static str {
        "AuthorOrReadOnly"
    }

    fn has_object_permission(&self, actor: &Actor, action: Action, target: &T) -> bool {
        action.is_safe() || actor.is(target.author_id())
    }
}

/// Update and destroy on a comment are reserved to its author.
pub struct CommentMutationPolicy;

impl Permission<Comment> for CommentMutationPolicy {
    fn name(&self) -> &'static str {
        "CommentMutationPolicy"
    }

    fn has_object_permission(&self, actor: &Actor, action: Action, target: &Comment) -> bool {
        !action.is_mutation() || actor.is(target.author_id)
    }
}

/// Creating a comment requires the parent blogpost to accept comments.
/// The target is the parent blogpost.
pub struct CommentsAllowedPolicy;

impl Permission<Blogpost> for CommentsAllowedPolicy {
    fn name(&self) -> &'static str {
        "CommentsAllowedPolicy"
    }

    fn has_object_permission(&self, _actor: &Actor, action: Action, target: &Blogpost) -> bool {
        action != Action::Create || target.allow_comments
    }
}

/// PermissionSet
///
/// An ordered list of policies. A denial becomes `AuthenticationRequired`
/// for anonymous actors and `AuthorizationDenied` otherwise.
pub struct PermissionSet<T> {
    policies: Vec<Box<dyn Permission<T>>>,
}

impl<T> Default for PermissionSet<T> {
    fn default() -> Self {
        Self {
            policies: Vec::new(),
        }
    }
}

impl<T> PermissionSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, policy: impl Permission<T> + 'static) -> Self {
        self.policies.push(Box::new(policy));
        self
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// View-level check, before any target is loaded.
    pub fn check(&self, actor: &Actor, action: Action) -> Result<(), ApiError> {
        match self
            .policies
            .iter()
            .find(|policy| !policy.has_permission(actor, action))
        {
            Some(policy) => Err(deny(policy.name(), actor, action)),
            None => Ok(()),
        }
    }

    /// Object-level check against a loaded target.
    pub fn check_object(&self, actor: &Actor, action: Action, target: &T) -> Result<(), ApiError> {
        match self
            .policies
            .iter()
            .find(|policy| !policy.has_object_permission(actor, action, target))
        {
            Some(policy) => Err(deny(policy.name(), actor, action)),
            None => Ok(()),
        }
    }
}

fn deny(policy: &str, actor: &Actor, action: Action) -> ApiError {
    tracing::debug!(policy, actor = actor.name(), ?action, "permission denied");
    if actor.is_authenticated() {
        ApiError::AuthorizationDenied(
            "You do not have permission to perform this action.".to_string(),
        )
    } else {
        ApiError::AuthenticationRequired(
            "Authentication credentials were not provided.".to_string(),
        )
    }
}

/// Policies guarding `/blogposts/`.
pub fn blogpost_permissions() -> PermissionSet<Blogpost> {
    PermissionSet::new()
        .with(ReadOrAuthenticatedWrite)
        .with(AuthorOrReadOnly)
}

/// Policies guarding `/comments/`.
pub fn comment_permissions() -> PermissionSet<Comment> {
    PermissionSet::new()
        .with(ReadOrAuthenticatedWrite)
        .with(CommentMutationPolicy)
}

/// Policies checked against the parent blogpost when a comment is created.
/// Empty unless `enforce_comments_allowed` is set.
pub fn comment_parent_permissions(enforce_comments_allowed: bool) -> PermissionSet<Blogpost> {
    if enforce_comments_allowed {
        PermissionSet::new().with(CommentsAllowedPolicy)
    } else {
        PermissionSet::new()
    }
}
