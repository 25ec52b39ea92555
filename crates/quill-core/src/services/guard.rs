//! Ownership guard for mutation entry points.
//!
//! Every check runs before any side effect. Anonymous callers always get
//! `Forbidden`; creation only needs an identity, while update and delete
//! need the identity to match the resource's recorded author.

use crate::domain::{Actor, Comment, Post, UserId};
use crate::error::DomainError;
use crate::ports::UserRepository;

/// A resource with a recorded author.
pub trait Owned {
    /// `None` once the author has been deleted.
    fn owner_id(&self) -> Option<UserId>;
}

impl Owned for Post {
    fn owner_id(&self) -> Option<UserId> {
        self.author_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> Option<UserId> {
        Some(self.author_id)
    }
}

/// Any authenticated identity.
pub fn require_actor(actor: Option<&Actor>) -> Result<&Actor, DomainError> {
    actor.ok_or_else(|| {
        tracing::debug!("Rejected anonymous mutation");
        DomainError::Forbidden
    })
}

/// An identity whose account still exists. Tokens outlive deleted accounts.
pub async fn require_account<'a, S>(
    store: &S,
    actor: Option<&'a Actor>,
) -> Result<&'a Actor, DomainError>
where
    S: UserRepository + ?Sized,
{
    let actor = require_actor(actor)?;
    if store.find_user(actor.user_id).await?.is_some() {
        Ok(actor)
    } else {
        tracing::warn!(user_id = %actor.user_id, "Rejected mutation by deleted account");
        Err(DomainError::Forbidden)
    }
}

/// The authenticated author of `resource`.
pub fn require_owner<'a, R: Owned>(
    actor: Option<&'a Actor>,
    resource: &R,
) -> Result<&'a Actor, DomainError> {
    let actor = require_actor(actor)?;
    if resource.owner_id() == Some(actor.user_id) {
        Ok(actor)
    } else {
        tracing::warn!(user_id = %actor.user_id, "Rejected mutation by non-owner");
        Err(DomainError::Forbidden)
    }
}

/// An authenticated staff identity.
pub fn require_staff(actor: Option<&Actor>) -> Result<&Actor, DomainError> {
    let actor = require_actor(actor)?;
    if actor.is_staff {
        Ok(actor)
    } else {
        tracing::warn!(user_id = %actor.user_id, "Rejected staff operation");
        Err(DomainError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn comment_by(author_id: UserId) -> Comment {
        let now = Utc::now();
        Comment {
            id: 1,
            post_id: 1,
            author_id,
            content: "hi".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn post_by(author_id: Option<UserId>) -> Post {
        let now = Utc::now();
        Post {
            id: 1,
            title: "t".into(),
            hook_text: None,
            content: "c".into(),
            head_image: None,
            file_upload: None,
            created_at: now,
            updated_at: now,
            author_id,
            category_id: None,
        }
    }

    #[test]
    fn anonymous_is_forbidden() {
        assert!(matches!(require_actor(None), Err(DomainError::Forbidden)));
        let comment = comment_by(Uuid::new_v4());
        assert!(matches!(
            require_owner(None, &comment),
            Err(DomainError::Forbidden)
        ));
    }

    #[test]
    fn owner_passes_and_others_do_not() {
        let owner = Actor::new(Uuid::new_v4());
        let other = Actor::new(Uuid::new_v4());
        let comment = comment_by(owner.user_id);

        assert_eq!(require_owner(Some(&owner), &comment).unwrap(), &owner);
        assert!(matches!(
            require_owner(Some(&other), &comment),
            Err(DomainError::Forbidden)
        ));
    }

    #[test]
    fn orphaned_post_cannot_be_mutated() {
        let actor = Actor::new(Uuid::new_v4());
        assert!(matches!(
            require_owner(Some(&actor), &post_by(None)),
            Err(DomainError::Forbidden)
        ));
    }

    #[test]
    fn staff_check() {
        let staff = Actor::staff(Uuid::new_v4());
        let user = Actor::new(Uuid::new_v4());
        assert!(require_staff(Some(&staff)).is_ok());
        assert!(matches!(
            require_staff(Some(&user)),
            Err(DomainError::Forbidden)
        ));
        assert!(matches!(require_staff(None), Err(DomainError::Forbidden)));
    }
}
