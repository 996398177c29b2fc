//! crates/bookshelf_core/src/relationships.rs
//!
//! The relationship mutator: add/remove favorite, add to recently-viewed,
//! and review authoring. Every operation follows the same shape: validate,
//! resolve the book, apply one atomic conditional mutation, return the
//! updated projection. Uniqueness is enforced by the storage operation
//! itself, so concurrent calls for the same user cannot both succeed.

use uuid::Uuid;

use crate::domain::{NewReview, ReviewAuthor, ReviewWithAuthor, RECENT_LIMIT};
use crate::ports::{CatalogStore, PortError, PortResult, RelationshipStore, ReviewStore};

/// Resolves a book or reports not-found. Every mutation starts here.
async fn require_book(catalog: &dyn CatalogStore, book_id: Uuid) -> PortResult<()> {
    catalog
        .get_book(book_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| PortError::NotFound(format!("Book {} not found", book_id)))
}

/// Adds or removes a book in the user's favorites set.
///
/// Adding an existing favorite and removing a missing one are both
/// conflicts, never silent no-ops. On success the full updated set of
/// favorite book ids is returned.
pub async fn set_favorite(
    catalog: &dyn CatalogStore,
    relationships: &dyn RelationshipStore,
    user_id: Uuid,
    book_id: Uuid,
    add: bool,
) -> PortResult<Vec<Uuid>> {
    require_book(catalog, book_id).await?;

    let changed = if add {
        relationships.insert_favorite(user_id, book_id).await?
    } else {
        relationships.remove_favorite(user_id, book_id).await?
    };
    if !changed {
        return Err(PortError::Conflict(if add {
            "Book already in user's favorites".to_string()
        } else {
            "Book is not in user's favorites".to_string()
        }));
    }

    relationships.favorites(user_id).await
}

/// Prepends a book to the user's recently-viewed sequence.
///
/// A book that is already anywhere in the sequence is a conflict rather
/// than a promotion to the front. On success the sequence is truncated to
/// the newest `RECENT_LIMIT` entries and returned most-recent-first.
pub async fn add_recent(
    catalog: &dyn CatalogStore,
    relationships: &dyn RelationshipStore,
    user_id: Uuid,
    book_id: Uuid,
) -> PortResult<Vec<Uuid>> {
    require_book(catalog, book_id).await?;

    relationships
        .push_recent(user_id, book_id, RECENT_LIMIT)
        .await?
        .ok_or_else(|| PortError::Conflict("Book already in user's recents".to_string()))
}

/// Persists a new review, enforcing the one-review-per-user-per-book rule,
/// and returns it joined with the author's public display fields.
pub async fn add_review(
    catalog: &dyn CatalogStore,
    reviews: &dyn ReviewStore,
    relationships: &dyn RelationshipStore,
    user_id: Uuid,
    book_id: Uuid,
    content: &str,
    rating: f64,
) -> PortResult<ReviewWithAuthor> {
    if content.trim().is_empty() {
        return Err(PortError::Validation(
            "Review content is required".to_string(),
        ));
    }
    if !(1.0..=5.0).contains(&rating) {
        return Err(PortError::Validation(
            "Review rating must be a value between 1 and 5".to_string(),
        ));
    }
    require_book(catalog, book_id).await?;

    let review = reviews
        .insert_review(NewReview {
            content: content.to_string(),
            rating,
            user_id,
            book_id,
        })
        .await?
        .ok_or_else(|| {
            PortError::Conflict("This user already has a review for this book".to_string())
        })?;

    // The author is the authenticated caller; a missing record here is a
    // storage inconsistency, not a caller error.
    let author = relationships
        .get_user(user_id)
        .await?
        .ok_or_else(|| PortError::Unexpected(format!("User {} not found", user_id)))?;

    Ok(ReviewWithAuthor {
        id: review.id,
        content: review.content,
        rating: review.rating,
        author: ReviewAuthor {
            first_name: author.first_name,
            last_name: author.last_name,
            email: author.email,
        },
        created_at: review.created_at,
    })
}
