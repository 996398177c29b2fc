//! crates/bookshelf_core/src/detail.rs
//!
//! The book-detail aggregator: composes a single book's reviews, the
//! requesting user's own review, and the user's favorite/recently-viewed
//! membership into one view.

use uuid::Uuid;

use crate::domain::BookDetail;
use crate::ports::{CatalogStore, PortError, PortResult, RelationshipStore, ReviewStore};

/// Builds the composed detail view for one book.
///
/// The book must resolve before anything else runs; a miss is reported as
/// not-found and no review or membership lookup is issued. The four
/// remaining reads are independent and execute concurrently, but the view
/// is only returned once all of them have completed.
pub async fn book_detail(
    catalog: &dyn CatalogStore,
    reviews: &dyn ReviewStore,
    relationships: &dyn RelationshipStore,
    book_id: Uuid,
    user_id: Uuid,
) -> PortResult<BookDetail> {
    catalog
        .get_book(book_id)
        .await?
        .ok_or_else(|| PortError::NotFound(format!("Book {} not found", book_id)))?;

    let (all_reviews, my_review, is_favorite, is_recently_viewed) = futures::try_join!(
        reviews.reviews_for_book(book_id),
        reviews.review_by_user_for_book(user_id, book_id),
        relationships.is_favorite(user_id, book_id),
        relationships.is_recent(user_id, book_id),
    )?;

    Ok(BookDetail {
        reviews: all_reviews,
        my_review,
        is_favorite,
        is_recently_viewed,
    })
}
