//! crates/bookshelf_core/src/ports.rs
//!
//! Defines the storage contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.
//!
//! Every conditional mutation is expressed as a single storage operation that
//! reports whether state actually changed, so the core never has to perform a
//! separate existence read before a write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Book, NewBook, NewReview, Review, ReviewWithAuthor, User, UserCredentials,
};
use crate::query::BookQuery;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port and core operations.
/// This abstracts away the specific errors from external services (e.g., database, network)
/// while preserving the distinctions the web layer has to report.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Malformed or out-of-range input, rejected before any storage call.
    #[error("{0}")]
    Validation(String),
    /// An identifier that does not resolve to a stored record.
    #[error("{0}")]
    NotFound(String),
    /// A uniqueness or idempotency precondition was already satisfied.
    #[error("{0}")]
    Conflict(String),
    /// An unexpected storage failure. The detail is logged server-side only.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Store Ports (Traits)
//=========================================================================================

/// Durable document storage for books.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_book(&self, new_book: NewBook) -> PortResult<Book>;

    async fn get_book(&self, book_id: Uuid) -> PortResult<Option<Book>>;

    /// Runs a validated catalog query produced by the query builder.
    async fn find_books(&self, query: BookQuery) -> PortResult<Vec<Book>>;

    /// Resolves a list of book ids into books, preserving the input order.
    /// Ids that no longer resolve are skipped.
    async fn books_by_ids(&self, book_ids: &[Uuid]) -> PortResult<Vec<Book>>;
}

/// Durable storage for reviews, keyed by (book, author).
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Atomic conditional insert: persists the review unless the
    /// (user, book) pair already has one, in which case `None` is returned
    /// and the existing review is untouched.
    async fn insert_review(&self, new_review: NewReview) -> PortResult<Option<Review>>;

    /// All reviews for a book with author display fields attached,
    /// most-recent-first.
    async fn reviews_for_book(&self, book_id: Uuid) -> PortResult<Vec<ReviewWithAuthor>>;

    async fn review_by_user_for_book(
        &self,
        user_id: Uuid,
        book_id: Uuid,
    ) -> PortResult<Option<Review>>;

    /// All reviews authored by a user, most-recent-first.
    async fn reviews_by_user(&self, user_id: Uuid) -> PortResult<Vec<Review>>;
}

/// Durable storage for user records and the relationship sets they own.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    // --- User Records ---

    /// Atomic conditional insert: `None` when the email is already taken.
    async fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<Option<User>>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>>;

    // --- Favorites (unordered set, no duplicates) ---

    /// Atomic set-insert. Returns `false` when the book was already a
    /// favorite, leaving the set unchanged.
    async fn insert_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool>;

    /// Atomic set-remove. Returns `false` when the book was not a favorite.
    async fn remove_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool>;

    async fn favorites(&self, user_id: Uuid) -> PortResult<Vec<Uuid>>;

    async fn is_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool>;

    // --- Recently viewed (ordered, bounded, most-recent-first) ---

    /// Atomic prepend-if-absent. Returns `None` when the book is already
    /// anywhere in the sequence; otherwise prepends it, drops entries beyond
    /// `limit`, and returns the updated sequence most-recent-first.
    async fn push_recent(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        limit: usize,
    ) -> PortResult<Option<Vec<Uuid>>>;

    async fn recents(&self, user_id: Uuid) -> PortResult<Vec<Uuid>>;

    async fn is_recent(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool>;
}

/// Login-session persistence consumed by the web layer's auth middleware.
/// The core itself never touches these; handlers receive an already
/// resolved user id.
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}
