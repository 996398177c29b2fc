//! crates/bookshelf_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Maximum number of entries retained in a user's recently-viewed sequence.
pub const RECENT_LIMIT: usize = 10;

/// A catalog entry. Created through book registration and immutable
/// afterwards; the rating is a display score in `[0, 5]`.
#[derive(Debug, Clone)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub content_url: String,
    pub cover_image_url: String,
    pub publication_date: DateTime<Utc>,
    pub rating: f64,
}

/// The fields a caller supplies when registering a new book. Genre falls
/// back to "other", publication date to the creation time, rating to 0.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub content_url: String,
    pub cover_image_url: String,
    pub publication_date: Option<DateTime<Utc>>,
    pub rating: Option<f64>,
}

/// A user review of a book. At most one exists per (user, book) pair.
#[derive(Debug, Clone)]
pub struct Review {
    pub id: Uuid,
    pub content: String,
    pub rating: f64,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// The fields needed to persist a new review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub content: String,
    pub rating: f64,
    pub user_id: Uuid,
    pub book_id: Uuid,
}

/// A review joined with its author's public display fields. The book
/// reference is deliberately absent: callers already hold the book id.
#[derive(Debug, Clone)]
pub struct ReviewWithAuthor {
    pub id: Uuid,
    pub content: String,
    pub rating: f64,
    pub author: ReviewAuthor,
    pub created_at: DateTime<Utc>,
}

/// Public display fields of a review's author.
#[derive(Debug, Clone)]
pub struct ReviewAuthor {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// The composed single-book view: every review with its author attached,
/// the requesting user's own review if one exists, and that user's
/// favorite/recently-viewed membership for the book.
#[derive(Debug, Clone)]
pub struct BookDetail {
    pub reviews: Vec<ReviewWithAuthor>,
    pub my_review: Option<Review>,
    pub is_favorite: bool,
    pub is_recently_viewed: bool,
}
