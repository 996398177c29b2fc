//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the store ports from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Conditional mutations are single statements (`ON CONFLICT DO NOTHING`,
//! `DELETE ... WHERE`) whose row counts report whether state changed, so
//! uniqueness checks and writes can never race each other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use bookshelf_core::domain::{
    Book, NewBook, NewReview, Review, ReviewAuthor, ReviewWithAuthor, User, UserCredentials,
};
use bookshelf_core::ports::{
    AuthStore, CatalogStore, PortError, PortResult, RelationshipStore, ReviewStore,
};
use bookshelf_core::query::{BookQuery, SortOrder};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every store port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct BookRecord {
    id: Uuid,
    title: String,
    author: String,
    genre: String,
    content_url: String,
    cover_image_url: String,
    publication_date: DateTime<Utc>,
    rating: f64,
}
impl BookRecord {
    fn to_domain(self) -> Book {
        Book {
            id: self.id,
            title: self.title,
            author: self.author,
            genre: self.genre,
            content_url: self.content_url,
            cover_image_url: self.cover_image_url,
            publication_date: self.publication_date,
            rating: self.rating,
        }
    }
}

const BOOK_COLUMNS: &str =
    "id, title, author, genre, content_url, cover_image_url, publication_date, rating";

#[derive(FromRow)]
struct ReviewRecord {
    id: Uuid,
    content: String,
    rating: f64,
    user_id: Uuid,
    book_id: Uuid,
    created_at: DateTime<Utc>,
}
impl ReviewRecord {
    fn to_domain(self) -> Review {
        Review {
            id: self.id,
            content: self.content,
            rating: self.rating,
            user_id: self.user_id,
            book_id: self.book_id,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ReviewWithAuthorRecord {
    id: Uuid,
    content: String,
    rating: f64,
    created_at: DateTime<Utc>,
    first_name: String,
    last_name: String,
    email: String,
}
impl ReviewWithAuthorRecord {
    fn to_domain(self) -> ReviewWithAuthor {
        ReviewWithAuthor {
            id: self.id,
            content: self.content,
            rating: self.rating,
            author: ReviewAuthor {
                first_name: self.first_name,
                last_name: self.last_name,
                email: self.email,
            },
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `CatalogStore` Implementation
//=========================================================================================

#[async_trait]
impl CatalogStore for DbAdapter {
    async fn insert_book(&self, new_book: NewBook) -> PortResult<Book> {
        let sql = format!(
            "INSERT INTO books (id, title, author, genre, content_url, cover_image_url, publication_date, rating) \
             VALUES ($1, $2, $3, COALESCE($4, 'other'), $5, $6, COALESCE($7, now()), COALESCE($8, 0)) \
             RETURNING {BOOK_COLUMNS}"
        );
        let record = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_book.title)
            .bind(&new_book.author)
            .bind(&new_book.genre)
            .bind(&new_book.content_url)
            .bind(&new_book.cover_image_url)
            .bind(new_book.publication_date)
            .bind(new_book.rating)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_book(&self, book_id: Uuid) -> PortResult<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1");
        let record = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.map(BookRecord::to_domain))
    }

    async fn find_books(&self, query: BookQuery) -> PortResult<Vec<Book>> {
        let records = match query {
            BookQuery::TopRated { limit } => {
                let sql = format!(
                    "SELECT {BOOK_COLUMNS} FROM books ORDER BY rating DESC LIMIT $1"
                );
                sqlx::query_as::<_, BookRecord>(&sql)
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await
            }
            BookQuery::Search { keyword } => {
                let sql = format!(
                    "SELECT {BOOK_COLUMNS} FROM books WHERE title ILIKE $1 OR author ILIKE $1"
                );
                let pattern = format!(
                    "%{}%",
                    keyword.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
                );
                sqlx::query_as::<_, BookRecord>(&sql)
                    .bind(pattern)
                    .fetch_all(&self.pool)
                    .await
            }
            BookQuery::Filtered {
                genre,
                min_rating,
                max_rating,
                sort_by,
                sort_order,
            } => {
                // The sort key comes from the core's allow-list enum, never
                // from raw caller input.
                let direction = match sort_order {
                    SortOrder::Ascending => "ASC",
                    SortOrder::Descending => "DESC",
                };
                let sql = format!(
                    "SELECT {BOOK_COLUMNS} FROM books \
                     WHERE genre = $1 AND rating >= $2 AND rating < $3 \
                     ORDER BY {} {}",
                    sort_by.column(),
                    direction
                );
                sqlx::query_as::<_, BookRecord>(&sql)
                    .bind(genre)
                    .bind(min_rating)
                    .bind(max_rating)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(unexpected)?;
        Ok(records.into_iter().map(BookRecord::to_domain).collect())
    }

    async fn books_by_ids(&self, book_ids: &[Uuid]) -> PortResult<Vec<Book>> {
        if book_ids.is_empty() {
            return Ok(Vec::new());
        }
        let records = sqlx::query_as::<_, BookRecord>(
            "SELECT books.id, title, author, genre, content_url, cover_image_url, \
                    publication_date, rating \
             FROM unnest($1::uuid[]) WITH ORDINALITY AS ids(book_id, ord) \
             JOIN books ON books.id = ids.book_id ORDER BY ids.ord",
        )
            .bind(book_ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(BookRecord::to_domain).collect())
    }
}

//=========================================================================================
// `ReviewStore` Implementation
//=========================================================================================

#[async_trait]
impl ReviewStore for DbAdapter {
    async fn insert_review(&self, new_review: NewReview) -> PortResult<Option<Review>> {
        let record = sqlx::query_as::<_, ReviewRecord>(
            "INSERT INTO reviews (id, content, rating, user_id, book_id) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id, book_id) DO NOTHING \
             RETURNING id, content, rating, user_id, book_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new_review.content)
        .bind(new_review.rating)
        .bind(new_review.user_id)
        .bind(new_review.book_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(ReviewRecord::to_domain))
    }

    async fn reviews_for_book(&self, book_id: Uuid) -> PortResult<Vec<ReviewWithAuthor>> {
        let records = sqlx::query_as::<_, ReviewWithAuthorRecord>(
            "SELECT r.id, r.content, r.rating, r.created_at, u.first_name, u.last_name, u.email \
             FROM reviews r JOIN users u ON u.id = r.user_id \
             WHERE r.book_id = $1 ORDER BY r.created_at DESC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(ReviewWithAuthorRecord::to_domain)
            .collect())
    }

    async fn review_by_user_for_book(
        &self,
        user_id: Uuid,
        book_id: Uuid,
    ) -> PortResult<Option<Review>> {
        let record = sqlx::query_as::<_, ReviewRecord>(
            "SELECT id, content, rating, user_id, book_id, created_at \
             FROM reviews WHERE user_id = $1 AND book_id = $2",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(ReviewRecord::to_domain))
    }

    async fn reviews_by_user(&self, user_id: Uuid) -> PortResult<Vec<Review>> {
        let records = sqlx::query_as::<_, ReviewRecord>(
            "SELECT id, content, rating, user_id, book_id, created_at \
             FROM reviews WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(ReviewRecord::to_domain).collect())
    }
}

//=========================================================================================
// `RelationshipStore` Implementation
//=========================================================================================

#[async_trait]
impl RelationshipStore for DbAdapter {
    async fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, first_name, last_name, email, password_hash) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (email) DO NOTHING \
             RETURNING id, first_name, last_name, email, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(hashed_password)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, first_name, last_name, email, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.map(|row| UserCredentials {
            user_id: row.get("id"),
            email: row.get("email"),
            hashed_password: row.get("password_hash"),
        }))
    }

    async fn insert_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool> {
        let result = sqlx::query(
            "INSERT INTO favorites (user_id, book_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, book_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(book_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND book_id = $2")
            .bind(user_id)
            .bind(book_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() == 1)
    }

    async fn favorites(&self, user_id: Uuid) -> PortResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT book_id FROM favorites WHERE user_id = $1 ORDER BY added_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn is_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = $1 AND book_id = $2)",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn push_recent(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        limit: usize,
    ) -> PortResult<Option<Vec<Uuid>>> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // The duplicate check and the insert are one statement; a concurrent
        // push of the same book can win, but never double-insert.
        let inserted = sqlx::query(
            "INSERT INTO recently_viewed (user_id, book_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, book_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(book_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;
        if inserted.rows_affected() == 0 {
            return Ok(None);
        }

        // Drop everything older than the newest `limit` entries.
        sqlx::query(
            "DELETE FROM recently_viewed WHERE user_id = $1 AND id NOT IN ( \
                 SELECT id FROM recently_viewed WHERE user_id = $1 \
                 ORDER BY id DESC LIMIT $2 \
             )",
        )
        .bind(user_id)
        .bind(limit as i64)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        let sequence = sqlx::query_scalar::<_, Uuid>(
            "SELECT book_id FROM recently_viewed WHERE user_id = $1 ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(Some(sequence))
    }

    async fn recents(&self, user_id: Uuid) -> PortResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT book_id FROM recently_viewed WHERE user_id = $1 ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn is_recent(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM recently_viewed WHERE user_id = $1 AND book_id = $2)",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }
}

//=========================================================================================
// `AuthStore` Implementation
//=========================================================================================

#[async_trait]
impl AuthStore for DbAdapter {
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound("Session not found or expired".to_string()))
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
