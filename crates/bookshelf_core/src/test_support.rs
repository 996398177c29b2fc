//! In-memory store used by the core tests. Implements every port on one
//! struct behind a single mutex, so each operation is atomic the same way
//! the real adapter's conditional statements are. Read counters let tests
//! assert that short-circuited operations never reached storage.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    Book, NewBook, NewReview, Review, ReviewAuthor, ReviewWithAuthor, User, UserCredentials,
};
use crate::ports::{CatalogStore, PortResult, RelationshipStore, ReviewStore};
use crate::query::{BookQuery, SortField, SortOrder};

#[derive(Default)]
struct State {
    books: Vec<Book>,
    users: Vec<User>,
    reviews: Vec<Review>,
    favorites: Vec<(Uuid, Uuid)>,
    recents: Vec<(Uuid, Vec<Uuid>)>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    review_reads: AtomicUsize,
    membership_reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, first_name: &str, last_name: &str, email: &str) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        let id = user.id;
        self.state.lock().unwrap().users.push(user);
        id
    }

    pub fn add_book(&self, title: &str, author: &str, genre: &str, rating: f64) -> Uuid {
        let book = Book {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            content_url: format!("https://books.example/{}.epub", title),
            cover_image_url: format!("https://books.example/{}.jpg", title),
            publication_date: Utc::now(),
            rating,
        };
        let id = book.id;
        self.state.lock().unwrap().books.push(book);
        id
    }

    pub fn review_reads(&self) -> usize {
        self.review_reads.load(AtomicOrdering::SeqCst)
    }

    pub fn membership_reads(&self) -> usize {
        self.membership_reads.load(AtomicOrdering::SeqCst)
    }
}

fn compare(a: &Book, b: &Book, field: SortField) -> Ordering {
    match field {
        SortField::Title => a.title.cmp(&b.title),
        SortField::Author => a.author.cmp(&b.author),
        SortField::Genre => a.genre.cmp(&b.genre),
        SortField::PublicationDate => a.publication_date.cmp(&b.publication_date),
        SortField::Rating => a.rating.partial_cmp(&b.rating).unwrap_or(Ordering::Equal),
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn insert_book(&self, new_book: NewBook) -> PortResult<Book> {
        let book = Book {
            id: Uuid::new_v4(),
            title: new_book.title,
            author: new_book.author,
            genre: new_book.genre.unwrap_or_else(|| "other".to_string()),
            content_url: new_book.content_url,
            cover_image_url: new_book.cover_image_url,
            publication_date: new_book.publication_date.unwrap_or_else(Utc::now),
            rating: new_book.rating.unwrap_or(0.0),
        };
        self.state.lock().unwrap().books.push(book.clone());
        Ok(book)
    }

    async fn get_book(&self, book_id: Uuid) -> PortResult<Option<Book>> {
        let state = self.state.lock().unwrap();
        Ok(state.books.iter().find(|b| b.id == book_id).cloned())
    }

    async fn find_books(&self, query: BookQuery) -> PortResult<Vec<Book>> {
        let state = self.state.lock().unwrap();
        Ok(match query {
            BookQuery::TopRated { limit } => {
                let mut books = state.books.clone();
                books.sort_by(|a, b| compare(b, a, SortField::Rating));
                books.truncate(limit as usize);
                books
            }
            BookQuery::Search { keyword } => {
                let needle = keyword.to_lowercase();
                state
                    .books
                    .iter()
                    .filter(|b| {
                        b.title.to_lowercase().contains(&needle)
                            || b.author.to_lowercase().contains(&needle)
                    })
                    .cloned()
                    .collect()
            }
            BookQuery::Filtered {
                genre,
                min_rating,
                max_rating,
                sort_by,
                sort_order,
            } => {
                let mut books: Vec<Book> = state
                    .books
                    .iter()
                    .filter(|b| b.genre == genre && b.rating >= min_rating && b.rating < max_rating)
                    .cloned()
                    .collect();
                books.sort_by(|a, b| match sort_order {
                    SortOrder::Ascending => compare(a, b, sort_by),
                    SortOrder::Descending => compare(b, a, sort_by),
                });
                books
            }
        })
    }

    async fn books_by_ids(&self, book_ids: &[Uuid]) -> PortResult<Vec<Book>> {
        let state = self.state.lock().unwrap();
        Ok(book_ids
            .iter()
            .filter_map(|id| state.books.iter().find(|b| b.id == *id).cloned())
            .collect())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn insert_review(&self, new_review: NewReview) -> PortResult<Option<Review>> {
        let mut state = self.state.lock().unwrap();
        let exists = state
            .reviews
            .iter()
            .any(|r| r.user_id == new_review.user_id && r.book_id == new_review.book_id);
        if exists {
            return Ok(None);
        }
        let review = Review {
            id: Uuid::new_v4(),
            content: new_review.content,
            rating: new_review.rating,
            user_id: new_review.user_id,
            book_id: new_review.book_id,
            created_at: Utc::now(),
        };
        state.reviews.push(review.clone());
        Ok(Some(review))
    }

    async fn reviews_for_book(&self, book_id: Uuid) -> PortResult<Vec<ReviewWithAuthor>> {
        self.review_reads.fetch_add(1, AtomicOrdering::SeqCst);
        let state = self.state.lock().unwrap();
        let mut reviews: Vec<&Review> =
            state.reviews.iter().filter(|r| r.book_id == book_id).collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews
            .into_iter()
            .map(|r| {
                let author = state
                    .users
                    .iter()
                    .find(|u| u.id == r.user_id)
                    .expect("review author exists");
                ReviewWithAuthor {
                    id: r.id,
                    content: r.content.clone(),
                    rating: r.rating,
                    author: ReviewAuthor {
                        first_name: author.first_name.clone(),
                        last_name: author.last_name.clone(),
                        email: author.email.clone(),
                    },
                    created_at: r.created_at,
                }
            })
            .collect())
    }

    async fn review_by_user_for_book(
        &self,
        user_id: Uuid,
        book_id: Uuid,
    ) -> PortResult<Option<Review>> {
        self.review_reads.fetch_add(1, AtomicOrdering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state
            .reviews
            .iter()
            .find(|r| r.user_id == user_id && r.book_id == book_id)
            .cloned())
    }

    async fn reviews_by_user(&self, user_id: Uuid) -> PortResult<Vec<Review>> {
        self.review_reads.fetch_add(1, AtomicOrdering::SeqCst);
        let state = self.state.lock().unwrap();
        let mut reviews: Vec<Review> = state
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}

#[async_trait]
impl RelationshipStore for MemoryStore {
    async fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        _hashed_password: &str,
    ) -> PortResult<Option<User>> {
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.email == email) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(Some(user))
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.email == email).map(|u| {
            UserCredentials {
                user_id: u.id,
                email: u.email.clone(),
                hashed_password: String::new(),
            }
        }))
    }

    async fn insert_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool> {
        let mut state = self.state.lock().unwrap();
        if state.favorites.contains(&(user_id, book_id)) {
            return Ok(false);
        }
        state.favorites.push((user_id, book_id));
        Ok(true)
    }

    async fn remove_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.favorites.len();
        state.favorites.retain(|entry| *entry != (user_id, book_id));
        Ok(state.favorites.len() < before)
    }

    async fn favorites(&self, user_id: Uuid) -> PortResult<Vec<Uuid>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .favorites
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, b)| *b)
            .collect())
    }

    async fn is_favorite(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool> {
        self.membership_reads.fetch_add(1, AtomicOrdering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state.favorites.contains(&(user_id, book_id)))
    }

    async fn push_recent(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        limit: usize,
    ) -> PortResult<Option<Vec<Uuid>>> {
        let mut state = self.state.lock().unwrap();
        let idx = match state.recents.iter().position(|(u, _)| *u == user_id) {
            Some(idx) => idx,
            None => {
                state.recents.push((user_id, Vec::new()));
                state.recents.len() - 1
            }
        };
        let sequence = &mut state.recents[idx].1;
        if sequence.contains(&book_id) {
            return Ok(None);
        }
        sequence.insert(0, book_id);
        sequence.truncate(limit);
        Ok(Some(sequence.clone()))
    }

    async fn recents(&self, user_id: Uuid) -> PortResult<Vec<Uuid>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .recents
            .iter()
            .find(|(u, _)| *u == user_id)
            .map(|(_, sequence)| sequence.clone())
            .unwrap_or_default())
    }

    async fn is_recent(&self, user_id: Uuid, book_id: Uuid) -> PortResult<bool> {
        self.membership_reads.fetch_add(1, AtomicOrdering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state
            .recents
            .iter()
            .find(|(u, _)| *u == user_id)
            .map(|(_, sequence)| sequence.contains(&book_id))
            .unwrap_or(false))
    }
}
