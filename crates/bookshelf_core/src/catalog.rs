//! crates/bookshelf_core/src/catalog.rs
//!
//! Book registration and the shared book-identifier helper.

use uuid::Uuid;

use crate::domain::{Book, NewBook};
use crate::ports::{CatalogStore, PortError, PortResult};

/// Parses a raw book identifier. A syntactically invalid id reports the
/// same not-found outcome as an id that resolves to nothing, so callers
/// cannot distinguish malformed ids from missing books.
pub fn parse_book_id(raw: &str) -> PortResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| PortError::NotFound("Book not found".to_string()))
}

/// Validates and persists a newly registered book. Genre, publication date
/// and rating are optional; the store applies their defaults.
pub async fn register_book(catalog: &dyn CatalogStore, new_book: NewBook) -> PortResult<Book> {
    for (field, value) in [
        ("title", &new_book.title),
        ("author", &new_book.author),
        ("contentURL", &new_book.content_url),
        ("coverImageURL", &new_book.cover_image_url),
    ] {
        if value.trim().is_empty() {
            return Err(PortError::Validation(format!("{} is required", field)));
        }
    }
    if let Some(rating) = new_book.rating {
        if !(0.0..=5.0).contains(&rating) {
            return Err(PortError::Validation(
                "Rating must be a value between 0 and 5".to_string(),
            ));
        }
    }

    catalog.insert_book(new_book).await
}
