pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

// Re-export the handlers the binary wires into the router.
pub use middleware::require_auth;
pub use rest::{
    add_favorite_handler, add_recently_viewed_handler, add_review_handler,
    get_book_details_handler, list_books_handler, list_favorites_handler, profile_handler,
    register_book_handler, remove_favorite_handler,
};
