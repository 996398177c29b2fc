pub mod catalog;
pub mod detail;
pub mod domain;
pub mod ports;
pub mod query;
pub mod relationships;

#[cfg(test)]
pub(crate) mod test_support;

pub use domain::{
    Book, BookDetail, NewBook, NewReview, Review, ReviewAuthor, ReviewWithAuthor, User,
    UserCredentials, AuthSession, RECENT_LIMIT,
};
pub use ports::{AuthStore, CatalogStore, PortError, PortResult, RelationshipStore, ReviewStore};
pub use query::{BookQuery, ListParams, Listing, SortField, SortOrder};

#[cfg(test)]
mod tests {
    //! The end-to-end chain: register a book, find it through the filtered
    //! listing, review it, and favorite it, with each repeated mutation
    //! reporting a conflict.

    use crate::domain::NewBook;
    use crate::query::{ListParams, Listing};
    use crate::test_support::MemoryStore;
    use crate::{catalog, ports::PortError, query, relationships};

    fn filter_params(genre: &str, rating: &str, sort_by: &str, sort_order: &str) -> ListParams {
        ListParams {
            genre: Some(genre.to_string()),
            rating: Some(rating.to_string()),
            sort_by: Some(sort_by.to_string()),
            sort_order: Some(sort_order.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn register_list_review_favorite_flow() {
        let store = MemoryStore::new();
        let user_id = store.add_user("Jane", "Doe", "jane@example.com");

        let book = catalog::register_book(
            &store,
            NewBook {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                genre: Some("scifi".to_string()),
                content_url: "https://books.example/dune.epub".to_string(),
                cover_image_url: "https://books.example/dune.jpg".to_string(),
                publication_date: None,
                rating: Some(4.7),
            },
        )
        .await
        .unwrap();

        let listing = query::list_books(
            &store,
            &store,
            user_id,
            filter_params("scifi", "4", "title", "asc"),
        )
        .await
        .unwrap();
        match listing {
            Listing::Matches(books) => {
                assert_eq!(books.len(), 1);
                assert_eq!(books[0].id, book.id);
            }
            other => panic!("expected matches, got {:?}", other),
        }

        let review =
            relationships::add_review(&store, &store, &store, user_id, book.id, "Great", 5.0)
                .await
                .unwrap();
        assert_eq!(review.rating, 5.0);

        let err =
            relationships::add_review(&store, &store, &store, user_id, book.id, "Great", 5.0)
                .await
                .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        let favorites = relationships::set_favorite(&store, &store, user_id, book.id, true)
            .await
            .unwrap();
        assert_eq!(favorites, vec![book.id]);

        let err = relationships::set_favorite(&store, &store, user_id, book.id, true)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
    }

    #[tokio::test]
    async fn search_matches_substrings_case_insensitively() {
        let store = MemoryStore::new();
        let user_id = store.add_user("Jane", "Doe", "jane@example.com");
        store.add_book("The Lord of the Rings", "J.R.R. Tolkien", "fantasy", 4.9);
        store.add_book("lord", "Anon", "other", 2.0);
        store.add_book("Lordship", "Anon", "other", 2.5);
        store.add_book("Dune", "Frank Herbert", "scifi", 4.7);

        let params = ListParams {
            search_keyword: Some("lord".to_string()),
            ..Default::default()
        };
        let listing = query::list_books(&store, &store, user_id, params)
            .await
            .unwrap();
        match listing {
            Listing::Matches(books) => assert_eq!(books.len(), 3),
            other => panic!("expected matches, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn rating_bucket_is_half_open() {
        let store = MemoryStore::new();
        let user_id = store.add_user("Jane", "Doe", "jane@example.com");
        store.add_book("In bucket low", "A", "scifi", 4.0);
        store.add_book("In bucket high", "B", "scifi", 4.999);
        store.add_book("At upper bound", "C", "scifi", 5.0);
        store.add_book("Below bucket", "D", "scifi", 3.9);
        store.add_book("Wrong genre", "E", "fantasy", 4.5);

        let listing = query::list_books(
            &store,
            &store,
            user_id,
            filter_params("scifi", "4", "rating", "asc"),
        )
        .await
        .unwrap();
        match listing {
            Listing::Matches(books) => {
                let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
                assert_eq!(titles, vec!["In bucket low", "In bucket high"]);
            }
            other => panic!("expected matches, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn default_listing_returns_top_five_and_recents() {
        let store = MemoryStore::new();
        let user_id = store.add_user("Jane", "Doe", "jane@example.com");
        for i in 0..7 {
            store.add_book(&format!("Book {}", i), "Author", "other", i as f64 / 2.0);
        }
        let viewed = store.add_book("Viewed", "Author", "other", 1.0);
        relationships::add_recent(&store, &store, user_id, viewed)
            .await
            .unwrap();

        let listing = query::list_books(&store, &store, user_id, ListParams::default())
            .await
            .unwrap();
        match listing {
            Listing::TopAndRecent {
                top_books,
                recently_viewed,
            } => {
                assert_eq!(top_books.len(), 5);
                // Descending by rating: the best book leads.
                assert_eq!(top_books[0].title, "Book 6");
                assert_eq!(recently_viewed.len(), 1);
                assert_eq!(recently_viewed[0].id, viewed);
            }
            other => panic!("expected top-and-recent, got {:?}", other),
        }
    }
}
