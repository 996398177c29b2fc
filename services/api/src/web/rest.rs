//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::error::ApiRejection;
use crate::web::state::AppState;
use bookshelf_core::domain::{Book, NewBook, Review, ReviewWithAuthor};
use bookshelf_core::query::{ListParams, Listing};
use bookshelf_core::{catalog, detail, query, relationships};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_books_handler,
        get_book_details_handler,
        register_book_handler,
        add_review_handler,
        list_favorites_handler,
        add_favorite_handler,
        remove_favorite_handler,
        add_recently_viewed_handler,
        profile_handler,
    ),
    components(
        schemas(
            BookResponse,
            ListBooksResponse,
            BookDetailResponse,
            ReviewResponse,
            ReviewWithAuthorResponse,
            ReviewAuthorResponse,
            RegisterBookRequest,
            AddReviewRequest,
            BookRefRequest,
            FavoritesResponse,
            RecentlyViewedResponse,
            ProfileResponse,
            UserInfoResponse,
        )
    ),
    tags(
        (name = "Bookshelf API", description = "Catalog browsing, book details, reviews and per-user favorites/recents.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    id: Uuid,
    title: String,
    author: String,
    genre: String,
    content_url: String,
    cover_image_url: String,
    publication_date: chrono::DateTime<chrono::Utc>,
    rating: f64,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            genre: book.genre,
            content_url: book.content_url,
            cover_image_url: book.cover_image_url,
            publication_date: book.publication_date,
            rating: book.rating,
        }
    }
}

/// The listing response: plain matches for search/filter requests, the
/// top-rated books plus the caller's recently-viewed books otherwise.
#[derive(Serialize, ToSchema)]
#[serde(untagged)]
pub enum ListBooksResponse {
    Matches(Vec<BookResponse>),
    #[serde(rename_all = "camelCase")]
    TopAndRecent {
        top_books: Vec<BookResponse>,
        recently_viewed_books: Vec<BookResponse>,
    },
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    id: Uuid,
    content: String,
    rating: f64,
    book_id: Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            content: review.content,
            rating: review.rating,
            book_id: review.book_id,
            created_at: review.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAuthorResponse {
    first_name: String,
    last_name: String,
    email: String,
}

/// A review with its author attached; the book reference is omitted since
/// the caller addressed the book to get here.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithAuthorResponse {
    id: Uuid,
    content: String,
    rating: f64,
    author: ReviewAuthorResponse,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ReviewWithAuthor> for ReviewWithAuthorResponse {
    fn from(review: ReviewWithAuthor) -> Self {
        Self {
            id: review.id,
            content: review.content,
            rating: review.rating,
            author: ReviewAuthorResponse {
                first_name: review.author.first_name,
                last_name: review.author.last_name,
                email: review.author.email,
            },
            created_at: review.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookDetailResponse {
    reviews: Vec<ReviewWithAuthorResponse>,
    my_review: Option<ReviewResponse>,
    is_favorite: bool,
    is_recently_viewed: bool,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBookRequest {
    title: String,
    author: String,
    genre: Option<String>,
    content_url: String,
    cover_image_url: String,
    publication_date: Option<chrono::DateTime<chrono::Utc>>,
    rating: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddReviewRequest {
    book_id: String,
    review_content: String,
    review_rating: f64,
}

/// A request body that targets a book by id. The id is a raw string so a
/// malformed value reports not-found instead of a deserialization error.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookRefRequest {
    book_id: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesResponse {
    favorite_books: Vec<Uuid>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentlyViewedResponse {
    recently_viewed_books: Vec<Uuid>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoResponse {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    user_info: UserInfoResponse,
    user_reviews: Vec<ReviewResponse>,
}

/// The raw listing query parameters, named as the client sends them.
#[derive(Deserialize)]
pub struct ListBooksQuery {
    searchkeyword: Option<String>,
    genre: Option<String>,
    rating: Option<String>,
    sortby: Option<String>,
    sortorder: Option<String>,
}

//=========================================================================================
// Catalog Handlers
//=========================================================================================

/// List, search or filter books.
///
/// With no parameters: the five top-rated books plus the caller's
/// recently-viewed books. With `searchkeyword`: a case-insensitive substring
/// search over title and author. With `genre`+`rating`+`sortby`+`sortorder`:
/// books of that genre whose rating falls in the bucket `[rating, rating+1)`.
/// Exactly one mode applies; ambiguous combinations are rejected.
#[utoipa::path(
    get,
    path = "/books",
    params(
        ("searchkeyword" = Option<String>, Query, description = "Substring to match against title or author"),
        ("genre" = Option<String>, Query, description = "Genre to filter by"),
        ("rating" = Option<String>, Query, description = "Integer rating bucket between 1 and 5"),
        ("sortby" = Option<String>, Query, description = "One of title, author, genre, publicationDate, rating"),
        ("sortorder" = Option<String>, Query, description = "asc or desc"),
    ),
    responses(
        (status = 200, description = "Matching books", body = ListBooksResponse),
        (status = 422, description = "Invalid or ambiguous query parameters"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_books_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(params): Query<ListBooksQuery>,
) -> Result<impl IntoResponse, ApiRejection> {
    let params = ListParams {
        search_keyword: params.searchkeyword,
        genre: params.genre,
        rating: params.rating,
        sort_by: params.sortby,
        sort_order: params.sortorder,
    };
    let listing = query::list_books(
        app_state.catalog.as_ref(),
        app_state.relationships.as_ref(),
        user_id,
        params,
    )
    .await?;

    let response = match listing {
        Listing::Matches(books) => {
            ListBooksResponse::Matches(books.into_iter().map(Into::into).collect())
        }
        Listing::TopAndRecent {
            top_books,
            recently_viewed,
        } => ListBooksResponse::TopAndRecent {
            top_books: top_books.into_iter().map(Into::into).collect(),
            recently_viewed_books: recently_viewed.into_iter().map(Into::into).collect(),
        },
    };
    Ok(Json(response))
}

/// Get the composed detail view for one book.
#[utoipa::path(
    get,
    path = "/books/{book_id}/details",
    params(
        ("book_id" = String, Path, description = "The book's id"),
    ),
    responses(
        (status = 200, description = "The composed detail view", body = BookDetailResponse),
        (status = 404, description = "Book not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_book_details_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, ApiRejection> {
    let book_id = catalog::parse_book_id(&book_id)?;
    let detail = detail::book_detail(
        app_state.catalog.as_ref(),
        app_state.reviews.as_ref(),
        app_state.relationships.as_ref(),
        book_id,
        user_id,
    )
    .await?;

    Ok(Json(BookDetailResponse {
        reviews: detail.reviews.into_iter().map(Into::into).collect(),
        my_review: detail.my_review.map(Into::into),
        is_favorite: detail.is_favorite,
        is_recently_viewed: detail.is_recently_viewed,
    }))
}

/// Register a new book in the catalog.
#[utoipa::path(
    post,
    path = "/books",
    request_body = RegisterBookRequest,
    responses(
        (status = 201, description = "Book registered", body = BookResponse),
        (status = 422, description = "Missing or invalid fields"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_book_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<RegisterBookRequest>,
) -> Result<impl IntoResponse, ApiRejection> {
    let book = catalog::register_book(
        app_state.catalog.as_ref(),
        NewBook {
            title: req.title,
            author: req.author,
            genre: req.genre,
            content_url: req.content_url,
            cover_image_url: req.cover_image_url,
            publication_date: req.publication_date,
            rating: req.rating,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

//=========================================================================================
// Review Handlers
//=========================================================================================

/// Add a review for a book. Each user may review a book at most once.
#[utoipa::path(
    post,
    path = "/reviews",
    request_body = AddReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewWithAuthorResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "This user already has a review for this book"),
        (status = 422, description = "Empty content or rating outside 1..5"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn add_review_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<AddReviewRequest>,
) -> Result<impl IntoResponse, ApiRejection> {
    let book_id = catalog::parse_book_id(&req.book_id)?;
    let review = relationships::add_review(
        app_state.catalog.as_ref(),
        app_state.reviews.as_ref(),
        app_state.relationships.as_ref(),
        user_id,
        book_id,
        &req.review_content,
        req.review_rating,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(ReviewWithAuthorResponse::from(review)),
    ))
}

//=========================================================================================
// Favorites and Recently-Viewed Handlers
//=========================================================================================

/// List the caller's favorite books, populated from the catalog.
#[utoipa::path(
    get,
    path = "/favorites",
    responses(
        (status = 200, description = "The caller's favorite books", body = [BookResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_favorites_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, ApiRejection> {
    let favorite_ids = app_state.relationships.favorites(user_id).await?;
    let books = app_state.catalog.books_by_ids(&favorite_ids).await?;
    Ok(Json(
        books.into_iter().map(BookResponse::from).collect::<Vec<_>>(),
    ))
}

/// Add a book to the caller's favorites.
#[utoipa::path(
    post,
    path = "/favorites",
    request_body = BookRefRequest,
    responses(
        (status = 200, description = "The updated favorites set", body = FavoritesResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book already in user's favorites"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn add_favorite_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<BookRefRequest>,
) -> Result<impl IntoResponse, ApiRejection> {
    mutate_favorites(app_state, user_id, &req.book_id, true).await
}

/// Remove a book from the caller's favorites.
#[utoipa::path(
    delete,
    path = "/favorites",
    request_body = BookRefRequest,
    responses(
        (status = 200, description = "The updated favorites set", body = FavoritesResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book is not in user's favorites"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn remove_favorite_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<BookRefRequest>,
) -> Result<impl IntoResponse, ApiRejection> {
    mutate_favorites(app_state, user_id, &req.book_id, false).await
}

async fn mutate_favorites(
    app_state: Arc<AppState>,
    user_id: Uuid,
    raw_book_id: &str,
    add: bool,
) -> Result<impl IntoResponse, ApiRejection> {
    let book_id = catalog::parse_book_id(raw_book_id)?;
    let favorite_books = relationships::set_favorite(
        app_state.catalog.as_ref(),
        app_state.relationships.as_ref(),
        user_id,
        book_id,
        add,
    )
    .await?;
    Ok(Json(FavoritesResponse { favorite_books }))
}

/// Record a book view in the caller's recently-viewed history.
#[utoipa::path(
    post,
    path = "/recently-viewed",
    request_body = BookRefRequest,
    responses(
        (status = 200, description = "The updated history, most recent first", body = RecentlyViewedResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book already in user's recents"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn add_recently_viewed_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<BookRefRequest>,
) -> Result<impl IntoResponse, ApiRejection> {
    let book_id = catalog::parse_book_id(&req.book_id)?;
    let recently_viewed_books = relationships::add_recent(
        app_state.catalog.as_ref(),
        app_state.relationships.as_ref(),
        user_id,
        book_id,
    )
    .await?;
    Ok(Json(RecentlyViewedResponse {
        recently_viewed_books,
    }))
}

//=========================================================================================
// Profile Handler
//=========================================================================================

/// The caller's public profile fields plus their reviews, newest first.
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Profile info and authored reviews", body = ProfileResponse),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn profile_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, ApiRejection> {
    let user = app_state
        .relationships
        .get_user(user_id)
        .await?
        .ok_or_else(|| {
            bookshelf_core::ports::PortError::NotFound(format!("User {} not found", user_id))
        })?;
    let user_reviews = app_state.reviews.reviews_by_user(user_id).await?;

    Ok(Json(ProfileResponse {
        user_info: UserInfoResponse {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            created_at: user.created_at,
        },
        user_reviews: user_reviews.into_iter().map(Into::into).collect(),
    }))
}
