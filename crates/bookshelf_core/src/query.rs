//! crates/bookshelf_core/src/query.rs
//!
//! The query builder: turns the raw, heterogeneous query parameters of a
//! browse/search/filter request into exactly one validated catalog query.
//!
//! Mode selection is strictly mutually exclusive, in priority order
//! filter-set > search keyword > default listing. A request whose parameters
//! do not cleanly match one mode is rejected instead of silently running
//! more than one branch.

use uuid::Uuid;

use crate::domain::{Book, RECENT_LIMIT};
use crate::ports::{CatalogStore, PortError, PortResult, RelationshipStore};

/// Number of books returned by the default top-rated listing.
pub const TOP_BOOKS_LIMIT: u32 = 5;

//=========================================================================================
// Raw Parameters and Validated Query Types
//=========================================================================================

/// The raw query-string parameters of a listing request, exactly as the
/// transport layer received them. Everything is optional; validation and
/// mode dispatch happen in [`build_query`].
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub search_keyword: Option<String>,
    pub genre: Option<String>,
    pub rating: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ListParams {
    fn has_filter_params(&self) -> bool {
        self.genre.is_some()
            || self.rating.is_some()
            || self.sort_by.is_some()
            || self.sort_order.is_some()
    }
}

/// The allow-list of fields a caller may sort filtered results by.
/// Anything else is rejected rather than passed through to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Author,
    Genre,
    PublicationDate,
    Rating,
}

impl SortField {
    fn parse(raw: &str) -> PortResult<Self> {
        match raw {
            "title" => Ok(Self::Title),
            "author" => Ok(Self::Author),
            "genre" => Ok(Self::Genre),
            "publicationDate" => Ok(Self::PublicationDate),
            "rating" => Ok(Self::Rating),
            other => Err(PortError::Validation(format!(
                "'{}' is not a sortable field",
                other
            ))),
        }
    }

    /// The storage column this field sorts by.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Genre => "genre",
            Self::PublicationDate => "publication_date",
            Self::Rating => "rating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn parse(raw: &str) -> PortResult<Self> {
        match raw {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(PortError::Validation(format!(
                "'{}' is not a valid sort order",
                other
            ))),
        }
    }
}

/// A validated catalog query, ready for the storage layer. Exactly one is
/// produced per listing request.
#[derive(Debug, Clone, PartialEq)]
pub enum BookQuery {
    /// The default listing: the highest-rated books, descending.
    TopRated { limit: u32 },
    /// Case-insensitive, unanchored substring match over title OR author.
    Search { keyword: String },
    /// Genre equality plus the half-open rating bucket `[min, max)`,
    /// ordered by the requested field.
    Filtered {
        genre: String,
        min_rating: f64,
        max_rating: f64,
        sort_by: SortField,
        sort_order: SortOrder,
    },
}

/// The result of a listing request. The default mode additionally carries
/// the caller's recently-viewed books; the other modes return plain matches.
#[derive(Debug, Clone)]
pub enum Listing {
    Matches(Vec<Book>),
    TopAndRecent {
        top_books: Vec<Book>,
        recently_viewed: Vec<Book>,
    },
}

//=========================================================================================
// Mode Dispatch and Validation
//=========================================================================================

/// Parses a rating-bucket value into its half-open interval `[r, r + 1)`.
/// Rejected before any storage call: a non-numeric value and an
/// out-of-range value produce distinct errors, never a silent clamp.
fn parse_rating_bucket(raw: &str) -> PortResult<(f64, f64)> {
    let bucket: f64 = raw
        .trim()
        .parse()
        .map_err(|_| PortError::Validation(format!("Invalid rating value '{}'", raw)))?;
    if !(1.0..=5.0).contains(&bucket) {
        return Err(PortError::Validation(format!(
            "Rating {} is out of range, expected a value between 1 and 5",
            bucket
        )));
    }
    Ok((bucket, bucket + 1.0))
}

/// Selects exactly one query mode for the given parameters.
///
/// Any filter parameter commits the request to the filtered mode, at which
/// point all four of genre/rating/sortBy/sortOrder must be present and the
/// search keyword absent. With no filter parameters, a present keyword
/// selects search; otherwise the default top-rated listing.
pub fn build_query(params: &ListParams) -> PortResult<BookQuery> {
    if params.has_filter_params() {
        if params.search_keyword.is_some() {
            return Err(PortError::Validation(
                "A search keyword cannot be combined with genre filtering".to_string(),
            ));
        }
        let (genre, rating, sort_by, sort_order) = match (
            &params.genre,
            &params.rating,
            &params.sort_by,
            &params.sort_order,
        ) {
            (Some(g), Some(r), Some(sb), Some(so)) => (g, r, sb, so),
            _ => {
                return Err(PortError::Validation(
                    "Filtering requires genre, rating, sortBy and sortOrder together"
                        .to_string(),
                ))
            }
        };
        let (min_rating, max_rating) = parse_rating_bucket(rating)?;
        return Ok(BookQuery::Filtered {
            genre: genre.clone(),
            min_rating,
            max_rating,
            sort_by: SortField::parse(sort_by)?,
            sort_order: SortOrder::parse(sort_order)?,
        });
    }

    if let Some(keyword) = &params.search_keyword {
        return Ok(BookQuery::Search {
            keyword: keyword.clone(),
        });
    }

    Ok(BookQuery::TopRated {
        limit: TOP_BOOKS_LIMIT,
    })
}

//=========================================================================================
// Listing Entry Point
//=========================================================================================

/// Runs a listing request end to end: dispatches the parameters to one
/// query mode, executes it, and for the default mode also resolves the
/// caller's recently-viewed books (bounded, most-recent-first).
pub async fn list_books(
    catalog: &dyn CatalogStore,
    relationships: &dyn RelationshipStore,
    user_id: Uuid,
    params: ListParams,
) -> PortResult<Listing> {
    let query = build_query(&params)?;

    match query {
        BookQuery::TopRated { .. } => {
            // The two reads are independent; run them concurrently.
            let (top_books, recent_ids) = futures::try_join!(
                catalog.find_books(query.clone()),
                relationships.recents(user_id),
            )?;
            let bounded = &recent_ids[..recent_ids.len().min(RECENT_LIMIT)];
            let recently_viewed = catalog.books_by_ids(bounded).await?;
            Ok(Listing::TopAndRecent {
                top_books,
                recently_viewed,
            })
        }
        query => Ok(Listing::Matches(catalog.find_books(query).await?)),
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_params(genre: &str, rating: &str, sort_by: &str, sort_order: &str) -> ListParams {
        ListParams {
            genre: Some(genre.to_string()),
            rating: Some(rating.to_string()),
            sort_by: Some(sort_by.to_string()),
            sort_order: Some(sort_order.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn no_parameters_selects_top_rated() {
        let query = build_query(&ListParams::default()).unwrap();
        assert_eq!(query, BookQuery::TopRated { limit: 5 });
    }

    #[test]
    fn keyword_selects_search() {
        let params = ListParams {
            search_keyword: Some("lord".to_string()),
            ..Default::default()
        };
        assert_eq!(
            build_query(&params).unwrap(),
            BookQuery::Search {
                keyword: "lord".to_string()
            }
        );
    }

    #[test]
    fn complete_filter_set_builds_half_open_bucket() {
        let query = build_query(&filter_params("scifi", "4", "title", "asc")).unwrap();
        match query {
            BookQuery::Filtered {
                genre,
                min_rating,
                max_rating,
                sort_by,
                sort_order,
            } => {
                assert_eq!(genre, "scifi");
                assert_eq!(min_rating, 4.0);
                assert_eq!(max_rating, 5.0);
                assert_eq!(sort_by, SortField::Title);
                assert_eq!(sort_order, SortOrder::Ascending);
            }
            other => panic!("expected filtered query, got {:?}", other),
        }
    }

    #[test]
    fn non_numeric_rating_is_a_validation_error() {
        let err = build_query(&filter_params("scifi", "high", "title", "asc")).unwrap_err();
        match err {
            PortError::Validation(msg) => assert!(msg.contains("Invalid rating value")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn out_of_range_rating_is_a_distinct_validation_error() {
        for raw in ["0.5", "6", "-1"] {
            let err = build_query(&filter_params("scifi", raw, "title", "asc")).unwrap_err();
            match err {
                PortError::Validation(msg) => assert!(msg.contains("out of range")),
                other => panic!("expected validation error, got {:?}", other),
            }
        }
    }

    #[test]
    fn partial_filter_set_is_rejected() {
        let params = ListParams {
            genre: Some("scifi".to_string()),
            sort_by: Some("title".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            build_query(&params),
            Err(PortError::Validation(_))
        ));
    }

    #[test]
    fn keyword_combined_with_filters_is_rejected() {
        let mut params = filter_params("scifi", "4", "title", "asc");
        params.search_keyword = Some("dune".to_string());
        assert!(matches!(
            build_query(&params),
            Err(PortError::Validation(_))
        ));
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let err = build_query(&filter_params("scifi", "4", "isbn", "asc")).unwrap_err();
        assert!(matches!(err, PortError::Validation(_)));
    }

    #[test]
    fn unknown_sort_order_is_rejected() {
        let err = build_query(&filter_params("scifi", "4", "title", "sideways")).unwrap_err();
        assert!(matches!(err, PortError::Validation(_)));
    }
}
