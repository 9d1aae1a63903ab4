use crate::catalog::Catalog;
use crate::models::{PageRequest, TrackId};
use thiserror::Error;

/// Expectations supplied by a catalog implementation to run the shared contract suite.
#[derive(Debug, Clone)]
pub struct CatalogContractExpectations {
    /// The catalog id every returned track should carry.
    pub catalog_id: String,
    /// Query text to send to the catalog. It must match more than `page_size` tracks.
    pub query: String,
    /// The first track id expected for the query (deterministic ordering).
    pub expected_first_track_id: TrackId,
    /// Page size used for the two pages fetched by the suite.
    pub page_size: u32,
}

/// Errors surfaced by the catalog contract test harness.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogContractError {
    #[error("popular tracks list was empty")]
    EmptyPopular,
    #[error("search returned no tracks for query: {query}")]
    EmptySearch { query: String },
    #[error("search returned wrong first track id: expected {expected:?}, got {actual:?}")]
    SearchWrongFirstTrack { expected: TrackId, actual: TrackId },
    #[error("track carries a different catalog id: {actual}")]
    CatalogMismatch { actual: String },
    #[error("first page declared a previous page")]
    FirstPageHasPrevious,
    #[error("first page declared no next page although the query spans two pages")]
    FirstPageMissingNext,
    #[error("second page declared no previous page")]
    SecondPageMissingPrevious,
    #[error("second page repeated track {track_id:?} from the first page")]
    PageOverlap { track_id: TrackId },
    #[error("catalog error while running contract: {0}")]
    CatalogFailure(String),
}

/// Run the shared catalog contract suite against a catalog implementation.
///
/// Catalogs should call this from their crate-level tests with fixtures that
/// exist in their test setup.
pub async fn run_catalog_contract<C: Catalog>(
    catalog: &C,
    expectations: &CatalogContractExpectations,
) -> Result<(), CatalogContractError> {
    verify_popular(catalog, expectations).await?;
    verify_search_paging(catalog, expectations).await?;
    Ok(())
}

async fn verify_popular<C: Catalog>(
    catalog: &C,
    expectations: &CatalogContractExpectations,
) -> Result<(), CatalogContractError> {
    let popular = catalog
        .popular_tracks()
        .await
        .map_err(|e| CatalogContractError::CatalogFailure(e.to_string()))?;
    if popular.is_empty() {
        return Err(CatalogContractError::EmptyPopular);
    }
    if let Some(foreign) = popular
        .iter()
        .find(|track| track.catalog_id != expectations.catalog_id)
    {
        return Err(CatalogContractError::CatalogMismatch {
            actual: foreign.catalog_id.clone(),
        });
    }
    Ok(())
}

async fn verify_search_paging<C: Catalog>(
    catalog: &C,
    expectations: &CatalogContractExpectations,
) -> Result<(), CatalogContractError> {
    let first = catalog
        .search_tracks(
            &expectations.query,
            PageRequest::first_page(expectations.page_size),
        )
        .await
        .map_err(|e| CatalogContractError::CatalogFailure(e.to_string()))?;

    let head = first
        .items
        .first()
        .ok_or_else(|| CatalogContractError::EmptySearch {
            query: expectations.query.clone(),
        })?;
    if head.id != expectations.expected_first_track_id {
        return Err(CatalogContractError::SearchWrongFirstTrack {
            expected: expectations.expected_first_track_id.clone(),
            actual: head.id.clone(),
        });
    }
    if head.catalog_id != expectations.catalog_id {
        return Err(CatalogContractError::CatalogMismatch {
            actual: head.catalog_id.clone(),
        });
    }
    if first.has_prev() {
        return Err(CatalogContractError::FirstPageHasPrevious);
    }
    if !first.has_next() {
        return Err(CatalogContractError::FirstPageMissingNext);
    }

    let second = catalog
        .search_tracks(
            &expectations.query,
            PageRequest::new(expectations.page_size, expectations.page_size),
        )
        .await
        .map_err(|e| CatalogContractError::CatalogFailure(e.to_string()))?;
    if !second.has_prev() {
        return Err(CatalogContractError::SecondPageMissingPrevious);
    }
    if let Some(repeated) = second
        .items
        .iter()
        .find(|track| first.items.iter().any(|seen| seen.id == track.id))
    {
        return Err(CatalogContractError::PageOverlap {
            track_id: repeated.id.clone(),
        });
    }

    Ok(())
}
