//! Read-only access to the vehicle catalog.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::vehicle::{CatalogItem, CatalogQuery};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog store unavailable: {0}")]
    Unavailable(String),
    #[error("catalog record could not be decoded: {0}")]
    Decode(String),
}

/// Query surface of the catalog. Implementations must be side-effect free.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find(&self, query: &CatalogQuery) -> Result<Vec<CatalogItem>, CatalogError>;

    async fn find_one(&self, query: &CatalogQuery) -> Result<Option<CatalogItem>, CatalogError>;

    async fn distinct_models(&self) -> Result<Vec<String>, CatalogError>;
}
