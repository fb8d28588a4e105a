use tokio::sync::RwLock;

use showroom_core::catalog::{CatalogError, CatalogStore};
use showroom_core::domain::vehicle::{CatalogItem, CatalogQuery};

/// Catalog held in process memory. Results keep insertion order.
#[derive(Default)]
pub struct InMemoryCatalogRepository {
    items: RwLock<Vec<CatalogItem>>,
}

impl InMemoryCatalogRepository {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items: RwLock::new(items) }
    }

    pub async fn insert(&self, item: CatalogItem) {
        self.items.write().await.push(item);
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalogRepository {
    async fn find(&self, query: &CatalogQuery) -> Result<Vec<CatalogItem>, CatalogError> {
        let items = self.items.read().await;
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(items.iter().filter(|item| query.matches(item)).take(limit).cloned().collect())
    }

    async fn find_one(&self, query: &CatalogQuery) -> Result<Option<CatalogItem>, CatalogError> {
        let items = self.items.read().await;
        Ok(items.iter().find(|item| query.matches(item)).cloned())
    }

    async fn distinct_models(&self) -> Result<Vec<String>, CatalogError> {
        let items = self.items.read().await;
        let mut models = items.iter().map(|item| item.model.clone()).collect::<Vec<_>>();
        models.sort();
        models.dedup();
        Ok(models)
    }
}
