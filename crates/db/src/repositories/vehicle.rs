use showroom_core::catalog::{CatalogError, CatalogStore};
use showroom_core::domain::vehicle::{CatalogItem, CatalogQuery};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};

use super::RepositoryError;
use crate::DbPool;

const SELECT_VEHICLES: &str = r#"
    SELECT model, variant, seating_capacity, fuel_type, body_type, drivetrain,
        ex_showroom_price, ex_showroom_price_display, certified_mileage, mileage_value
    FROM vehicle
    WHERE 1=1"#;

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(1) FROM vehicle").fetch_one(&self.pool).await?)
    }

    async fn fetch(
        &self,
        query: &CatalogQuery,
        limit: Option<usize>,
    ) -> Result<Vec<CatalogItem>, RepositoryError> {
        let mut builder = matching_vehicles(query, limit);
        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(vehicle_from_row).collect()
    }
}

#[async_trait::async_trait]
impl CatalogStore for SqlCatalogRepository {
    async fn find(&self, query: &CatalogQuery) -> Result<Vec<CatalogItem>, CatalogError> {
        Ok(self.fetch(query, query.limit).await?)
    }

    async fn find_one(&self, query: &CatalogQuery) -> Result<Option<CatalogItem>, CatalogError> {
        Ok(self.fetch(query, Some(1)).await?.into_iter().next())
    }

    async fn distinct_models(&self) -> Result<Vec<String>, CatalogError> {
        let models: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT model FROM vehicle ORDER BY model")
                .fetch_all(&self.pool)
                .await
                .map_err(RepositoryError::from)?;
        Ok(models)
    }
}

fn matching_vehicles(query: &CatalogQuery, limit: Option<usize>) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new(SELECT_VEHICLES);

    if let Some(min_seats) = query.min_seats {
        builder.push(" AND seating_capacity >= ").push_bind(i64::from(min_seats));
    }

    let text_predicates = [
        ("fuel_type", &query.fuel_type),
        ("body_type", &query.body_type),
        ("drivetrain", &query.drivetrain),
        ("model", &query.model),
        ("variant", &query.variant),
    ];
    for (column, needle) in text_predicates {
        if let Some(needle) = needle {
            builder
                .push(format!(" AND LOWER({column}) LIKE "))
                .push_bind(like_pattern(needle))
                .push(" ESCAPE '\\'");
        }
    }

    if let Some(price_min) = query.price_min {
        builder.push(" AND ex_showroom_price >= ").push_bind(price_min);
    }
    if let Some(price_max) = query.price_max {
        builder.push(" AND ex_showroom_price <= ").push_bind(price_max);
    }
    if let Some(mileage_min) = query.mileage_min {
        builder.push(" AND mileage_value >= ").push_bind(mileage_min);
    }
    if let Some(mileage_max) = query.mileage_max {
        builder.push(" AND mileage_value <= ").push_bind(mileage_max);
    }

    builder.push(" ORDER BY ex_showroom_price IS NULL, ex_showroom_price, model, variant");
    if let Some(limit) = limit {
        builder.push(" LIMIT ").push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }

    builder
}

/// Lowercased `%needle%` with LIKE wildcards escaped.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.trim().to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn vehicle_from_row(row: &SqliteRow) -> Result<CatalogItem, RepositoryError> {
    let seats: Option<i64> = row.try_get("seating_capacity")?;
    let seats = seats
        .map(u32::try_from)
        .transpose()
        .map_err(|_| RepositoryError::Decode("invalid seating_capacity".to_string()))?;

    Ok(CatalogItem {
        model: row.try_get("model")?,
        variant: row.try_get("variant")?,
        seats,
        fuel_type: row.try_get("fuel_type")?,
        body_type: row.try_get("body_type")?,
        drivetrain: row.try_get("drivetrain")?,
        price: row.try_get("ex_showroom_price")?,
        price_display: row.try_get("ex_showroom_price_display")?,
        mileage: row.try_get("certified_mileage")?,
        mileage_value: row.try_get("mileage_value")?,
    })
}
