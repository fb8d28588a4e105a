use showroom_core::domain::profile::{AttributeProfile, CarType, DriveType, FuelType};
use showroom_core::{CatalogItem, CatalogQuery, CatalogStore};
use showroom_db::{
    connect_with_settings, migrations, CatalogSeedDataset, InMemoryCatalogRepository,
    SqlCatalogRepository,
};

type ParityTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

async fn seeded_stores() -> ParityTestResult<(SqlCatalogRepository, InMemoryCatalogRepository)> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    CatalogSeedDataset::load(&pool).await.map_err(|error| format!("seed: {error}"))?;

    let sql = SqlCatalogRepository::new(pool);
    let everything =
        sql.find(&CatalogQuery::default()).await.map_err(|error| format!("find all: {error}"))?;
    Ok((sql, InMemoryCatalogRepository::new(everything)))
}

fn identities(items: &[CatalogItem]) -> Vec<(String, Option<String>)> {
    let mut keys =
        items.iter().map(|item| (item.model.clone(), item.variant.clone())).collect::<Vec<_>>();
    keys.sort();
    keys
}

fn profile_queries() -> Vec<(&'static str, CatalogQuery)> {
    let family_diesel_suv = AttributeProfile {
        family_size: Some(5),
        fuel_type: Some(FuelType::Diesel),
        car_type: Some(CarType::Suv),
        budget_max: Some(800_000),
        ..AttributeProfile::default()
    };
    let large_family = AttributeProfile {
        family_size: Some(7),
        budget_min: Some(900_000),
        budget_max: Some(1_500_000),
        ..AttributeProfile::default()
    };
    let cng_commuter = AttributeProfile {
        fuel_type: Some(FuelType::Cng),
        mileage_min: Some(25.0),
        ..AttributeProfile::default()
    };
    let four_by_four =
        AttributeProfile { drive_type: Some(DriveType::FourWheel), ..AttributeProfile::default() };

    vec![
        ("family-diesel-suv", CatalogQuery::from_profile(&family_diesel_suv, 10)),
        ("large-family", CatalogQuery::from_profile(&large_family, 10)),
        ("cng-commuter", CatalogQuery::from_profile(&cng_commuter, 10)),
        ("four-by-four", CatalogQuery::from_profile(&four_by_four, 10)),
        ("model-lookup", CatalogQuery::by_model("wagon r")),
    ]
}

#[tokio::test]
async fn sql_and_memory_stores_agree_on_profile_queries() -> ParityTestResult {
    let (sql, memory) = seeded_stores().await?;
    let seeded = memory.len().await;
    require!(seeded == 19, "expected 19 seeded rows, found {seeded}");

    for (label, query) in profile_queries() {
        let from_sql = sql.find(&query).await.map_err(|error| format!("{label}: {error}"))?;
        let from_memory = memory.find(&query).await.map_err(|error| format!("{label}: {error}"))?;

        require!(!from_sql.is_empty(), "{label}: expected at least one match");
        require!(
            identities(&from_sql) == identities(&from_memory),
            "{label}: stores disagree: {:?} vs {:?}",
            identities(&from_sql),
            identities(&from_memory)
        );
    }

    Ok(())
}

#[tokio::test]
async fn sql_store_orders_cheapest_first_with_unpriced_last() -> ParityTestResult {
    let (sql, _) = seeded_stores().await?;
    let all = sql.find(&CatalogQuery::default()).await.map_err(|error| error.to_string())?;

    let prices = all.iter().map(|item| item.price).collect::<Vec<_>>();
    let priced = prices.iter().take_while(|price| price.is_some()).collect::<Vec<_>>();
    require!(
        priced.windows(2).all(|pair| pair[0] <= pair[1]),
        "priced rows should be ascending: {prices:?}"
    );
    require!(
        prices.last().is_some_and(|price| price.is_none()),
        "unpriced rows should sort last: {prices:?}"
    );

    Ok(())
}

#[tokio::test]
async fn limits_apply_identically() -> ParityTestResult {
    let (sql, memory) = seeded_stores().await?;
    let query = CatalogQuery { fuel_type: Some("Petrol".to_string()), ..CatalogQuery::default() }
        .with_limit(3);

    let from_sql = sql.find(&query).await.map_err(|error| error.to_string())?;
    let from_memory = memory.find(&query).await.map_err(|error| error.to_string())?;
    require!(from_sql.len() == 3, "sql store returned {} rows", from_sql.len());
    require!(from_memory.len() == 3, "memory store returned {} rows", from_memory.len());

    Ok(())
}
