use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Rows the demo catalog must contain after loading.
const SEED_VEHICLES: &[SeedVehicleContract] = &[
    SeedVehicleContract {
        id: "alto-k10-vxi",
        model: "Alto K10",
        fuel_type: "Petrol",
        body_type: "Hatchback",
        seats: 4,
        price: Some(429_000),
    },
    SeedVehicleContract {
        id: "wagon-r-lxi-cng",
        model: "Wagon R",
        fuel_type: "CNG",
        body_type: "Hatchback",
        seats: 5,
        price: Some(645_000),
    },
    SeedVehicleContract {
        id: "swift-zxi",
        model: "Swift",
        fuel_type: "Petrol",
        body_type: "Hatchback",
        seats: 5,
        price: Some(779_000),
    },
    SeedVehicleContract {
        id: "dzire-vxi",
        model: "Dzire",
        fuel_type: "Petrol",
        body_type: "Sedan",
        seats: 5,
        price: Some(734_000),
    },
    SeedVehicleContract {
        id: "brezza-vdi",
        model: "Brezza",
        fuel_type: "Diesel",
        body_type: "SUV",
        seats: 5,
        price: Some(850_000),
    },
    SeedVehicleContract {
        id: "ertiga-vdi",
        model: "Ertiga",
        fuel_type: "Diesel",
        body_type: "MPV",
        seats: 7,
        price: Some(1_015_000),
    },
    SeedVehicleContract {
        id: "e-vitara-delta",
        model: "e Vitara",
        fuel_type: "Electric",
        body_type: "SUV",
        seats: 5,
        price: Some(1_799_000),
    },
    SeedVehicleContract {
        id: "invicto-alpha-plus",
        model: "Invicto",
        fuel_type: "Petrol",
        body_type: "MPV",
        seats: 7,
        price: None,
    },
];

const SEED_VEHICLE_IDS: &[&str] = &[
    "alto-k10-vxi",
    "alto-k10-vxi-cng",
    "wagon-r-zxi",
    "wagon-r-lxi-cng",
    "swift-zxi",
    "dzire-vxi",
    "dzire-vxi-cng",
    "ciaz-zeta",
    "brezza-vdi",
    "brezza-zxi",
    "grand-vitara-alpha-allgrip",
    "jimny-zeta",
    "ertiga-vdi",
    "ertiga-vxi-cng",
    "xl6-zeta",
    "eeco-5-seater",
    "fronx-delta",
    "e-vitara-delta",
    "invicto-alpha-plus",
];

/// Demo Maruti Suzuki catalog used by `showroom seed` and integration tests.
pub struct CatalogSeedDataset;

impl CatalogSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/showroom_catalog.sql");

    /// Loads the catalog. Re-running replaces the seeded rows in place.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let vehicles_seeded: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM vehicle")
            .fetch_one(pool)
            .await?;
        let models: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT model FROM vehicle ORDER BY model")
                .fetch_all(pool)
                .await?;

        Ok(SeedResult { vehicles_seeded, models })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let quoted_ids = sql_array_from_ids(SEED_VEHICLE_IDS);
        let seeded: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(1) FROM vehicle WHERE id IN {quoted_ids}"))
                .fetch_one(pool)
                .await?;
        checks.push(("vehicle-count", seeded == SEED_VEHICLE_IDS.len() as i64));

        for vehicle in SEED_VEHICLES {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM vehicle
                    WHERE id = ?1 AND model = ?2 AND fuel_type = ?3 AND body_type = ?4
                      AND seating_capacity = ?5 AND ex_showroom_price IS ?6)",
            )
            .bind(vehicle.id)
            .bind(vehicle.model)
            .bind(vehicle.fuel_type)
            .bind(vehicle.body_type)
            .bind(vehicle.seats)
            .bind(vehicle.price)
            .fetch_one(pool)
            .await?;
            checks.push((vehicle.id, present == 1));
        }

        let family_diesel_suv: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM vehicle
             WHERE LOWER(fuel_type) = 'diesel' AND LOWER(body_type) = 'suv'
               AND seating_capacity >= 5 AND ex_showroom_price <= 880000",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("family-diesel-suv-under-flexed-8-lakh", family_diesel_suv > 0));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes every seeded row, leaving operator-added vehicles alone.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let quoted_ids = sql_array_from_ids(SEED_VEHICLE_IDS);
        sqlx::query(&format!("DELETE FROM vehicle WHERE id IN {quoted_ids}")).execute(pool).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedVehicleContract {
    id: &'static str,
    model: &'static str,
    fuel_type: &'static str,
    body_type: &'static str,
    seats: i64,
    price: Option<i64>,
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{}'", id)).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub vehicles_seeded: i64,
    pub models: Vec<String>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    #[test]
    fn sql_fixture_is_valid() {
        assert!(CatalogSeedDataset::SQL.contains("INSERT OR REPLACE INTO vehicle"));
        for id in SEED_VEHICLE_IDS {
            assert!(CatalogSeedDataset::SQL.contains(&format!("'{id}'")), "{id} missing from SQL");
        }
        for vehicle in SEED_VEHICLES {
            assert!(SEED_VEHICLE_IDS.contains(&vehicle.id));
        }
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");

        migrations::run_pending(&pool).await.expect("run migrations");

        let first = CatalogSeedDataset::load(&pool).await.expect("load seed fixtures");
        let first_verification =
            CatalogSeedDataset::verify(&pool).await.expect("verify seed fixtures");
        assert!(first_verification.all_present, "{:?}", first_verification.checks);
        assert_eq!(first.vehicles_seeded, SEED_VEHICLE_IDS.len() as i64);

        let second = CatalogSeedDataset::load(&pool).await.expect("reload seed fixtures");
        let second_verification =
            CatalogSeedDataset::verify(&pool).await.expect("re-verify seed fixtures");
        assert!(second_verification.all_present);
        assert_eq!(second.vehicles_seeded, SEED_VEHICLE_IDS.len() as i64);
        assert_eq!(first.models, second.models);
        assert_eq!(first_verification.checks, second_verification.checks);
    }

    #[tokio::test]
    async fn verify_reports_missing_rows_after_clean() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");

        migrations::run_pending(&pool).await.expect("run migrations");
        CatalogSeedDataset::load(&pool).await.expect("load seed fixtures");
        CatalogSeedDataset::clean(&pool).await.expect("clean seed fixtures");

        let verification = CatalogSeedDataset::verify(&pool).await.expect("verify");
        assert!(!verification.all_present);
        assert!(verification.checks.iter().any(|(label, ok)| *label == "brezza-vdi" && !ok));
    }
}
