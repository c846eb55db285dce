//! Sample farmers for local development and demos.

use chrono::Utc;
use sea_orm::{sea_query::OnConflict, ConnectionTrait, EntityTrait, Set};
use tracing::info;

use crate::entities::farmer::{ActiveModel as FarmerActiveModel, Column, Entity as Farmer};
use crate::errors::AppError;

/// (name, phone, location)
pub const SAMPLE_FARMERS: [(&str, &str, &str); 3] = [
    ("John Doe", "1234567890", "Texas"),
    ("Jane Smith", "9876543210", "California"),
    ("Michael Johnson", "4567891230", "Florida"),
];

/// Inserts the sample farmers, skipping phones that are already registered.
///
/// Returns how many rows were inserted, so a second run reports 0.
pub async fn seed_farmers<C>(db: &C) -> Result<u64, AppError>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let rows = SAMPLE_FARMERS
        .iter()
        .map(|(name, phone, location)| FarmerActiveModel {
            name: Set(name.to_string()),
            phone: Set(phone.to_string()),
            location: Set(location.to_string()),
            // Bulk inserts bypass ActiveModelBehavior, so stamp explicitly
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        });

    let inserted = Farmer::insert_many(rows)
        .on_conflict(OnConflict::column(Column::Phone).do_nothing().to_owned())
        .exec_without_returning(db)
        .await
        .map_err(AppError::DatabaseError)?;

    info!(
        inserted,
        skipped = SAMPLE_FARMERS.len() as u64 - inserted,
        "sample farmers seeded"
    );
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use sea_orm::{PaginatorTrait, QueryOrder};

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let db = establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .unwrap();
        run_migrations(&db).await.unwrap();

        assert_eq!(seed_farmers(&db).await.unwrap(), 3);
        assert_eq!(seed_farmers(&db).await.unwrap(), 0);
        assert_eq!(Farmer::find().count(&db).await.unwrap(), 3);

        let farmers = Farmer::find().order_by_asc(Column::Id).all(&db).await.unwrap();
        let seeded: Vec<(&str, &str, &str)> = farmers
            .iter()
            .map(|f| (f.name.as_str(), f.phone.as_str(), f.location.as_str()))
            .collect();
        assert_eq!(seeded, SAMPLE_FARMERS.to_vec());
        assert!(farmers.iter().all(|f| f.created_at == f.updated_at));
    }
}
