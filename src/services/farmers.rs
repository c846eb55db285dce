use crate::{
    dto::farmer::{
        rules, CreateFarmerRequest, FarmerChanges, NewFarmer, UpdateFarmerRequest, FIELD_ORDER,
    },
    entities::farmer,
    errors::{FieldErrors, ServiceError},
    repositories::FarmerRepository,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use validator::{Validate, ValidationErrors};

pub const FARMER_NOT_FOUND: &str = "Farmer not found";

/// Service for managing farmers
#[derive(Clone)]
pub struct FarmerService {
    repository: Arc<dyn FarmerRepository>,
}

impl FarmerService {
    /// Creates a new farmer service instance
    pub fn new(repository: Arc<dyn FarmerRepository>) -> Self {
        Self { repository }
    }

    /// Lists every farmer, oldest first
    #[instrument(skip(self))]
    pub async fn list_farmers(&self) -> Result<Vec<farmer::Model>, ServiceError> {
        self.repository.list().await
    }

    /// Gets a farmer by ID
    #[instrument(skip(self))]
    pub async fn get_farmer(&self, id: i32) -> Result<farmer::Model, ServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(not_found)
    }

    /// Creates a new farmer
    #[instrument(skip(self, request))]
    pub async fn create_farmer(
        &self,
        request: CreateFarmerRequest,
    ) -> Result<farmer::Model, ServiceError> {
        let mut errors = request.validate().err().unwrap_or_else(ValidationErrors::new);
        if let Some(phone) = request.phone_candidate() {
            if self.repository.phone_taken(phone, None).await? {
                errors.add("phone", rules::unique_violation("phone"));
            }
        }
        reject_if_invalid(errors)?;

        let new_farmer = NewFarmer::try_from(request).map_err(|e| invalid(&e))?;
        let created = self
            .repository
            .create(new_farmer)
            .await
            .map_err(phone_conflict)?;

        info!(farmer_id = created.id, "farmer created");
        Ok(created)
    }

    /// Applies the fields present in `request` to an existing farmer
    #[instrument(skip(self, request))]
    pub async fn update_farmer(
        &self,
        id: i32,
        request: UpdateFarmerRequest,
    ) -> Result<farmer::Model, ServiceError> {
        let existing = self.get_farmer(id).await?;

        let mut errors = request.validate().err().unwrap_or_else(ValidationErrors::new);
        if let Some(phone) = request.phone_candidate() {
            if self.repository.phone_taken(phone, Some(id)).await? {
                errors.add("phone", rules::unique_violation("phone"));
            }
        }
        reject_if_invalid(errors)?;

        let changes = FarmerChanges::try_from(request).map_err(|e| invalid(&e))?;
        let updated = self
            .repository
            .update(existing, changes)
            .await
            .map_err(phone_conflict)?
            .ok_or_else(not_found)?;

        info!(farmer_id = updated.id, "farmer updated");
        Ok(updated)
    }

    /// Deletes a farmer
    #[instrument(skip(self))]
    pub async fn delete_farmer(&self, id: i32) -> Result<(), ServiceError> {
        if !self.repository.delete(id).await? {
            return Err(not_found());
        }

        info!(farmer_id = id, "farmer deleted");
        Ok(())
    }
}

fn not_found() -> ServiceError {
    ServiceError::NotFound(FARMER_NOT_FOUND.to_string())
}

fn invalid(errors: &ValidationErrors) -> ServiceError {
    ServiceError::ValidationError(FieldErrors::from_validation_errors(errors, FIELD_ORDER))
}

fn reject_if_invalid(errors: ValidationErrors) -> Result<(), ServiceError> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(invalid(&errors))
    }
}

/// A concurrent writer claimed the phone between the check and the write
fn phone_conflict(err: ServiceError) -> ServiceError {
    if !err.is_unique_violation() {
        return err;
    }
    debug!(error = %err, "phone uniqueness enforced by datastore");
    let mut fields = FieldErrors::new();
    if let Some(message) = rules::unique_violation("phone").message {
        fields.add("phone", message);
    }
    ServiceError::ValidationError(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use crate::errors::AppError;
    use crate::repositories::SeaOrmFarmerRepository;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use serde_json::json;

    /// Never reports a phone as taken, so only the unique index can catch duplicates.
    struct BlindPhoneCheck(SeaOrmFarmerRepository);

    #[async_trait]
    impl FarmerRepository for BlindPhoneCheck {
        async fn list(&self) -> Result<Vec<farmer::Model>, AppError> {
            self.0.list().await
        }
        async fn find_by_id(&self, id: i32) -> Result<Option<farmer::Model>, AppError> {
            self.0.find_by_id(id).await
        }
        async fn create(&self, farmer: NewFarmer) -> Result<farmer::Model, AppError> {
            self.0.create(farmer).await
        }
        async fn update(
            &self,
            existing: farmer::Model,
            changes: FarmerChanges,
        ) -> Result<Option<farmer::Model>, AppError> {
            self.0.update(existing, changes).await
        }
        async fn delete(&self, id: i32) -> Result<bool, AppError> {
            self.0.delete(id).await
        }
        async fn phone_taken(&self, _phone: &str, _except_id: Option<i32>) -> Result<bool, AppError> {
            Ok(false)
        }
    }

    /// Deletes the row right before writing, as a concurrent destroy would.
    struct DeletedMidUpdate(SeaOrmFarmerRepository);

    #[async_trait]
    impl FarmerRepository for DeletedMidUpdate {
        async fn list(&self) -> Result<Vec<farmer::Model>, AppError> {
            self.0.list().await
        }
        async fn find_by_id(&self, id: i32) -> Result<Option<farmer::Model>, AppError> {
            self.0.find_by_id(id).await
        }
        async fn create(&self, farmer: NewFarmer) -> Result<farmer::Model, AppError> {
            self.0.create(farmer).await
        }
        async fn update(
            &self,
            existing: farmer::Model,
            changes: FarmerChanges,
        ) -> Result<Option<farmer::Model>, AppError> {
            self.0.delete(existing.id).await?;
            self.0.update(existing, changes).await
        }
        async fn delete(&self, id: i32) -> Result<bool, AppError> {
            self.0.delete(id).await
        }
        async fn phone_taken(&self, phone: &str, except_id: Option<i32>) -> Result<bool, AppError> {
            self.0.phone_taken(phone, except_id).await
        }
    }

    async fn sqlite_repository() -> SeaOrmFarmerRepository {
        let db = establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .unwrap();
        run_migrations(&db).await.unwrap();
        SeaOrmFarmerRepository::new(Arc::new(db))
    }

    fn create_request(body: serde_json::Value) -> CreateFarmerRequest {
        serde_json::from_value(body).unwrap()
    }

    fn amy() -> CreateFarmerRequest {
        create_request(json!({ "name": "Amy Lee", "phone": "5550001111", "location": "Ohio" }))
    }

    #[tokio::test]
    async fn duplicate_phone_is_a_field_error() {
        let service = FarmerService::new(Arc::new(sqlite_repository().await));
        service.create_farmer(amy()).await.unwrap();

        let err = service.create_farmer(amy()).await.unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(ref fields) => {
            assert_eq!(
                fields.get("phone").unwrap(),
                &["The phone has already been taken.".to_string()]
            );
        });
        assert_eq!(service.list_farmers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lost_race_on_phone_is_a_field_error() {
        let service = FarmerService::new(Arc::new(BlindPhoneCheck(sqlite_repository().await)));
        service.create_farmer(amy()).await.unwrap();

        let err = service.create_farmer(amy()).await.unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(ref fields) => {
            assert_eq!(fields.fields().collect::<Vec<_>>(), vec!["phone"]);
        });
    }

    #[tokio::test]
    async fn unique_error_joins_other_field_errors_in_order() {
        let service = FarmerService::new(Arc::new(sqlite_repository().await));
        service.create_farmer(amy()).await.unwrap();

        let err = service
            .create_farmer(create_request(json!({ "phone": "5550001111", "location": "" })))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(ref fields) => {
            assert_eq!(
                fields.fields().collect::<Vec<_>>(),
                vec!["name", "phone", "location"]
            );
        });
    }

    #[tokio::test]
    async fn update_of_missing_farmer_is_not_found_before_validation() {
        let service = FarmerService::new(Arc::new(sqlite_repository().await));
        let request: UpdateFarmerRequest = serde_json::from_value(json!({ "name": null })).unwrap();

        let err = service.update_farmer(404, request).await.unwrap_err();
        assert_matches!(err, ServiceError::NotFound(ref message) if message == FARMER_NOT_FOUND);
    }

    #[tokio::test]
    async fn update_racing_a_delete_is_not_found() {
        let service = FarmerService::new(Arc::new(DeletedMidUpdate(sqlite_repository().await)));
        let farmer = service.create_farmer(amy()).await.unwrap();
        let request: UpdateFarmerRequest = serde_json::from_value(json!({ "name": "X" })).unwrap();

        let err = service.update_farmer(farmer.id, request).await.unwrap_err();
        assert_matches!(err, ServiceError::NotFound(ref message) if message == FARMER_NOT_FOUND);
        assert!(service.list_farmers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_may_keep_its_own_phone() {
        let service = FarmerService::new(Arc::new(sqlite_repository().await));
        let farmer = service.create_farmer(amy()).await.unwrap();

        let request: UpdateFarmerRequest =
            serde_json::from_value(json!({ "phone": "5550001111", "name": "Amy L." })).unwrap();
        let updated = service.update_farmer(farmer.id, request).await.unwrap();
        assert_eq!(updated.phone, "5550001111");
        assert_eq!(updated.name, "Amy L.");
    }

    #[tokio::test]
    async fn delete_twice_is_not_found() {
        let service = FarmerService::new(Arc::new(sqlite_repository().await));
        let farmer = service.create_farmer(amy()).await.unwrap();

        service.delete_farmer(farmer.id).await.unwrap();
        assert_matches!(
            service.delete_farmer(farmer.id).await,
            Err(ServiceError::NotFound(_))
        );
        assert_matches!(
            service.get_farmer(farmer.id).await,
            Err(ServiceError::NotFound(_))
        );
    }
}
