use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;

use crate::dto::farmer::{FarmerChanges, NewFarmer};
use crate::entities::farmer::{
    ActiveModel as FarmerActiveModel, Column, Entity as Farmer, Model as FarmerModel,
};
use crate::errors::AppError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Persistence operations for farmers
#[async_trait]
pub trait FarmerRepository: Send + Sync {
    /// All farmers, oldest first
    async fn list(&self) -> Result<Vec<FarmerModel>, AppError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<FarmerModel>, AppError>;

    async fn create(&self, farmer: NewFarmer) -> Result<FarmerModel, AppError>;

    /// Apply `changes` to `existing`; absent fields keep their stored values.
    /// Returns `None` when the row is gone by the time the write lands.
    async fn update(
        &self,
        existing: FarmerModel,
        changes: FarmerChanges,
    ) -> Result<Option<FarmerModel>, AppError>;

    /// Returns false when no row had this id
    async fn delete(&self, id: i32) -> Result<bool, AppError>;

    /// Whether another farmer already holds `phone`, ignoring `except_id`
    async fn phone_taken(&self, phone: &str, except_id: Option<i32>) -> Result<bool, AppError>;
}

/// Repository for farmer operations
#[derive(Debug)]
pub struct SeaOrmFarmerRepository {
    base: BaseRepository,
}

impl SeaOrmFarmerRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl FarmerRepository for SeaOrmFarmerRepository {
    async fn list(&self) -> Result<Vec<FarmerModel>, AppError> {
        Farmer::find()
            .order_by_asc(Column::Id)
            .all(self.get_db())
            .await
            .map_err(AppError::DatabaseError)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<FarmerModel>, AppError> {
        Farmer::find_by_id(id)
            .one(self.get_db())
            .await
            .map_err(AppError::DatabaseError)
    }

    async fn create(&self, farmer: NewFarmer) -> Result<FarmerModel, AppError> {
        // Timestamps are filled in by the entity's before_save hook
        let active_model = FarmerActiveModel {
            name: Set(farmer.name),
            phone: Set(farmer.phone),
            location: Set(farmer.location),
            ..Default::default()
        };

        active_model
            .insert(self.get_db())
            .await
            .map_err(AppError::DatabaseError)
    }

    async fn update(
        &self,
        existing: FarmerModel,
        changes: FarmerChanges,
    ) -> Result<Option<FarmerModel>, AppError> {
        let mut active_model: FarmerActiveModel = existing.into();

        if let Some(name) = changes.name {
            active_model.name = Set(name);
        }
        if let Some(phone) = changes.phone {
            active_model.phone = Set(phone);
        }
        if let Some(location) = changes.location {
            active_model.location = Set(location);
        }

        match active_model.update(self.get_db()).await {
            Ok(updated) => Ok(Some(updated)),
            Err(DbErr::RecordNotUpdated | DbErr::RecordNotFound(_)) => Ok(None),
            Err(err) => Err(AppError::DatabaseError(err)),
        }
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = Farmer::delete_by_id(id)
            .exec(self.get_db())
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(result.rows_affected > 0)
    }

    async fn phone_taken(&self, phone: &str, except_id: Option<i32>) -> Result<bool, AppError> {
        let mut query = Farmer::find().filter(Column::Phone.eq(phone));
        if let Some(id) = except_id {
            query = query.filter(Column::Id.ne(id));
        }

        let count = query
            .count(self.get_db())
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(count > 0)
    }
}

impl Repository for SeaOrmFarmerRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}
