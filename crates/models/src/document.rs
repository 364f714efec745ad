//! Generic document row: one JSON body per `(collection, key)`.
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};

use crate::errors;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub collection: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub data: Json,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub async fn find(db: &DatabaseConnection, collection: &str, key: &str) -> Result<Option<Model>, errors::ModelError> {
    Entity::find_by_id((collection.to_string(), key.to_string()))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Insert or fully replace the document body.
pub async fn upsert(db: &DatabaseConnection, collection: &str, key: &str, data: Json) -> Result<(), errors::ModelError> {
    let am = ActiveModel {
        collection: Set(collection.to_string()),
        key: Set(key.to_string()),
        data: Set(data),
        updated_at: Set(Utc::now().into()),
    };
    Entity::insert(am)
        .on_conflict(
            OnConflict::columns([Column::Collection, Column::Key])
                .update_columns([Column::Data, Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(())
}

/// Remove a document; returns whether a row was deleted.
pub async fn remove(db: &DatabaseConnection, collection: &str, key: &str) -> Result<bool, errors::ModelError> {
    let res = Entity::delete_by_id((collection.to_string(), key.to_string()))
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}
