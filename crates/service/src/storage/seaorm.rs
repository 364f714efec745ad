use async_trait::async_trait;
use models::document::{self, Column, Entity};
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Select,
};
use serde_json::Value;

use super::{Document, DocumentStore, Filter, Query, StoreError};

/// PostgreSQL-backed document store over the `documents` table.
#[derive(Clone)]
pub struct SeaOrmDocumentStore {
    pub db: DatabaseConnection,
}

impl SeaOrmDocumentStore {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn db_err(e: sea_orm::DbErr) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn into_document(data: Value) -> Result<Document, StoreError> {
    match data {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(format!("stored body is not an object: {other}"))),
    }
}

/// `data -> 'field'` / `data ->> 'field'` operands. Field names are inlined so
/// the partial expression indexes apply, hence the strict character check.
fn field_path(field: &str, op: &str) -> Result<String, StoreError> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StoreError::InvalidQuery(format!("unsupported field name '{field}'")));
    }
    Ok(format!("(data {op} '{field}')"))
}

/// `jsonb_typeof` name of a filter value; comparisons only match stored
/// values of the same JSON type.
fn json_type(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn typed(field: &str, value: &Value, predicate: String) -> Result<String, StoreError> {
    Ok(format!("(jsonb_typeof({}) = '{}' AND {predicate})", field_path(field, "->")?, json_type(value)))
}

fn field_equals(field: &str, value: &Value) -> Result<SimpleExpr, StoreError> {
    Ok(match value {
        Value::String(s) => {
            let sql = typed(field, value, format!("{} = $1", field_path(field, "->>")?))?;
            Expr::cust_with_values(sql, [s.clone()])
        }
        // jsonb equality keeps the JSON type and compares numbers by value.
        other => Expr::cust_with_values(format!("{} = $1", field_path(field, "->")?), [sea_orm::Value::from(other.clone())]),
    })
}

/// Strings compare byte-wise, numbers and booleans by jsonb value. Other
/// bounds never match.
fn field_compare(field: &str, op: &str, value: &Value) -> Result<SimpleExpr, StoreError> {
    Ok(match value {
        Value::String(s) => {
            let sql = typed(field, value, format!(r#"{} COLLATE "C" {op} $1"#, field_path(field, "->>")?))?;
            Expr::cust_with_values(sql, [s.clone()])
        }
        Value::Number(_) | Value::Bool(_) => {
            let sql = typed(field, value, format!("{} {op} $1", field_path(field, "->")?))?;
            Expr::cust_with_values(sql, [sea_orm::Value::from(value.clone())])
        }
        _ => Expr::cust("FALSE"),
    })
}

fn filter_condition(filter: &Filter) -> Result<Condition, StoreError> {
    Ok(match filter {
        Filter::Eq(field, value) => Condition::all().add(field_equals(field, value)?),
        Filter::In(field, values) => values
            .iter()
            .try_fold(Condition::any(), |cond, v| Ok::<_, StoreError>(cond.add(field_equals(field, v)?)))?,
        Filter::Gte(field, value) => Condition::all().add(field_compare(field, ">=", value)?),
        Filter::Lt(field, value) => Condition::all().add(field_compare(field, "<", value)?),
    })
}

fn filtered(collection: &str, filters: &[Filter]) -> Result<Select<Entity>, StoreError> {
    filters.iter().try_fold(Entity::find().filter(Column::Collection.eq(collection)), |select, f| {
        filter_condition(f).map(|cond| select.filter(cond))
    })
}

#[async_trait]
impl DocumentStore for SeaOrmDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        document::find(&self.db, collection, key).await?.map(|m| into_document(m.data)).transpose()
    }

    async fn set(&self, collection: &str, key: &str, doc: Document) -> Result<(), StoreError> {
        document::upsert(&self.db, collection, key, Value::Object(doc)).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        Ok(document::remove(&self.db, collection, key).await?)
    }

    async fn query(&self, collection: &str, q: &Query) -> Result<Vec<(String, Document)>, StoreError> {
        q.validate()?;
        let mut select = filtered(collection, &q.filters)?;
        if let Some(after) = &q.start_after {
            select = select.filter(Column::Key.gt(after.as_str()));
        }
        select = select.order_by_asc(Column::Key);
        if q.offset > 0 {
            select = select.offset(q.offset as u64);
        }
        if let Some(limit) = q.limit {
            select = select.limit(limit as u64);
        }
        let rows = select.all(&self.db).await.map_err(db_err)?;
        rows.into_iter().map(|m| Ok((m.key, into_document(m.data)?))).collect()
    }

    async fn count(&self, collection: &str, filters: &[Filter]) -> Result<u64, StoreError> {
        filters.iter().try_for_each(Filter::validate)?;
        filtered(collection, filters)?.count(&self.db).await.map_err(db_err)
    }
}
