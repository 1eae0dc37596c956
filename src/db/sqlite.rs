//! SQLite implementation of [`DocumentStore`].
//!
//! Each record is a JSON object in the `data` column of the shared `documents` table.
//! Predicates, sort keys and group keys compile to `json_extract` expressions. The `folded`
//! column holds the same document with every string lowercased, for substring search.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::document::{
    new_id, validate_field, Direction, Document, GroupRow, GroupSpec, Predicate, SortKey, ID_FIELD,
};
use super::store::DocumentStore;
use crate::errors::AppError;

/// Document store backed by a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    timeout: Duration,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Run a store call under the configured timeout.
    async fn timed<T, F>(&self, call: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        with_timeout(self.timeout, call).await
    }
}

/// Fail with [`AppError::StoreUnavailable`] when `call` does not finish within `timeout`.
async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Store call exceeded {:?}", timeout);
            Err(AppError::StoreUnavailable(format!(
                "Store did not respond within {} ms",
                timeout.as_millis()
            )))
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
        sort: &[SortKey],
        skip: u64,
        limit: Option<u64>,
    ) -> Result<Vec<Document>, AppError> {
        self.timed(async {
            let mut qb = select_matching("SELECT id, data FROM documents", collection, predicate)?;
            push_order(&mut qb, sort)?;
            // SQLite needs a LIMIT clause before OFFSET; -1 means unbounded
            qb.push(" LIMIT ").push_bind(limit.map(to_i64).unwrap_or(-1));
            qb.push(" OFFSET ").push_bind(to_i64(skip));

            let rows = qb.build().fetch_all(&self.pool).await?;
            rows.iter().map(document_from_row).collect()
        })
        .await
    }

    async fn count(&self, collection: &str, predicate: &Predicate) -> Result<u64, AppError> {
        self.timed(async {
            let mut qb = select_matching("SELECT COUNT(*) AS n FROM documents", collection, predicate)?;
            let row = qb.build().fetch_one(&self.pool).await?;
            let n: i64 = row.try_get("n")?;
            Ok(n.max(0) as u64)
        })
        .await
    }

    async fn find_one(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> Result<Option<Document>, AppError> {
        self.timed(async {
            let mut qb = select_matching("SELECT id, data FROM documents", collection, predicate)?;
            qb.push(" ORDER BY seq LIMIT 1");
            let row = qb.build().fetch_optional(&self.pool).await?;
            row.as_ref().map(document_from_row).transpose()
        })
        .await
    }

    async fn insert_one(&self, collection: &str, mut document: Document) -> Result<String, AppError> {
        self.timed(async {
            document.remove(ID_FIELD);
            let id = new_id();
            let data = serde_json::to_string(&document)?;
            let folded = serde_json::to_string(&fold_case(&document))?;

            sqlx::query("INSERT INTO documents (collection, id, data, folded) VALUES (?, ?, ?, ?)")
                .bind(collection)
                .bind(&id)
                .bind(&data)
                .bind(&folded)
                .execute(&self.pool)
                .await?;

            Ok(id)
        })
        .await
    }

    async fn update_one(
        &self,
        collection: &str,
        id: &str,
        fields: &Document,
    ) -> Result<u64, AppError> {
        self.update_many(collection, &Predicate::IdIn(vec![id.to_string()]), fields)
            .await
    }

    async fn update_many(
        &self,
        collection: &str,
        predicate: &Predicate,
        fields: &Document,
    ) -> Result<u64, AppError> {
        self.timed(async {
            let mut tx = self.pool.begin().await?;

            let mut qb = select_matching("SELECT id, data FROM documents", collection, predicate)?;
            let rows = qb.build().fetch_all(&mut *tx).await?;

            let mut modified = 0;
            for row in &rows {
                let id: String = row.try_get("id")?;
                let data: String = row.try_get("data")?;
                let mut document: Document = serde_json::from_str(&data)?;
                set_fields(&mut document, fields);

                sqlx::query(
                    "UPDATE documents SET data = ?, folded = ? WHERE collection = ? AND id = ?",
                )
                .bind(serde_json::to_string(&document)?)
                .bind(serde_json::to_string(&fold_case(&document))?)
                .bind(collection)
                .bind(&id)
                .execute(&mut *tx)
                .await?;
                modified += 1;
            }

            tx.commit().await?;
            Ok(modified)
        })
        .await
    }

    async fn delete_one(&self, collection: &str, id: &str) -> Result<u64, AppError> {
        self.timed(async {
            let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected())
        })
        .await
    }

    async fn aggregate_group(
        &self,
        collection: &str,
        spec: &GroupSpec,
    ) -> Result<Vec<GroupRow>, AppError> {
        self.timed(async {
            let key_exprs = spec
                .keys
                .iter()
                .map(|k| field_expr(k))
                .collect::<Result<Vec<_>, _>>()?;

            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
            for (i, expr) in key_exprs.iter().enumerate() {
                qb.push(format!("json_quote({}) AS k{}, ", expr, i));
            }
            qb.push("COUNT(*) AS total");
            for (i, acc) in spec.accumulators.iter().enumerate() {
                qb.push(", SUM(CASE WHEN ");
                push_comparison(&mut qb, &field_expr(&acc.field)?, &acc.value, false);
                qb.push(format!(" THEN 1 ELSE 0 END) AS s{}", i));
            }
            qb.push(" FROM documents WHERE collection = ")
                .push_bind(collection.to_string())
                .push(" AND (");
            push_predicate(&mut qb, &spec.predicate)?;
            qb.push(")");
            if !key_exprs.is_empty() {
                let keys = key_exprs.join(", ");
                qb.push(format!(" GROUP BY {} ORDER BY {}", keys, keys));
            }

            let rows = qb.build().fetch_all(&self.pool).await?;
            let mut groups = Vec::with_capacity(rows.len());
            for row in &rows {
                let mut keys = Vec::with_capacity(key_exprs.len());
                for i in 0..key_exprs.len() {
                    let raw: String = row.try_get(format!("k{}", i).as_str())?;
                    keys.push(serde_json::from_str(&raw)?);
                }
                let mut sums = Vec::with_capacity(spec.accumulators.len());
                for (i, acc) in spec.accumulators.iter().enumerate() {
                    let sum: Option<i64> = row.try_get(format!("s{}", i).as_str())?;
                    sums.push((acc.name.clone(), sum.unwrap_or(0)));
                }
                groups.push(GroupRow {
                    keys,
                    count: row.try_get("total")?,
                    sums,
                });
            }
            Ok(groups)
        })
        .await
    }

    async fn ensure_unique_index(&self, collection: &str, fields: &[&str]) -> Result<(), AppError> {
        validate_field(collection)?;
        if fields.is_empty() {
            return Err(AppError::Internal("Unique index needs at least one field".to_string()));
        }
        let exprs = fields
            .iter()
            .map(|f| field_expr(f))
            .collect::<Result<Vec<_>, _>>()?;
        let name = format!("uq_{}_{}", collection, fields.join("_")).replace('.', "_");

        let sql = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON documents({}) WHERE collection = '{}'",
            name,
            exprs.join(", "),
            collection
        );
        self.timed(async {
            sqlx::query(&sql).execute(&self.pool).await?;
            Ok(())
        })
        .await?;

        tracing::debug!("Unique index {} ensured", name);
        Ok(())
    }
}

// Query compilation helpers

fn select_matching<'a>(
    head: &str,
    collection: &str,
    predicate: &Predicate,
) -> Result<QueryBuilder<'a, Sqlite>, AppError> {
    let mut qb = QueryBuilder::new(head);
    qb.push(" WHERE collection = ")
        .push_bind(collection.to_string())
        .push(" AND (");
    push_predicate(&mut qb, predicate)?;
    qb.push(")");
    Ok(qb)
}

/// SQL expression reading `field` from a document row.
fn field_expr(field: &str) -> Result<String, AppError> {
    if field == ID_FIELD {
        return Ok("id".to_string());
    }
    validate_field(field)?;
    Ok(format!("json_extract(data, '$.{}')", field))
}

/// SQL expression reading the lowercased form of `field`.
fn folded_expr(field: &str) -> Result<String, AppError> {
    if field == ID_FIELD {
        return Ok("lower(id)".to_string());
    }
    validate_field(field)?;
    Ok(format!("json_extract(folded, '$.{}')", field))
}

fn push_predicate(qb: &mut QueryBuilder<'_, Sqlite>, predicate: &Predicate) -> Result<(), AppError> {
    match predicate {
        Predicate::All => {
            qb.push("1 = 1");
        }
        Predicate::Eq(field, value) => push_comparison(qb, &field_expr(field)?, value, false),
        Predicate::Ne(field, value) => push_comparison(qb, &field_expr(field)?, value, true),
        Predicate::Contains(field, needle) => {
            qb.push(format!("instr(CAST({} AS TEXT), ", folded_expr(field)?))
                .push_bind(needle.to_lowercase())
                .push(") > 0");
        }
        Predicate::IdIn(ids) => {
            if ids.is_empty() {
                qb.push("0 = 1");
            } else {
                qb.push("id IN (");
                let mut list = qb.separated(", ");
                for id in ids {
                    list.push_bind(id.clone());
                }
                list.push_unseparated(")");
            }
        }
        Predicate::IdNe(id) => {
            qb.push("id <> ").push_bind(id.clone());
        }
        Predicate::And(clauses) => push_joined(qb, clauses, " AND ", "1 = 1")?,
        Predicate::Or(clauses) => push_joined(qb, clauses, " OR ", "0 = 1")?,
    }
    Ok(())
}

fn push_joined(
    qb: &mut QueryBuilder<'_, Sqlite>,
    clauses: &[Predicate],
    separator: &str,
    empty: &str,
) -> Result<(), AppError> {
    if clauses.is_empty() {
        qb.push(empty);
        return Ok(());
    }
    qb.push("(");
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            qb.push(separator);
        }
        push_predicate(qb, clause)?;
    }
    qb.push(")");
    Ok(())
}

/// `expr = value` (or `IS NOT` when negated), null-aware.
fn push_comparison(qb: &mut QueryBuilder<'_, Sqlite>, expr: &str, value: &Value, negate: bool) {
    qb.push(expr);
    match (value, negate) {
        (Value::Null, false) => {
            qb.push(" IS NULL");
        }
        (Value::Null, true) => {
            qb.push(" IS NOT NULL");
        }
        (value, false) => {
            qb.push(" = ");
            push_value(qb, value);
        }
        (value, true) => {
            qb.push(" IS NOT ");
            push_value(qb, value);
        }
    }
}

/// Bind a JSON value the way `json_extract` surfaces it to SQL.
fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::Null => qb.push_bind(None::<String>),
        Value::Bool(b) => qb.push_bind(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => qb.push_bind(i),
            None => qb.push_bind(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => qb.push_bind(s.clone()),
        other => qb.push_bind(other.to_string()),
    };
}

fn push_order(qb: &mut QueryBuilder<'_, Sqlite>, sort: &[SortKey]) -> Result<(), AppError> {
    qb.push(" ORDER BY ");
    for key in sort {
        let dir = match key.direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        qb.push(format!("{} {}, ", field_expr(&key.field)?, dir));
    }
    // Insertion order breaks remaining ties
    qb.push("seq ASC");
    Ok(())
}

fn document_from_row(row: &SqliteRow) -> Result<Document, AppError> {
    let id: String = row.try_get("id")?;
    let data: String = row.try_get("data")?;
    let mut document: Document = serde_json::from_str(&data)?;
    document.insert(ID_FIELD.to_string(), Value::String(id));
    Ok(document)
}

/// Copy of `document` with every string value lowercased, nested values included.
pub(super) fn fold_case(document: &Document) -> Document {
    document
        .iter()
        .map(|(key, value)| (key.clone(), fold_value(value)))
        .collect()
}

fn fold_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_lowercase()),
        Value::Array(items) => Value::Array(items.iter().map(fold_value).collect()),
        Value::Object(map) => Value::Object(fold_case(map)),
        other => other.clone(),
    }
}

fn set_fields(document: &mut Document, fields: &Document) {
    for (key, value) in fields {
        if key != ID_FIELD {
            document.insert(key.clone(), value.clone());
        }
    }
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
