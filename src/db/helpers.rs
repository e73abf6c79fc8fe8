use color_eyre::Result;
use libsql::params::{IntoParams, Params};
use serde::de::DeserializeOwned;

/// Fetch all rows and deserialize each into `T` via `libsql::de::from_row`.
pub async fn query_all<T: DeserializeOwned>(
    conn: &libsql::Connection,
    sql: &str,
    params: impl IntoParams,
) -> Result<Vec<T>> {
    let mut rows = conn.query(sql, params).await?;
    let mut results = Vec::new();
    while let Some(row) = rows.next().await? {
        results.push(libsql::de::from_row::<T>(&row)?);
    }
    Ok(results)
}

/// Fetch the first column of every row as an integer id.
pub async fn query_ids(
    conn: &libsql::Connection,
    sql: &str,
    params: impl IntoParams,
) -> Result<Vec<i64>> {
    let mut rows = conn.query(sql, params).await?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next().await? {
        ids.push(row.get::<i64>(0)?);
    }
    Ok(ids)
}

/// Fetch the first column of the first row as an integer, or `None` if no rows.
pub async fn query_id_optional(
    conn: &libsql::Connection,
    sql: &str,
    params: impl IntoParams,
) -> Result<Option<i64>> {
    match conn.query(sql, params).await?.next().await? {
        Some(row) => Ok(Some(row.get::<i64>(0)?)),
        None => Ok(None),
    }
}

/// `?, ?, ?` for an `IN (...)` list of `n` values.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Positional parameters for an `IN (...)` list.
pub fn positional<T: Into<libsql::Value>>(values: impl IntoIterator<Item = T>) -> Params {
    Params::Positional(values.into_iter().map(Into::into).collect())
}
