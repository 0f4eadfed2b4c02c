//! # Folio Allocation
//!
//! Next number = highest suffix already stored + 1, read on the caller's
//! transaction connection. The UNIQUE index on the target column is the
//! backstop: if two writers race, one of them fails with a retryable
//! [`DbError`](crate::DbError) and its transaction rolls back untouched.

use saori_core::FolioKind;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;

/// Table and column holding each folio family.
const fn target(kind: FolioKind) -> (&'static str, &'static str) {
    match kind {
        FolioKind::Sale => ("sales", "folio"),
        FolioKind::Quote => ("quotes", "folio"),
        FolioKind::PurchaseOrder => ("purchase_orders", "folio"),
        FolioKind::Employee => ("employees", "code"),
    }
}

/// Allocates the next folio of `kind` inside the current transaction.
pub(crate) async fn next_folio(conn: &mut SqliteConnection, kind: FolioKind) -> DbResult<String> {
    let (table, column) = target(kind);
    let sql = format!(
        "SELECT MAX(CAST(SUBSTR({column}, ?1) AS INTEGER)) FROM {table} WHERE {column} GLOB ?2"
    );

    let max_seen: Option<i64> = sqlx::query_scalar(&sql)
        .bind(kind.prefix().len() as i64 + 1)
        .bind(format!("{}[0-9]*", kind.prefix()))
        .fetch_one(&mut *conn)
        .await?;

    let folio = kind.format(kind.next_after(max_seen));
    debug!(%folio, "Allocated folio");
    Ok(folio)
}
