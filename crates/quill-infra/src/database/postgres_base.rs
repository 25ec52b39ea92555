use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, DbConn, DbErr, SqlErr, TransactionTrait};

use quill_core::error::RepoError;
use quill_core::ports::{CommitFuture, StoreTransaction, TransactionalStore};

/// Blog store over any SeaORM connection: the pool or an open transaction.
pub struct SeaOrmStore<C> {
    pub(crate) conn: C,
}

/// PostgreSQL store backed by the connection pool.
pub type PostgresStore = SeaOrmStore<DbConn>;

/// PostgreSQL store scoped to one transaction.
pub type PostgresTransaction = SeaOrmStore<DatabaseTransaction>;

impl<C> SeaOrmStore<C> {
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl TransactionalStore for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, RepoError> {
        let tx = self.conn.begin().await.map_err(db_err)?;
        Ok(Box::new(SeaOrmStore::new(tx)))
    }
}

impl StoreTransaction for PostgresTransaction {
    fn commit(self: Box<Self>) -> CommitFuture {
        Box::pin(async move { self.conn.commit().await.map_err(db_err) })
    }
}

/// Map a SeaORM error onto the repository error kinds.
pub(crate) fn db_err(err: DbErr) -> RepoError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            return RepoError::Constraint("Entity already exists".to_string());
        }
        Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
            return RepoError::Constraint(msg);
        }
        _ => {}
    }

    match err {
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => RepoError::NotFound,
        DbErr::ConnectionAcquire(e) => RepoError::Connection(e.to_string()),
        DbErr::Conn(e) => RepoError::Connection(e.to_string()),
        other => {
            let err_str = other.to_string();
            if err_str.contains("duplicate") || err_str.contains("unique") {
                RepoError::Constraint("Entity already exists".to_string())
            } else {
                RepoError::Query(err_str)
            }
        }
    }
}
