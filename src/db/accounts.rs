use crate::db::models::{Account, AccountFilter};
use crate::db::sqlite::SqlitePool;
use crate::error::BridgeError;
use sqlx::{QueryBuilder, Sqlite};

const ACCOUNT_COLUMNS: &str =
    "id, name, classification, currency, account_type, active, current_balance, parent_id";

#[derive(Clone)]
pub struct AccountsStorage {
    pool: SqlitePool,
}

impl AccountsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert-or-overwrite every account by id inside one transaction.
    /// Nothing is committed unless all rows succeed.
    pub async fn upsert_many(&self, accounts: &[Account]) -> Result<usize, BridgeError> {
        let mut tx = self.pool.begin().await?;

        for acc in accounts {
            sqlx::query(
                r#"
                INSERT INTO accounts (
                    id, name, classification, currency, account_type,
                    active, current_balance, parent_id
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    name=excluded.name,
                    classification=excluded.classification,
                    currency=excluded.currency,
                    account_type=excluded.account_type,
                    active=excluded.active,
                    current_balance=excluded.current_balance,
                    parent_id=excluded.parent_id
                "#,
            )
            .bind(acc.id)
            .bind(&acc.name)
            .bind(&acc.classification)
            .bind(&acc.currency)
            .bind(&acc.account_type)
            .bind(acc.active)
            .bind(acc.current_balance)
            .bind(acc.parent_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(accounts.len())
    }

    pub async fn list_all(&self) -> Result<Vec<Account>, BridgeError> {
        let accounts = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    pub async fn search(&self, filter: &AccountFilter) -> Result<Vec<Account>, BridgeError> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE 1 = 1"));
        if let Some(active) = filter.active {
            qb.push(" AND active = ").push_bind(active);
        }
        if let Some(classification) = filter.classification() {
            qb.push(" AND classification = ")
                .push_bind(classification.to_string());
        }
        qb.push(" ORDER BY id");

        let accounts = qb.build_query_as::<Account>().fetch_all(&self.pool).await?;
        Ok(accounts)
    }
}
