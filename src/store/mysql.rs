//! MySQL-backed link store
//!
//! One row per player in `LinkFlag`, one row under the world-global key
//! in `WorldVar` holding the used-code map as a JSON blob. Schema:
//!
//! ```sql
//! CREATE TABLE `LinkFlag` (
//!   `LnkPlayerId` BIGINT      NOT NULL PRIMARY KEY,
//!   `LnkLinked`   INT         NOT NULL DEFAULT 0
//! );
//! CREATE TABLE `WorldVar` (
//!   `WvrKey`      VARCHAR(64) NOT NULL PRIMARY KEY,
//!   `WvrValue`    MEDIUMTEXT  NOT NULL
//! );
//! ```

use sqlx::MySqlPool;

use super::{LinkStore, StoreError, USED_CODES_KEY};
use crate::ledger::UsedCodes;

pub struct MySqlLinkStore {
    pool: MySqlPool,
}

impl MySqlLinkStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl LinkStore for MySqlLinkStore {
    async fn load_used_codes(&self) -> Result<Option<UsedCodes>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT `WvrValue` FROM `WorldVar` WHERE `WvrKey` = ?"
        )
        .bind(USED_CODES_KEY)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((json,)) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save_used_codes(&self, codes: &UsedCodes) -> Result<(), StoreError> {
        let json = serde_json::to_string(codes)?;
        sqlx::query(
            "INSERT INTO `WorldVar` (`WvrKey`, `WvrValue`) VALUES (?, ?)
             ON DUPLICATE KEY UPDATE `WvrValue` = VALUES(`WvrValue`)"
        )
        .bind(USED_CODES_KEY)
        .bind(json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_link_flag(&self, player_id: i64) -> Result<i64, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT `LnkLinked` FROM `LinkFlag` WHERE `LnkPlayerId` = ?"
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(v,)| v).unwrap_or(0))
    }

    async fn set_link_flag(&self, player_id: i64, value: i64) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO `LinkFlag` (`LnkPlayerId`, `LnkLinked`) VALUES (?, ?)
             ON DUPLICATE KEY UPDATE `LnkLinked` = VALUES(`LnkLinked`)"
        )
        .bind(player_id)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
