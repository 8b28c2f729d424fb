//! Address persistence for `PostgreSQL`.
//!
//! The owning profile is not stored on the address row; `profile_id` is
//! derived with a join on `profile.address_id`.

use async_trait::async_trait;

use dsc_core::{AddressId, ProfileId};

use super::{AddressStore, PgTransaction, RepositoryError};
use crate::models::Address;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` address queries.
#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i64,
    street_address: String,
    postal_code: Option<String>,
    city: String,
    state_province: Option<String>,
    country: Option<String>,
    profile_id: Option<i64>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: Some(AddressId::new(row.id)),
            street_address: row.street_address,
            postal_code: row.postal_code,
            city: row.city,
            state_province: row.state_province,
            country: row.country,
            profile_id: row.profile_id.map(ProfileId::new),
        }
    }
}

const SELECT_ADDRESS: &str = r"
    SELECT a.id, a.street_address, a.postal_code, a.city, a.state_province, a.country,
           p.id AS profile_id
    FROM dsc.address a
    LEFT JOIN dsc.profile p ON p.address_id = a.id
";

// =============================================================================
// Store
// =============================================================================

impl PgTransaction {
    async fn insert_address(&mut self, address: &Address) -> Result<AddressId, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO dsc.address (street_address, postal_code, city, state_province, country)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(&address.street_address)
        .bind(&address.postal_code)
        .bind(&address.city)
        .bind(&address.state_province)
        .bind(&address.country)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(AddressId::new(id))
    }

    /// Replace the row with the given id, inserting it under that id if it
    /// does not exist yet.
    async fn replace_address(
        &mut self,
        id: AddressId,
        address: &Address,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE dsc.address
            SET street_address = $2, postal_code = $3, city = $4,
                state_province = $5, country = $6, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&address.street_address)
        .bind(&address.postal_code)
        .bind(&address.city)
        .bind(&address.state_province)
        .bind(&address.country)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        sqlx::query(
            r"
            INSERT INTO dsc.address (id, street_address, postal_code, city, state_province, country)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(id)
        .bind(&address.street_address)
        .bind(&address.postal_code)
        .bind(&address.city)
        .bind(&address.state_province)
        .bind(&address.country)
        .execute(&mut *self.tx)
        .await?;

        // Keep the serial ahead of explicitly chosen ids; never move it back
        sqlx::query(
            r"
            SELECT setval(pg_get_serial_sequence('dsc.address', 'id'),
                          GREATEST($1, nextval(pg_get_serial_sequence('dsc.address', 'id'))))
            ",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl AddressStore for PgTransaction {
    async fn save_address(&mut self, address: Address) -> Result<Address, RepositoryError> {
        let id = match address.id {
            Some(id) => {
                self.replace_address(id, &address).await?;
                id
            }
            None => self.insert_address(&address).await?,
        };

        self.find_address(id).await?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!("address {id} missing after save"))
        })
    }

    async fn find_address(&mut self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!("{SELECT_ADDRESS} WHERE a.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(Address::from))
    }

    async fn find_all_addresses(&mut self) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!("{SELECT_ADDRESS} ORDER BY a.id"))
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    async fn delete_address(&mut self, id: AddressId) -> Result<bool, RepositoryError> {
        // profile.address_id is cleared by ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM dsc.address WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
