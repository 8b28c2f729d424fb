//! Profile persistence for `PostgreSQL`.

use async_trait::async_trait;

use dsc_core::{AddressId, Login, ProfileId};

use super::{PgTransaction, ProfileStore, RepositoryError, conflict_on_unique};
use crate::models::{NewProfile, Profile};

/// Internal row type for `PostgreSQL` profile queries.
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    user_login: String,
    display_name: Option<String>,
    address_id: Option<i64>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let user_login = Login::parse(&row.user_login).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid login in database: {e}"))
        })?;

        Ok(Self {
            id: ProfileId::new(row.id),
            user_login,
            display_name: row.display_name,
            address_id: row.address_id.map(AddressId::new),
        })
    }
}

#[async_trait]
impl ProfileStore for PgTransaction {
    async fn profiles_by_login(&mut self, login: &Login) -> Result<Vec<Profile>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT id, user_login, display_name, address_id
            FROM dsc.profile
            WHERE user_login = $1
            ORDER BY id
            ",
        )
        .bind(login.as_str())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn save_profile(&mut self, profile: &Profile) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            UPDATE dsc.profile
            SET user_login = $2, display_name = $3, address_id = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_login, display_name, address_id
            ",
        )
        .bind(profile.id)
        .bind(profile.user_login.as_str())
        .bind(&profile.display_name)
        .bind(profile.address_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| conflict_on_unique(e, "address already linked to another profile"))?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn insert_profile(&mut self, profile: NewProfile) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            INSERT INTO dsc.profile (user_login, display_name)
            VALUES ($1, $2)
            RETURNING id, user_login, display_name, address_id
            ",
        )
        .bind(profile.user_login.as_str())
        .bind(&profile.display_name)
        .fetch_one(&mut *self.tx)
        .await?;

        row.try_into()
    }
}
