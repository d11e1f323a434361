//! `PostgreSQL` implementation of [`UserDirectory`].

use super::schema::users;
use crate::access::{
    domain::{Actor, Role, UserId},
    ports::{UserDirectory, UserDirectoryError, UserDirectoryResult},
};
use crate::pg::{PgPool, get_conn, run_blocking};
use async_trait::async_trait;
use diesel::prelude::*;

/// `PostgreSQL`-backed user directory.
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Creates a directory from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registers a new user with the given role.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError::Persistence`] when the insert fails.
    pub async fn register(&self, role: Role) -> UserDirectoryResult<Actor> {
        let pool = self.pool.clone();
        let actor = Actor::new(UserId::new(), role);
        run_blocking(
            move || {
                let mut connection = get_conn(&pool, UserDirectoryError::persistence)?;
                diesel::insert_into(users::table)
                    .values((
                        users::id.eq(actor.id().into_inner()),
                        users::role.eq(role.as_str()),
                    ))
                    .execute(&mut connection)
                    .map_err(UserDirectoryError::persistence)?;
                Ok(actor)
            },
            UserDirectoryError::persistence,
        )
        .await
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn role_of(&self, user_id: UserId) -> UserDirectoryResult<Option<Role>> {
        let pool = self.pool.clone();
        run_blocking(
            move || {
                let mut connection = get_conn(&pool, UserDirectoryError::persistence)?;
                let persisted_role = users::table
                    .filter(users::id.eq(user_id.into_inner()))
                    .select(users::role)
                    .first::<String>(&mut connection)
                    .optional()
                    .map_err(UserDirectoryError::persistence)?;
                persisted_role
                    .map(|value| {
                        Role::try_from(value.as_str()).map_err(UserDirectoryError::persistence)
                    })
                    .transpose()
            },
            UserDirectoryError::persistence,
        )
        .await
    }
}
