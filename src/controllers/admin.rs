use regex::Regex;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::controllers::contains_pattern;
use crate::core::error::{self, Error};
use crate::types::request::{NewAdminData, PageParams, UpdateAdminData};
use crate::types::{AdminSummary, Role};
use crate::utils::password::{self, MIN_PASSWORD_LENGTH};

#[derive(Clone)]
pub(crate) struct AdminController {
    pool: PgPool,
    bcrypt_cost: u32,
    username_pattern: Regex,
}

impl std::fmt::Debug for AdminController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminController")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("username_pattern", &self.username_pattern.as_str())
            .finish()
    }
}

impl AdminController {
    pub(crate) fn new(pool: PgPool, bcrypt_cost: u32) -> Result<Self, error::ConfigError> {
        Ok(Self {
            pool,
            bcrypt_cost,
            username_pattern: Regex::new(r"^[a-zA-Z0-9_-]{3,32}$")?,
        })
    }

    pub(crate) async fn list(&self, params: &PageParams) -> Result<Vec<AdminSummary>, Error> {
        Ok(sqlx::query(
            "SELECT id, username, role
            FROM admins
            ORDER BY id
            LIMIT $1 OFFSET $2;",
        )
        .bind(params.page_size())
        .bind(params.offset())
        .try_map(map_admin)
        .fetch_all(&self.pool)
        .await?)
    }

    pub(crate) async fn search(
        &self,
        query: &str,
        params: &PageParams,
    ) -> Result<Vec<AdminSummary>, Error> {
        Ok(sqlx::query(
            "SELECT id, username, role
            FROM admins
            WHERE username ILIKE $1 ESCAPE '\\' OR role ILIKE $1 ESCAPE '\\'
            ORDER BY id
            LIMIT $2 OFFSET $3;",
        )
        .bind(contains_pattern(query))
        .bind(params.page_size())
        .bind(params.offset())
        .try_map(map_admin)
        .fetch_all(&self.pool)
        .await?)
    }

    pub(crate) async fn get(&self, id: i32) -> Result<AdminSummary, Error> {
        sqlx::query("SELECT id, username, role FROM admins WHERE id = $1;")
            .bind(id)
            .try_map(map_admin)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::AdminNotFound)
    }

    pub(crate) async fn create(&self, data: NewAdminData) -> Result<AdminSummary, Error> {
        let (Some(username), Some(password), Some(role)) = (data.username, data.password, data.role)
        else {
            return Err(Error::InvalidRequest(
                "Username, password, and role are required fields",
            ));
        };

        self.validate_username(&username)?;
        validate_password(&password)?;

        let password_hash = password::hash(&password, self.bcrypt_cost).await?;

        match sqlx::query(
            "INSERT INTO admins (username, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, role;",
        )
        .bind(&username)
        .bind(&password_hash)
        .bind(role.as_str())
        .try_map(map_admin)
        .fetch_one(&self.pool)
        .await
        {
            Ok(admin) => Ok(admin),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(Error::AdminAlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Partial update. A new password or role revokes the admin's refresh token.
    pub(crate) async fn update(&self, id: i32, data: UpdateAdminData) -> Result<AdminSummary, Error> {
        if data.username.is_none() && data.password.is_none() && data.role.is_none() {
            return Err(Error::InvalidRequest("Nothing to update"));
        }

        if let Some(username) = &data.username {
            self.validate_username(username)?;
        }

        let password_hash = match &data.password {
            Some(password) => {
                validate_password(password)?;
                Some(password::hash(password, self.bcrypt_cost).await?)
            }
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        let admin = match sqlx::query(
            "UPDATE admins SET
                username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash),
                role = COALESCE($4, role)
            WHERE id = $1
            RETURNING id, username, role;",
        )
        .bind(id)
        .bind(&data.username)
        .bind(&password_hash)
        .bind(data.role.map(|role| role.as_str()))
        .try_map(map_admin)
        .fetch_optional(&mut *tx)
        .await
        {
            Ok(Some(admin)) => admin,
            Ok(None) => return Err(Error::AdminNotFound),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(Error::AdminAlreadyExists);
            }
            Err(e) => return Err(e.into()),
        };

        if revokes_sessions(&data) {
            sqlx::query("DELETE FROM refresh_tokens WHERE admin_id = $1;")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(admin)
    }

    pub(crate) async fn delete(&self, id: i32) -> Result<(), Error> {
        let admin = self.get(id).await?;

        if admin.role.is_superuser() {
            return Err(Error::SuperAdminCannotBeDeleted);
        }

        let result = sqlx::query("DELETE FROM admins WHERE id = $1 AND role <> 'super_admin';")
            .bind(id)
            .execute(&self.pool)
            .await?;

        match result.rows_affected() {
            0 => Err(Error::AdminNotFound),
            _ => Ok(()),
        }
    }

    /// Creates the initial super admin unless the username is taken. Returns true if created.
    pub(crate) async fn seed_super_admin(&self, username: &str, password: &str) -> Result<bool, Error> {
        self.validate_username(username)?;
        validate_password(password)?;

        let password_hash = password::hash(password, self.bcrypt_cost).await?;

        let result = sqlx::query(
            "INSERT INTO admins (username, password_hash, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO NOTHING;",
        )
        .bind(username)
        .bind(&password_hash)
        .bind(Role::SuperAdmin.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    fn validate_username(&self, username: &str) -> Result<(), Error> {
        if !self.username_pattern.is_match(username) {
            return Err(Error::InvalidRequest(
                "Username must be 3-32 letters, digits, '_' or '-'",
            ));
        }

        Ok(())
    }
}

/// A new password or role ends the admin's current session.
fn revokes_sessions(data: &UpdateAdminData) -> bool {
    data.password.is_some() || data.role.is_some()
}

fn validate_password(password: &str) -> Result<(), Error> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(Error::InvalidRequest(
            "Password must be at least 8 characters",
        ));
    }

    Ok(())
}

fn map_admin(row: PgRow) -> Result<AdminSummary, sqlx::Error> {
    let role: String = row.try_get("role")?;

    Ok(AdminSummary {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        role: role.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
    })
}
