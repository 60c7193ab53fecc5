use regex::Regex;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::controllers::contains_pattern;
use crate::core::error::{self, Error};
use crate::types::request::PageParams;
use crate::types::user::{User, UserFields};

const USER_COLUMNS: &str = "id, first_name, last_name, phone_number, blocked, gender, \
    registration_date, date_of_birth, location, email, profile_photo_url";

#[derive(Clone)]
pub(crate) struct UserController {
    pool: PgPool,
    phone_pattern: Regex,
}

impl std::fmt::Debug for UserController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserController")
            .field("phone_pattern", &self.phone_pattern.as_str())
            .finish()
    }
}

impl UserController {
    pub(crate) fn new(pool: PgPool) -> Result<Self, error::ConfigError> {
        Ok(Self {
            pool,
            phone_pattern: Regex::new(r"^\+993\d{8}$")?,
        })
    }

    pub(crate) async fn list(&self, params: &PageParams) -> Result<Vec<User>, Error> {
        Ok(sqlx::query(&format!(
            "SELECT {} FROM users ORDER BY id LIMIT $1 OFFSET $2;",
            USER_COLUMNS
        ))
        .bind(params.page_size())
        .bind(params.offset())
        .map(map_user)
        .fetch_all(&self.pool)
        .await?)
    }

    pub(crate) async fn search(&self, query: &str, params: &PageParams) -> Result<Vec<User>, Error> {
        Ok(sqlx::query(&format!(
            "SELECT {} FROM users
            WHERE first_name ILIKE $1 ESCAPE '\\'
                OR last_name ILIKE $1 ESCAPE '\\'
                OR phone_number ILIKE $1 ESCAPE '\\'
                OR email ILIKE $1 ESCAPE '\\'
            ORDER BY id
            LIMIT $2 OFFSET $3;",
            USER_COLUMNS
        ))
        .bind(contains_pattern(query))
        .bind(params.page_size())
        .bind(params.offset())
        .map(map_user)
        .fetch_all(&self.pool)
        .await?)
    }

    pub(crate) async fn get(&self, id: i32) -> Result<User, Error> {
        sqlx::query(&format!("SELECT {} FROM users WHERE id = $1;", USER_COLUMNS))
            .bind(id)
            .map(map_user)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::UserNotFound)
    }

    pub(crate) async fn create(&self, fields: UserFields) -> Result<User, Error> {
        let phone_number = fields
            .phone_number
            .as_deref()
            .ok_or(Error::InvalidRequest("Phone number is required"))?;
        self.validate_phone_number(phone_number)?;

        let query = format!(
            "INSERT INTO users (first_name, last_name, phone_number, gender, date_of_birth,
                location, email, profile_photo_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {};",
            USER_COLUMNS
        );

        match sqlx::query(&query)
            .bind(&fields.first_name)
            .bind(&fields.last_name)
            .bind(phone_number)
            .bind(&fields.gender)
            .bind(fields.date_of_birth)
            .bind(&fields.location)
            .bind(&fields.email)
            .bind(&fields.profile_photo_url)
            .map(map_user)
            .fetch_one(&self.pool)
            .await
        {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(Error::UserAlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Only the provided fields change.
    pub(crate) async fn update(&self, id: i32, fields: UserFields) -> Result<User, Error> {
        if let Some(phone_number) = &fields.phone_number {
            self.validate_phone_number(phone_number)?;
        }

        let query = format!(
            "UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone_number = COALESCE($4, phone_number),
                gender = COALESCE($5, gender),
                date_of_birth = COALESCE($6, date_of_birth),
                location = COALESCE($7, location),
                email = COALESCE($8, email),
                profile_photo_url = COALESCE($9, profile_photo_url)
            WHERE id = $1
            RETURNING {};",
            USER_COLUMNS
        );

        match sqlx::query(&query)
            .bind(id)
            .bind(&fields.first_name)
            .bind(&fields.last_name)
            .bind(&fields.phone_number)
            .bind(&fields.gender)
            .bind(fields.date_of_birth)
            .bind(&fields.location)
            .bind(&fields.email)
            .bind(&fields.profile_photo_url)
            .map(map_user)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(Error::UserNotFound),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(Error::UserAlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) async fn delete(&self, id: i32) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1;")
            .bind(id)
            .execute(&self.pool)
            .await?;

        match result.rows_affected() {
            0 => Err(Error::UserNotFound),
            _ => Ok(()),
        }
    }

    pub(crate) async fn set_blocked(&self, id: i32, blocked: bool) -> Result<User, Error> {
        sqlx::query(&format!(
            "UPDATE users SET blocked = $2 WHERE id = $1 RETURNING {};",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(blocked)
        .map(map_user)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::UserNotFound)
    }

    fn validate_phone_number(&self, phone_number: &str) -> Result<(), Error> {
        if !self.phone_pattern.is_match(phone_number) {
            return Err(Error::InvalidRequest("Invalid phone number format"));
        }

        Ok(())
    }
}

fn map_user(row: PgRow) -> User {
    User {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        phone_number: row.get("phone_number"),
        blocked: row.get("blocked"),
        gender: row.get("gender"),
        registration_date: row.get("registration_date"),
        date_of_birth: row.get("date_of_birth"),
        location: row.get("location"),
        email: row.get("email"),
        profile_photo_url: row.get("profile_photo_url"),
    }
}
