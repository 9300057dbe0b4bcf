use chrono::{NaiveDate, Utc};
use sqlx::Row;

use clientele_core::domain::customer::{birth_date_range_for_age, Customer, CustomerId};

use super::{CustomerRepository, RepositoryError};
use crate::DbPool;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let date_of_birth_str: String =
        row.try_get("date_of_birth").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let profile_image: String =
        row.try_get("profile_image").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let id = id
        .parse::<CustomerId>()
        .map_err(|e| RepositoryError::Decode(format!("customer id `{id}`: {e}")))?;
    let date_of_birth = NaiveDate::parse_from_str(&date_of_birth_str, DATE_FORMAT).map_err(|e| {
        RepositoryError::Decode(format!("date of birth `{date_of_birth_str}`: {e}"))
    })?;

    Ok(Customer { id, name, date_of_birth, profile_image })
}

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn create(&self, customer: Customer) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO customer (id, name, date_of_birth, profile_image, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(customer.id.to_string())
        .bind(&customer.name)
        .bind(customer.date_of_birth.format(DATE_FORMAT).to_string())
        .bind(&customer.profile_image)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, name, date_of_birth, profile_image
             FROM customer ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_customer).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_age(
        &self,
        age: u32,
        today: NaiveDate,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let Some((earliest, latest)) = birth_date_range_for_age(age, today) else {
            return Ok(Vec::new());
        };

        // ISO dates compare correctly as text.
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, name, date_of_birth, profile_image
             FROM customer
             WHERE date_of_birth BETWEEN ? AND ?
             ORDER BY created_at ASC, rowid ASC",
        )
        .bind(earliest.format(DATE_FORMAT).to_string())
        .bind(latest.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_customer).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, date_of_birth, profile_image
             FROM customer WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_customer(r)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, customer: Customer) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE customer
             SET name = ?, date_of_birth = ?, profile_image = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&customer.name)
        .bind(customer.date_of_birth.format(DATE_FORMAT).to_string())
        .bind(&customer.profile_image)
        .bind(Utc::now().to_rfc3339())
        .bind(customer.id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, id: &CustomerId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM customer WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
