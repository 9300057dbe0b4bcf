use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use clientele_core::domain::customer::{Customer, CustomerId};

pub mod customer;
pub mod memory;

pub use customer::SqlCustomerRepository;
pub use memory::InMemoryCustomerRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Storage for customer records.
///
/// `update` and `remove` report whether a record with the given id existed.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn create(&self, customer: Customer) -> Result<(), RepositoryError>;
    async fn list_all(&self) -> Result<Vec<Customer>, RepositoryError>;
    /// Customers who are exactly `age` completed years old on `today`.
    async fn find_by_age(
        &self,
        age: u32,
        today: NaiveDate,
    ) -> Result<Vec<Customer>, RepositoryError>;
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError>;
    async fn update(&self, customer: Customer) -> Result<bool, RepositoryError>;
    async fn remove(&self, id: &CustomerId) -> Result<bool, RepositoryError>;
}
