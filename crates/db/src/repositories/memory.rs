use chrono::NaiveDate;
use tokio::sync::RwLock;

use clientele_core::domain::customer::{completed_years, Customer, CustomerId};

use super::{CustomerRepository, RepositoryError};

/// Insertion-ordered customer store for tests and local runs.
#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<Vec<Customer>>,
}

#[async_trait::async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn create(&self, customer: Customer) -> Result<(), RepositoryError> {
        let mut customers = self.customers.write().await;
        if customers.iter().any(|existing| existing.id == customer.id) {
            return Err(RepositoryError::Decode(format!("duplicate customer id {}", customer.id)));
        }
        customers.push(customer);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.clone())
    }

    async fn find_by_age(
        &self,
        age: u32,
        today: NaiveDate,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers
            .iter()
            .filter(|customer| completed_years(customer.date_of_birth, today) == Some(age))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.iter().find(|customer| customer.id == *id).cloned())
    }

    async fn update(&self, customer: Customer) -> Result<bool, RepositoryError> {
        let mut customers = self.customers.write().await;
        match customers.iter_mut().find(|existing| existing.id == customer.id) {
            Some(existing) => {
                *existing = customer;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, id: &CustomerId) -> Result<bool, RepositoryError> {
        let mut customers = self.customers.write().await;
        let before = customers.len();
        customers.retain(|customer| customer.id != *id);
        Ok(customers.len() != before)
    }
}
