use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use clientele_core::avatar::{fetch_profile_image, AvatarSource};
use clientele_core::domain::customer::{Customer, CustomerId, CustomerRequest};
use clientele_core::domain::patch::{apply_patch, PatchOperation};
use clientele_core::domain::validation::validate_request;
use clientele_core::errors::{
    ApplicationError, DomainError, CUSTOMERS_BY_AGE_NOT_FOUND, CUSTOMER_NOT_FOUND,
    INVALID_CUSTOMER_ID, INVALID_ID_OR_AGE,
};
use clientele_db::repositories::{CustomerRepository, RepositoryError};
use tracing::info;

/// Result of resolving a `{idOrAge}` path token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CustomerLookup {
    Single(Customer),
    ByAge(Vec<Customer>),
}

#[derive(Clone)]
pub struct CustomerService {
    repository: Arc<dyn CustomerRepository>,
    avatars: Arc<dyn AvatarSource>,
}

fn persistence(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

/// Parses a customer id path or query value. Nil ids are treated as absent.
pub fn parse_customer_id(raw: &str) -> Result<CustomerId, DomainError> {
    match raw.parse::<CustomerId>() {
        Ok(id) if !id.is_nil() => Ok(id),
        _ => Err(DomainError::MalformedIdentifier(INVALID_CUSTOMER_ID.to_string())),
    }
}

/// `[+-]?[0-9]+`, regardless of magnitude.
fn is_integer(token: &str) -> bool {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}

impl CustomerService {
    pub fn new(repository: Arc<dyn CustomerRepository>, avatars: Arc<dyn AvatarSource>) -> Self {
        Self { repository, avatars }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    pub async fn list_all(&self) -> Result<Vec<Customer>, ApplicationError> {
        self.repository.list_all().await.map_err(persistence)
    }

    /// Integers are ages, then UUIDs are ids; anything else is malformed.
    pub async fn lookup(&self, token: &str) -> Result<CustomerLookup, ApplicationError> {
        let token = token.trim();

        if is_integer(token) {
            // Negative or overflowing ages are still ages; nobody matches them.
            let customers = match token.parse::<u32>() {
                Ok(age) => {
                    self.repository.find_by_age(age, Self::today()).await.map_err(persistence)?
                }
                Err(_) => Vec::new(),
            };
            if customers.is_empty() {
                return Err(ApplicationError::not_found(CUSTOMERS_BY_AGE_NOT_FOUND));
            }
            return Ok(CustomerLookup::ByAge(customers));
        }

        let id = token
            .parse::<CustomerId>()
            .map_err(|_| DomainError::MalformedIdentifier(INVALID_ID_OR_AGE.to_string()))?;
        self.find_by_id(&id).await.map(CustomerLookup::Single)
    }

    pub async fn find_by_id(&self, id: &CustomerId) -> Result<Customer, ApplicationError> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(persistence)?
            .ok_or_else(|| ApplicationError::not_found(CUSTOMER_NOT_FOUND))
    }

    /// Validates, fetches the avatar, then persists. Nothing is stored when
    /// the avatar cannot be fetched.
    pub async fn create(&self, request: CustomerRequest) -> Result<Customer, ApplicationError> {
        let fields = validate_request(&request, Self::today())?;
        let profile_image = fetch_profile_image(self.avatars.as_ref(), &fields.name).await?;

        let customer = Customer {
            id: CustomerId::new(),
            name: fields.name,
            date_of_birth: fields.date_of_birth,
            profile_image,
        };
        self.repository.create(customer.clone()).await.map_err(persistence)?;

        info!(
            event_name = "customer.created",
            customer_id = %customer.id,
            "customer created"
        );
        Ok(customer)
    }

    /// Applies a patch document to the stored record. The avatar is fetched
    /// again only when the name changed, ignoring case.
    pub async fn update(
        &self,
        id: &CustomerId,
        operations: &[PatchOperation],
    ) -> Result<Customer, ApplicationError> {
        let existing = self.find_by_id(id).await?;
        let outcome = apply_patch(&existing.to_request(), operations)?;
        let fields = validate_request(&outcome.request, Self::today())?;

        let profile_image = if outcome.name_changed {
            fetch_profile_image(self.avatars.as_ref(), &fields.name).await?
        } else {
            existing.profile_image.clone()
        };

        let updated = Customer {
            id: existing.id,
            name: fields.name,
            date_of_birth: fields.date_of_birth,
            profile_image,
        };
        if !self.repository.update(updated.clone()).await.map_err(persistence)? {
            return Err(ApplicationError::not_found(CUSTOMER_NOT_FOUND));
        }

        info!(
            event_name = "customer.updated",
            customer_id = %updated.id,
            avatar_refreshed = outcome.name_changed,
            "customer updated"
        );
        Ok(updated)
    }

    pub async fn delete(&self, id: &CustomerId) -> Result<(), ApplicationError> {
        if id.is_nil() {
            return Err(DomainError::MalformedIdentifier(INVALID_CUSTOMER_ID.to_string()).into());
        }
        if !self.repository.remove(id).await.map_err(persistence)? {
            return Err(ApplicationError::not_found(CUSTOMER_NOT_FOUND));
        }

        info!(event_name = "customer.deleted", customer_id = %id, "customer deleted");
        Ok(())
    }
}
