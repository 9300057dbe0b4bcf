//! Customer HTTP routes.
//!
//! - `GET    /api/customers`             list every customer (204 when empty)
//! - `POST   /api/customers`             create from `{customerName, dateOfBirth}`
//! - `PATCH  /api/customers?id={id}`     apply a JSON patch document
//! - `GET    /api/customers/{idOrAge}`   integer age or customer id
//! - `DELETE /api/customers/{id}`        remove a customer

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use clientele_core::domain::customer::{Customer, CustomerRequest};
use clientele_core::domain::patch::PatchOperation;
use clientele_core::errors::{
    ApplicationError, DomainError, INVALID_CUSTOMER_ID, INVALID_ID_OR_AGE, MISSING_REQUEST_BODY,
};
use serde::{Deserialize, Serialize};

use crate::envelope::ApiResponse;
use crate::service::{parse_customer_id, CustomerLookup, CustomerService};

#[derive(Clone)]
pub struct CustomerState {
    service: CustomerService,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchParams {
    pub id: Option<String>,
}

/// Payload for `GET /api/customers/{idOrAge}`: one record for an id, a list
/// for an age.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LookupResult {
    Single(Customer),
    Many(Vec<Customer>),
}

pub fn router(service: CustomerService) -> Router {
    Router::new()
        .route("/api/customers", get(list_customers).post(create_customer).patch(update_customer))
        .route("/api/customers/{id_or_age}", get(get_customer).delete(delete_customer))
        .with_state(CustomerState { service })
}

fn body_error(rejection: JsonRejection) -> ApplicationError {
    let message = match rejection {
        JsonRejection::MissingJsonContentType(_) => MISSING_REQUEST_BODY.to_string(),
        other => other.body_text(),
    };
    DomainError::MissingRequest(message).into()
}

/// Path and query values that cannot be decoded are reported with the same
/// message as values that decode but do not parse.
fn identifier_error(message: &str) -> ApplicationError {
    DomainError::MalformedIdentifier(message.to_string()).into()
}

pub async fn list_customers(State(state): State<CustomerState>) -> ApiResponse<Vec<Customer>> {
    match state.service.list_all().await {
        Ok(customers) if customers.is_empty() => ApiResponse::no_content(),
        Ok(customers) => ApiResponse::ok(customers),
        Err(error) => error.into(),
    }
}

pub async fn get_customer(
    State(state): State<CustomerState>,
    id_or_age: Result<Path<String>, PathRejection>,
) -> ApiResponse<LookupResult> {
    let Ok(Path(id_or_age)) = id_or_age else {
        return identifier_error(INVALID_ID_OR_AGE).into();
    };

    match state.service.lookup(&id_or_age).await {
        Ok(CustomerLookup::Single(customer)) => ApiResponse::ok(LookupResult::Single(customer)),
        Ok(CustomerLookup::ByAge(customers)) => ApiResponse::ok(LookupResult::Many(customers)),
        Err(error) => error.into(),
    }
}

pub async fn create_customer(
    State(state): State<CustomerState>,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> ApiResponse<Customer> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return body_error(rejection).into(),
    };

    match state.service.create(request).await {
        Ok(customer) => ApiResponse::created(customer),
        Err(error) => error.into(),
    }
}

pub async fn update_customer(
    State(state): State<CustomerState>,
    params: Result<Query<PatchParams>, QueryRejection>,
    payload: Result<Json<Vec<PatchOperation>>, JsonRejection>,
) -> ApiResponse<Customer> {
    let Ok(Query(params)) = params else {
        return identifier_error(INVALID_CUSTOMER_ID).into();
    };
    let id = match parse_customer_id(params.id.as_deref().unwrap_or_default()) {
        Ok(id) => id,
        Err(error) => return ApplicationError::from(error).into(),
    };
    let Json(operations) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return body_error(rejection).into(),
    };

    match state.service.update(&id, &operations).await {
        Ok(customer) => ApiResponse::ok(customer),
        Err(error) => error.into(),
    }
}

pub async fn delete_customer(
    State(state): State<CustomerState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResponse<()> {
    let Ok(Path(id)) = id else {
        return identifier_error(INVALID_CUSTOMER_ID).into();
    };
    let id = match parse_customer_id(&id) {
        Ok(id) => id,
        Err(error) => return ApplicationError::from(error).into(),
    };

    match state.service.delete(&id).await {
        Ok(()) => ApiResponse::success(StatusCode::OK, None),
        Err(error) => error.into(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use clientele_core::avatar::AvatarError;
    use clientele_core::domain::customer::{Customer, CustomerId};
    use clientele_core::domain::validation::{
        EMPTY_DATE_OF_BIRTH, FUTURE_DATE_OF_BIRTH, INVALID_DATE_FORMAT, INVALID_NAME,
    };
    use clientele_core::errors::{
        CUSTOMERS_BY_AGE_NOT_FOUND, CUSTOMER_NOT_FOUND, INVALID_CUSTOMER_ID, INVALID_ID_OR_AGE,
        MISSING_REQUEST_BODY,
    };
    use clientele_db::repositories::{CustomerRepository, InMemoryCustomerRepository};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::router;
    use crate::service::tests::CountingAvatars;
    use crate::service::CustomerService;

    struct Harness {
        app: Router,
        repository: Arc<InMemoryCustomerRepository>,
        avatars: Arc<CountingAvatars>,
    }

    fn harness(avatars: CountingAvatars) -> Harness {
        let repository = Arc::new(InMemoryCustomerRepository::default());
        let avatars = Arc::new(avatars);
        let app = router(CustomerService::new(repository.clone(), avatars.clone()));
        Harness { app, repository, avatars }
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response =
            app.clone().oneshot(builder.body(body).expect("request")).await.expect("response");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    async fn create(app: &Router, name: &str, date_of_birth: &str) -> Customer {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/customers",
            Some(json!({ "customerName": name, "dateOfBirth": date_of_birth })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        serde_json::from_value(body["result"].clone()).expect("customer")
    }

    #[tokio::test]
    async fn list_is_no_content_when_empty() {
        let h = harness(CountingAvatars::default());

        let (status, body) = send(&h.app, Method::GET, "/api/customers", None).await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn create_returns_created_envelope_with_base64_svg() {
        let h = harness(CountingAvatars::default());

        let (status, body) = send(
            &h.app,
            Method::POST,
            "/api/customers",
            Some(json!({ "customerName": "John Doe", "dateOfBirth": "1981-09-09" })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["statusCode"], 201);
        assert_eq!(body["isSuccess"], true);
        assert_eq!(body["errorMessages"], json!([]));
        assert_eq!(body["result"]["customerName"], "John Doe");
        assert_eq!(body["result"]["dateOfBirth"], "1981-09-09");

        let image = body["result"]["profileImage"].as_str().expect("profile image");
        let svg = String::from_utf8(STANDARD.decode(image).expect("base64")).expect("utf8");
        assert_eq!(svg, "<svg><text>John Doe</text></svg>");

        let (status, body) = send(&h.app, Method::GET, "/api/customers", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn create_reports_every_validation_error() {
        let h = harness(CountingAvatars::default());

        let (status, body) = send(
            &h.app,
            Method::POST,
            "/api/customers",
            Some(json!({ "customerName": "123456789", "dateOfBirth": "08-12-1993" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["isSuccess"], false);
        assert_eq!(body["errorMessages"], json!([INVALID_NAME, INVALID_DATE_FORMAT]));
        assert_eq!(body["result"], Value::Null);
        assert_eq!(h.avatars.count(), 0);
        assert!(h.repository.list_all().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn create_reports_null_fields_through_the_validator() {
        let h = harness(CountingAvatars::default());

        let (status, body) = send(
            &h.app,
            Method::POST,
            "/api/customers",
            Some(json!({ "customerName": "J4ne", "dateOfBirth": null })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorMessages"], json!([INVALID_NAME, EMPTY_DATE_OF_BIRTH]));
        assert_eq!(h.avatars.count(), 0);

        let (status, body) = send(
            &h.app,
            Method::POST,
            "/api/customers",
            Some(json!({ "customerName": 42, "dateOfBirth": 19930812 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorMessages"], json!([INVALID_NAME, INVALID_DATE_FORMAT]));
    }

    #[tokio::test]
    async fn create_rejects_empty_and_future_dates() {
        let h = harness(CountingAvatars::default());

        let (_, empty) = send(
            &h.app,
            Method::POST,
            "/api/customers",
            Some(json!({ "customerName": "Mickey Mouse", "dateOfBirth": "" })),
        )
        .await;
        assert_eq!(empty["errorMessages"], json!([EMPTY_DATE_OF_BIRTH]));

        let (status, future) = send(
            &h.app,
            Method::POST,
            "/api/customers",
            Some(json!({ "customerName": "Mickey Mouse", "dateOfBirth": "2999-01-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(future["errorMessages"], json!([FUTURE_DATE_OF_BIRTH]));
    }

    #[tokio::test]
    async fn create_without_body_is_a_bad_request() {
        let h = harness(CountingAvatars::default());

        let (status, body) = send(&h.app, Method::POST, "/api/customers", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorMessages"], json!([MISSING_REQUEST_BODY]));
    }

    #[tokio::test]
    async fn avatar_outage_is_a_bad_gateway_and_nothing_is_stored() {
        let h = harness(CountingAvatars::failing(AvatarError::Timeout));

        let (status, body) = send(
            &h.app,
            Method::POST,
            "/api/customers",
            Some(json!({ "customerName": "John Doe", "dateOfBirth": "1981-09-09" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["isSuccess"], false);
        let message = body["errorMessages"][0].as_str().expect("message");
        assert!(message.starts_with("Exception Occured - "), "{message}");
        assert!(h.repository.list_all().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn non_svg_avatar_body_is_a_bad_gateway_and_nothing_is_stored() {
        let h = harness(CountingAvatars::replying("<html><body>rate limited</body></html>"));

        let (status, body) = send(
            &h.app,
            Method::POST,
            "/api/customers",
            Some(json!({ "customerName": "John Doe", "dateOfBirth": "1981-09-09" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["result"], Value::Null);
        assert!(h.repository.list_all().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn get_by_id_or_age_covers_every_branch() {
        let h = harness(CountingAvatars::default());
        let customer = create(&h.app, "John Doe", "1981-09-09").await;

        let (status, body) =
            send(&h.app, Method::GET, &format!("/api/customers/{}", customer.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["customerId"], customer.id.to_string());

        let age = customer.age_on(chrono::Utc::now().date_naive()).expect("age");
        let (status, body) =
            send(&h.app, Method::GET, &format!("/api/customers/{age}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"][0]["customerId"], customer.id.to_string());

        let (status, body) = send(&h.app, Method::GET, "/api/customers/3", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errorMessages"], json!([CUSTOMERS_BY_AGE_NOT_FOUND]));

        let (status, body) =
            send(&h.app, Method::GET, &format!("/api/customers/{}", CustomerId::new()), None)
                .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errorMessages"], json!([CUSTOMER_NOT_FOUND]));

        let (status, body) = send(&h.app, Method::GET, "/api/customers/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorMessages"], json!([INVALID_ID_OR_AGE]));

        let (status, body) = send(&h.app, Method::GET, "/api/customers/99999999999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errorMessages"], json!([CUSTOMERS_BY_AGE_NOT_FOUND]));
    }

    #[tokio::test]
    async fn undecodable_paths_and_queries_still_return_an_envelope() {
        let h = harness(CountingAvatars::default());

        let (status, body) = send(&h.app, Method::GET, "/api/customers/%FF", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["isSuccess"], false);
        assert_eq!(body["errorMessages"], json!([INVALID_ID_OR_AGE]));

        let (status, body) = send(&h.app, Method::DELETE, "/api/customers/%FF", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorMessages"], json!([INVALID_CUSTOMER_ID]));

        let id = CustomerId::new();
        let (status, body) = send(
            &h.app,
            Method::PATCH,
            &format!("/api/customers?id={id}&id={id}"),
            Some(json!([])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorMessages"], json!([INVALID_CUSTOMER_ID]));
    }

    #[tokio::test]
    async fn empty_patch_document_returns_the_record_unchanged() {
        let h = harness(CountingAvatars::default());
        let customer = create(&h.app, "John Doe", "1981-09-09").await;

        let (status, body) = send(
            &h.app,
            Method::PATCH,
            &format!("/api/customers?id={}", customer.id),
            Some(json!([])),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "{body}");
        let returned: Customer = serde_json::from_value(body["result"].clone()).expect("customer");
        assert_eq!(returned, customer);
        assert_eq!(h.avatars.count(), 1);
    }

    #[tokio::test]
    async fn patch_updates_fields_and_refreshes_avatar_on_rename() {
        let h = harness(CountingAvatars::default());
        let customer = create(&h.app, "John Doe", "1981-09-09").await;
        let uri = format!("/api/customers?id={}", customer.id);

        let (status, body) = send(
            &h.app,
            Method::PATCH,
            &uri,
            Some(json!([{ "op": "replace", "path": "/dateOfBirth", "value": "1982-03-04" }])),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["result"]["dateOfBirth"], "1982-03-04");
        assert_eq!(body["result"]["profileImage"], customer.profile_image.as_str());
        assert_eq!(h.avatars.count(), 1);

        let (status, body) = send(
            &h.app,
            Method::PATCH,
            &uri,
            Some(json!([{ "op": "replace", "path": "/customerName", "value": "Jane Doe" }])),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["result"]["customerName"], "Jane Doe");
        assert_eq!(h.avatars.count(), 2);
    }

    #[tokio::test]
    async fn patch_rejects_bad_ids_documents_and_results() {
        let h = harness(CountingAvatars::default());
        let customer = create(&h.app, "John Doe", "1981-09-09").await;
        let rename = json!([{ "op": "replace", "path": "/customerName", "value": "Jane Doe" }]);

        let (status, body) =
            send(&h.app, Method::PATCH, "/api/customers", Some(rename.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorMessages"], json!([INVALID_CUSTOMER_ID]));

        let (status, body) = send(
            &h.app,
            Method::PATCH,
            &format!("/api/customers?id={}", CustomerId::new()),
            Some(rename),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errorMessages"], json!([CUSTOMER_NOT_FOUND]));

        let uri = format!("/api/customers?id={}", customer.id);
        let (status, _) = send(
            &h.app,
            Method::PATCH,
            &uri,
            Some(json!([{ "op": "replace", "path": "/profileImage", "value": "x" }])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &h.app,
            Method::PATCH,
            &uri,
            Some(json!([{ "op": "replace", "path": "/customerName", "value": "J4ne" }])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorMessages"], json!([INVALID_NAME]));

        let stored = h.repository.find_by_id(&customer.id).await.expect("find");
        assert_eq!(stored, Some(customer));
        assert_eq!(h.avatars.count(), 1);
    }

    #[tokio::test]
    async fn delete_removes_once_and_validates_ids() {
        let h = harness(CountingAvatars::default());
        let customer = create(&h.app, "John Doe", "1981-09-09").await;
        let uri = format!("/api/customers/{}", customer.id);

        let (status, body) = send(&h.app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isSuccess"], true);
        assert_eq!(body["result"], Value::Null);

        let (status, _) = send(&h.app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &h.app,
            Method::DELETE,
            "/api/customers/00000000-0000-0000-0000-000000000000",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorMessages"], json!([INVALID_CUSTOMER_ID]));
    }
}
