//! Patch documents against the customer request shape.
//!
//! The document is a JSON array of `{op, path, value}` operations. It is
//! applied to a copy of the current request projection; the caller validates
//! the merged result before anything is persisted.

use serde::Deserialize;
use serde_json::Value;

use super::customer::CustomerRequest;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    #[serde(default)]
    pub value: Option<Value>,
}

impl PatchOperation {
    pub fn replace(path: &str, value: impl Into<Value>) -> Self {
        Self { op: "replace".to_string(), path: path.to_string(), value: Some(value.into()) }
    }

    pub fn remove(path: &str) -> Self {
        Self { op: "remove".to_string(), path: path.to_string(), value: None }
    }

    pub fn test(path: &str, value: impl Into<Value>) -> Self {
        Self { op: "test".to_string(), path: path.to_string(), value: Some(value.into()) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PatchField {
    CustomerName,
    DateOfBirth,
}

impl PatchField {
    fn parse(path: &str) -> Result<Self, DomainError> {
        let normalized = path.trim().trim_start_matches('/').to_ascii_lowercase();
        match normalized.as_str() {
            "customername" => Ok(Self::CustomerName),
            "dateofbirth" => Ok(Self::DateOfBirth),
            "customerid" | "profileimage" => {
                Err(DomainError::InvalidPatch(format!("`{path}` cannot be modified")))
            }
            _ => Err(DomainError::InvalidPatch(format!("unknown path `{path}`"))),
        }
    }

    fn slot<'a>(&self, target: &'a mut CustomerRequest) -> &'a mut String {
        match self {
            Self::CustomerName => &mut target.customer_name,
            Self::DateOfBirth => &mut target.date_of_birth,
        }
    }
}

/// Field-level changes carried by a patch, after merging. An empty document
/// yields the current request unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchOutcome {
    pub request: CustomerRequest,
    pub name_changed: bool,
}

pub fn apply_patch(
    current: &CustomerRequest,
    operations: &[PatchOperation],
) -> Result<PatchOutcome, DomainError> {
    let mut candidate = current.clone();
    for operation in operations {
        let field = PatchField::parse(&operation.path)?;
        let slot = field.slot(&mut candidate);
        match operation.op.trim().to_ascii_lowercase().as_str() {
            "add" | "replace" => *slot = string_value(operation)?,
            "remove" => slot.clear(),
            "test" => {
                let expected = string_value(operation)?;
                if *slot != expected {
                    return Err(DomainError::InvalidPatch(format!(
                        "test failed for `{}`",
                        operation.path
                    )));
                }
            }
            other => {
                return Err(DomainError::InvalidPatch(format!("unsupported operation `{other}`")))
            }
        }
    }

    let name_changed =
        candidate.customer_name.to_lowercase() != current.customer_name.to_lowercase();
    Ok(PatchOutcome { request: candidate, name_changed })
}

fn string_value(operation: &PatchOperation) -> Result<String, DomainError> {
    match &operation.value {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(Value::Null) | None => Err(DomainError::InvalidPatch(format!(
            "operation on `{}` requires a value",
            operation.path
        ))),
        Some(_) => Err(DomainError::InvalidPatch(format!(
            "value for `{}` must be a string",
            operation.path
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{apply_patch, PatchOperation};
    use crate::domain::customer::CustomerRequest;
    use crate::errors::DomainError;

    fn current() -> CustomerRequest {
        CustomerRequest {
            customer_name: "John Doe".to_string(),
            date_of_birth: "1981-09-09".to_string(),
        }
    }

    #[test]
    fn replace_date_of_birth_keeps_name() {
        let outcome =
            apply_patch(&current(), &[PatchOperation::replace("/dateOfBirth", "1982-01-01")])
                .expect("patch");

        assert_eq!(outcome.request.customer_name, "John Doe");
        assert_eq!(outcome.request.date_of_birth, "1982-01-01");
        assert!(!outcome.name_changed);
    }

    #[test]
    fn name_change_is_detected_case_insensitively() {
        let same = apply_patch(&current(), &[PatchOperation::replace("/customerName", "JOHN DOE")])
            .expect("patch");
        assert!(!same.name_changed);
        assert_eq!(same.request.customer_name, "JOHN DOE");

        let renamed =
            apply_patch(&current(), &[PatchOperation::replace("/CustomerName", "Jane Doe")])
                .expect("patch");
        assert!(renamed.name_changed);
    }

    #[test]
    fn operations_apply_in_order_and_leave_input_untouched() {
        let input = current();
        let outcome = apply_patch(
            &input,
            &[
                PatchOperation::test("/customerName", "John Doe"),
                PatchOperation::remove("/customerName"),
                PatchOperation::replace("/customerName", "Donald Duck"),
            ],
        )
        .expect("patch");

        assert_eq!(outcome.request.customer_name, "Donald Duck");
        assert_eq!(input, current());
    }

    #[test]
    fn remove_clears_the_field() {
        let outcome =
            apply_patch(&current(), &[PatchOperation::remove("/dateOfBirth")]).expect("patch");
        assert_eq!(outcome.request.date_of_birth, "");
    }

    #[test]
    fn failed_test_aborts_the_patch() {
        let error = apply_patch(
            &current(),
            &[
                PatchOperation::test("/customerName", "Someone Else"),
                PatchOperation::replace("/customerName", "Jane Doe"),
            ],
        )
        .expect_err("test should fail");

        assert!(matches!(error, DomainError::InvalidPatch(message) if message.contains("test")));
    }

    #[test]
    fn rejects_server_managed_and_unknown_paths() {
        for path in ["/customerId", "/profileImage", "/nickname"] {
            let result = apply_patch(&current(), &[PatchOperation::replace(path, "x")]);
            assert!(matches!(result, Err(DomainError::InvalidPatch(_))), "{path} should fail");
        }
    }

    #[test]
    fn rejects_non_string_values_and_unknown_ops() {
        let numeric = apply_patch(&current(), &[PatchOperation::replace("/dateOfBirth", 1981)]);
        assert!(matches!(numeric, Err(DomainError::InvalidPatch(_))));

        let op: PatchOperation =
            serde_json::from_value(json!({ "op": "copy", "path": "/customerName", "from": "/x" }))
                .expect("deserialize");
        assert!(matches!(apply_patch(&current(), &[op]), Err(DomainError::InvalidPatch(_))));
    }

    #[test]
    fn empty_document_is_a_no_op() {
        let outcome = apply_patch(&current(), &[]).expect("patch");

        assert_eq!(outcome.request, current());
        assert!(!outcome.name_changed);
    }
}
