pub mod avatar;
pub mod config;
pub mod domain;
pub mod errors;
pub mod svg;

pub use avatar::{fetch_profile_image, AvatarError, AvatarSource};
pub use domain::customer::{Customer, CustomerId, CustomerRequest};
pub use domain::patch::{apply_patch, PatchOperation, PatchOutcome};
pub use domain::validation::{validate_request, ValidCustomerFields};
pub use errors::{ApplicationError, DomainError};
pub use svg::sanitize_svg;
