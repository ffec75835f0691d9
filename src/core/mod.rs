pub mod error;
pub mod tag;
pub mod types;

pub use error::{BoxError, MigrateError, Result};
pub use tag::{contains_whitespace, is_null_tag, validate_tag};
pub use types::{Direction, NULL_TAG, Position};
