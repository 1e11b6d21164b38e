mod helpers;
pub mod op;
mod secret;
mod shillings;

pub use helpers::{parse_boolean_flag, parse_env};
pub use secret::Secret;
pub use shillings::{Shillings, ShillingsConversionError, TZS_CURRENCY_CODE};
