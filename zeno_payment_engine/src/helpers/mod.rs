mod phone;
mod slug;

pub use phone::{normalize_phone_number, MOBILE_NUMBER_PATTERN};
pub use slug::slugify;
