use once_cell::sync::Lazy;
use regex::Regex;

/// Tanzanian mobile numbers, in local (`07..`) or international (`+2557..`, `2557..`) form.
pub const MOBILE_NUMBER_PATTERN: &str = r"^(?:\+?255|0)[67]\d{8}$";

static MOBILE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(MOBILE_NUMBER_PATTERN).unwrap());

/// Strips whitespace from `phone` and returns it if it is a valid mobile number.
pub fn normalize_phone_number(phone: &str) -> Option<String> {
    let phone = phone.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    MOBILE_NUMBER.is_match(&phone).then_some(phone)
}
