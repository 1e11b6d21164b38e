/// Lowercases `title` and joins its alphanumeric runs with hyphens, e.g. `"Hello, World!"` -> `"hello-world"`.
pub fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod test {
    use super::slugify;

    #[test]
    fn slugs() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Mobile   money in 2024 "), "mobile-money-in-2024");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify("Già fatto"), "già-fatto");
    }
}
