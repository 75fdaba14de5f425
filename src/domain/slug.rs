//! Slug validation for URL segments that end up inside cache keys and
//! content paths.
//!
//! A slug is accepted only when it is already in `slug` crate normal form:
//! lowercase ASCII alphanumerics separated by single dashes. That keeps key
//! segments free of `:` and content paths free of `/` or `..`.

use slug::slugify;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug is empty")]
    Empty,
    #[error("`{input}` is not a normalized slug (expected `{normalized}`)")]
    NotNormalized { input: String, normalized: String },
}

/// Accept `input` when it is a non-empty, already-normalized slug.
pub fn validate_slug(input: &str) -> Result<&str, SlugError> {
    if input.is_empty() {
        return Err(SlugError::Empty);
    }

    let normalized = slugify(input);
    if normalized != input {
        return Err(SlugError::NotNormalized {
            input: input.to_string(),
            normalized,
        });
    }

    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_normalized_slugs() {
        assert_eq!(validate_slug("my-slug"), Ok("my-slug"));
        assert_eq!(validate_slug("detectors"), Ok("detectors"));
        assert_eq!(validate_slug("x-ray-2024"), Ok("x-ray-2024"));
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(validate_slug(""), Err(SlugError::Empty));
    }

    #[test]
    fn rejects_path_traversal_and_separators() {
        assert!(validate_slug("../secrets").is_err());
        assert!(validate_slug("a/b").is_err());
        assert!(validate_slug("page:blog").is_err());
    }

    #[test]
    fn rejects_uppercase_and_spaces() {
        let err = validate_slug("My Slug").expect_err("not normalized");
        assert_eq!(
            err,
            SlugError::NotNormalized {
                input: "My Slug".to_string(),
                normalized: "my-slug".to_string(),
            }
        );
    }
}
