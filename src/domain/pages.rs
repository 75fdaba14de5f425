use std::num::NonZeroU32;

use super::{error::DomainError, sections::Section, slug::validate_slug};

/// A public page addressed by section, listing position, or detail slug.
///
/// Construction validates every free-form segment, so a `PageRequest` can be
/// turned into a cache key or a content path without further checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    Home,
    Index {
        section: Section,
        page: NonZeroU32,
        category: Option<String>,
    },
    Detail {
        section: Section,
        slug: String,
    },
}

impl PageRequest {
    /// Section listing. The home section has a single index, so paging and
    /// filtering it is rejected.
    pub fn index(
        section: Section,
        page: Option<u32>,
        category: Option<&str>,
    ) -> Result<Self, DomainError> {
        let page = match page {
            Some(value) => NonZeroU32::new(value)
                .ok_or_else(|| DomainError::validation("page numbers start at 1"))?,
            None => NonZeroU32::MIN,
        };

        let category = match category {
            Some(value) => Some(
                validate_slug(value)
                    .map_err(|err| DomainError::validation(err.to_string()))?
                    .to_string(),
            ),
            None => None,
        };

        if section == Section::Home {
            if page != NonZeroU32::MIN || category.is_some() {
                return Err(DomainError::validation(
                    "the home page does not support paging or categories",
                ));
            }
            return Ok(PageRequest::Home);
        }

        Ok(PageRequest::Index {
            section,
            page,
            category,
        })
    }

    pub fn detail(section: Section, slug: &str) -> Result<Self, DomainError> {
        if section == Section::Home {
            return Err(DomainError::validation("the home page has no detail pages"));
        }
        let slug = validate_slug(slug).map_err(|err| DomainError::validation(err.to_string()))?;
        Ok(PageRequest::Detail {
            section,
            slug: slug.to_string(),
        })
    }

    pub fn section(&self) -> Section {
        match self {
            PageRequest::Home => Section::Home,
            PageRequest::Index { section, .. } | PageRequest::Detail { section, .. } => *section,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_defaults_to_first_page() {
        let request = PageRequest::index(Section::Blog, None, None).expect("valid");
        assert_eq!(
            request,
            PageRequest::Index {
                section: Section::Blog,
                page: NonZeroU32::MIN,
                category: None,
            }
        );
    }

    #[test]
    fn index_rejects_page_zero() {
        assert!(PageRequest::index(Section::Blog, Some(0), None).is_err());
    }

    #[test]
    fn index_rejects_unnormalized_category() {
        assert!(PageRequest::index(Section::Products, None, Some("X Rays")).is_err());
    }

    #[test]
    fn home_index_collapses_to_home() {
        assert_eq!(
            PageRequest::index(Section::Home, None, None),
            Ok(PageRequest::Home)
        );
        assert!(PageRequest::index(Section::Home, Some(2), None).is_err());
    }

    #[test]
    fn detail_validates_slug() {
        assert!(PageRequest::detail(Section::Blog, "my-slug").is_ok());
        assert!(PageRequest::detail(Section::Blog, "../etc").is_err());
        assert!(PageRequest::detail(Section::Home, "anything").is_err());
    }

    #[test]
    fn section_is_reported_for_every_variant() {
        assert_eq!(PageRequest::Home.section(), Section::Home);
        let detail = PageRequest::detail(Section::Solutions, "imaging").expect("valid");
        assert_eq!(detail.section(), Section::Solutions);
    }
}
