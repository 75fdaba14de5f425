//! Page cache key definitions.
//!
//! Keys are colon-delimited and scoped by section so that a plain string
//! prefix (`page:<section>`) selects every rendered variant of a section:
//!
//! - `page:home`
//! - `page:<section>` (first page, unfiltered index)
//! - `page:<section>:page:<n>[:category:<slug>]`
//! - `page:<section>:<slug>` (detail)
//! - `preview:<section>:<slug>` (preview identity, never stored)

use crate::domain::{pages::PageRequest, sections::Section};

const PAGE_NAMESPACE: &str = "page";
const PREVIEW_NAMESPACE: &str = "preview";

/// Invalidation prefix covering every cached page of `section`.
pub fn section_prefix(section: Section) -> String {
    format!("{PAGE_NAMESPACE}:{section}")
}

/// Cache key for a public page render.
pub fn page_key(request: &PageRequest) -> String {
    match request {
        PageRequest::Home => section_prefix(Section::Home),
        PageRequest::Index {
            section,
            page,
            category,
        } => {
            let base = section_prefix(*section);
            match category {
                None if page.get() == 1 => base,
                None => format!("{base}:page:{page}"),
                Some(category) => format!("{base}:page:{page}:category:{category}"),
            }
        }
        PageRequest::Detail { section, slug } => format!("{}:{slug}", section_prefix(*section)),
    }
}

/// Identity of a preview render. Used for logging; previews are never cached.
pub fn preview_key(request: &PageRequest) -> String {
    let section = request.section();
    match request {
        PageRequest::Detail { slug, .. } => format!("{PREVIEW_NAMESPACE}:{section}:{slug}"),
        _ => format!("{PREVIEW_NAMESPACE}:{section}"),
    }
}
