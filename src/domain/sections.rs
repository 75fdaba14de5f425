//! Public site sections.
//!
//! Every public page belongs to exactly one section. The section slug is both
//! the first URL segment and the second segment of the page cache key, so
//! invalidating `page:<section>` drops everything rendered for it.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    Home,
    About,
    Products,
    Blog,
    CaseStudies,
    Solutions,
    Whitepapers,
    Partners,
    Contact,
}

impl Section {
    pub const ALL: [Section; 9] = [
        Section::Home,
        Section::About,
        Section::Products,
        Section::Blog,
        Section::CaseStudies,
        Section::Solutions,
        Section::Whitepapers,
        Section::Partners,
        Section::Contact,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Home => "home",
            Section::About => "about",
            Section::Products => "products",
            Section::Blog => "blog",
            Section::CaseStudies => "case-studies",
            Section::Solutions => "solutions",
            Section::Whitepapers => "whitepapers",
            Section::Partners => "partners",
            Section::Contact => "contact",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == value)
            .ok_or_else(|| DomainError::unknown_section(value))
    }
}
