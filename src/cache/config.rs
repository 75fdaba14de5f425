//! Page cache configuration.
//!
//! Controls whether public pages are served from the cache, how long each
//! section's renders stay fresh, and how often expired entries are swept.

use std::{collections::HashMap, time::Duration};

use crate::domain::sections::Section;

const DEFAULT_TTL_SECONDS: i64 = 600;
const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;

/// Default freshness per section. Content edited often (home, blog) stays
/// fresh for five minutes; near-static pages for thirty.
const DEFAULT_SECTION_TTLS: [(Section, i64); 9] = [
    (Section::Home, 300),
    (Section::Blog, 300),
    (Section::Products, 600),
    (Section::Solutions, 900),
    (Section::CaseStudies, 900),
    (Section::Whitepapers, 1800),
    (Section::Partners, 1800),
    (Section::About, 1800),
    (Section::Contact, 1800),
];

/// Runtime cache policy, built from the validated `[cache]` settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Serve public pages through the page cache.
    pub enabled: bool,
    /// TTL for sections without an explicit entry. Zero or negative never expires.
    pub default_ttl_seconds: i64,
    /// Per-section TTL overrides.
    pub section_ttl_seconds: HashMap<Section, i64>,
    /// Interval between expired-entry sweeps; zero disables the sweeper.
    pub sweep_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
            section_ttl_seconds: HashMap::from(DEFAULT_SECTION_TTLS),
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECONDS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        let mut section_ttl_seconds = HashMap::from(DEFAULT_SECTION_TTLS);
        section_ttl_seconds.extend(settings.section_ttl_seconds.iter().map(|(k, v)| (*k, *v)));

        Self {
            enabled: settings.enabled,
            default_ttl_seconds: settings.default_ttl_seconds,
            section_ttl_seconds,
            sweep_interval_seconds: settings
                .sweep_interval
                .map(|interval| interval.as_secs())
                .unwrap_or(0),
        }
    }
}

impl CacheConfig {
    /// TTL in seconds applied to renders of `section`.
    pub fn ttl_for(&self, section: Section) -> i64 {
        self.section_ttl_seconds
            .get(&section)
            .copied()
            .unwrap_or(self.default_ttl_seconds)
    }

    /// Sweep cadence, or `None` when sweeping is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_seconds > 0).then(|| Duration::from_secs(self.sweep_interval_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.default_ttl_seconds, 600);
        assert_eq!(config.sweep_interval_seconds, 60);
        assert_eq!(config.section_ttl_seconds.len(), Section::ALL.len());
    }

    #[test]
    fn default_section_ttls_stay_between_five_and_thirty_minutes() {
        let config = CacheConfig::default();
        for section in Section::ALL {
            let ttl = config.ttl_for(section);
            assert!((300..=1800).contains(&ttl), "{section}: {ttl}");
        }
    }

    #[test]
    fn ttl_falls_back_to_default() {
        let config = CacheConfig {
            default_ttl_seconds: 42,
            section_ttl_seconds: HashMap::new(),
            ..Default::default()
        };
        assert_eq!(config.ttl_for(Section::Blog), 42);
    }

    #[test]
    fn built_from_validated_settings() {
        let settings = crate::config::CacheSettings {
            enabled: false,
            default_ttl_seconds: 90,
            section_ttl_seconds: HashMap::from([(Section::Blog, 30)]),
            sweep_interval: None,
        };

        let config = CacheConfig::from(&settings);
        assert!(!config.enabled);
        assert_eq!(config.ttl_for(Section::Blog), 30);
        assert_eq!(config.ttl_for(Section::Products), 600);
        assert_eq!(config.sweep_interval(), None);
    }

    #[test]
    fn section_override_wins() {
        let mut config = CacheConfig::default();
        config.section_ttl_seconds.insert(Section::Blog, 0);
        assert_eq!(config.ttl_for(Section::Blog), 0);
        assert_eq!(config.ttl_for(Section::Products), 600);
    }

    #[test]
    fn zero_interval_disables_sweeper() {
        let config = CacheConfig {
            sweep_interval_seconds: 0,
            ..Default::default()
        };
        assert!(config.sweep_interval().is_none());
        assert_eq!(
            CacheConfig::default().sweep_interval(),
            Some(Duration::from_secs(60))
        );
    }
}
