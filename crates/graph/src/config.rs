use serde::{Deserialize, Serialize};

/// Default toggle/limit profiles by snapshot size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeProfile {
    Tiny,
    Small,
    Medium,
    Large,
}

impl SizeProfile {
    pub fn for_node_count(n: usize) -> Self {
        match n {
            0..=50 => SizeProfile::Tiny,
            51..=250 => SizeProfile::Small,
            251..=1000 => SizeProfile::Medium,
            _ => SizeProfile::Large,
        }
    }

    /// Parallelism bound for the Phase 2 worker.
    pub fn max_workers(self) -> usize {
        match self {
            SizeProfile::Tiny | SizeProfile::Small => 1,
            SizeProfile::Medium => 2,
            SizeProfile::Large => 4,
        }
    }
}

/// Which Phase 2 metrics to compute, and their limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub enable_pagerank: bool,
    pub enable_betweenness: bool,
    pub enable_eigenvector: bool,
    pub enable_hits: bool,
    pub enable_core_number: bool,
    pub enable_articulation: bool,
    pub enable_cycles: bool,
    pub enable_critical_path: bool,
    /// Upper bound on retained cycle representatives.
    pub cycle_limit: usize,
    pub size_profile: SizeProfile,
}

impl AnalysisConfig {
    /// Everything on. Used by reports that must include centralities
    /// and by most tests.
    pub fn full() -> Self {
        Self {
            enable_pagerank: true,
            enable_betweenness: true,
            enable_eigenvector: true,
            enable_hits: true,
            enable_core_number: true,
            enable_articulation: true,
            enable_cycles: true,
            enable_critical_path: true,
            cycle_limit: 50,
            size_profile: SizeProfile::Tiny,
        }
    }

    /// Defaults scaled to the snapshot size. Johnson cycle search and
    /// Brandes betweenness are the first to go as graphs grow.
    pub fn for_size(n: usize) -> Self {
        let profile = SizeProfile::for_node_count(n);
        match profile {
            SizeProfile::Tiny => Self {
                size_profile: profile,
                ..Self::full()
            },
            SizeProfile::Small => Self {
                cycle_limit: 25,
                size_profile: profile,
                ..Self::full()
            },
            SizeProfile::Medium => Self {
                cycle_limit: 10,
                size_profile: profile,
                ..Self::full()
            },
            SizeProfile::Large => Self {
                enable_betweenness: false,
                enable_cycles: false,
                cycle_limit: 10,
                size_profile: profile,
                ..Self::full()
            },
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_profiles_cover_ranges() {
        assert_eq!(SizeProfile::for_node_count(0), SizeProfile::Tiny);
        assert_eq!(SizeProfile::for_node_count(51), SizeProfile::Small);
        assert_eq!(SizeProfile::for_node_count(500), SizeProfile::Medium);
        assert_eq!(SizeProfile::for_node_count(5000), SizeProfile::Large);
    }

    #[test]
    fn large_profile_disables_expensive_metrics() {
        let config = AnalysisConfig::for_size(10_000);
        assert!(!config.enable_betweenness);
        assert!(!config.enable_cycles);
        assert!(config.enable_pagerank);
    }
}
