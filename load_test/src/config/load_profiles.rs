use std::time::Duration;

/// Virtual-user count and run length for a named load level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProfile {
    pub name: &'static str,
    pub vus: usize,
    pub duration: Duration,
    pub graceful_stop: Duration,
}

pub const PROFILE_NAMES: [&str; 3] = ["smoke", "load", "stress"];

/// Get load profile by name
pub fn get_load_profile(profile: &str) -> LoadProfile {
    match profile {
        "smoke" => smoke_profile(),
        "load" => load_profile(),
        "stress" => stress_profile(),
        _ => {
            tracing::warn!("Unknown profile '{}', using 'load' profile", profile);
            load_profile()
        }
    }
}

/// Smoke profile for checking the corpus and endpoint wiring
///
/// - 1 virtual user
/// - 30 seconds
pub fn smoke_profile() -> LoadProfile {
    LoadProfile {
        name: "smoke",
        vus: 1,
        duration: Duration::from_secs(30),
        graceful_stop: Duration::from_secs(30),
    }
}

/// Default profile for regular load runs
///
/// - 10 virtual users
/// - 5 minutes
pub fn load_profile() -> LoadProfile {
    LoadProfile {
        name: "load",
        vus: 10,
        duration: Duration::from_secs(300),
        graceful_stop: Duration::from_secs(30),
    }
}

/// Stress profile for saturating the engine
///
/// - 50 virtual users
/// - 10 minutes
/// - Longer grace period since queued algorithms take a while to drain
pub fn stress_profile() -> LoadProfile {
    LoadProfile {
        name: "stress",
        vus: 50,
        duration: Duration::from_secs(600),
        graceful_stop: Duration::from_secs(120),
    }
}
