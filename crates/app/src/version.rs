use std::fmt;

/// Build metadata captured by `build.rs`.
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub repo_version: &'static str,
    pub build_profile: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
    pub target: &'static str,
}

impl BuildInfo {
    pub const fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            repo_version: env!("REPO_VERSION"),
            build_profile: env!("BUILD_PROFILE"),
            build_timestamp: env!("BUILD_TIMESTAMP"),
            rust_version: env!("RUST_VERSION"),
            target: env!("BUILD_TARGET"),
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chunkvault {} ({})\n\
             - profile: {}\n\
             - built: {}\n\
             - rustc: {}\n\
             - target: {}",
            self.version,
            self.repo_version,
            self.build_profile,
            self.build_timestamp,
            self.rust_version,
            self.target
        )
    }
}
