/// Version of the running software
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: String,
    /// Commit identifier used to suffix side-by-side versioned install paths
    pub commit_id: String,
}

impl VersionInfo {
    pub fn new(version: impl Into<String>, commit_id: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            commit_id: commit_id.into(),
        }
    }

    /// Version baked in at build time; `KEEL_COMMIT_ID` overrides the commit id.
    pub fn current() -> Self {
        let version = env!("CARGO_PKG_VERSION");
        Self::new(version, option_env!("KEEL_COMMIT_ID").unwrap_or(version))
    }
}
