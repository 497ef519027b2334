use serde::Serialize;

#[derive(Debug, Serialize)]
struct Info {
    version: &'static str,
    commit: &'static str,
    build_time: &'static str,
    target: &'static str,
}

macro_rules! vergen_env {
    ($name:literal) => {
        match option_env!($name) {
            Some(v) => v,
            None => "unknown",
        }
    };
}

const INFO: Info = Info {
    version: env!("CARGO_PKG_VERSION"),
    commit: vergen_env!("VERGEN_GIT_SHA"),
    build_time: vergen_env!("VERGEN_BUILD_TIMESTAMP"),
    target: vergen_env!("VERGEN_CARGO_TARGET_TRIPLE"),
};

/// Banner printed to stderr when the plugin runs without CNI_COMMAND.
pub fn about() -> String {
    format!(
        "Chained CNI example {} (commit {}, built {} for {})",
        INFO.version, INFO.commit, INFO.build_time, INFO.target
    )
}

/// Build information as json, for the diagnostic log.
pub fn build_info() -> String {
    serde_json::to_string(&INFO).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_about() {
        let about = about();
        assert!(about.starts_with("Chained CNI example "), "{}", about);
        assert!(about.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_build_info() {
        let info: serde_json::Value = serde_json::from_str(&build_info()).unwrap();
        assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(info["commit"], vergen_env!("VERGEN_GIT_SHA"));
        assert_ne!(info["build_time"], "unknown");
        assert_ne!(info["target"], "unknown");
    }
}
