use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "flust=info,flust_engine=info,flust_plugins=info";

/// Installs a fmt subscriber filtered by `RUST_LOG`, or by
/// [`DEFAULT_LOG_FILTER`] when unset or unparsable. Does nothing if a global
/// subscriber already exists.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .ok();
}

fn default_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_LOG_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_covers_workspace_crates() {
        let directives = default_filter().to_string();
        for target in ["flust=info", "flust_engine=info", "flust_plugins=info"] {
            assert!(directives.contains(target), "{directives} lacks {target}");
        }
    }

    #[test]
    fn init_twice_is_harmless() {
        init();
        init();
    }
}
