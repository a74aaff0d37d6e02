use crate::config::LogLevel;

macro_rules! define_log_targets {
    ($(($const_name:ident, $field_name:ident, $target_str:literal)),* $(,)?) => {
        $(
            pub const $const_name: &str = $target_str;
        )*

        pub const LOG_TARGETS: &[&str] = &[$($const_name),*];

        /// Level for `target`, falling back to the global level
        pub fn log_level_for(config: &crate::config::LogConfig, target: &str) -> LogLevel {
            match target {
                $(
                    $const_name => config.$field_name,
                )*
                _ => config.level,
            }
        }

        // Every target needs a `<name>_level` field on LogConfig,
        // this stops compiling when one is missing
        const _: fn() -> crate::config::LogConfig = || crate::config::LogConfig {
            ansi_enabled: true,
            format: crate::config::LogFormat::Pretty,
            output: crate::config::LogOutput::Stdout,
            level: LogLevel::Info,
            $(
                $field_name: LogLevel::Info,
            )*
        };
    };
}

define_log_targets!(
    (DEVELOPMENT, development_level, "development"),
    (API, api_level, "api"),
    (AUTHENTICATION, authentication_level, "authentication"),
    (CONFIG, config_level, "config"),
    (SEED, seed_level, "seed"),
    (STORE, store_level, "store"),
);
