use crate::config::{LogConfig, LogLevel, LogOutput};
use crate::log::targets::{log_level_for, LOG_TARGETS};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::FmtSubscriber;

pub fn builder(
    config: &LogConfig,
) -> SubscriberBuilder<DefaultFields, Format, EnvFilter, BoxMakeWriter> {
    let writer = match config.output {
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
    };

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter(config))
        .with_ansi(config.ansi_enabled)
        .with_writer(writer);

    // Source locations once anything logs at debug
    let verbose = std::iter::once(config.level)
        .chain(LOG_TARGETS.iter().map(|target| log_level_for(config, target)))
        .any(|level| matches!(level, LogLevel::Debug | LogLevel::Trace));

    builder
        .with_thread_ids(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
}

///
/// Global level plus one `target=level` directive per log target
///
fn filter(config: &LogConfig) -> EnvFilter {
    LOG_TARGETS.iter().fold(
        EnvFilter::builder().parse_lossy(config.level.to_string()),
        |filter, target| match format!("{target}={}", log_level_for(config, target)).parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        },
    )
}
