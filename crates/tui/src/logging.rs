use anyhow::{Context, Result};
use tdl_core::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

fn env_filter(filter: Option<&str>) -> Result<EnvFilter> {
    let filter = filter.unwrap_or(DEFAULT_DIRECTIVE);
    let directive: Directive = filter
        .parse()
        .with_context(|| format!("Invalid log directive '{}'", filter))?;
    Ok(EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy())
}

/// Compact logs on stderr, for the scripting commands.
pub fn init_stderr(filter: Option<&str>) -> Result<()> {
    let env_filter = env_filter(filter)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
    Ok(())
}

/// Logs appended to `tdl.log` in the data directory, for the terminal UI.
///
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init_file(config: &AppConfig, filter: Option<&str>) -> Result<WorkerGuard> {
    let env_filter = env_filter(filter)?;
    let file_name = config
        .log_path()
        .file_name()
        .context("Log path has no file name")?;
    let appender = tracing_appender::rolling::never(config.data_dir(), file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_directive() {
        assert!(env_filter(Some("tdl=verbose")).is_err());
        assert!(env_filter(Some("debug")).is_ok());
        assert!(env_filter(None).is_ok());
    }
}
