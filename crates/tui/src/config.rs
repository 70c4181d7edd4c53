pub use tdl_core::config::*;

use crate::cli::Cli;

pub fn from_cli(cli: &Cli) -> anyhow::Result<AppConfig> {
    AppConfig::discover(ConfigOverrides {
        data_dir: cli.data_dir.clone(),
        api_url: cli.api_url.clone(),
        offline: cli.offline,
        soon_threshold_days: cli.soon_days,
    })
}
