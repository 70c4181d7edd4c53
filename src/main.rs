use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = tdl::cli::Cli::parse();
    let config = tdl::config::from_cli(&cli)?;

    match cli.command.clone() {
        Some(tdl::cli::CliCommand::Tui) | None => {
            // The terminal owns stdout, so the TUI logs to a file.
            let _guard = tdl::logging::init_file(&config, cli.log_filter.as_deref())?;
            tdl::tui::run(config)?;
        }
        Some(command) => {
            tdl::logging::init_stderr(cli.log_filter.as_deref())?;
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            tdl::commands::execute(&config, command, &mut handle)?;
        }
    }

    Ok(())
}
