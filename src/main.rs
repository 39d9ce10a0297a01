//! Entry point: parse the CLI, load and validate configuration, then
//! hand off to the supervisor.

use clap::Parser;

use auditrs::cli::Cli;
use auditrs::config::Settings;
use auditrs::supervisor::Supervisor;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let settings = match Settings::load(&cli.config) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("failed to load configuration from {}: {}", cli.config.display(), err);
            return std::process::ExitCode::FAILURE;
        }
    };

    if cli.print_config {
        match toml::to_string_pretty(&settings) {
            Ok(rendered) => println!("{}", rendered),
            Err(err) => eprintln!("failed to render configuration: {}", err),
        }
        return std::process::ExitCode::SUCCESS;
    }

    if cli.cpuprofile.is_some() {
        log::warn!("--cpuprofile was given but this build has no profiler wired in, ignoring");
    }

    log::info!("starting auditrs");

    if let Err(err) = Supervisor::new(settings).run().await {
        eprintln!("auditrs exited with error: {:?}", err);
        return std::process::ExitCode::FAILURE;
    }

    std::process::ExitCode::SUCCESS
}
