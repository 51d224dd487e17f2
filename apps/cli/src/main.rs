mod cli;
mod command;
mod config;
mod error;
mod history_store;
mod render;

use error::WrapErr;

use clap::CommandFactory;
use clap::Parser;
use tracing::Level;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> error::Result<()> {
    color_eyre::install()?;

    let command_line = cli::Cli::parse();
    init_logging(command_line.verbose);

    let Some(command) = command_line.command else {
        cli::Cli::command().print_help()?;
        return Ok(());
    };

    let cfg = config::Config::load(command_line.config.as_deref())
        .context("Load configuration error")?;

    let cmd: Box<dyn command::Command> = match command {
        cli::Commands::Search(args) => Box::new(command::SearchCommand::new(cfg, args)),
        cli::Commands::Get { id } => Box::new(command::GetCommand::new(cfg, id)),
        cli::Commands::Recent { days } => Box::new(command::RecentCommand::new(cfg, days)),
        cli::Commands::History { action } => {
            Box::new(command::HistoryCommand::new(cfg, action))
        }
        cli::Commands::Shell => Box::new(command::ShellCommand::new(cfg)),
    };
    cmd.execute().await?;

    Ok(())
}
