mod aggregate;
mod clean;
mod cli;
mod error;
mod filter;
mod fmt;
mod ingest;
mod models;
mod present;
mod settings;
#[cfg(test)]
mod testutil;
mod tui;

use clap::{CommandFactory, Parser};

use cli::{Cli, Commands, FilterArgs};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        None => cli::dashboard::run(None, None, &FilterArgs::default()),
        Some(Commands::Dashboard {
            file,
            layout,
            filters,
        }) => cli::dashboard::run(file.as_deref(), layout, &filters),
        Some(Commands::Summary { file, filters }) => cli::report::summary(file.as_deref(), &filters),
        Some(Commands::Table {
            file,
            filters,
            limit,
        }) => cli::report::detail(file.as_deref(), &filters, limit),
        Some(Commands::Filters { file }) => cli::report::filters(file.as_deref()),
        Some(Commands::Export {
            file,
            output,
            filters,
            cleaned,
        }) => cli::export::run(file.as_deref(), &output, &filters, cleaned),
        Some(Commands::Config { file, layout }) => cli::config::run(file.as_deref(), layout),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "fuelboard",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
