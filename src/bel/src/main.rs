use bel::cli::{App, Args, Config, logging};
use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    };

    if let Err(e) = logging::init(&config) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }

    let mut app = App::new(config);
    if let Err(e) = app.run(&args.command).await {
        if !matches!(e, bel::cli::CliError::Program) {
            eprintln!("Error: {}", e);
        }
        process::exit(e.exit_code());
    }
}
