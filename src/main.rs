use std::io;
use std::process;

use anyhow::{Context, Result};
use clap::CommandFactory;
use tracing::error;

use tsuru_installer::client::DockerClient;
use tsuru_installer::{
    cli, init_logging, load_profile, run_install, run_remove, run_status, run_validate,
};

fn run(command: &cli::Commands) -> Result<()> {
    let opts = match command {
        cli::Commands::Completions(opts) => {
            let mut cmd = cli::Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(opts.shell, &mut cmd, name, &mut io::stdout());
            return Ok(());
        }
        cli::Commands::Validate(opts) => {
            init_logging(opts.log_level)?;
            return run_validate(opts);
        }
        cli::Commands::Install(opts)
        | cli::Commands::Status(opts)
        | cli::Commands::Remove(opts) => opts,
    };

    init_logging(opts.log_level)?;
    let profile = load_profile(&opts.file)?;
    let client = DockerClient::new(profile.daemon_timeout())
        .context("failed to create container daemon client")?;

    match command {
        cli::Commands::Install(_) => run_install(&profile, &client),
        cli::Commands::Status(_) => run_status(&profile, &client, &mut io::stdout()),
        cli::Commands::Remove(_) => run_remove(&profile, &client),
        cli::Commands::Validate(_) | cli::Commands::Completions(_) => Ok(()),
    }
}

fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(2);
        }
    };

    if let Err(e) = run(&args.command) {
        error!("{:#}", e);
        process::exit(1);
    }
}
