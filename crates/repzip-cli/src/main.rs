//! `repzip`: build and inspect reproducible ZIP archives.

use clap::Parser;
use repzip_cli::cli::{Cli, Commands};
use repzip_cli::commands::{run_build, run_list};
use repzip_cli::logging::{init_logging, LogConfig, LogLevel};

fn main() {
    let cli = Cli::parse();

    let log_level = LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet);
    init_logging(&LogConfig::from_env(log_level, cli.global.log_format));

    let exit_code = match &cli.command {
        Commands::Build(args) => run_build(&cli.global, args),
        Commands::List(args) => run_list(&cli.global, args),
    };

    std::process::exit(exit_code.as_i32());
}
