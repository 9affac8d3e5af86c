use clap::{Parser, Subcommand};
use env_logger::Env;
use kagi_keys::pbe::{DEFAULT_ITERATIONS, DEFAULT_SALT_LENGTH, PbeConfig};
use log::debug;

mod args;
mod convert;
mod create;
mod error;
mod io;
mod key_io;
mod pipeline;
mod verify;

use error::Result;

use create::CreateCommands;
use io::{LocalFileSystem, StdConsole};
use pipeline::Services;
use verify::VerifyCommands;

#[derive(Parser)]
#[command(name = "kagi")]
#[command(about = "Asymmetric key toolkit: create, convert, sign and verify", long_about = None)]
struct Cli {
    /// Salt length in bytes for password based encryption
    #[arg(long, global = true, env = "KAGI_PBE_SALT_LENGTH", default_value_t = DEFAULT_SALT_LENGTH)]
    pbe_salt_length: usize,

    /// Iteration count for password based encryption
    #[arg(long, global = true, env = "KAGI_PBE_ITERATIONS", default_value_t = DEFAULT_ITERATIONS)]
    pbe_iterations: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Key and signature creation
    Create {
        #[command(subcommand)]
        command: CreateCommands,
    },
    /// Key pair and signature checks
    Verify {
        #[command(subcommand)]
        command: VerifyCommands,
    },
    /// Convert keys between DER, PEM, OpenSSH and SSH2
    Convert {
        #[command(flatten)]
        config: convert::Config,
    },
}

fn run(cli: Cli) -> Result<()> {
    let services = Services {
        console: &StdConsole,
        file_system: &LocalFileSystem,
        pbe: PbeConfig::new(cli.pbe_salt_length, cli.pbe_iterations)?,
    };
    debug!(
        "PBE salt length {} bytes, {} iterations",
        services.pbe.salt_length(),
        services.pbe.iterations()
    );

    match cli.command {
        Commands::Create { command } => match command {
            CreateCommands::Key { config } => create::key::execute(config, &services),
            CreateCommands::Signature { config } => create::signature::execute(config, &services),
        },
        Commands::Verify { command } => match command {
            VerifyCommands::Key { config } => verify::key::execute(config, &services),
            VerifyCommands::Signature { config } => verify::signature::execute(config, &services),
        },
        Commands::Convert { config } => convert::execute(config, &services),
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
