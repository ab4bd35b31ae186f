use clap::{Parser, Subcommand};
use core_identity::Entity;
use core_params::{Op, Word};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "permgate")]
#[command(version, about = "Parameterized permission tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode one parameter node as a 256-bit word
    Encode {
        /// Node id: 200 block, 201 timestamp, 202 caller, 203 oracle,
        /// 204 logic, 205 literal, anything else an argument index
        #[arg(long)]
        id: u8,

        /// Operator name, symbol or number (eq, ==, and, if_else, 7, ...)
        #[arg(long)]
        op: Op,

        /// Value (decimal or 0x hex, at most 240 bits)
        #[arg(long, default_value = "0")]
        value: Word,
    },
    /// Decode 256-bit words back into nodes
    Decode {
        /// Words (decimal or 0x hex)
        #[arg(required = true)]
        words: Vec<Word>,
    },
    /// Compile a condition into parameter words
    Compile {
        /// Condition, e.g. "arg[0] <= 100 AND timestamp < 1800000000"
        condition: String,
    },
    /// Derive a role id from its name
    Role {
        /// Role name
        name: String,
    },
    /// Run an access decision against a fixture file
    Check {
        /// Path to the fixture TOML file
        fixture: PathBuf,

        /// Requesting entity
        #[arg(long, value_parser = commands::parse_entity)]
        who: Entity,

        /// Target resource
        #[arg(long)]
        resource: core_identity::Resource,

        /// Role name or 0x-prefixed 32-byte id
        #[arg(long, value_parser = commands::parse_role)]
        role: core_identity::Role,

        /// Caller-supplied argument (repeatable, in order)
        #[arg(long = "arg")]
        args: Vec<Word>,

        /// Immediate invoker, when different from --who
        #[arg(long, value_parser = commands::parse_entity)]
        caller: Option<Entity>,

        /// Engine configuration TOML
        #[arg(long)]
        config: Option<PathBuf>,

        /// Block height reported to block nodes
        #[arg(long, default_value_t = 0)]
        block: u64,

        /// Timestamp reported to timestamp nodes (default: now)
        #[arg(long)]
        timestamp: Option<u64>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode { id, op, value } => commands::params::encode(id, op, value)?,
        Commands::Decode { words } => commands::params::decode(&words),
        Commands::Compile { condition } => commands::params::compile(&condition)?,
        Commands::Role { name } => commands::params::role(&name),
        Commands::Check {
            fixture,
            who,
            resource,
            role,
            args,
            caller,
            config,
            block,
            timestamp,
        } => {
            let request = commands::check::Request {
                caller: caller.unwrap_or(who),
                who,
                resource,
                role,
                args,
            };
            let allowed = commands::check::run(
                &fixture,
                config.as_deref(),
                block,
                timestamp,
                &request,
            )?;
            if !allowed {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
