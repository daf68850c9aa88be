//! protobridge CLI
//!
//! Commands:
//! - `protobridge generate` - Write the proto3 schema and translator module
//! - `protobridge check` - Compile a project without writing anything

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod generate;

#[derive(Parser)]
#[command(name = "protobridge")]
#[command(author, version, about = "Proto3 schema and translator generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate `<output>.proto` and `<output>.proto.lib.ts`
    Generate {
        /// Path to the project file
        #[arg(short, long, default_value = "protobridge.toml")]
        config: PathBuf,

        /// Emit plain JavaScript instead of TypeScript
        #[arg(long)]
        javascript: bool,
    },

    /// Compile the declarations and report the emitted entities
    Check {
        /// Path to the project file
        #[arg(short, long, default_value = "protobridge.toml")]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { config, javascript } => {
            let (schema, module) = generate::run(&config, javascript)?;
            println!("Generated {} and {}", schema.display(), module.display());
        }
        Commands::Check { config } => {
            for name in generate::check(&config)? {
                println!("{name}");
            }
        }
    }

    Ok(())
}
