use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod packs;

/// upcast: migration tooling for JSON record lineages.
///
/// Export the migration registry, upcast records, and validate them
/// against the registered packs from the command line. Records are read
/// from stdin as a single JSON object; every command writes one JSON
/// envelope to stdout.
#[derive(Parser)]
#[command(name = "upcast", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the migration registry.
    Registry {
        #[command(subcommand)]
        command: RegistryCommands,
    },

    /// Upcast one JSON record from stdin to its latest version.
    Upcast {
        /// Schema id of the record family.
        #[arg(long = "schema-id")]
        schema_id: String,

        /// Pack to load (repeatable). Also honors UPCAST_PACKS.
        #[arg(long = "pack")]
        packs: Vec<String>,

        /// Envelope format version.
        #[arg(long, default_value = "v1")]
        format: String,

        /// Include the applied-step trace in the output.
        #[arg(long)]
        trace: bool,
    },

    /// Check that one JSON record from stdin can reach its latest version.
    Validate {
        /// Schema id of the record family.
        #[arg(long = "schema-id")]
        schema_id: String,

        /// Pack to load (repeatable). Also honors UPCAST_PACKS.
        #[arg(long = "pack")]
        packs: Vec<String>,

        /// Envelope format version.
        #[arg(long, default_value = "v1")]
        format: String,

        /// Include the applied-step trace in the output.
        #[arg(long)]
        trace: bool,
    },
}

#[derive(Subcommand)]
enum RegistryCommands {
    /// Export schema ids, latest versions, and migration edges.
    Export {
        /// Pack to load (repeatable). Also honors UPCAST_PACKS.
        #[arg(long = "pack")]
        packs: Vec<String>,

        /// Envelope format version.
        #[arg(long, default_value = "v1")]
        format: String,

        /// Emit Graphviz DOT instead of JSON.
        #[arg(long)]
        dot: bool,

        /// Write output to a file instead of stdout.
        #[arg(long)]
        out: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Registry {
            command:
                RegistryCommands::Export {
                    packs,
                    format,
                    dot,
                    out,
                },
        } => commands::registry_export(&packs, &format, dot, out.as_deref()),
        Commands::Upcast {
            schema_id,
            packs,
            format,
            trace,
        } => commands::upcast(&schema_id, &packs, &format, trace),
        Commands::Validate {
            schema_id,
            packs,
            format,
            trace,
        } => commands::validate(&schema_id, &packs, &format, trace),
    };

    process::exit(code);
}
