//! CLI for phosphor: boot a retro CRT in your terminal and jump into the server.

mod commands;
mod tui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use phosphor_core::IntensityProfile;

#[derive(Parser)]
#[command(name = "phosphor")]
#[command(about = "phosphor: boot a retro CRT in your terminal and jump into the server")]
#[command(version = phosphor_core::VERSION)]
struct Cli {
    /// Write logs to this file instead of stderr (RUST_LOG sets the level)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot the CRT, power it on and show the launcher (default)
    Run {
        /// JSON config file (server, intensity, muted, boot timing, script)
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON boot script, overrides the config
        #[arg(long)]
        script: Option<PathBuf>,

        /// VHS intensity: soft, normal, strong, extreme
        #[arg(long)]
        intensity: Option<IntensityProfile>,

        /// Start with sound cues muted
        #[arg(long)]
        mute: bool,

        /// Seed the noise generator for a reproducible overlay
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the server deep link and the fallback address
    Link {
        /// JSON config file to read the server from
        #[arg(long)]
        config: Option<PathBuf>,

        /// Server name shown in the game client
        #[arg(long)]
        name: Option<String>,

        /// Server host
        #[arg(long)]
        host: Option<String>,

        /// Server port
        #[arg(long)]
        port: Option<u16>,

        /// Also hand the link to the platform URL handler
        #[arg(long)]
        open: bool,

        /// Also copy the address to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Show the VHS intensity profiles and their parameters
    Profiles {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a boot script and print it as JSON
    Script {
        /// JSON config file (its boot timing and script are used)
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON boot script; the built-in script when omitted
        #[arg(long)]
        script: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    let tui = matches!(cli.command, None | Some(Commands::Run { .. }));
    commands::init_logging(cli.log_file.as_deref(), tui);

    match cli.command {
        None => commands::run::run(commands::run::RunCommandConfig::default()),
        Some(Commands::Run {
            config,
            script,
            intensity,
            mute,
            seed,
        }) => commands::run::run(commands::run::RunCommandConfig {
            config_path: config,
            script_path: script,
            intensity,
            mute,
            seed,
        }),
        Some(Commands::Link {
            config,
            name,
            host,
            port,
            open,
            copy,
        }) => commands::link::run(commands::link::LinkCommandConfig {
            config_path: config.as_deref(),
            name,
            host,
            port,
            open,
            copy,
        }),
        Some(Commands::Profiles { json }) => commands::profiles::run(json),
        Some(Commands::Script { config, script }) => {
            commands::script::run(config.as_deref(), script.as_deref())
        }
    }
}
