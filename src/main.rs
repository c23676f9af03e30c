use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::process::ExitCode;

use profs::{
    commands,
    error::ProfsError,
    paths::Paths,
    ui::{ColorMode, Ui},
};

#[derive(Parser)]
#[command(name = "profs")]
#[command(about = "Switch managed directories between named profile snapshots")]
#[command(version)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// When to use colors: always, auto, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Print diagnostic DEBUG lines to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show managed paths grouped by active profile
    #[command(alias = "status")]
    List,

    /// List all detected profiles
    ListProfiles,

    /// Show the active profile
    StatusProfile,

    /// Show the raw configuration file
    StatusConfig,

    /// Show the fully resolved status as JSON
    StatusFull,

    /// Start managing a directory
    Add {
        /// Path to add
        path: PathBuf,

        /// Profile to store the current content under (defaults to the active profile)
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Stop managing a directory (symlinks and snapshots stay in place)
    Remove {
        /// Path as listed in the configuration
        path: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Switch all managed paths to a profile
    Set {
        /// The profile to activate
        profile: String,
    },

    /// Create a new profile for every managed path
    AddProfile {
        /// Name of the profile to create
        name: String,

        /// Copy the active profile instead of creating an empty one
        #[arg(long)]
        copy_existing: bool,
    },

    /// Delete a profile from every managed path
    RemoveProfile {
        /// Name of the profile to delete
        name: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show inconsistencies in the current configuration
    Doctor,

    /// Reset the configuration to zero (symlinks remain intact)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Move a legacy config dir (~/.config/gigurra/profs or ~/.profs) to the current location
    MigrateConfigDir {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn run(cli: Cli, ui: &Ui) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "profs", &mut std::io::stdout());
        return Ok(());
    }

    let paths = Paths::new()?;
    if paths.uses_legacy_dir() {
        ui.debug(format!(
            "using legacy config dir {}; run 'profs migrate-config-dir' to move it",
            paths.legacy_config_dir.display()
        ));
    }

    match cli.command {
        Commands::List => commands::list(&paths, ui),
        Commands::ListProfiles => commands::list_profiles(&paths, ui),
        Commands::StatusProfile => commands::status_profile(&paths, ui),
        Commands::StatusConfig => commands::status_config(&paths, ui),
        Commands::StatusFull => commands::status_full(&paths, ui),
        Commands::Add { path, profile } => commands::add(&paths, ui, &path, profile.as_deref()),
        Commands::Remove { path, yes } => commands::remove(&paths, ui, &path, yes),
        Commands::Set { profile } => commands::set(&paths, ui, &profile),
        Commands::AddProfile {
            name,
            copy_existing,
        } => commands::add_profile(&paths, ui, &name, copy_existing),
        Commands::RemoveProfile { name, yes } => commands::remove_profile(&paths, ui, &name, yes),
        Commands::Doctor => commands::doctor(&paths, ui),
        Commands::Reset { yes } => commands::reset(&paths, ui, yes),
        Commands::MigrateConfigDir { yes } => commands::migrate_config_dir(&paths, ui, yes),
        Commands::Completions { .. } => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let ui = Ui::new(cli.color, cli.no_color).with_verbose(cli.verbose);

    match run(cli, &ui) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<ProfsError>() {
            Some(ProfsError::Aborted(msg)) => {
                ui.info(msg);
                ExitCode::SUCCESS
            }
            _ => {
                ui.err(format!("{:#}", e));
                ExitCode::FAILURE
            }
        },
    }
}
