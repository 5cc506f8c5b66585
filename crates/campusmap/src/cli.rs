use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, Settings};

#[derive(Parser)]
#[command(name = "campusmap")]
#[command(author, version, about)]
#[command(long_about = "Find walking routes between campus buildings.\n\n\
    Pick a start and end building and the route is drawn on the campus map.\n\n\
    Examples:\n  \
    campusmap --map campus_map.jpg      Launch the map window\n  \
    campusmap buildings                 List all buildings\n  \
    campusmap route BAG CSE             Print walking directions\n  \
    campusmap export BAG CSE -o r.png   Save the route overlay as PNG")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Base URL of the routing service (overrides config)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Campus map image (overrides config)
    #[arg(long, global = true)]
    pub map: Option<PathBuf>,

    /// Launch in a window instead of maximized
    #[arg(long, global = false)]
    pub windowed: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all buildings known to the routing service
    Buildings,

    /// Print walking directions between two buildings
    Route {
        /// Short name of the starting building (prompted if omitted)
        start: Option<String>,

        /// Short name of the destination building (prompted if omitted)
        end: Option<String>,
    },

    /// Render the map with a route overlay to a PNG file
    Export {
        /// Short name of the starting building
        start: String,

        /// Short name of the destination building
        end: String,

        /// Output PNG file
        #[arg(short, long, default_value = "route.png")]
        output: PathBuf,

        /// Export width in pixels
        #[arg(long, default_value = "1443")]
        width: u32,

        /// Export height in pixels
        #[arg(long, default_value = "988")]
        height: u32,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. server.url, map.image, defaults.theme)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        let config = Config::load_or_default();
        Settings::resolve(&config, self.server.as_deref(), self.map.as_deref())
    }

    pub fn run(self) -> anyhow::Result<()> {
        let settings = self.settings();
        match self.command {
            Some(Commands::Buildings) => crate::commands::buildings::run(&settings),
            Some(Commands::Route { start, end }) => {
                crate::commands::route::run(&settings, start, end, self.quiet)
            }
            Some(Commands::Export {
                start,
                end,
                output,
                width,
                height,
            }) => crate::commands::export::run(&settings, &start, &end, output, width, height),
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                crate::commands::print_version();
                Ok(())
            }
            None => crate::app::run(settings, self.windowed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_route_with_global_flags() {
        let cli = Cli::try_parse_from([
            "campusmap",
            "route",
            "BAG",
            "CSE",
            "--server",
            "http://example.edu:8080",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://example.edu:8080"));
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Route {
                start: Some(start),
                end: Some(end),
            }) => assert_eq!((start.as_str(), end.as_str()), ("BAG", "CSE")),
            _ => panic!("expected route with both buildings"),
        }
    }

    #[test]
    fn test_parse_export_defaults() {
        let cli = Cli::try_parse_from(["campusmap", "export", "BAG", "CSE"]).unwrap();
        match cli.command {
            Some(Commands::Export {
                output,
                width,
                height,
                ..
            }) => {
                assert_eq!(output, PathBuf::from("route.png"));
                assert_eq!((width, height), (1443, 988));
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn test_no_subcommand_launches_gui() {
        let cli = Cli::try_parse_from(["campusmap", "--windowed", "--map", "campus.jpg"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.windowed);
        assert_eq!(cli.map, Some(PathBuf::from("campus.jpg")));
    }
}
