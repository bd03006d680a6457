use clap::{Parser, Subcommand};
use userdir_business::{DEFAULT_API_BASE_URL, UserId};

#[derive(Parser)]
#[command(name = "userdir")]
#[command(about = "Browse the user directory", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Base URL of the directory API
    #[arg(
        long,
        global = true,
        env = "USERDIR_API_BASE_URL",
        default_value = DEFAULT_API_BASE_URL
    )]
    pub base_url: String,

    /// Show timing/latency information
    #[arg(long, global = true)]
    pub timing: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the user list as a table
    List {
        /// Only show users whose name or email contains this text
        #[arg(long, short = 'q')]
        query: Option<String>,
    },
    /// Show one user's details
    Show {
        /// User ID
        id: UserId,
    },
    /// Browse interactively: search, inspect, delete and approve users
    Browse,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_with_query() {
        let cli = Cli::try_parse_from(["userdir", "list", "-q", "lean"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::List { query: Some(ref q) }) if q == "lean"
        ));
    }

    #[test]
    fn test_parse_show_and_base_url() {
        let cli =
            Cli::try_parse_from(["userdir", "show", "3", "--base-url", "http://localhost:9"])
                .unwrap();
        assert!(matches!(cli.command, Some(Commands::Show { id: 3 })));
        assert_eq!(cli.base_url, "http://localhost:9");
    }
}
