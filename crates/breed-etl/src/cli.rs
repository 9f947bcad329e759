//! Command-line interface definition

use clap::{Parser, Subcommand};

/// Dog breed catalog ETL
#[derive(Parser, Debug)]
#[command(name = "breed-etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    pub database_url: Option<String>,

    /// Breed catalog endpoint
    #[arg(long, env = "DOG_API_URL", global = true)]
    pub api_url: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Fetch, normalize and load the catalog, then record the run
    Run,

    /// Create the tables if they do not exist
    InitSchema,

    /// Fetch and normalize without touching the database
    Preview {
        /// Print at most this many records
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show recent pipeline runs
    Status {
        /// Reporting window in days
        #[arg(short, long, default_value_t = 7, value_parser = clap::value_parser!(i32).range(1..))]
        days: i32,

        /// Number of latest runs to list
        #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(i64).range(1..))]
        recent: i64,
    },
}

impl Cli {
    pub fn subcommand(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }

    /// Config lookup where command-line flags win over the environment.
    pub fn lookup(&self) -> impl Fn(&str) -> Option<String> + '_ {
        move |key: &str| {
            let flag = match key {
                "DATABASE_URL" => self.database_url.clone(),
                "DOG_API_URL" => self.api_url.clone(),
                _ => None,
            };
            flag.or_else(|| std::env::var(key).ok())
        }
    }
}
