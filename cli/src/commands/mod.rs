use bookcheck_harness::Suite;
use clap::{Args, Subcommand, ValueEnum};

pub mod fixtures;
pub mod resolve;
pub mod run;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the check catalogue against the configured api
    Run(run::RunCommand),

    /// Print the url an endpoint resolves to
    Resolve(resolve::ResolveCommand),

    /// Load and validate the fixtures without sending requests
    Fixtures(fixtures::FixturesCommand),
}

/// Which deployment and api version to check.
#[derive(Args)]
pub struct Target {
    /// Environment name, as used in base.url.<env> and the fixture directories
    #[arg(long = "env", global = true, env = "BOOKCHECK_ENV", default_value = "dev")]
    pub environment: String,

    /// Api version, as used in api.<version>
    #[arg(long, global = true, env = "BOOKCHECK_VERSION", default_value = "v1")]
    pub api_version: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResourceArg {
    Books,
    Authors,
    All,
}

impl ResourceArg {
    pub fn suites(self) -> Vec<Suite> {
        match self {
            ResourceArg::Books => vec![Suite::Books],
            ResourceArg::Authors => vec![Suite::Authors],
            ResourceArg::All => Suite::ALL.to_vec(),
        }
    }
}
