use anyhow::Result;
use bookcheck_harness::Settings;
use clap::Args;

use super::Target;

#[derive(Args)]
pub struct ResolveCommand {
    /// Logical endpoint name, e.g. books
    pub endpoint: String,
}

pub fn execute(cmd: ResolveCommand, settings: &Settings, target: &Target) -> Result<()> {
    let endpoints = settings.endpoint_config(&target.environment, &target.api_version)?;
    let url = endpoints.endpoint_url(&cmd.endpoint)?;

    println!("{}", url);
    println!(
        "max response time: {}ms",
        endpoints.max_response_time_millis
    );
    Ok(())
}
