use anyhow::{bail, Result};
use bookcheck_harness::fixtures::FixtureLoader;
use bookcheck_harness::verify::{RecordingReporter, Tee, TracingReporter};
use bookcheck_harness::{HttpTransport, RunReport, Settings, SuiteRunner, TestCaseOrchestrator};
use clap::Args;

use super::{ResourceArg, Target};

#[derive(Args)]
pub struct RunCommand {
    /// Resource whose checks should run
    #[arg(long, value_enum, default_value_t = ResourceArg::All)]
    pub resource: ResourceArg,

    /// Print the run report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(cmd: RunCommand, settings: &Settings, target: &Target) -> Result<()> {
    let endpoints = settings.endpoint_config(&target.environment, &target.api_version)?;
    let golden = FixtureLoader::new(settings.golden_root()?);
    let scenarios = FixtureLoader::new(settings.fixture_root()?);

    let transport = HttpTransport::new();
    let recorder = RecordingReporter::new();
    let tracer = TracingReporter;
    let reporter = Tee::new(&tracer, &recorder);

    let orchestrator =
        TestCaseOrchestrator::new(endpoints, golden, scenarios, &transport, &reporter);
    let report = SuiteRunner::new(&orchestrator)
        .run(&cmd.resource.suites())
        .await?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, &recorder);
    }

    if !report.is_success() {
        bail!(
            "{} of {} checks failed",
            report.failed(),
            report.outcomes.len()
        );
    }
    Ok(())
}

fn print_summary(report: &RunReport, recorder: &RecordingReporter) {
    println!("Run {} started {}", report.run_id, report.started_at);
    for outcome in &report.outcomes {
        let mark = if outcome.passed { "PASS" } else { "FAIL" };
        println!("  [{}] {}", mark, outcome.name);
    }

    for failure in report.failures() {
        println!();
        println!("{} ({})", failure.name, failure.kind.unwrap_or("unknown"));
        if let Some(error) = &failure.error {
            println!("{}", error);
        }
    }

    println!();
    println!(
        "{} checks: {} passed, {} failed ({} assertions, {} failed)",
        report.outcomes.len(),
        report.passed(),
        report.failed(),
        recorder.events().len(),
        recorder.failures().len()
    );
}
