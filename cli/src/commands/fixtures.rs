use anyhow::{bail, Result};
use bookcheck_harness::compare::find_duplicates;
use bookcheck_harness::fixtures::{FixtureLoader, TestScenario};
use bookcheck_harness::model::{Author, Book, Resource};
use bookcheck_harness::orchestrator::FieldErrorRule;
use bookcheck_harness::{Settings, Suite};
use clap::Args;

use super::{ResourceArg, Target};

#[derive(Args)]
pub struct FixturesCommand {
    /// Resource whose fixtures should be checked
    #[arg(long, value_enum, default_value_t = ResourceArg::All)]
    pub resource: ResourceArg,
}

pub fn execute(cmd: FixturesCommand, settings: &Settings, target: &Target) -> Result<()> {
    let golden = FixtureLoader::new(settings.golden_root()?);
    let scenarios = FixtureLoader::new(settings.fixture_root()?);
    let environment = target.environment.as_str();

    let mut problems = 0;
    for suite in cmd.resource.suites() {
        problems += match suite {
            Suite::Books => inspect::<Book>(&golden, &scenarios, environment),
            Suite::Authors => inspect::<Author>(&golden, &scenarios, environment),
        };
    }

    if problems > 0 {
        bail!("{} fixture problem(s) found", problems);
    }
    Ok(())
}

/// Prints what loaded and returns the number of problems found.
fn inspect<R: Resource>(golden: &FixtureLoader, scenarios: &FixtureLoader, environment: &str) -> usize {
    let mut problems = 0;

    match golden.load::<R>(environment, &R::golden_fixture()) {
        Ok(items) => {
            println!("{}: {} golden {}s", R::golden_fixture(), items.len(), R::LABEL);
            let duplicates = find_duplicates(&items);
            if !duplicates.is_empty() {
                problems += 1;
                println!("  {} duplicate entries:", duplicates.len());
                for duplicate in &duplicates {
                    println!("    {:?}", duplicate);
                }
            }
        }
        Err(e) => {
            problems += 1;
            println!("{}", e);
        }
    }

    for name in [R::create_scenarios_fixture(), R::update_scenarios_fixture()] {
        match scenarios.load_scenarios::<R::Payload>(environment, &name) {
            Ok(loaded) => print_scenarios(&name, &loaded),
            Err(e) => {
                problems += 1;
                println!("{}", e);
            }
        }
    }

    match scenarios.load_optional::<FieldErrorRule>(environment, &R::field_errors_fixture()) {
        Ok(Some(rules)) => println!("{}: {} field error overrides", R::field_errors_fixture(), rules.len()),
        Ok(None) => {}
        Err(e) => {
            problems += 1;
            println!("{}", e);
        }
    }

    problems
}

fn print_scenarios<P>(name: &str, scenarios: &[TestScenario<P>]) {
    println!("{}: {} scenarios", name, scenarios.len());
    for scenario in scenarios {
        println!(
            "  {} -> {}",
            scenario.test_name, scenario.expected_status_code
        );
    }
}
