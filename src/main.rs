//! episim CLI — run a SEQIAHR scenario from a YAML file.
//!
//! ```text
//! episim <scenario.yaml> [--csv <out.csv>]
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;

use episim::prelude::*;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("episim: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("episim v{}", episim::VERSION);
    println!("SEQIAHR compartmental epidemic simulator");
    println!();
    println!("Usage: episim <scenario.yaml> [--csv <out.csv>]");
    println!();
    println!("Runs the scenario and prints summary statistics; with --csv,");
    println!("also writes the long-form compartment table for charting.");
}

fn run(args: &[String]) -> EpiResult<()> {
    let (scenario_path, csv_path) = parse_args(args)?;

    let config = ScenarioConfig::load(scenario_path)?;
    let trajectory = config.run()?;
    let stats = trajectory.summary_stats(config.population);

    if !config.scenario.name.is_empty() {
        println!("scenario: {}", config.scenario.name);
    }
    println!(
        "R0: {:.2} during quarantine, {:.2} outside",
        config.parameters.reproduction_number(true),
        config.parameters.reproduction_number(false)
    );
    println!("{stats}");

    if let Some(path) = csv_path {
        let table = trajectory.to_display_table(
            &config.variant.default_display_compartments(),
            &LabelMap::default(),
            config.population,
        );
        let mut writer = BufWriter::new(File::create(&path)?);
        table.write_csv(&mut writer)?;
        println!("wrote {} rows to {path}", table.rows.len());
    }

    Ok(())
}

fn parse_args(args: &[String]) -> EpiResult<(&str, Option<String>)> {
    let mut scenario = None;
    let mut csv = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--csv" {
            match iter.next() {
                Some(path) => csv = Some(path.clone()),
                None => return Err(EpiError::config("--csv requires a path")),
            }
        } else if scenario.is_none() {
            scenario = Some(arg.as_str());
        } else {
            return Err(EpiError::config(format!("unexpected argument {arg}")));
        }
    }

    scenario
        .map(|s| (s, csv))
        .ok_or_else(|| EpiError::config("missing scenario file"))
}
