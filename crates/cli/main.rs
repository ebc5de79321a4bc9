use anyhow::Result;
use clap::{App, Arg, ArgMatches};
use colored::Colorize;
use thiserror::Error;

use proofkit_core::prelude::*;
use proofkit_lang::{prelude, ProofkitError};

#[derive(Debug, Error)]
enum CliError {
    #[error("Invalid fuel {value:?}, expected a step count")]
    InvalidFuel { value: String },
    #[error("Failed to load the library\n{report}")]
    Library { report: String },
    #[error("Unknown name {name}")]
    UnknownName { name: String },
    #[error("{name} has no body to normalize")]
    NoBody { name: String },
    #[error("Normalizing {name} failed: {reason}")]
    Normalize { name: String, reason: String },
    #[error("{count} entries failed verification")]
    Verification { count: usize },
}

fn arguments() -> ArgMatches<'static> {
    App::new("proofkit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Checks the proofkit library of propositional connectives")
        .arg(Arg::with_name("fuel")
            .long("fuel")
            .value_name("STEPS")
            .takes_value(true)
            .help("Reduction steps allowed per query, 0 for no limit (default from PROOFKIT_FUEL)"))
        .arg(Arg::with_name("verify")
            .long("verify")
            .help("Recheck every entry after loading"))
        .arg(Arg::with_name("normalize")
            .long("normalize")
            .value_name("NAME")
            .takes_value(true)
            .multiple(true)
            .number_of_values(1)
            .help("Print the normal form of the named entry's body"))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .help("Log more, repeat for debug and trace output"))
        .get_matches()
}

fn init_logging(verbosity: u64) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbosity {
        0 => {}
        1 => { builder.filter_level(log::LevelFilter::Info); }
        2 => { builder.filter_level(log::LevelFilter::Debug); }
        _ => { builder.filter_level(log::LevelFilter::Trace); }
    }
    builder.init();
}

fn config(matches: &ArgMatches<'_>) -> Result<KernelConfig> {
    match matches.value_of("fuel") {
        None => Ok(KernelConfig::from_env()),
        Some(value) => {
            let fuel = value.trim().parse::<usize>()
                .map_err(|_| CliError::InvalidFuel { value: value.to_string() })?;
            if fuel == 0 { Ok(KernelConfig::unlimited()) }
            else { Ok(KernelConfig::with_fuel(fuel)) }
        }
    }
}

fn status(entry: &Entry) -> colored::ColoredString {
    match &entry.kind {
        EntryKind::Definition { .. } => "defined".green(),
        EntryKind::Axiom => "assumed".yellow(),
        EntryKind::Theorem { proof: Some(_), .. } => "proved".green(),
        EntryKind::Theorem { proof: None, .. } => "unproved".red(),
    }
}

fn report(env: &Environment) {
    for name in env.names() {
        if let Some(entry) = env.lookup(name) {
            println!("{:<8} {:<18} {}", entry.keyword(), name.as_str(), status(entry));
        }
    }
}

fn normalize_entry(env: &Environment, name: &str) -> Result<()> {
    let entry = env.lookup(Symbol::from(name))
        .ok_or_else(|| CliError::UnknownName { name: name.to_string() })?;
    let body = entry.body()
        .ok_or_else(|| CliError::NoBody { name: name.to_string() })?;
    let normal = normalize(env, body.clone())
        .map_err(|e| CliError::Normalize { name: name.to_string(), reason: e.to_string() })?;
    println!("{} {}\n{}", name, "normalizes to".bright_blue(), normal);
    Ok(())
}

fn main() -> Result<()> {
    let matches = arguments();
    init_logging(matches.occurrences_of("verbose"));
    let config = config(&matches)?;
    log::info!("kernel configuration {:?}", config);

    let (env, _implicits) = prelude::environment(config)
        .map_err(|e| CliError::Library { report: e.to_string() })?;
    report(&env);

    if let Some(names) = matches.values_of("normalize") {
        for name in names {
            normalize_entry(&env, name)?;
        }
    }

    if matches.is_present("verify") {
        let failures = env.verify_all();
        if !failures.is_empty() {
            let count = failures.len();
            eprintln!("{}", ProofkitError::from(failures));
            return Err(CliError::Verification { count }.into())
        }
        println!("{} {} entries", "verified".green(), env.len());
    }
    Ok(())
}
