use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

use oncorisk_classifiers::config::ModelType;
use oncorisk_classifiers::preprocessing::Standardization;
use oncorisk_cli::analysis::config::{load_analysis_config, AnalysisConfig};
use oncorisk_cli::analysis::run::{render_table, run_analysis, write_summary};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("ONCORISK_LOG", "error,oncorisk=info"))
        .init();

    let matches = Command::new("oncorisk")
        .version(clap::crate_version!())
        .about("Cross-validated model comparison for cervical cancer risk factors")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("analyze")
                .about("Split, cross-validate, rebalance and evaluate the models on a risk-factor table")
                .arg(
                    Arg::new("data")
                        .help("Path to the risk-factor CSV file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("config")
                        .help("Path to the analysis JSON configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Write a JSON summary, ROC points included, to this path.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the split, the folds, the resampler and every model.")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("model_type")
                        .long("model-type")
                        .help("Only run this model type.")
                        .value_parser(["logistic", "random_forest", "boosting"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("standardization")
                        .long("standardization")
                        .help("Scale the test partition by its own statistics or by the training ones.")
                        .value_parser(["self", "reference"])
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(Command::new("config").about("Print the default analysis configuration as JSON"))
        .get_matches();

    match matches.subcommand() {
        Some(("analyze", sub_m)) => handle_analyze(sub_m),
        Some(("config", _)) => {
            println!("{}", serde_json::to_string_pretty(&AnalysisConfig::default())?);
            Ok(())
        }
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_analyze(matches: &ArgMatches) -> Result<()> {
    let data_path: &PathBuf = matches
        .get_one("data")
        .ok_or_else(|| anyhow::anyhow!("missing data path"))?;
    log::info!("[oncorisk] Analyzing risk-factor table: {:?}", data_path);

    let mut config = if let Some(config_path) = matches.get_one::<PathBuf>("config") {
        log::info!("[oncorisk] Using config: {:?}", config_path);
        load_analysis_config(config_path)?
    } else {
        log::info!("[oncorisk] No config provided; using defaults.");
        AnalysisConfig::default()
    };

    if let Some(&seed) = matches.get_one::<u64>("seed") {
        config.set_seed(seed);
    }
    if let Some(model_type) = matches.get_one::<String>("model_type") {
        config.restrict_models(ModelType::from_str(model_type).map_err(anyhow::Error::msg)?);
    }
    if let Some(strategy) = matches.get_one::<String>("standardization") {
        config.split.standardization = match strategy.as_str() {
            "reference" => Standardization::ReferenceStats,
            _ => Standardization::SelfStats,
        };
    }

    match run_analysis(data_path, &config) {
        Ok(summary) => {
            print!("{}", render_table(&summary));
            if let Some(output) = matches.get_one::<PathBuf>("output_file") {
                write_summary(&summary, output)?;
            }
            Ok(())
        }
        Err(e) => {
            log::error!("Analysis failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
