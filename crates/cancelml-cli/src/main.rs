use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use cancelml::config::{load_config, PipelineConfig};
use cancelml::processor::DataProcessor;
use cancelml::trainer::ModelTrainer;
use cancelml_cli::server::{self, AppState};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("CANCELML_LOG", "error,cancelml=info"))
        .init();

    let config_arg = Arg::new("config")
        .short('c')
        .long("config")
        .help("Path to the pipeline configuration file")
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
        .default_value("config/config.yaml");

    let matches = Command::new("cancelml")
        .version(clap::crate_version!())
        .about("Hotel booking cancellation prediction pipeline")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("process")
                .about("Clean, encode, rebalance and feature-select the raw splits")
                .arg(config_arg.clone()),
        )
        .subcommand(
            Command::new("train")
                .about("Run hyperparameter search, evaluate and persist the model")
                .arg(config_arg.clone()),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve the persisted model behind the HTTP prediction endpoint")
                .arg(config_arg)
                .arg(
                    Arg::new("bind")
                        .short('b')
                        .long("bind")
                        .help("Bind address, overrides the configured one")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("process", sub)) => run_process(&config_from(sub)?),
        Some(("train", sub)) => run_train(&config_from(sub)?),
        Some(("serve", sub)) => run_serve(&config_from(sub)?, sub),
        _ => unreachable!("subcommand is required"),
    }
}

fn config_from(matches: &ArgMatches) -> Result<PipelineConfig> {
    let path = matches
        .get_one::<PathBuf>("config")
        .expect("config has a default value");
    load_config(path).with_context(|| format!("failed to load configuration from {:?}", path))
}

fn run_process(config: &PipelineConfig) -> Result<()> {
    let processor = DataProcessor::new(
        config.paths.raw_train.clone(),
        config.paths.raw_test.clone(),
        config.paths.processed_train(),
        config.paths.processed_test(),
        config.data_processing.clone(),
    );
    processor.process().context("data processing stage failed")?;
    Ok(())
}

fn run_train(config: &PipelineConfig) -> Result<()> {
    let trainer = ModelTrainer::new(
        config.paths.processed_train(),
        config.paths.processed_test(),
        config.paths.model_path.clone(),
        config.paths.experiments_dir.clone(),
        config.data_processing.label_column.clone(),
        config.training.clone(),
    );
    trainer.run().context("training stage failed")?;
    Ok(())
}

fn run_serve(config: &PipelineConfig, matches: &ArgMatches) -> Result<()> {
    let bind_addr = matches
        .get_one::<String>("bind")
        .cloned()
        .unwrap_or_else(|| config.paths.bind_addr.clone());
    let state = AppState::load(&config.paths.model_path, config.paths.frontend_dist.clone());

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(server::run(&bind_addr, state))
}
