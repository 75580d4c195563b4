use std::{env, error::Error, path::PathBuf, process, time::Duration};

use clap::Parser;
use energy_star_endpoints::{
    api::portfolio_manager::PortfolioManagerClient,
    interval::month::Month,
    orchestrator::{Orchestrator, Tally},
    settings::RunSettings,
    utils::logging::init_file_logger,
};
use log::{error, info};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Environment name, loads `.env/{env}.env` if the file exists
    #[arg(short, long, default_value = "prod")]
    env: String,

    /// Config file with one section per property
    #[arg(short, long, default_value = "inputs.conf")]
    config: PathBuf,

    /// Log file, appended to
    #[arg(long, default_value = "update_log.log")]
    log_file: PathBuf,

    /// How many year boundaries to walk back over before giving up
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(0..=100))]
    max_years: u32,

    /// Web services root, defaults to $ENERGY_STAR_BASE_URL or the public one
    #[arg(long)]
    base_url: Option<String>,

    /// Timeout for each http request, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Change to this directory before doing anything else
    #[arg(long)]
    workdir: Option<PathBuf>,
}

/// Run this job once a month, after the scores get published.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    if let Some(dir) = &args.workdir {
        env::set_current_dir(dir)?;
    }
    let env_file = PathBuf::from(format!(".env/{}.env", args.env));
    if env_file.exists() {
        dotenvy::from_path(&env_file)?;
    }

    let defaults = RunSettings::default();
    let settings = RunSettings {
        config_path: args.config,
        log_path: args.log_file,
        base_url: args
            .base_url
            .or_else(|| env::var("ENERGY_STAR_BASE_URL").ok())
            .unwrap_or(defaults.base_url),
        max_years_to_check: args.max_years,
        timeout: args.timeout_secs.map(Duration::from_secs),
        ..defaults
    };
    init_file_logger(&settings.log_path)?;
    info!("Starting update of {}", settings.config_path.display());

    // from here on every failure goes to the log file
    match update(settings) {
        Ok(tally) => {
            println!("{}", tally);
            Ok(())
        }
        Err(e) => {
            error!("Error in main process: {}", e);
            println!("Error occurred, please check the log file.");
            println!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn update(settings: RunSettings) -> Result<Tally, Box<dyn Error>> {
    let client = PortfolioManagerClient::new(&settings.base_url, settings.timeout)?;
    let orchestrator = Orchestrator::new(settings, client);
    Ok(orchestrator.run(Month::current())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_years_is_bounded() {
        let args = Args::try_parse_from(["update_energy_star_endpoints", "--max-years", "3"]).unwrap();
        assert_eq!(args.max_years, 3);
        assert!(Args::try_parse_from(["update_energy_star_endpoints", "--max-years", "101"]).is_err());
        assert!(
            Args::try_parse_from(["update_energy_star_endpoints", "--max-years", "4294967295"])
                .is_err()
        );
    }

    #[test]
    fn update_reports_missing_config() {
        let settings = RunSettings {
            config_path: "/definitely/not/here/inputs.conf".into(),
            ..RunSettings::default()
        };
        let err = update(settings).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
