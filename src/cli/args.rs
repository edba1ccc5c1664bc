use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pws-processor")]
#[command(about = "Personal weather station observation processor")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        short,
        long,
        global = true,
        help = "Settings file (TOML); PWS_* environment variables override it"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll a Weather Underground station until interrupted
    Watch {
        #[arg(short, long, help = "Station id [default: station.station_id setting]")]
        station: Option<String>,

        #[arg(
            long,
            env = "PWS_STATION__API_KEY",
            hide_env_values = true,
            help = "Weather Underground API key [default: station.api_key setting]"
        )]
        api_key: Option<String>,

        #[arg(long, help = "Print snapshots as JSON lines")]
        json: bool,
    },

    /// Run recorded readings from a CSV file through the pipeline
    Replay {
        #[arg(short, long, help = "Input CSV file")]
        input: PathBuf,

        #[arg(
            short,
            long,
            help = "JSON-lines file for finalized daily extremes [default: archive_path setting]"
        )]
        archive: Option<PathBuf>,

        #[arg(long, default_value = "metric", help = "Unit system of the recording")]
        units: String,

        #[arg(long, help = "Print every snapshot as a JSON line")]
        json: bool,

        #[arg(short, long, help = "Suppress the progress bar")]
        quiet: bool,
    },

    /// Compute derived variables for a single set of conditions
    Derive {
        #[arg(short, long, allow_negative_numbers = true)]
        temperature: f64,

        #[arg(short = 'H', long)]
        humidity: f64,

        #[arg(short, long, default_value = "0")]
        wind_speed: f64,

        #[arg(short, long)]
        pressure: Option<f64>,

        #[arg(long, help = "Solar radiation (W/m²)")]
        solar: Option<f64>,

        #[arg(long, help = "UV index")]
        uv: Option<f64>,

        #[arg(long, help = "Rain so far today (mm), for the water balance")]
        rain_total: Option<f64>,

        #[arg(long, default_value = "°C", help = "Temperature unit symbol (°C, °F, K)")]
        temp_unit: String,

        #[arg(long, default_value = "km/h", help = "Wind speed unit symbol")]
        speed_unit: String,

        #[arg(long, default_value = "hPa", help = "Pressure unit symbol")]
        pressure_unit: String,
    },

    /// Print daily extremes stored in an archive file
    Archive {
        #[arg(short, long, help = "JSON-lines archive [default: archive_path setting]")]
        file: Option<PathBuf>,

        #[arg(short, long, default_value = "7", help = "Show the most recent N days")]
        last: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::API_KEY_ENV;
    use clap::CommandFactory;

    #[test]
    fn test_api_key_flag_reads_settings_variable() {
        let command = Cli::command();
        let watch = command.find_subcommand("watch").unwrap();
        let api_key = watch
            .get_arguments()
            .find(|arg| arg.get_id() == "api_key")
            .unwrap();

        assert_eq!(api_key.get_env(), Some(std::ffi::OsStr::new(API_KEY_ENV)));
    }

    #[test]
    fn test_derive_accepts_negative_temperature() {
        let cli = Cli::try_parse_from(["pws-processor", "derive", "-t", "-5", "-H", "60"]).unwrap();
        match cli.command {
            Commands::Derive {
                temperature, solar, ..
            } => {
                assert_eq!(temperature, -5.0);
                assert!(solar.is_none());
            }
            _ => panic!("expected derive"),
        }
    }
}
