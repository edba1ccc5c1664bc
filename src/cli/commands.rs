use chrono::Utc;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::analyzers::DerivedCalculator;
use crate::cli::args::{Cli, Commands};
use crate::error::{CycleError, FetchError, ProcessingError, Result};
use crate::models::{DerivedVariables, RawReading};
use crate::processors::{poll, CycleOutcome, ObservationPipeline, ReadingValidator};
use crate::readers::{ReplaySource, WeatherUndergroundSource};
use crate::settings::Settings;
use crate::utils::progress::{CycleTally, ProgressReporter};
use crate::utils::units::{present, round_half_even, to_metric_from_symbol, Quantity, UnitSystem};
use crate::writers::{ConfiguredArchive, JsonLinesArchive};

pub async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    info!(
        timezone = %settings.timezone,
        units = ?settings.unit_system,
        poll_interval_secs = settings.poll_interval_secs,
        "settings loaded"
    );

    match cli.command {
        Commands::Watch {
            station,
            api_key,
            json,
        } => watch(settings, station, api_key, json).await,

        Commands::Replay {
            input,
            archive,
            units,
            json,
            quiet,
        } => replay(settings, input, archive, &units, json, quiet).await,

        Commands::Derive {
            temperature,
            humidity,
            wind_speed,
            pressure,
            solar,
            uv,
            rain_total,
            temp_unit,
            speed_unit,
            pressure_unit,
        } => {
            let mut builder = RawReading::builder()
                .timestamp(Utc::now())
                .temperature(to_metric_from_symbol(temperature, &temp_unit)?)
                .humidity(humidity)
                .wind_speed(to_metric_from_symbol(wind_speed, &speed_unit)?);
            if let Some(p) = pressure {
                builder = builder.pressure(to_metric_from_symbol(p, &pressure_unit)?);
            }
            if let Some(w_m2) = solar {
                builder = builder.solar_radiation(w_m2);
            }
            if let Some(index) = uv {
                builder = builder.uv_index(index);
            }
            if let Some(total) = rain_total {
                builder = builder.precipitation(0.0, total);
            }
            let reading = builder.build()?;

            let derived = derive_checked(&settings, &reading)?;
            print_derived(settings.unit_system, &derived);
            Ok(())
        }

        Commands::Archive { file, last } => {
            let path = file
                .or_else(|| settings.archive_path.clone())
                .ok_or_else(|| {
                    ProcessingError::Config(
                        "no archive file given and archive_path is not set".to_string(),
                    )
                })?;
            let records = JsonLinesArchive::new(&path).read_all()?;
            println!("Archive {}: {} days", path.display(), records.len());

            let skip = records.len().saturating_sub(last);
            for record in &records[skip..] {
                println!("\n{}", record.summary());
            }
            Ok(())
        }
    }
}

async fn watch(
    settings: Settings,
    station: Option<String>,
    api_key: Option<String>,
    json: bool,
) -> Result<()> {
    let station_id = station.unwrap_or_else(|| settings.station.station_id.clone());
    let api_key = api_key.unwrap_or_else(|| settings.station.api_key.clone());
    let source = WeatherUndergroundSource::new(&station_id, &api_key)?
        .with_wind_direction_offset(settings.station.wind_direction_offset);
    let archive = ConfiguredArchive::from_path(settings.archive_path.as_deref());

    let mut pipeline = ObservationPipeline::new(source, archive, &settings)?;
    println!(
        "Watching station {} every {}s (Ctrl-C to stop)",
        station_id, settings.poll_interval_secs
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C; stop the process to exit");
            std::future::pending::<()>().await;
        }
    };

    let mut tally = CycleTally::default();
    poll(&mut pipeline, settings.poll_interval(), shutdown, |outcome| {
        tally.record(outcome);
        print_outcome(outcome, json);
    })
    .await;

    println!("\nStopped after {} cycles: {}", tally.total(), tally.summary());
    if let Some(extrema) = pipeline.extrema() {
        println!("{}", extrema.summary());
    }
    Ok(())
}

async fn replay(
    mut settings: Settings,
    input: PathBuf,
    archive: Option<PathBuf>,
    units: &str,
    json: bool,
    quiet: bool,
) -> Result<()> {
    if archive.is_some() {
        settings.archive_path = archive;
    }
    let units: UnitSystem = units.parse()?;
    let source = ReplaySource::from_csv_path(&input, units)?;
    let total = source.len() as u64;
    let archive = ConfiguredArchive::from_path(settings.archive_path.as_deref());

    let mut pipeline = ObservationPipeline::new(source, archive, &settings)?;
    let message = format!("Replaying {}", input.display());
    let mut progress = ProgressReporter::new(total, &message, quiet || json);

    loop {
        let outcome = pipeline.run_cycle().await;
        if matches!(outcome, Err(CycleError::Fetch(FetchError::Exhausted))) {
            break;
        }
        progress.record(&outcome);
        if json {
            print_outcome(&outcome, true);
        }
    }
    progress.finish();

    if !json {
        println!("\n{} readings: {}", total, progress.tally().summary());
        if let Some(extrema) = pipeline.extrema() {
            println!("\nCurrent day (not archived):\n{}", extrema.summary());
        }
        if let ConfiguredArchive::JsonLines(archive) = pipeline.archive() {
            println!("Finalized days appended to {}", archive.path().display());
        }
    }
    Ok(())
}

/// Derives a one-off reading after the same range checks the pipeline runs.
fn derive_checked(settings: &Settings, reading: &RawReading) -> Result<DerivedVariables> {
    if let Some(reason) = ReadingValidator::check_ranges(reading) {
        return Err(ProcessingError::Rejected(reason));
    }
    let calculator = DerivedCalculator::new(settings.derivation.clone())
        .with_altitude(settings.station.altitude_m);
    Ok(calculator.derive(reading))
}

fn print_derived(system: UnitSystem, derived: &DerivedVariables) {
    let t_unit = system.unit_for(Quantity::Temperature);

    let show = |label: &str, value: Option<f64>, unit: &str| match value {
        Some(v) => println!("  {:<24} {} {}", label, v, unit),
        None => println!("  {:<24} n/a", label),
    };
    let temp = |value: Option<f64>| value.map(|v| present(v, Quantity::Temperature, system));
    let t_symbol = t_unit.symbol();

    println!("Derived variables:");
    show("Dew point", temp(derived.dew_point), t_symbol);
    show("Heat index", temp(derived.heat_index), t_symbol);
    show("Wind chill", temp(derived.wind_chill), t_symbol);
    show("Apparent temperature", temp(derived.apparent_temperature), t_symbol);

    let thermo = &derived.thermodynamics;
    let one = |value: Option<f64>, decimals| value.map(|v| round_half_even(v, decimals));
    println!("Thermodynamics:");
    show("Wet bulb", temp(thermo.wet_bulb), t_symbol);
    show("Equivalent temperature", temp(thermo.equivalent_temperature), t_symbol);
    show(
        "Equivalent potential T",
        temp(thermo.equivalent_potential_temperature),
        t_symbol,
    );
    show("Vapour pressure", one(thermo.vapor_pressure, 2), "hPa");
    show("Mixing ratio", one(thermo.mixing_ratio, 2), "g/kg");
    show("Specific humidity", one(thermo.specific_humidity, 2), "g/kg");
    show("Absolute humidity", one(thermo.absolute_humidity, 2), "g/m³");
    show("Air density", one(thermo.air_density, 3), "kg/m³");
    show("Cloud base (LCL)", one(thermo.lcl_height, 0), "m");
    show("Station pressure", one(thermo.station_pressure, 1), "hPa");

    let radiation = &derived.radiation;
    if radiation == &Default::default() {
        return;
    }
    let label = |value: Option<String>| value.unwrap_or_else(|| "n/a".to_string());
    println!("Radiation:");
    show("ET0", one(radiation.et0, 2), "mm/day");
    show("Sky clarity", one(radiation.sky_clarity, 2), "");
    println!("  {:<24} {}", "Sky", label(radiation.sky.map(|s| s.to_string())));
    println!("  {:<24} {}", "UV risk", label(radiation.uv_risk.map(|r| r.to_string())));
    show("Water balance", one(radiation.water_balance, 1), "mm");
    println!(
        "  {:<24} {}",
        "Water balance class",
        label(radiation.water_balance_class.map(|c| c.to_string()))
    );
}

fn print_outcome(outcome: &CycleOutcome, json: bool) {
    match outcome {
        Ok(snapshot) if json => match serde_json::to_string(snapshot.as_ref()) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!(error = %e, "cannot serialize snapshot"),
        },
        Ok(snapshot) => println!("{}", snapshot.summary()),
        Err(e) if json => println!("{}", serde_json::json!({ "error": e.to_string() })),
        Err(e) => println!("⚠️  {}", e),
    }
}
