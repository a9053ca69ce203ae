use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use iob_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "iob")]
#[command(about = "Insulin-on-board and dose safety calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record an insulin dose
    Log {
        /// Units of insulin
        #[arg(long, allow_negative_numbers = true)]
        units: f64,

        /// Insulin type (rapid, short, intermediate, long)
        #[arg(long = "type", default_value = "rapid")]
        insulin_type: InsulinType,

        /// Action duration in hours (defaults to the configured duration for the type)
        #[arg(long)]
        duration: Option<f64>,

        /// When the dose was taken (RFC 3339, defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Show current insulin on board
    Status {
        /// Evaluate at this time (RFC 3339, defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Calculate a dose recommendation
    Calc {
        /// Grams of carbohydrate
        #[arg(long, allow_negative_numbers = true)]
        carbs: f64,

        /// Current sensor glucose (mg/dL)
        #[arg(long)]
        glucose: Option<f64>,

        /// Manually entered glucose (mg/dL), overrides --glucose
        #[arg(long)]
        manual_glucose: Option<f64>,

        /// Evaluate at this time (RFC 3339, defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// Record the recommended dose as a rapid-acting dose
        #[arg(long)]
        log: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    iob_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let log_path = data_dir.join("doses.jsonl");

    match cli.command {
        Commands::Log {
            units,
            insulin_type,
            duration,
            at,
        } => cmd_log(&log_path, &config, units, insulin_type, duration, at),
        Commands::Status { at, json } => cmd_status(&log_path, &config, at, json),
        Commands::Calc {
            carbs,
            glucose,
            manual_glucose,
            at,
            log,
            json,
        } => {
            let request = DoseRequest {
                carbs,
                current_glucose: glucose,
                manual_glucose,
            };
            cmd_calc(&log_path, &config, &request, at, log, json)
        }
    }
}

fn cmd_log(
    log_path: &Path,
    config: &Config,
    units: f64,
    insulin_type: InsulinType,
    duration: Option<f64>,
    at: Option<DateTime<Utc>>,
) -> Result<()> {
    let duration = duration.unwrap_or_else(|| config.calculator.duration_for(insulin_type));
    let dose = InsulinDose::new(units, at.unwrap_or_else(Utc::now), insulin_type, duration);
    dose.validate()?;

    let mut log = JsonlDoseLog::new(log_path);
    log.append(&dose)?;

    println!(
        "✓ Logged {:.2}u {} insulin ({}h action)",
        dose.amount, dose.insulin_type, dose.duration
    );
    Ok(())
}

fn cmd_status(
    log_path: &Path,
    config: &Config,
    at: Option<DateTime<Utc>>,
    json: bool,
) -> Result<()> {
    let now = at.unwrap_or_else(Utc::now);
    let doses = load_history(log_path, config, now)?;
    let result = calculate_iob(&doses, now)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    display_iob(&result);
    Ok(())
}

fn cmd_calc(
    log_path: &Path,
    config: &Config,
    request: &DoseRequest,
    at: Option<DateTime<Utc>>,
    log: bool,
    json: bool,
) -> Result<()> {
    let now = at.unwrap_or_else(Utc::now);
    let doses = load_history(log_path, config, now)?;
    let recommendation = recommend_dose(request, &doses, &config.calculator, &config.risk, now)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendation)?);
    } else {
        display_recommendation(&recommendation);
    }

    // Risk is advisory; logging proceeds whatever the level
    if log {
        if recommendation.total_dose > 0.0 {
            let dose = InsulinDose::new(
                recommendation.total_dose,
                now,
                InsulinType::Rapid,
                config.calculator.duration_for(InsulinType::Rapid),
            );
            let mut sink = JsonlDoseLog::new(log_path);
            sink.append(&dose)?;
            if !json {
                println!("\n✓ Logged {:.2}u rapid insulin", dose.amount);
            }
        } else if !json {
            println!("\nNothing to log (recommended dose is 0)");
        }
    }

    Ok(())
}

fn load_history(log_path: &Path, config: &Config, now: DateTime<Utc>) -> Result<Vec<InsulinDose>> {
    let source = JsonlDoseLog::new(log_path);
    load_active_doses(&source, &config.calculator, now)
}

fn display_iob(result: &IobResult) {
    println!("Insulin on board: {:.2}u", result.total_iob);
    println!("  Active:  {:.2}u", result.active_iob);
    println!("  Expired: {:.2}u", result.expired_iob);

    if result.doses.is_empty() {
        println!("\n  No recent doses.");
        return;
    }

    println!();
    for dose in &result.doses {
        println!(
            "  {:>6.2}u → {:>5.2}u left ({:>6.2}%), {:.2}h ago, {:.2}h remaining",
            dose.amount,
            dose.remaining_amount,
            dose.percentage_remaining,
            dose.hours_elapsed,
            dose.hours_remaining
        );
    }
}

fn display_recommendation(rec: &DoseRecommendation) {
    println!("Carb coverage:    {:.2}u", rec.carb_coverage);
    println!("Correction:       {:.2}u", rec.correction_dose);
    println!("Insulin on board: {:.2}u", rec.insulin_on_board);
    println!("Recommended dose: {:.2}u", rec.total_dose);
    println!();

    let marker = match rec.risk.level {
        RiskLevel::Low => "✓",
        RiskLevel::Medium | RiskLevel::High => "⚠",
    };
    println!("{} Risk: {}", marker, rec.risk.level);
    println!("  {}", rec.risk.message);
}
