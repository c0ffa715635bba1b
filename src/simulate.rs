use crate::infra::{load_engine_config, load_scorecards};
use clap::Args;
use fincra_core::config::TelemetryConfig;
use fincra_core::cra::batch::load_records;
use fincra_core::cra::{
    calculate_cra_with, simulate_batch, BatchReport, CraInput, CraOutput, RuleSetSummary,
};
use fincra_core::error::AppError;
use fincra_core::telemetry;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON file containing one record object
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Engine configuration JSON (defaults apply when omitted)
    #[arg(long)]
    pub(crate) engine_config: Option<PathBuf>,
    /// Directory holding the five scorecard tables (defaults to CRA_SCORECARDS_DIR)
    #[arg(long)]
    pub(crate) scorecards: Option<PathBuf>,
    /// Print the raw JSON result instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SimulateArgs {
    /// JSON array or CSV file of records
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Engine configuration JSON (defaults apply when omitted)
    #[arg(long)]
    pub(crate) engine_config: Option<PathBuf>,
    /// Directory holding the five scorecard tables (defaults to CRA_SCORECARDS_DIR)
    #[arg(long)]
    pub(crate) scorecards: Option<PathBuf>,
    /// Print the full JSON report instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RulesetArgs {
    /// Engine configuration JSON (defaults apply when omitted)
    #[arg(long)]
    pub(crate) engine_config: Option<PathBuf>,
    /// Print the summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    init_cli_logging()?;
    let ScoreArgs {
        input,
        engine_config,
        scorecards,
        json,
    } = args;

    let raw = fs::read_to_string(&input)?;
    let value: serde_json::Value = serde_json::from_str(&raw).map_err(|err| {
        AppError::BadInput(format!("{} is not valid JSON: {err}", input.display()))
    })?;
    let record = CraInput::from_value(value)?;
    let config = load_engine_config(engine_config.as_deref())?;
    let tables = load_scorecards(scorecards);

    let output = calculate_cra_with(&record, &config, &tables);
    if json {
        println!("{}", to_pretty_json(&output)?);
    } else {
        print!("{}", render_assessment(&output));
    }
    Ok(())
}

pub(crate) fn run_simulate(args: SimulateArgs) -> Result<(), AppError> {
    init_cli_logging()?;
    let SimulateArgs {
        input,
        engine_config,
        scorecards,
        json,
    } = args;

    let records = load_records(&input)?;
    let config = load_engine_config(engine_config.as_deref())?;
    let tables = load_scorecards(scorecards);

    let report = simulate_batch(&records, &config, &tables);
    if json {
        println!("{}", to_pretty_json(&report)?);
    } else {
        print!("{}", render_batch(&report));
    }
    Ok(())
}

pub(crate) fn run_ruleset(args: RulesetArgs) -> Result<(), AppError> {
    init_cli_logging()?;
    let config = load_engine_config(args.engine_config.as_deref())?;
    let summary = RuleSetSummary::from_config(&config);

    if args.json {
        println!("{}", to_pretty_json(&summary)?);
    } else {
        print!("{}", render_ruleset(&summary));
    }
    Ok(())
}

fn init_cli_logging() -> Result<(), AppError> {
    let log_level = std::env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
    telemetry::init_stderr(&TelemetryConfig { log_level })?;
    Ok(())
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|err| AppError::Internal(err.to_string()))
}

pub(crate) fn render_assessment(output: &CraOutput) -> String {
    let mut lines = vec![
        format!("{} ({})", output.entity_name, output.record_id),
        format!(
            "- Final score {} ({}) | weighted score {}",
            output.final_score, output.risk_band, output.pre_override_score
        ),
    ];
    if let Some(name) = &output.override_applied {
        lines.push(format!("- Override applied: {name}"));
    }
    let scores = &output.component_scores;
    lines.push(format!(
        "- Pillars: geography {} | industry {} | entity {} | product {} | delivery {}",
        scores.geo, scores.ind, scores.ent, scores.prod, scores.deliv
    ));
    if output.findings.is_empty() {
        lines.push("- No findings".to_string());
    } else {
        lines.push("Findings:".to_string());
        lines.extend(output.findings.iter().map(|finding| format!("  - {finding}")));
    }
    join_lines(lines)
}

pub(crate) fn render_batch(report: &BatchReport) -> String {
    let summary = &report.summary;
    let mut lines = vec![
        format!(
            "CRA batch simulation ({})",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        format!(
            "- {} records | {} high risk | {} overrides applied | average score {:.2}",
            summary.total_records,
            summary.high_risk,
            summary.overrides_applied,
            summary.average_final_score
        ),
    ];
    if !summary.by_band.is_empty() {
        lines.push("Band distribution:".to_string());
        lines.extend(
            summary
                .by_band
                .iter()
                .map(|(band, count)| format!("  - {band}: {count}")),
        );
    }
    if !report.results.is_empty() {
        lines.push("Records:".to_string());
        for result in &report.results {
            let marker = result
                .override_applied
                .as_deref()
                .map(|name| format!(" [override: {name}]"))
                .unwrap_or_default();
            lines.push(format!(
                "  - {} {}: {} ({}){}",
                result.record_id, result.entity_name, result.final_score, result.risk_band, marker
            ));
        }
    }
    join_lines(lines)
}

pub(crate) fn render_ruleset(summary: &RuleSetSummary) -> String {
    let mut lines = vec![
        summary.intro.clone(),
        String::new(),
        format!("Weights: {}", summary.weights),
        String::new(),
        summary.geography_first.clone(),
        String::new(),
        "Override rules:".to_string(),
    ];
    if summary.overrides.is_empty() {
        lines.push("  (none)".to_string());
    }
    for rule in &summary.overrides {
        let note = if rule.shadowed {
            " (covered by the geography check)"
        } else {
            ""
        };
        lines.push(format!(
            "  {}. {}: {} -> score {}{}",
            rule.priority, rule.name, rule.condition_label, rule.result_score, note
        ));
    }
    lines.push(String::new());
    lines.push(format!("Risk bands: {}", summary.risk_bands));
    lines.push(format!("Prohibited countries: {}", summary.prohibited_countries));
    join_lines(lines)
}

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
