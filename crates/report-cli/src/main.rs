//! report-cli: Run the statement analysis engine over a JSON request file.
//!
//! The request holds the current period, optional prior and peer periods and an
//! optional scope. Benchmarks come from a JSON table (`--benchmarks`), from the
//! HTTP service named by `BENCHMARK_API_URL`, or are absent.
//!
//! Usage:
//!   cargo run -p report-cli -- --input request.json
//!   cargo run -p report-cli -- --input request.json --benchmarks table.json --tiers ratio,cash_flow
//!   cargo run -p report-cli -- --input request.json --flat --output report.json
//!   cargo run -p report-cli -- --list --categories liquidity

use std::path::{Path, PathBuf};
use std::sync::Arc;

use analysis_orchestrator::{export, AnalysisOrchestrator, EngineConfig};
use anyhow::{Context, Result};
use benchmark_provider::{CachedBenchmarkProvider, HttpBenchmarkProvider, StaticBenchmarkProvider};
use clap::Parser;
use formula_library::{catalog, DefinitionSummary};
use statement_core::{AnalysisRequest, BenchmarkProvider, NoBenchmarks, Tier};
use tokio_util::sync::CancellationToken;

/// Financial statement analysis report generator
#[derive(Parser, Debug)]
#[command(name = "report-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON analysis request
    #[arg(short, long, required_unless_present = "list")]
    input: Option<PathBuf>,

    /// JSON benchmark table; overrides BENCHMARK_API_URL
    #[arg(short, long)]
    benchmarks: Option<PathBuf>,

    /// Restrict to these tiers (comma separated)
    #[arg(long, value_delimiter = ',')]
    tiers: Vec<Tier>,

    /// Restrict to these categories (comma separated)
    #[arg(long, value_delimiter = ',')]
    categories: Vec<String>,

    /// Restrict to these analysis ids (comma separated)
    #[arg(long, value_delimiter = ',')]
    analyses: Vec<String>,

    /// Emit results keyed by analysis id
    #[arg(long)]
    flat: bool,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// List the analysis catalog and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    if args.list {
        let json = list_catalog(&args.tiers, &args.categories)?;
        return emit(&json, args.output.as_deref());
    }

    let config = EngineConfig::from_env().context("Failed to load engine configuration")?;
    let provider = select_provider(&args, &config)?;

    let input = args.input.as_deref().context("--input is required")?;
    let mut request = read_request(input)?;
    if !args.tiers.is_empty() {
        request.tiers = args.tiers.clone();
    }
    if !args.categories.is_empty() {
        request.categories = args.categories.clone();
    }
    if !args.analyses.is_empty() {
        request.analyses = args.analyses.clone();
    }

    let engine = AnalysisOrchestrator::new(provider, config).context("Failed to build analysis engine")?;
    tracing::info!(provider = engine.provider_name(), "Engine ready");

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            ctrl_c.cancel();
        }
    });

    let report = engine
        .run_with_cancel(request, token)
        .await
        .context("Analysis run failed")?;

    tracing::info!(
        score = report.overall_score,
        computed = report.metadata.analyses_computed,
        failed = report.metadata.analyses_failed,
        findings = report.findings.len(),
        recommendations = report.recommendations.len(),
        "Report generated"
    );

    let json = if args.flat {
        export::to_flat_json(&report)
    } else {
        export::to_json(&report)
    }
    .context("Failed to serialize report")?;

    emit(&json, args.output.as_deref())
}

fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "report_cli=info,analysis_orchestrator=info,benchmark_provider=warn".into())
    };
    let json_logging = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // Logs go to stderr so stdout stays a clean report.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter())
            .init();
    }
}

fn select_provider(args: &Args, config: &EngineConfig) -> Result<Arc<dyn BenchmarkProvider>> {
    if let Some(path) = &args.benchmarks {
        let table = StaticBenchmarkProvider::from_path(path)
            .with_context(|| format!("Failed to load benchmark table {}", path.display()))?;
        tracing::info!(entries = table.len(), "Loaded benchmark table");
        return Ok(Arc::new(table));
    }

    if let Some(url) = &config.benchmark_api_url {
        let http = HttpBenchmarkProvider::new(url.clone(), config.benchmark_timeout)
            .context("Failed to create benchmark API client")?;
        let ttl = chrono::Duration::seconds(config.benchmark_cache_ttl_secs);
        tracing::info!(url = %url, ttl_secs = config.benchmark_cache_ttl_secs, "Using benchmark API");
        return Ok(Arc::new(CachedBenchmarkProvider::with_ttl(http, ttl)));
    }

    tracing::warn!("No benchmark source configured, results will be graded without benchmarks");
    Ok(Arc::new(NoBenchmarks))
}

fn read_request(path: &Path) -> Result<AnalysisRequest> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid analysis request in {}", path.display()))
}

fn list_catalog(tiers: &[Tier], categories: &[String]) -> Result<String> {
    let summaries: Vec<DefinitionSummary> = catalog()
        .select(tiers, categories, &[])
        .into_iter()
        .map(|(_, def)| DefinitionSummary::from(def))
        .collect();
    serde_json::to_string_pretty(&summaries).context("Failed to serialize catalog")
}

fn emit(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_flags_parse() {
        let args = Args::parse_from([
            "report-cli",
            "--input",
            "request.json",
            "--tiers",
            "structural,cash_flow",
            "--categories",
            "liquidity",
            "--flat",
        ]);
        assert_eq!(args.tiers, vec![Tier::Structural, Tier::CashFlow]);
        assert_eq!(args.categories, vec!["liquidity".to_string()]);
        assert!(args.flat);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_unknown_tier_rejected() {
        let result = Args::try_parse_from(["report-cli", "--input", "r.json", "--tiers", "quantum"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_input_required_unless_listing() {
        assert!(Args::try_parse_from(["report-cli"]).is_err());
        assert!(Args::try_parse_from(["report-cli", "--list"]).is_ok());
    }

    #[test]
    fn test_list_catalog_filters() {
        let json = list_catalog(&[], &["liquidity".to_string()]).unwrap();
        let listed: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.iter().all(|d| d["category"] == "liquidity"));
    }

    #[tokio::test]
    async fn test_request_file_runs() {
        let path = std::env::temp_dir().join(format!("report-cli-request-{}.json", std::process::id()));
        let request = serde_json::json!({
            "current": {
                "year": 2024,
                "current_assets": 500000.0,
                "current_liabilities": 250000.0
            },
            "analyses": ["current_ratio"]
        });
        std::fs::write(&path, request.to_string()).unwrap();

        let request = read_request(&path).unwrap();
        let engine = AnalysisOrchestrator::with_defaults(Arc::new(NoBenchmarks));
        let report = engine.run(request).await.unwrap();
        assert_eq!(report.results.len(), 1);
        assert!(report.results[0].computed);

        std::fs::remove_file(&path).ok();
    }
}
