use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use sales_analyzer::model::{AnalysisResult, MonthlyBucket};
use sales_analyzer::Analysis;
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sales_analyzer")]
#[command(about = "Promotion and pricing analysis for a daily sales CSV")]
#[command(version)]
struct Cli {
    /// CSV with columns: date (DD/MM/YYYY), revenue, cost of sales, quantity
    #[arg(env = "SALES_ANALYZER_INPUT")]
    input: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
    format: OutputFormat,

    /// Indent JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Leave the monthly rollup out of the report
    #[arg(long, default_value_t = false)]
    no_monthly: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Summary,
}

#[derive(Serialize)]
struct Report<'a> {
    dropped_rows: usize,
    analysis: &'a AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    monthly: Option<&'a [MonthlyBucket]>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sales_analyzer=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(input = %cli.input.display(), "loading sales data");

    let analysis = sales_analyzer::run_from_path(&cli.input)
        .with_context(|| format!("failed to analyse '{}'", cli.input.display()))?;

    match cli.format {
        OutputFormat::Json => {
            let report = Report {
                dropped_rows: analysis.dropped_rows,
                analysis: &analysis.result,
                monthly: (!cli.no_monthly).then_some(analysis.monthly.as_slice()),
            };
            let json = if cli.pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{}", json);
        }
        OutputFormat::Summary => print_summary(&analysis, !cli.no_monthly),
    }

    Ok(())
}

fn print_summary(analysis: &Analysis, show_monthly: bool) {
    let r = &analysis.result;

    println!(
        "{} days ({} to {}), {} rows dropped",
        r.record_count, r.first_date, r.last_date, analysis.dropped_rows
    );
    println!(
        "Unit price: avg {:.2}, range {:.2} - {:.2}",
        r.avg_unit_price, r.min_unit_price, r.max_unit_price
    );
    println!(
        "Revenue {:.2} | Quantity {} | Avg GP {}%",
        r.total_revenue,
        r.total_quantity,
        fmt_opt(r.avg_gross_profit_pct)
    );
    println!(
        "Per day: {:.0} units, {:.2} revenue",
        r.avg_daily_quantity, r.avg_daily_revenue
    );

    println!("\nCampaigns ({} detected, top {} shown)", r.campaigns_detected, r.top_campaigns.len());
    for (i, c) in r.campaign_summaries().iter().enumerate() {
        let ped = match (c.price_elasticity, c.elasticity) {
            (Some(ped), Some(class)) => format!("PED {:.2} ({:?})", ped, class),
            _ => "PED undefined".to_string(),
        };
        println!(
            "  #{} {} to {} ({} days) | avg price {} | {}",
            i + 1,
            c.start_date,
            c.end_date,
            c.days,
            fmt_opt(c.avg_unit_price),
            ped
        );
    }

    println!("\nPromotional vs regular");
    for (label, seg) in [("promo", &r.promotional), ("regular", &r.regular)] {
        match seg {
            Some(s) => println!(
                "  {:<8} {} days | price {:.2} | qty {:.0} | revenue {:.0} | GP {}%",
                label,
                s.days,
                s.avg_unit_price,
                s.avg_quantity,
                s.avg_revenue,
                fmt_opt(s.avg_gross_profit_pct)
            ),
            None => println!("  {:<8} no days", label),
        }
    }
    match &r.lift {
        Some(l) => println!(
            "  lift: revenue {:+.1}% | volume {:+.1}% | price {:+.1}% | GP {}pp",
            l.revenue_lift_pct,
            l.quantity_lift_pct,
            l.price_change_pct,
            fmt_opt(l.gross_profit_delta_pct)
        ),
        None => println!("  lift: undefined"),
    }

    if show_monthly {
        println!("\nMonthly");
        for m in &analysis.monthly {
            println!(
                "  {} | price {:.2} | qty {} | revenue {:.0} | GP {}%",
                m.key,
                m.avg_unit_price,
                m.total_quantity,
                m.total_revenue,
                fmt_opt(m.avg_gross_profit_pct)
            );
        }
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{:.2}", x)).unwrap_or_else(|| "-".to_string())
}
