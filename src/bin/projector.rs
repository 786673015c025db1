//! Print the appreciation timeline for a catalog plot.

use clap::Parser;
use estate_intelligence::{config::AppConfig, Currency, Projection, ProjectionEngine};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Wealth projector for Cubana Millennium City plots.
#[derive(Parser, Debug)]
#[command(name = "projector", version, about)]
struct Args {
    /// Index into the catalog's plot list.
    #[arg(default_value_t = 2)]
    plot_index: usize,

    /// Year the plot is bought.
    #[arg(default_value_t = 2026)]
    purchase_year: i32,

    /// Display currency (NGN, USD, GBP).
    #[arg(default_value = "NGN")]
    currency: Currency,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    let config = AppConfig::from_env()?;
    let catalog = config.load_catalog()?;
    let engine = ProjectionEngine::from_catalog(&catalog);

    let plot = catalog.plot(args.plot_index)?;
    let (purchase_year, currency) = (args.purchase_year, args.currency);
    info!(plot = %plot.label, purchase_year, currency = %currency, "Projecting");

    let projection = engine.project(plot.base_price, purchase_year, currency)?;

    println!("\n=== {} ({} sqm) ===", plot.label, plot.size);
    for point in &projection.series {
        println!(
            "  {}{}  {:>18.2} {}",
            point.year,
            if point.is_entry_year { "*" } else { " " },
            point.value_in_display_currency,
            currency
        );
    }
    println!();
    for line in summary_lines(&projection, purchase_year) {
        println!("{}", line);
    }

    Ok(())
}

fn summary_lines(projection: &Projection, purchase_year: i32) -> Vec<String> {
    let currency = projection.currency;
    vec![
        format!("Entry price ({}):     {:.2} {}", purchase_year, projection.entry_value, currency),
        format!(
            "Projected value ({}): {:.2} {}",
            projection.next_year(),
            projection.next_year_value,
            currency
        ),
        format!(
            "Horizon value ({}):   {:.2} {}",
            projection.horizon_year,
            projection.horizon_value(),
            currency
        ),
        format!(
            "Potential growth by {}: +{:.0}%",
            projection.horizon_year, projection.total_appreciation_percent
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_project_executive_plot_in_naira() {
        let args = Args::try_parse_from(["projector"]).unwrap();
        assert_eq!(args.plot_index, 2);
        assert_eq!(args.purchase_year, 2026);
        assert_eq!(args.currency, Currency::Ngn);
    }

    #[test]
    fn test_currency_is_parsed_case_insensitively() {
        let args = Args::try_parse_from(["projector", "0", "2028", "usd"]).unwrap();
        assert_eq!(args.plot_index, 0);
        assert_eq!(args.purchase_year, 2028);
        assert_eq!(args.currency, Currency::Usd);
    }

    #[test]
    fn test_bad_values_are_usage_errors() {
        let err = Args::try_parse_from(["projector", "abc"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let err = Args::try_parse_from(["projector", "2", "2026", "EUR"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_summary_includes_horizon_value() {
        let projection = ProjectionEngine::default()
            .project(80_000_000.0, 2026, Currency::Ngn)
            .unwrap();
        let lines = summary_lines(&projection, 2026);

        assert_eq!(lines[0], "Entry price (2026):     80000000.00 NGN");
        assert_eq!(lines[1], "Projected value (2027): 92000000.00 NGN");
        assert_eq!(lines[2], "Horizon value (2031):   168000000.00 NGN");
        assert_eq!(lines[3], "Potential growth by 2031: +110%");
    }
}
