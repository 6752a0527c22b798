use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tickwindow::{MarketTracker, WindowConfig, WindowSnapshot};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tickwindow", about = "Rolling min/max/average over a trailing time window")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay observations and print the window snapshot after each one.
    Replay {
        /// Observations file (`<series> <rfc3339 time> <price>` per line).
        observations: PathBuf,
        /// Window length in days.
        #[arg(long, default_value_t = 10)]
        window_days: i64,
        /// Only print this series.
        #[arg(long)]
        series: Option<String>,
    },
    /// Replay observations, then print stored snapshots for a time range.
    Query {
        /// Observations file (`<series> <rfc3339 time> <price>` per line).
        observations: PathBuf,
        /// Series to query.
        #[arg(long)]
        series: String,
        /// Range start (RFC 3339).
        #[arg(long)]
        from: DateTime<Utc>,
        /// Range end (RFC 3339).
        #[arg(long)]
        to: DateTime<Utc>,
        /// Window length in days.
        #[arg(long, default_value_t = 10)]
        window_days: i64,
    },
}

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
struct Observation {
    series: String,
    time: DateTime<Utc>,
    price: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            observations,
            window_days,
            series,
        } => run_replay(observations, window_days, series)?,
        Commands::Query {
            observations,
            series,
            from,
            to,
            window_days,
        } => run_query(observations, &series, from, to, window_days)?,
    }

    Ok(())
}

fn run_replay(path: PathBuf, window_days: i64, only: Option<String>) -> Result<()> {
    let config = WindowConfig::days(window_days).context("invalid window length")?;
    let mut tracker = MarketTracker::new(config);

    for observation in read_observations(&path)? {
        let snapshot = tracker
            .add(&observation.series, observation.time, observation.price)
            .with_context(|| {
                format!(
                    "failed to add {} at {}",
                    observation.series, observation.time
                )
            })?;

        if is_selected(only.as_deref(), &observation.series) {
            print_snapshot(&observation.series, observation.time, &snapshot);
        }
    }

    Ok(())
}

fn run_query(
    path: PathBuf,
    series: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    window_days: i64,
) -> Result<()> {
    let config = WindowConfig::days(window_days).context("invalid window length")?;
    let mut tracker = MarketTracker::new(config);

    for observation in read_observations(&path)? {
        tracker
            .add(&observation.series, observation.time, observation.price)
            .with_context(|| {
                format!(
                    "failed to add {} at {}",
                    observation.series, observation.time
                )
            })?;
    }

    let data = tracker
        .get_data(series, from, to)
        .with_context(|| format!("query for series '{series}' failed"))?;

    if data.is_empty() {
        println!("No snapshots between {from} and {to}.");
    } else {
        for (time, snapshot) in data {
            print_snapshot(series, time, &snapshot);
        }
    }

    Ok(())
}

/// Whether `series` passes the optional `--series` filter
fn is_selected(only: Option<&str>, series: &str) -> bool {
    only.map_or(true, |name| name == series)
}

fn read_observations(path: &Path) -> Result<Vec<Observation>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open observations file {}", path.display()))?;
    parse_observations(BufReader::new(file))
}

/// Parse `<series> <rfc3339 time> <price>` lines; blank lines and `#`
/// comments are skipped
fn parse_observations<R: BufRead>(reader: R) -> Result<Vec<Observation>> {
    let mut observations = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let series = fields
            .next()
            .ok_or_else(|| anyhow::anyhow!("missing series on line {}", line_no + 1))?;
        let time_str = fields
            .next()
            .ok_or_else(|| anyhow::anyhow!("missing time on line {}", line_no + 1))?;
        let price_str = fields
            .next()
            .ok_or_else(|| anyhow::anyhow!("missing price on line {}", line_no + 1))?;

        let time = DateTime::parse_from_rfc3339(time_str)
            .with_context(|| format!("invalid time '{}' on line {}", time_str, line_no + 1))?
            .with_timezone(&Utc);
        let price: f64 = price_str
            .parse()
            .with_context(|| format!("invalid price '{}' on line {}", price_str, line_no + 1))?;

        observations.push(Observation {
            series: series.to_string(),
            time,
            price,
        });
    }

    Ok(observations)
}

fn print_snapshot(series: &str, time: DateTime<Utc>, snapshot: &WindowSnapshot) {
    println!(
        "{}\t{}\tprice={:.4}\tmin={:.4}\tmax={:.4}\tavg={:.4}",
        series,
        time.to_rfc3339(),
        snapshot.price,
        snapshot.min,
        snapshot.max,
        snapshot.average
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(input: &str) -> Result<Vec<Observation>> {
        parse_observations(input.as_bytes())
    }

    #[test]
    fn test_skips_blank_lines_and_comments() {
        let input = "# series time price\n\nAAA 2024-01-01T00:00:00Z 10.5\n   \n  # indented comment\nBBB 2024-01-02T12:00:00+02:00 3\n";
        let observations = parse(input).unwrap();

        assert_eq!(
            observations,
            vec![
                Observation {
                    series: "AAA".to_string(),
                    time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                    price: 10.5,
                },
                Observation {
                    series: "BBB".to_string(),
                    time: Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap(),
                    price: 3.0,
                },
            ]
        );
    }

    #[test]
    fn test_bad_timestamp_names_the_line() {
        let err = parse("AAA 2024-01-01T00:00:00Z 1\nAAA yesterday 2\n").unwrap_err();
        assert!(err.to_string().contains("invalid time 'yesterday' on line 2"));
    }

    #[test]
    fn test_missing_and_invalid_fields() {
        let err = parse("AAA 2024-01-01T00:00:00Z\n").unwrap_err();
        assert!(err.to_string().contains("missing price on line 1"));

        let err = parse("AAA\n").unwrap_err();
        assert!(err.to_string().contains("missing time on line 1"));

        let err = parse("AAA 2024-01-01T00:00:00Z cheap\n").unwrap_err();
        assert!(err.to_string().contains("invalid price 'cheap' on line 1"));
    }

    #[test]
    fn test_series_filter() {
        assert!(is_selected(None, "AAA"));
        assert!(is_selected(Some("AAA"), "AAA"));
        assert!(!is_selected(Some("AAA"), "BBB"));
    }

    #[test]
    fn test_parsed_input_feeds_tracker() {
        let observations = parse(
            "AAA 2024-01-01T00:00:00Z 10\nBBB 2024-01-01T00:00:00Z 99\nAAA 2024-01-02T00:00:00Z 20\n",
        )
        .unwrap();
        let mut tracker = MarketTracker::new(WindowConfig::days(10).unwrap());
        let mut last = None;
        for observation in observations.iter().filter(|o| is_selected(Some("AAA"), &o.series)) {
            last = Some(
                tracker
                    .add(&observation.series, observation.time, observation.price)
                    .unwrap(),
            );
        }

        let snapshot = last.unwrap();
        assert_eq!((snapshot.min, snapshot.max, snapshot.average), (10.0, 20.0, 15.0));
        assert_eq!(tracker.series(), vec!["AAA"]);
    }
}
