//! Handlers for `finny stats` and `finny watch`.

use crate::args::{OutputFormat, StatsArgs, WatchArgs};
use crate::commands::Out;
use crate::model::TimeRange;
use crate::refresh::RefreshLoop;
use crate::source::{self, ExpenseSource, Mode};
use crate::stats::StatsReport;
use crate::{Config, Result};
use anyhow::Context;
use chrono::{Local, NaiveDate};
use std::time::Duration;
use tracing::{info, warn};

/// Computes the statistics for the requested range (or the configured default) as of today. The
/// message is the rendered report.
pub async fn stats(config: Config, mode: Mode, args: &StatsArgs) -> Result<Out<StatsReport>> {
    let source = source::source(&config, mode)?;
    let range = args.range().unwrap_or(config.default_range());
    let report = report(source.as_ref(), range, Local::now().date_naive()).await?;
    let rendered = render(&report, args.format())?;
    Ok(Out::new(rendered, report))
}

/// Prints the statistics, then prints them again each time they change, until Ctrl-C.
pub async fn watch(config: Config, mode: Mode, args: &WatchArgs) -> Result<Out<()>> {
    let source = source::source(&config, mode)?;
    let range = args.range().unwrap_or(config.default_range());
    let interval = args
        .interval()
        .map(Duration::from_secs)
        .unwrap_or(config.poll_interval());
    info!(
        "Watching spending for {}, press Ctrl-C to stop",
        range.describe()
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for Ctrl-C, stopping: {e}");
        }
    };
    RefreshLoop::new(source, range, interval)
        .run(|report| println!("{report}"), shutdown)
        .await?;
    Ok("Stopped watching".into())
}

async fn report(
    source: &dyn ExpenseSource,
    range: TimeRange,
    now: NaiveDate,
) -> Result<StatsReport> {
    let expenses = source
        .fetch_expenses()
        .await
        .context("Unable to read expenses")?;
    Ok(StatsReport::compute(&expenses, range, now))
}

fn render(report: &StatsReport, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => report.to_string(),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("Unable to serialize the report")?
        }
    })
}
