use anyhow::Result;
use ansi_term::Style;
use chrono::Duration;
use clap::Parser;
use futures::TryStreamExt;

use crate::{
    storage::entities::TimerRecord,
    utils::{clock::Clock, percentage::Percentage, time::format_clock},
};

use super::{
    output::{
        records_since,
        summary::{summarize, Bucket, Report},
        ExtractConfig,
    },
    Stores,
};

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[arg(long, default_value_t = 7, help = "Trailing window in days")]
    days: u32,
    #[arg(short = 'p', long = "percentage", help = "Only show buckets with at least this share", default_value_t = Percentage::zero())]
    min_percentage: Percentage,
}

/// Command to process `report`. Summarizes recorded time from the last
/// `days` days into per-task, per-category and per-day groupings.
pub async fn process_report_command(
    stores: &Stores,
    ReportCommand {
        days,
        min_percentage,
    }: ReportCommand,
) -> Result<()> {
    let since = stores.clock.now() - Duration::seconds(days as i64 * 86400);

    let records: Vec<TimerRecord> = records_since(&stores.records, ExtractConfig { since })
        .try_collect()
        .await?;
    let report = summarize(records);

    print_report(days, min_percentage, &report);
    Ok(())
}

fn print_report(days: u32, min_percentage: Percentage, report: &Report) {
    let bold = Style::new().bold();

    println!("Last {days} days");
    println!(
        "{} {}",
        bold.paint("Total:"),
        format_clock(report.total_seconds)
    );

    if report.total_seconds == 0 {
        println!();
        println!("No records in the window.");
        return;
    }

    print_buckets("By task", &report.tasks, min_percentage);
    print_buckets("By category", &report.categories, min_percentage);
    print_buckets("By day", &report.days, min_percentage);
}

fn print_buckets(title: &str, buckets: &[Bucket], min_percentage: Percentage) {
    println!();
    println!("{}", Style::new().bold().paint(title));
    for bucket in buckets {
        if bucket.percentage < min_percentage {
            continue;
        }
        println!(
            "{:>4}\t{}\t{}",
            bucket.percentage.to_string(),
            format_clock(bucket.seconds),
            bucket.label
        );
    }
}
