use std::collections::HashMap;

use anyhow::Result;
use ansi_term::Style;
use chrono::Duration;
use now::DateTimeNow;

use crate::{
    cli::output::summary::UNCATEGORIZED,
    storage::{entities::TimerRecord, record_store::RecordStore, StoreError},
    utils::{
        clock::Clock,
        time::{epoch_start, format_clock, format_record_time},
    },
};

use super::{confirm, Stores};

pub async fn process_start(stores: &Stores, task_spec: &str) -> Result<()> {
    match stores.timers.start(task_spec, false).await {
        Ok(timer) => {
            println!(
                "Started {} at {}",
                timer.label(),
                timer.start.format("%H:%M:%S")
            );
            Ok(())
        }
        Err(StoreError::AlreadyRunning { task }) => {
            if confirm(&format!(
                "A timer for {task} is already running. Replace it?"
            ))? {
                let timer = stores.timers.start(task_spec, true).await?;
                println!(
                    "Started {} at {}",
                    timer.label(),
                    timer.start.format("%H:%M:%S")
                );
            } else {
                println!("Kept the running timer.");
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn process_stop(stores: &Stores) -> Result<()> {
    let record = stores.timers.stop(&stores.records).await?;
    println!(
        "Stopped {} after {}",
        record.label(),
        format_clock(record.seconds)
    );
    Ok(())
}

pub async fn process_status(stores: &Stores) -> Result<()> {
    let (timer, elapsed) = stores.timers.status().await?;
    println!("Running {} for {}", timer.label(), format_clock(elapsed));
    Ok(())
}

pub async fn process_history(stores: &Stores, count: usize) -> Result<()> {
    let records = stores.records.scan(epoch_start()).await?;
    if records.is_empty() {
        println!("No records yet.");
        return Ok(());
    }
    let skip = records.len().saturating_sub(count);
    for record in &records[skip..] {
        print_record(record);
    }
    Ok(())
}

pub async fn process_list(stores: &Stores) -> Result<()> {
    let today = stores.clock.now().beginning_of_day();
    let records = stores.records.scan(today).await?;
    if records.is_empty() {
        println!("Nothing recorded today.");
        return Ok(());
    }
    for record in &records {
        print_record(record);
    }
    let total: i64 = records.iter().map(|record| record.seconds).sum();
    println!();
    println!(
        "{} {}",
        Style::new().bold().paint("Total:"),
        format_clock(total)
    );
    Ok(())
}

pub async fn process_categories(stores: &Stores) -> Result<()> {
    let records = stores.records.scan(epoch_start()).await?;
    if records.is_empty() {
        println!("No records yet.");
        return Ok(());
    }

    let mut index = HashMap::<String, usize>::new();
    let mut totals: Vec<(String, usize, i64)> = Vec::new();
    for record in records {
        let category = if record.category.is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            record.category
        };
        match index.get(&category) {
            Some(&at) => {
                totals[at].1 += 1;
                totals[at].2 += record.seconds;
            }
            None => {
                index.insert(category.clone(), totals.len());
                totals.push((category, 1, record.seconds));
            }
        }
    }
    totals.sort_by(|a, b| b.2.cmp(&a.2));

    for (category, count, seconds) in totals {
        println!("{}\t{count} records\t{category}", format_clock(seconds));
    }
    Ok(())
}

pub async fn process_clean(stores: &Stores, days: u32) -> Result<()> {
    let cutoff = (stores.clock.now() - Duration::days(days as i64)).date_naive();
    if !confirm(&format!(
        "This removes records started before {cutoff}. Continue?"
    ))? {
        println!("Nothing pruned.");
        return Ok(());
    }

    let outcome = stores.records.prune(cutoff).await?;
    match outcome.backup {
        Some(backup) => println!("Backed up the old store to {}", backup.display()),
        None => println!("No record store yet, nothing to back up."),
    }
    println!(
        "Kept {} records, dropped {}.",
        outcome.kept, outcome.dropped
    );
    Ok(())
}

fn print_record(record: &TimerRecord) {
    println!(
        "{}\t{}\t{}",
        format_record_time(record.start),
        format_clock(record.seconds),
        record.label()
    );
}
