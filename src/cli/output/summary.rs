use std::collections::HashMap;
use std::hash::Hash;

use crate::storage::entities::{task_label, TimerRecord};
use crate::utils::percentage::Percentage;

pub const UNCATEGORIZED: &str = "(uncategorized)";

/// An aggregation group with its summed duration and share of the total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub label: String,
    pub seconds: i64,
    pub percentage: Percentage,
}

/// Summary of a record window: total duration plus the per-task,
/// per-category and per-day groupings, each sorted for display.
#[derive(Debug)]
pub struct Report {
    pub total_seconds: i64,
    pub tasks: Vec<Bucket>,
    pub categories: Vec<Bucket>,
    pub days: Vec<Bucket>,
}

/// Accumulates seconds per key, remembering first-encounter order so that
/// equal totals keep it after sorting.
struct Grouping<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, i64)>,
}

impl<K: Eq + Hash + Clone> Grouping<K> {
    fn new() -> Grouping<K> {
        Grouping {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn add(&mut self, key: K, seconds: i64) {
        match self.index.get(&key) {
            Some(&at) => self.entries[at].1 += seconds,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, seconds));
            }
        }
    }

    fn into_buckets(self, total: i64, label: impl Fn(K) -> String) -> Vec<Bucket> {
        self.entries
            .into_iter()
            .map(|(key, seconds)| Bucket {
                label: label(key),
                percentage: Percentage::of(seconds, total),
                seconds,
            })
            .collect()
    }
}

/// A stable sort, so buckets with equal totals stay in insertion order.
fn sort_by_seconds(buckets: &mut [Bucket]) {
    buckets.sort_by(|a, b| b.seconds.cmp(&a.seconds));
}

pub fn summarize(records: impl IntoIterator<Item = TimerRecord>) -> Report {
    let mut total = 0i64;
    let mut tasks = Grouping::<(String, String)>::new();
    let mut categories = Grouping::<String>::new();
    let mut days = Grouping::<String>::new();

    for record in records {
        total += record.seconds;
        days.add(record.start.format("%Y-%m-%d").to_string(), record.seconds);
        categories.add(
            if record.category.is_empty() {
                UNCATEGORIZED.to_string()
            } else {
                record.category.clone()
            },
            record.seconds,
        );
        tasks.add((record.category, record.task), record.seconds);
    }

    let mut tasks =
        tasks.into_buckets(total, |(category, task)| task_label(&category, &task));
    sort_by_seconds(&mut tasks);

    let mut categories = categories.into_buckets(total, |category| category);
    sort_by_seconds(&mut categories);

    let mut days = days.into_buckets(total, |day| day);
    // ISO dates sort lexicographically, newest first
    days.sort_by(|a, b| b.label.cmp(&a.label));

    Report {
        total_seconds: total,
        tasks,
        categories,
        days,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Local, TimeZone};

    use super::*;

    fn record(start: DateTime<Local>, category: &str, task: &str, seconds: i64) -> TimerRecord {
        TimerRecord {
            start,
            end: start + Duration::seconds(seconds),
            category: category.into(),
            task: task.into(),
            seconds,
        }
    }

    fn day(d: u32, hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, d, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_window() {
        let report = summarize(vec![]);
        assert_eq!(report.total_seconds, 0);
        assert!(report.tasks.is_empty());
        assert!(report.categories.is_empty());
        assert!(report.days.is_empty());
    }

    #[test]
    fn test_category_shares() {
        // two work records and an uncategorized one over two days
        let report = summarize(vec![
            record(day(9, 10), "work", "build", 3600),
            record(day(10, 10), "work", "review", 1800),
            record(day(10, 12), "", "errands", 900),
        ]);

        assert_eq!(report.total_seconds, 6300);

        assert_eq!(report.categories.len(), 2);
        assert_eq!(report.categories[0].label, "work");
        assert_eq!(report.categories[0].seconds, 5400);
        assert_eq!(*report.categories[0].percentage, 85);
        assert_eq!(report.categories[1].label, UNCATEGORIZED);
        assert_eq!(report.categories[1].seconds, 900);
        assert_eq!(*report.categories[1].percentage, 14);
    }

    #[test]
    fn test_task_grouping_merges_same_label() {
        let report = summarize(vec![
            record(day(9, 10), "work", "build", 100),
            record(day(9, 12), "work", "build", 50),
            record(day(9, 13), "", "build", 25),
        ]);

        // same task name under a different category is a different bucket
        assert_eq!(report.tasks.len(), 2);
        assert_eq!(report.tasks[0].label, "work: build");
        assert_eq!(report.tasks[0].seconds, 150);
        assert_eq!(report.tasks[1].label, "build");
        assert_eq!(report.tasks[1].seconds, 25);
    }

    #[test]
    fn test_ties_keep_first_encountered_order() {
        let report = summarize(vec![
            record(day(9, 10), "", "first", 300),
            record(day(9, 11), "", "second", 300),
            record(day(9, 12), "", "third", 600),
        ]);

        let labels: Vec<&str> = report.tasks.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["third", "first", "second"]);
    }

    #[test]
    fn test_days_sort_newest_first() {
        let report = summarize(vec![
            record(day(9, 10), "", "a", 100),
            record(day(11, 10), "", "b", 100),
            record(day(10, 10), "", "c", 100),
            record(day(10, 18), "", "d", 100),
        ]);

        let labels: Vec<&str> = report.days.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2025-03-11", "2025-03-10", "2025-03-09"]);
        assert_eq!(report.days[1].seconds, 200);
    }

    #[test]
    fn test_percentages_never_sum_above_total() {
        let report = summarize(vec![
            record(day(9, 10), "", "a", 1),
            record(day(9, 11), "", "b", 1),
            record(day(9, 12), "", "c", 1),
        ]);
        let sum: u32 = report.tasks.iter().map(|b| *b.percentage).sum();
        assert!(sum <= 100);
        assert_eq!(
            report.tasks.iter().map(|b| b.seconds).sum::<i64>(),
            report.total_seconds
        );
    }
}
