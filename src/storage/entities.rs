use chrono::{DateTime, Local, NaiveDate, NaiveTime};

use crate::utils::{
    percentage::Percentage,
    time::{format_record_time, parse_record_time},
};

/// Header line of the record store, naming the fields of every record line.
pub const RECORD_HEADER: &str = "start_time|end_time|category|task|duration|seconds";

/// One completed, immutable timed-task entry. `seconds` is the canonical
/// value used for aggregation; the human `HH:MM:SS` column in the file is
/// derived from it on write and ignored on read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerRecord {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub category: String,
    pub task: String,
    pub seconds: i64,
}

/// Display label combining category and task.
pub fn task_label(category: &str, task: &str) -> String {
    if category.is_empty() {
        task.to_string()
    } else {
        format!("{category}: {task}")
    }
}

impl TimerRecord {
    pub fn label(&self) -> String {
        task_label(&self.category, &self.task)
    }

    pub fn to_line(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            format_record_time(self.start),
            format_record_time(self.end),
            self.category,
            self.task,
            crate::utils::time::format_clock(self.seconds),
            self.seconds
        )
    }

    /// Parses one store line. Anything that isn't a well-formed record (the
    /// header included) yields `None` and is skipped by the caller.
    pub fn parse_line(line: &str) -> Option<TimerRecord> {
        let fields: Vec<&str> = line.split('|').collect();
        let [start, end, category, task, _duration, seconds] = fields[..] else {
            return None;
        };
        let start = parse_record_time(start)?;
        let end = parse_record_time(end)?;
        let seconds = seconds.trim().parse::<i64>().ok()?;
        if seconds < 0 || end < start || task.is_empty() {
            return None;
        }
        Some(TimerRecord {
            start,
            end,
            category: category.to_string(),
            task: task.to_string(),
            seconds,
        })
    }
}

/// The single in-flight timer, if any. Persisted as one line
/// `<epoch_seconds> <category> <task>`; an empty category keeps its
/// positional slot, so the task survives either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTimer {
    pub start: DateTime<Local>,
    pub category: String,
    pub task: String,
}

impl ActiveTimer {
    pub fn label(&self) -> String {
        task_label(&self.category, &self.task)
    }

    pub fn elapsed_seconds(&self, now: DateTime<Local>) -> i64 {
        (now - self.start).num_seconds().max(0)
    }

    pub fn to_line(&self) -> String {
        format!("{} {} {}", self.start.timestamp(), self.category, self.task)
    }

    pub fn parse_line(line: &str) -> Option<ActiveTimer> {
        let (epoch, rest) = line.trim_end().split_once(' ')?;
        let epoch = epoch.parse::<i64>().ok()?;
        let (category, task) = rest.split_once(' ').unwrap_or(("", rest));
        if task.is_empty() {
            return None;
        }
        let start = DateTime::from_timestamp(epoch, 0)?.with_timezone(&Local);
        Some(ActiveTimer {
            start,
            category: category.to_string(),
            task: task.to_string(),
        })
    }

    /// Splits a `category:task` spec; a spec without a separator is an
    /// uncategorized task.
    pub fn split_spec(spec: &str) -> (&str, &str) {
        match spec.split_once(':') {
            Some((category, task)) => (category.trim(), task.trim()),
            None => ("", spec.trim()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    /// The value stored in the priority field of a task line. No priority is
    /// an empty field.
    pub fn as_field(&self) -> &'static str {
        match self {
            Priority::None => "",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse_field(value: &str) -> Option<Priority> {
        match value {
            "" => Some(Priority::None),
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }

    /// Parses user input, accepting a couple of spellings.
    pub fn parse_input(value: &str) -> Option<Priority> {
        match value.to_ascii_lowercase().as_str() {
            "" | "none" => Some(Priority::None),
            "low" | "l" => Some(Priority::Low),
            "medium" | "med" | "m" => Some(Priority::Medium),
            "high" | "h" => Some(Priority::High),
            _ => None,
        }
    }
}

/// A task inside a project document. The id is assigned at creation and
/// never reassigned, so `done 3` keeps meaning the same task after the list
/// around it changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTask {
    pub id: u32,
    pub priority: Priority,
    pub description: String,
    pub done: bool,
}

impl ProjectTask {
    pub fn to_line(&self) -> String {
        format!(
            "[{}]|{}|{}|{}",
            if self.done { "x" } else { "" },
            self.id,
            self.priority.as_field(),
            self.description
        )
    }

    /// Parses a `[]|id|priority|description` line. Lines that don't look
    /// like a task, or carry a malformed id or priority, are not tasks and
    /// stay in the document untouched.
    pub fn parse_line(line: &str) -> Option<ProjectTask> {
        let (done, rest) = if let Some(rest) = line.strip_prefix("[]|") {
            (false, rest)
        } else if let Some(rest) = line.strip_prefix("[x]|") {
            (true, rest)
        } else {
            return None;
        };
        let mut fields = rest.splitn(3, '|');
        let id = fields.next()?.parse::<u32>().ok()?;
        let priority = Priority::parse_field(fields.next()?)?;
        let description = fields.next()?.to_string();
        Some(ProjectTask {
            id,
            priority,
            description,
            done,
        })
    }
}

const PROJECT_NAME_PREFIX: &str = "# Project: ";
const PROJECT_CREATED_PREFIX: &str = "# Created: ";
const PROJECT_DUE_PREFIX: &str = "# Due: ";
const DUE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
enum ProjectLine {
    Task(ProjectTask),
    Text(String),
}

/// A project document: metadata header lines plus an ordered task list.
/// Lines the parser doesn't recognize are carried through every rewrite
/// verbatim.
#[derive(Debug, Clone)]
pub struct ProjectDocument {
    name: String,
    lines: Vec<ProjectLine>,
}

impl ProjectDocument {
    pub fn new(
        name: &str,
        created: DateTime<Local>,
        due: Option<NaiveDate>,
    ) -> ProjectDocument {
        let mut lines = vec![
            ProjectLine::Text(format!("{PROJECT_NAME_PREFIX}{name}")),
            ProjectLine::Text(format!(
                "{PROJECT_CREATED_PREFIX}{}",
                format_record_time(created)
            )),
        ];
        if let Some(due) = due {
            lines.push(ProjectLine::Text(format!(
                "{PROJECT_DUE_PREFIX}{}",
                due.format(DUE_FORMAT)
            )));
        }
        ProjectDocument {
            name: name.to_string(),
            lines,
        }
    }

    pub fn parse(fallback_name: &str, content: &str) -> ProjectDocument {
        let lines: Vec<ProjectLine> = content
            .lines()
            .map(|line| match ProjectTask::parse_line(line) {
                Some(task) => ProjectLine::Task(task),
                None => ProjectLine::Text(line.to_string()),
            })
            .collect();
        let name = lines
            .iter()
            .find_map(|line| match line {
                ProjectLine::Text(text) => text.strip_prefix(PROJECT_NAME_PREFIX),
                _ => None,
            })
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| fallback_name.to_string());
        ProjectDocument { name, lines }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                ProjectLine::Task(task) => out.push_str(&task.to_line()),
                ProjectLine::Text(text) => out.push_str(text),
            }
            out.push('\n');
        }
        out
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        let header = format!("{PROJECT_NAME_PREFIX}{name}");
        for line in &mut self.lines {
            if let ProjectLine::Text(text) = line {
                if text.starts_with(PROJECT_NAME_PREFIX) {
                    *text = header;
                    return;
                }
            }
        }
        self.lines.insert(0, ProjectLine::Text(header));
    }

    fn metadata(&self, prefix: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            ProjectLine::Text(text) => text.strip_prefix(prefix).map(str::trim),
            _ => None,
        })
    }

    pub fn created(&self) -> Option<DateTime<Local>> {
        parse_record_time(self.metadata(PROJECT_CREATED_PREFIX)?)
    }

    pub fn due(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.metadata(PROJECT_DUE_PREFIX)?, DUE_FORMAT).ok()
    }

    /// Days until the due date at local midnight, floored, so any negative
    /// value means overdue. `None` when the project has no due date.
    pub fn days_left(&self, now: DateTime<Local>) -> Option<i64> {
        let due_start = self.due()?.and_time(NaiveTime::MIN);
        Some((due_start - now.naive_local()).num_seconds().div_euclid(86400))
    }

    pub fn tasks(&self) -> impl Iterator<Item = &ProjectTask> {
        self.lines.iter().filter_map(|line| match line {
            ProjectLine::Task(task) => Some(task),
            _ => None,
        })
    }

    pub fn task_mut(&mut self, id: u32) -> Option<&mut ProjectTask> {
        self.lines.iter_mut().find_map(|line| match line {
            ProjectLine::Task(task) if task.id == id => Some(task),
            _ => None,
        })
    }

    fn next_id(&self) -> u32 {
        self.tasks().map(|task| task.id).max().unwrap_or(0) + 1
    }

    pub fn add_task(&mut self, description: &str, priority: Priority) -> ProjectTask {
        let task = ProjectTask {
            id: self.next_id(),
            priority,
            description: description.to_string(),
            done: false,
        };
        self.lines.push(ProjectLine::Task(task.clone()));
        task
    }

    /// (done, total, completion share).
    pub fn completion(&self) -> (usize, usize, Percentage) {
        let total = self.tasks().count();
        let done = self.tasks().filter(|task| task.done).count();
        (done, total, Percentage::of(done as i64, total as i64))
    }
}

const NOTE_NAME_PREFIX: &str = "# Note: ";
const NOTE_CREATED_PREFIX: &str = "# Created: ";
const NOTE_TAGS_PREFIX: &str = "# Tags: ";

/// A note: a plain-text body behind a small metadata header.
#[derive(Debug, Clone)]
pub struct NoteDocument {
    pub name: String,
    pub created: Option<DateTime<Local>>,
    pub tags: Vec<String>,
    pub body: String,
}

impl NoteDocument {
    pub fn new(name: &str, created: DateTime<Local>, body: &str) -> NoteDocument {
        NoteDocument {
            name: name.to_string(),
            created: Some(created),
            tags: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn parse(fallback_name: &str, content: &str) -> NoteDocument {
        let mut name = None;
        let mut created = None;
        let mut tags = Vec::new();
        let mut lines = content.lines().peekable();
        while let Some(line) = lines.peek() {
            if let Some(value) = line.strip_prefix(NOTE_NAME_PREFIX) {
                name = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix(NOTE_CREATED_PREFIX) {
                created = parse_record_time(value.trim());
            } else if let Some(value) = line.strip_prefix(NOTE_TAGS_PREFIX) {
                tags = value
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect();
            } else {
                break;
            }
            lines.next();
        }
        let mut body: Vec<&str> = lines.collect();
        if body.first() == Some(&"") {
            body.remove(0);
        }
        NoteDocument {
            name: name.unwrap_or_else(|| fallback_name.to_string()),
            created,
            tags,
            body: body.join("\n"),
        }
    }

    pub fn render(&self) -> String {
        let mut out = format!("{NOTE_NAME_PREFIX}{}\n", self.name);
        if let Some(created) = self.created {
            out.push_str(&format!(
                "{NOTE_CREATED_PREFIX}{}\n",
                format_record_time(created)
            ));
        }
        if !self.tags.is_empty() {
            out.push_str(&format!("{NOTE_TAGS_PREFIX}{}\n", self.tags.join(", ")));
        }
        out.push('\n');
        out.push_str(&self.body);
        if !self.body.ends_with('\n') {
            out.push('\n');
        }
        out
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_record_line_round_trip() {
        let record = TimerRecord {
            start: local(2025, 3, 10, 9, 0, 0),
            end: local(2025, 3, 10, 10, 30, 5),
            category: "work".into(),
            task: "fix the build".into(),
            seconds: 5405,
        };
        let line = record.to_line();
        assert_eq!(
            line,
            "2025-03-10 09:00:00|2025-03-10 10:30:05|work|fix the build|01:30:05|5405"
        );
        assert_eq!(TimerRecord::parse_line(&line), Some(record));
    }

    #[test]
    fn test_record_line_rejects_garbage() {
        assert_eq!(TimerRecord::parse_line(RECORD_HEADER), None);
        assert_eq!(TimerRecord::parse_line(""), None);
        assert_eq!(TimerRecord::parse_line("a|b|c|d|e|f"), None);
        // end before start
        assert_eq!(
            TimerRecord::parse_line(
                "2025-03-10 10:00:00|2025-03-10 09:00:00|work|x|01:00:00|3600"
            ),
            None
        );
        assert_eq!(
            TimerRecord::parse_line("2025-03-10 09:00:00|2025-03-10 10:00:00|work|x|01:00:00|-1"),
            None
        );
    }

    #[test]
    fn test_active_timer_round_trip() {
        let timer = ActiveTimer {
            start: local(2025, 3, 10, 9, 0, 0),
            category: "work".into(),
            task: "fix the build".into(),
        };
        assert_eq!(ActiveTimer::parse_line(&timer.to_line()), Some(timer));
    }

    #[test]
    fn test_active_timer_empty_category_keeps_slot() {
        let timer = ActiveTimer {
            start: local(2025, 3, 10, 9, 0, 0),
            category: "".into(),
            task: "fix the build".into(),
        };
        let line = timer.to_line();
        assert!(line.contains("  fix the build"));
        assert_eq!(ActiveTimer::parse_line(&line), Some(timer));
    }

    #[test]
    fn test_split_spec() {
        assert_eq!(ActiveTimer::split_spec("work:fix it"), ("work", "fix it"));
        assert_eq!(ActiveTimer::split_spec("fix it"), ("", "fix it"));
        assert_eq!(ActiveTimer::split_spec(":fix"), ("", "fix"));
    }

    #[test]
    fn test_task_line_round_trip() {
        let task = ProjectTask {
            id: 3,
            priority: Priority::High,
            description: "ship it | really".into(),
            done: false,
        };
        let line = task.to_line();
        assert_eq!(line, "[]|3|high|ship it | really");
        assert_eq!(ProjectTask::parse_line(&line), Some(task));

        let done = ProjectTask {
            id: 4,
            priority: Priority::None,
            description: "done already".into(),
            done: true,
        };
        assert_eq!(done.to_line(), "[x]|4||done already");
        assert_eq!(ProjectTask::parse_line(&done.to_line()), Some(done));
    }

    #[test]
    fn test_task_line_rejects_malformed() {
        assert_eq!(ProjectTask::parse_line("# Project: x"), None);
        assert_eq!(ProjectTask::parse_line("[]|notanid||x"), None);
        assert_eq!(ProjectTask::parse_line("[]|1|urgent|x"), None);
        assert_eq!(ProjectTask::parse_line("[] no pipes here"), None);
    }

    #[test]
    fn test_project_document_round_trip() {
        let created = local(2025, 3, 10, 9, 0, 0);
        let due = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let mut doc = ProjectDocument::new("release", created, Some(due));
        doc.add_task("write changelog", Priority::Medium);
        doc.add_task("tag the release", Priority::None);

        let parsed = ProjectDocument::parse("release", &doc.render());
        assert_eq!(parsed.name(), "release");
        assert_eq!(parsed.created(), Some(created));
        assert_eq!(parsed.due(), Some(due));
        assert_eq!(parsed.tasks().count(), 2);
        assert_eq!(parsed.tasks().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_project_document_preserves_unknown_lines() {
        let content = "# Project: release\nsome free-form annotation\n[]|1||ship it\n";
        let doc = ProjectDocument::parse("release", content);
        assert_eq!(doc.render(), content);
    }

    #[test]
    fn test_project_ids_are_stable_across_completion() {
        let mut doc = ProjectDocument::new("p", local(2025, 3, 10, 9, 0, 0), None);
        doc.add_task("a", Priority::None);
        doc.add_task("b", Priority::None);
        doc.task_mut(1).unwrap().done = true;
        let parsed = ProjectDocument::parse("p", &doc.render());
        // ids survive the rewrite, so "done 2" still means task b
        assert_eq!(parsed.tasks().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(parsed.next_id(), 3);
    }

    #[test]
    fn test_days_left_floors_toward_overdue() {
        let mut doc = ProjectDocument::new("p", local(2025, 3, 10, 9, 0, 0), None);
        doc = ProjectDocument::parse(
            "p",
            &(doc.render() + "# Due: 2025-03-12\n"),
        );
        // due in ~1.6 days -> floor 1
        assert_eq!(doc.days_left(local(2025, 3, 10, 9, 0, 0)), Some(1));
        // 10 hours past due midnight -> floor(-10h/24h) = -1
        assert_eq!(doc.days_left(local(2025, 3, 12, 10, 0, 0)), Some(-1));
        // 34 hours past due midnight -> -2
        assert_eq!(doc.days_left(local(2025, 3, 13, 10, 0, 0)), Some(-2));
    }

    #[test]
    fn test_completion_percentage() {
        let mut doc = ProjectDocument::new("p", local(2025, 3, 10, 9, 0, 0), None);
        assert_eq!(doc.completion().2, Percentage::zero());
        for label in ["a", "b", "c", "d", "e"] {
            doc.add_task(label, Priority::None);
        }
        doc.task_mut(1).unwrap().done = true;
        doc.task_mut(2).unwrap().done = true;
        let (done, total, share) = doc.completion();
        assert_eq!((done, total), (2, 5));
        assert_eq!(*share, 40);
    }

    #[test]
    fn test_note_round_trip() {
        let mut note = NoteDocument::new(
            "meeting",
            local(2025, 3, 10, 9, 0, 0),
            "agenda\n- item one\n- item two",
        );
        note.tags = vec!["work".into(), "q1".into()];
        let parsed = NoteDocument::parse("meeting", &note.render());
        assert_eq!(parsed.name, "meeting");
        assert_eq!(parsed.created, note.created);
        assert_eq!(parsed.tags, note.tags);
        assert_eq!(parsed.body, note.body);
    }

    #[test]
    fn test_note_tag_matching_is_case_insensitive() {
        let mut note = NoteDocument::new("n", local(2025, 3, 10, 9, 0, 0), "");
        note.tags = vec!["Work".into()];
        assert!(note.has_tag("work"));
        assert!(!note.has_tag("play"));
    }
}
