use anyhow::Result;
use ansi_term::{Colour, Style};
use clap::{CommandFactory, Subcommand};

use crate::{
    storage::entities::{Priority, ProjectDocument, ProjectTask},
    utils::clock::Clock,
};

use super::{confirm, Args, Stores};

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    #[command(about = "List projects")]
    List {},
    #[command(about = "Create a project")]
    Create {
        name: String,
        #[arg(
            long,
            help = "Due date. Examples are \"2025-04-01\", \"today\", \"tomorrow\", \"+5days\""
        )]
        due: Option<String>,
    },
    #[command(about = "Show a project and its tasks")]
    View { name: String },
    #[command(about = "Add a task to a project")]
    Add {
        name: String,
        description: String,
        #[arg(long, help = "Task priority: none, low, medium or high")]
        priority: Option<String>,
    },
    #[command(about = "Mark a task as done")]
    Done { name: String, id: u32 },
    #[command(about = "Delete a project, keeping a backup copy")]
    Delete { name: String },
    #[command(about = "Rename a project")]
    Rename { old: String, new: String },
}

pub async fn process_project_command(stores: &Stores, command: ProjectCommand) -> Result<()> {
    match command {
        ProjectCommand::List {} => {
            let projects = stores.projects.list().await?;
            if projects.is_empty() {
                println!("No projects yet.");
                return Ok(());
            }
            for project in projects {
                print_project_line(stores, &project);
            }
            Ok(())
        }
        ProjectCommand::Create { name, due } => {
            let project = stores.projects.create(&name, due.as_deref()).await?;
            match project.due() {
                Some(due) => println!("Created project {name}, due {due}"),
                None => println!("Created project {name}"),
            }
            Ok(())
        }
        ProjectCommand::View { name } => {
            let project = stores.projects.load(&name).await?;
            print_project(stores, &project);
            Ok(())
        }
        ProjectCommand::Add {
            name,
            description,
            priority,
        } => {
            let priority = parse_priority(priority.as_deref())?;
            let task = stores.projects.add_task(&name, &description, priority).await?;
            println!("Added task {} to {name}", task.id);
            Ok(())
        }
        ProjectCommand::Done { name, id } => {
            let task = stores.projects.mark_done(&name, id).await?;
            println!("Done: {}", task.description);
            Ok(())
        }
        ProjectCommand::Delete { name } => {
            if !confirm(&format!("Delete project {name}?"))? {
                println!("Kept project {name}.");
                return Ok(());
            }
            match stores.projects.delete(&name).await? {
                Some(backup) => println!("Deleted {name}, backup at {}", backup.display()),
                None => println!("Deleted {name} (backup failed, see log)"),
            }
            Ok(())
        }
        ProjectCommand::Rename { old, new } => {
            stores.projects.rename(&old, &new).await?;
            println!("Renamed {old} to {new}");
            Ok(())
        }
    }
}

fn parse_priority(value: Option<&str>) -> Result<Priority> {
    let Some(value) = value else {
        return Ok(Priority::None);
    };
    match Priority::parse_input(value) {
        Some(priority) => Ok(priority),
        None => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("{value} is not a priority; use none, low, medium or high"),
            )
            .into()),
    }
}

fn print_project_line(stores: &Stores, project: &ProjectDocument) {
    let (done, total, _) = project.completion();
    let due = match project.days_left(stores.clock.now()) {
        Some(days) if days < 0 => format!("\toverdue by {} days", -days),
        Some(0) => "\tdue today".to_string(),
        Some(days) => format!("\tdue in {days} days"),
        None => String::new(),
    };
    println!("{}\t{done}/{total} done{due}", project.name());
}

fn print_project(stores: &Stores, project: &ProjectDocument) {
    println!("{}", Style::new().bold().paint(project.name()));
    if let Some(created) = project.created() {
        println!("Created {}", created.format("%Y-%m-%d"));
    }
    if let Some(due) = project.due() {
        let countdown = match project.days_left(stores.clock.now()) {
            Some(days) if days < 0 => Colour::Red
                .paint(format!("overdue by {} days", -days))
                .to_string(),
            Some(0) => "due today".to_string(),
            Some(days) => format!("{days} days left"),
            None => String::new(),
        };
        println!("Due {due} ({countdown})");
    }
    let (done, total, share) = project.completion();
    println!("{done}/{total} done ({share})");

    if total > 0 {
        println!();
        for task in project.tasks() {
            print_task(task);
        }
    }
}

fn print_task(task: &ProjectTask) {
    let marker = if task.done { "[x]" } else { "[ ]" };
    let priority = match task.priority {
        Priority::None => String::new(),
        Priority::Low => format!("{} ", Colour::Blue.paint("LOW")),
        Priority::Medium => format!("{} ", Colour::Yellow.paint("MEDIUM")),
        Priority::High => format!("{} ", Colour::Red.bold().paint("HIGH")),
    };
    let description = if task.done {
        Style::new().dimmed().paint(&task.description).to_string()
    } else {
        task.description.clone()
    };
    println!("{:>3} {marker} {priority}{description}", task.id);
}
