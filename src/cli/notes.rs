use std::env;

use anyhow::{anyhow, Result};
use ansi_term::Style;
use clap::Subcommand;

use crate::storage::entities::NoteDocument;

use super::{confirm, Stores};

#[derive(Debug, Subcommand)]
pub enum NoteCommand {
    #[command(about = "List notes")]
    List {},
    #[command(about = "Add a note")]
    Add {
        name: String,
        #[arg(help = "Note body; leave empty and edit later")]
        text: Vec<String>,
    },
    #[command(about = "Show a note")]
    View { name: String },
    #[command(about = "Open a note in $EDITOR")]
    Edit { name: String },
    #[command(about = "Delete a note, keeping a backup copy")]
    Delete { name: String },
    #[command(about = "Replace a note's tags")]
    Tag {
        name: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    #[command(name = "bytag", about = "List notes carrying a tag")]
    ByTag { tag: String },
}

pub async fn process_note_command(stores: &Stores, command: NoteCommand) -> Result<()> {
    match command {
        NoteCommand::List {} => {
            let notes = stores.notes.list().await?;
            if notes.is_empty() {
                println!("No notes yet.");
                return Ok(());
            }
            for note in notes {
                print_note_line(&note);
            }
            Ok(())
        }
        NoteCommand::Add { name, text } => {
            stores.notes.add(&name, &text.join(" ")).await?;
            println!("Added note {name}");
            Ok(())
        }
        NoteCommand::View { name } => {
            let note = stores.notes.load(&name).await?;
            println!("{}", Style::new().bold().paint(&note.name));
            if let Some(created) = note.created {
                println!("Created {}", created.format("%Y-%m-%d"));
            }
            if !note.tags.is_empty() {
                println!("Tags: {}", note.tags.join(", "));
            }
            if !note.body.is_empty() {
                println!();
                println!("{}", note.body);
            }
            Ok(())
        }
        NoteCommand::Edit { name } => {
            let path = stores.notes.path(&name).await?;
            let editor = env::var("VISUAL")
                .or_else(|_| env::var("EDITOR"))
                .unwrap_or_else(|_| "vi".to_string());
            let status = std::process::Command::new(&editor).arg(&path).status()?;
            if !status.success() {
                return Err(anyhow!("{editor} exited with {status}"));
            }
            Ok(())
        }
        NoteCommand::Delete { name } => {
            if !confirm(&format!("Delete note {name}?"))? {
                println!("Kept note {name}.");
                return Ok(());
            }
            match stores.notes.delete(&name).await? {
                Some(backup) => println!("Deleted {name}, backup at {}", backup.display()),
                None => println!("Deleted {name} (backup failed, see log)"),
            }
            Ok(())
        }
        NoteCommand::Tag { name, tags } => {
            let note = stores.notes.tag(&name, &tags).await?;
            println!("Tagged {name}: {}", note.tags.join(", "));
            Ok(())
        }
        NoteCommand::ByTag { tag } => {
            let notes = stores.notes.by_tag(&tag).await?;
            if notes.is_empty() {
                println!("No notes tagged {tag}.");
                return Ok(());
            }
            for note in notes {
                print_note_line(&note);
            }
            Ok(())
        }
    }
}

fn print_note_line(note: &NoteDocument) {
    if note.tags.is_empty() {
        println!("{}", note.name);
    } else {
        println!("{}\t[{}]", note.name, note.tags.join(", "));
    }
}
