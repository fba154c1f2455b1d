//! # Comment Subcommand
//!
//! The comment thread on a lead's assignment.

use anyhow::Result;
use clap::{Args, Subcommand};
use leadflow_core::{CommentId, LeadId};

use crate::Session;

#[derive(Args, Debug)]
pub struct CommentArgs {
    #[command(subcommand)]
    pub command: CommentCommand,
}

#[derive(Subcommand, Debug)]
pub enum CommentCommand {
    /// Add a comment to an assigned lead.
    Add {
        #[arg(long)]
        lead: LeadId,
        #[arg(long)]
        text: String,
    },

    /// Delete a comment (its author or a manager).
    Delete {
        #[arg(long)]
        id: CommentId,
    },

    /// List a lead's comments, oldest first.
    List {
        #[arg(long)]
        lead: LeadId,
    },
}

impl CommentCommand {
    pub fn mutates(&self) -> bool {
        !matches!(self, Self::List { .. })
    }
}

pub fn run_comment(args: &CommentArgs, session: &Session) -> Result<u8> {
    let engine = session.engine();
    match &args.command {
        CommentCommand::Add { lead, text } => {
            let comment = engine.add_comment(lead, &session.actor()?, text)?;
            println!("OK: added {}", comment.id);
            Ok(0)
        }
        CommentCommand::Delete { id } => {
            engine.delete_comment(id, &session.actor()?)?;
            println!("OK: deleted {id}");
            Ok(0)
        }
        CommentCommand::List { lead } => {
            for c in engine.list_comments(lead)? {
                let author = engine
                    .get_employee(&c.author_id)
                    .map(|e| e.name)
                    .unwrap_or_else(|_| c.author_id.to_string());
                println!("{}  {}: {}", c.created_at, author, c.text);
            }
            Ok(0)
        }
    }
}
