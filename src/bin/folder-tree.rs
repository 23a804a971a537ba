#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for browsing and maintaining an IMAP mailbox tree

use clap::{Parser, Subcommand};
use imap_folder_tree::{
    ElementDescriptor, FolderListMask, ImapConfig, MailboxClient, MailboxTree, MemoryPrefs,
    MemorySearches, NextMask, PreferenceStore, SnapshotLister, TreeConfig, prefs,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folder-tree")]
#[command(about = "Browse and maintain the IMAP mailbox tree of a webmail session")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// File holding preferences and saved searches between runs
    #[arg(long, global = true)]
    state: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Show the folder tree as a sidebar would
    Tree {
        /// Descend into collapsed mailboxes too
        #[arg(long)]
        all: bool,

        /// Include unsubscribed mailboxes
        #[arg(long)]
        unsub: bool,
    },

    /// List mailbox names in display order
    Folders {
        /// Include unsubscribed mailboxes
        #[arg(long)]
        unsub: bool,

        /// Include containers
        #[arg(long)]
        containers: bool,

        /// Include virtual folders
        #[arg(long)]
        vfolders: bool,

        /// Only list mailboxes below this one
        #[arg(long)]
        base: Option<String>,
    },

    /// Subscribe to mailboxes
    Subscribe {
        #[arg(required = true)]
        mailboxes: Vec<String>,
    },

    /// Unsubscribe from mailboxes
    Unsubscribe {
        #[arg(required = true)]
        mailboxes: Vec<String>,
    },

    /// Expand a mailbox in the sidebar
    Expand {
        mailbox: String,

        /// Expand all descendants too
        #[arg(long)]
        all: bool,
    },

    /// Collapse a mailbox in the sidebar
    Collapse { mailbox: String },

    /// Show or change the mailboxes checked for new mail
    Poll {
        mailboxes: Vec<String>,

        /// Stop polling the given mailboxes
        #[arg(long)]
        remove: bool,
    },

    /// Show the server's namespaces
    Namespaces,
}

/// What persists between runs.
#[derive(Default, Deserialize)]
struct State {
    #[serde(default)]
    prefs: MemoryPrefs,
    #[serde(default)]
    searches: MemorySearches,
}

#[derive(Serialize)]
struct StateRef<'a> {
    prefs: &'a MemoryPrefs,
    searches: &'a MemorySearches,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let client = MailboxClient::new(ImapConfig::from_env()?);

    if matches!(args.command, Command::Namespaces) {
        return cmd_namespaces(&client, &args).await;
    }

    let state = load_state(args.state.as_deref())?;
    let store = Arc::new(state.prefs);
    let searches = state.searches;

    let poll: Vec<String> = store
        .get(prefs::NAV_POLL)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default();
    let snapshot = client.snapshot(&poll).await?;
    let mut tree = MailboxTree::new(
        TreeConfig::from_env()?,
        SnapshotLister::new(snapshot),
        Arc::clone(&store),
        searches.clone(),
    );

    match &args.command {
        Command::Tree { all, unsub } => cmd_tree(&mut tree, &args, *all, *unsub)?,
        Command::Folders {
            unsub,
            containers,
            vfolders,
            base,
        } => {
            let mut mask = FolderListMask::empty();
            mask.set(FolderListMask::UNSUB, *unsub);
            mask.set(FolderListMask::CONTAINER, *containers);
            mask.set(FolderListMask::VFOLDER, *vfolders);
            cmd_folders(&mut tree, &args, mask, base.as_deref())?;
        }
        Command::Subscribe { mailboxes } => {
            for mailbox in mailboxes {
                client.subscribe(mailbox).await?;
            }
            tree.start_diff();
            tree.subscribe(mailboxes);
            print_changes(&mut tree, &args, "Subscribed to", mailboxes)?;
        }
        Command::Unsubscribe { mailboxes } => {
            for mailbox in mailboxes {
                client.unsubscribe(mailbox).await?;
            }
            tree.start_diff();
            tree.unsubscribe(mailboxes);
            print_changes(&mut tree, &args, "Unsubscribed from", mailboxes)?;
        }
        Command::Expand { mailbox, all } => {
            tree.start_diff();
            tree.expand(mailbox, *all);
            print_changes(&mut tree, &args, "Expanded", std::slice::from_ref(mailbox))?;
        }
        Command::Collapse { mailbox } => {
            tree.start_diff();
            tree.collapse(mailbox);
            print_changes(&mut tree, &args, "Collapsed", std::slice::from_ref(mailbox))?;
        }
        Command::Poll { mailboxes, remove } => {
            if *remove {
                tree.remove_poll_list(mailboxes);
            } else if !mailboxes.is_empty() {
                tree.add_poll_list(mailboxes);
            }
            let polled = tree.poll_list(true, false);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&polled)?);
            } else {
                for mailbox in &polled {
                    println!("{mailbox}");
                }
            }
        }
        Command::Namespaces => {}
    }

    if let Some(path) = &args.state {
        save_state(path, &store, &searches)?;
    }

    Ok(())
}

fn load_state(path: Option<&Path>) -> anyhow::Result<State> {
    let Some(path) = path.filter(|p| p.exists()) else {
        return Ok(State::default());
    };
    debug!("Loading state from {}", path.display());
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn save_state(path: &Path, prefs: &MemoryPrefs, searches: &MemorySearches) -> anyhow::Result<()> {
    let raw = serde_json::to_string_pretty(&StateRef { prefs, searches })?;
    std::fs::write(path, raw)?;
    debug!("Saved state to {}", path.display());
    Ok(())
}

async fn cmd_namespaces(client: &MailboxClient, args: &Args) -> anyhow::Result<()> {
    let namespaces = client.namespaces().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&namespaces)?);
    } else if namespaces.is_empty() {
        println!("No namespaces reported.");
    } else {
        println!("{:<10} {:<6} {}", "Kind", "Delim", "Prefix");
        println!("{}", "-".repeat(40));
        for ns in &namespaces {
            println!(
                "{:<10} {:<6} {:?}",
                format!("{:?}", ns.kind).to_lowercase(),
                ns.delimiter,
                ns.name
            );
        }
    }

    Ok(())
}

fn cmd_tree(tree: &mut MailboxTree, args: &Args, all: bool, unsub: bool) -> anyhow::Result<()> {
    if unsub {
        tree.show_unsubscribed(true);
    }
    let mask = if all {
        NextMask::SHOW_CLOSED
    } else {
        NextMask::empty()
    };
    let (rows, new_messages) = tree.build(mask, true);

    if args.json {
        let descriptors: Vec<ElementDescriptor> = rows
            .iter()
            .map(|row| ElementDescriptor::from_info(&row.info))
            .collect();
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }

    for row in &rows {
        let marker = if !row.info.children {
            ' '
        } else if tree.is_open(&row.info.value) || all {
            '-'
        } else {
            '+'
        };
        let unseen = row
            .info
            .status
            .filter(|_| row.info.polled)
            .map(|status| format!(" ({})", status.unseen))
            .unwrap_or_default();
        let unsubscribed = if row.info.subscribed {
            ""
        } else {
            " [unsubscribed]"
        };
        println!(
            "{}{marker} {}{unseen}{unsubscribed}",
            "  ".repeat(row.info.level),
            row.info.label
        );
    }

    let recent: u32 = new_messages.values().sum();
    if recent > 0 {
        println!("\n{recent} new message(s)");
    }

    Ok(())
}

fn cmd_folders(
    tree: &mut MailboxTree,
    args: &Args,
    mask: FolderListMask,
    base: Option<&str>,
) -> anyhow::Result<()> {
    let values: Vec<String> = tree
        .folder_list(mask, base)
        .into_iter()
        .map(|elt| elt.value)
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        for value in &values {
            println!("{value}");
        }
    }

    Ok(())
}

fn print_changes(
    tree: &mut MailboxTree,
    args: &Args,
    action: &str,
    mailboxes: &[String],
) -> anyhow::Result<()> {
    let response = tree.mailbox_response().unwrap_or_default();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        for mailbox in mailboxes {
            println!("{action} {mailbox}");
        }
    }

    Ok(())
}
