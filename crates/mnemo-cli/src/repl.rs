//! REPL – Read-Eval-Print Loop for the Mnemo interactive shell.
//!
//! Each line is parsed by [`commands::parse`] and executed against the
//! [`MemoryEngine`] on the CLI's Tokio runtime.  Engine errors are printed
//! and the loop continues.

use colored::Colorize;
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use mnemo_memory::lifecycle::PruneOptions;
use mnemo_memory::retrieval::{RecallOptions, SearchOptions, WindowOptions};
use mnemo_memory::store::ScoredRecord;
use mnemo_memory::todos::TodoQuery;
use mnemo_memory::{MemoryEngine, MemoryError};
use mnemo_types::{
    NewJournalEntry, NewKnowledgeItem, NewMemory, NewThought, NewTodo, Record, RecordBody,
    RelateRequest, TodoUpdate,
};
use tokio::runtime::Runtime;

use crate::commands::{self, Command};

/// Whether the loop should keep reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Shared state between the REPL loop and the Ctrl-C handler.
#[derive(Debug, Default)]
pub struct Session {
    /// Set once the loop should stop.
    pub shutdown: AtomicBool,
    /// Set while a command is executing.
    pub busy: AtomicBool,
}

/// Reaction to a Ctrl-C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Idle at the prompt: nothing to finish, exit right away.
    ExitNow,
    /// A command is running: stop once it returns.
    AfterCommand,
}

impl Session {
    pub fn interrupt(&self) -> Interrupt {
        self.shutdown.store(true, Ordering::SeqCst);
        if self.busy.load(Ordering::SeqCst) {
            Interrupt::AfterCommand
        } else {
            Interrupt::ExitNow
        }
    }
}

/// Run the REPL until `/quit`, EOF, or shutdown is requested.
pub fn run(engine: &MemoryEngine, runtime: &Runtime, session: Arc<Session>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if session.shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "mnemo>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let cmd = match commands::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                println!(
                    "{} {}. Type {} for available commands.",
                    "Error:".red(),
                    e,
                    "/help".bold()
                );
                continue;
            }
        };

        session.busy.store(true, Ordering::SeqCst);
        let outcome = runtime.block_on(execute(engine, cmd));
        session.busy.store(false, Ordering::SeqCst);

        match outcome {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => {
                println!("{}", "Goodbye.".green());
                session.shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Err(e) => print_error(&e),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

async fn execute(engine: &MemoryEngine, cmd: Command) -> Result<Flow, MemoryError> {
    match cmd {
        Command::Help => cmd_help(),
        Command::Quit => return Ok(Flow::Quit),
        Command::Stats => {
            println!("{}", "Records".bold().underline());
            for (kind, n) in engine.stats().await? {
                println!("  {:<13} {}", kind.as_str(), n.to_string().yellow());
            }
        }
        Command::Store {
            channel,
            content,
            importance,
        } => {
            let mut req = NewMemory::new(content, channel);
            req.importance = importance;
            let record = engine.store(req).await?;
            print_created(&record);
        }
        Command::Recall {
            query,
            channel,
            limit,
            threshold,
        } => {
            let hits = engine
                .recall(
                    &query,
                    RecallOptions {
                        channel,
                        limit,
                        threshold,
                    },
                )
                .await?;
            print_scored(&hits);
        }
        Command::Summarize {
            channel,
            hours,
            limit,
        } => {
            let records = engine
                .summarize(channel, WindowOptions { hours, limit })
                .await?;
            print_records(&records);
        }
        Command::Reflect {
            query,
            limit,
            threshold,
        } => {
            let hits = engine
                .reflect(&query, SearchOptions { limit, threshold })
                .await?;
            print_scored(&hits);
        }
        Command::Context { channel, message } => {
            let bundle = engine.context(channel, &message).await?;
            println!("{}", "Relevant memories".bold().underline());
            print_scored(&bundle.relevant_memories);
            println!("{}", format!("Recent on {channel}").bold().underline());
            print_records(&bundle.recent_summary);
            println!("{}", "Elsewhere".bold().underline());
            print_records(&bundle.cross_channel_context);
        }
        Command::Prune { days, importance } => {
            let report = engine
                .prune(PruneOptions {
                    older_than_days: days,
                    importance_threshold: importance,
                })
                .await?;
            println!(
                "{} pruned {} memor{} created before {} with importance < {}",
                "✓".green().bold(),
                report.deleted.to_string().bold(),
                if report.deleted == 1 { "y" } else { "ies" },
                report.cutoff.format("%Y-%m-%d %H:%M"),
                report.importance_threshold
            );
        }
        Command::Relate {
            person_id,
            note,
            affection,
            relationship_type,
            moment,
        } => {
            let request = RelateRequest {
                person_id,
                note,
                affection,
                relationship_type,
                moment,
                metadata: Default::default(),
            };
            let record = engine.relate(request).await?;
            print_person(&record);
        }
        Command::People { order, limit } => {
            let people = engine.people(order, limit).await?;
            if people.is_empty() {
                println!("  {}", "(nobody yet)".dimmed());
            }
            for record in &people {
                println!("  {}", describe(record));
            }
        }
        Command::Person { person_id } => {
            let record = engine.person(&person_id).await?;
            print_person(&record);
        }
        Command::Think {
            thought_type,
            content,
            mood,
            importance,
        } => {
            let mut req = NewThought::new(content, thought_type);
            if let Some(mood) = mood {
                req = req.with_mood(mood);
            }
            req.importance = importance;
            let record = engine.think(req).await?;
            print_created(&record);
        }
        Command::Thoughts {
            thought_type,
            limit,
        } => {
            let records = engine.thoughts(thought_type, limit).await?;
            print_records(&records);
        }
        Command::Journal {
            journal_type,
            content,
            mood,
            energy,
        } => {
            let mut req = NewJournalEntry::new(content, journal_type);
            if let Some(mood) = mood {
                req = req.with_mood(mood);
            }
            if let Some(energy) = energy {
                req = req.with_energy(energy);
            }
            let record = engine.journal(req).await?;
            print_created(&record);
        }
        Command::JournalRecent { limit } => {
            let records = engine.journal_recent(limit).await?;
            print_records(&records);
        }
        Command::Learn {
            topic,
            content,
            knowledge_type,
            source,
            confidence,
            tags,
        } => {
            let mut req = NewKnowledgeItem::new(content, topic);
            if let Some(t) = knowledge_type {
                req = req.with_type(t);
            }
            if let Some(source) = source {
                req = req.with_source(source);
            }
            if let Some(c) = confidence {
                req = req.with_confidence(c);
            }
            req.tags = tags.into_iter().collect::<BTreeSet<_>>();
            let record = engine.learn(req).await?;
            print_created(&record);
        }
        Command::Knowledge {
            query,
            topic,
            limit,
            threshold,
        } => {
            let hits = engine
                .search_knowledge(&query, topic.as_deref(), SearchOptions { limit, threshold })
                .await?;
            print_scored(&hits);
        }
        Command::TodoAdd {
            title,
            description,
            priority,
            category,
            project,
        } => {
            let mut req = NewTodo::new(title);
            req.description = description;
            req.project = project;
            if let Some(p) = priority {
                req = req.with_priority(p);
            }
            if let Some(c) = category {
                req = req.with_category(c);
            }
            let record = engine.add_todo(req).await?;
            print_created(&record);
        }
        Command::TodoList { status, project } => {
            let todos = engine.todos(&TodoQuery { status, project }).await?;
            print_records(&todos);
        }
        Command::TodoDone { id } => {
            let record = engine.complete_todo(id).await?;
            println!("{} {}", "✓".green().bold(), describe(&record));
        }
        Command::TodoUpdate {
            id,
            status,
            priority,
            category,
            title,
            project,
        } => {
            let update = TodoUpdate {
                status,
                priority,
                category,
                title,
                project,
            };
            let record = engine.update_todo(id, update).await?;
            println!("{} {}", "✓".green().bold(), describe(&record));
        }
        Command::TodoRemove { id } => {
            engine.delete_todo(id).await?;
            println!("{} todo {} deleted", "✓".green().bold(), id);
        }
        Command::Forget { kind, id } => {
            engine.forget(kind, id).await?;
            println!("{} {} {} forgotten", "✓".green().bold(), kind, id);
        }
    }
    Ok(Flow::Continue)
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    let rows: &[(&str, &str)] = &[
        ("/store <channel> <text> [importance=]", "remember something said on a channel"),
        ("/recall <query> [channel= limit= threshold=]", "similar memories"),
        ("/summarize <channel> [hours= limit=]", "recent memories of a channel"),
        ("/reflect <query> [limit= threshold=]", "similar thoughts and journal entries"),
        ("/context <channel> <message>", "full context for an incoming message"),
        ("/prune [days= importance=]", "delete old, unimportant memories"),
        ("/relate <person> [note= affection=±x|=x type= moment=]", "update a relationship"),
        ("/people [favorites|recent] [limit=]", "list relationships"),
        ("/person <person>", "show one relationship"),
        ("/think <type> <text> [mood= importance=]", "record a thought"),
        ("/thoughts [type] [limit=]", "recent thoughts"),
        ("/journal [<type> <text> mood= energy=]", "write or list journal entries"),
        ("/learn <topic> <text> [type= source= confidence= tags=a,b]", "store knowledge"),
        ("/knowledge <query> [topic= limit= threshold=]", "search knowledge"),
        ("/todo [add|list|done|update|rm] …", "manage todos"),
        ("/forget <kind> <id>", "delete one record"),
        ("/stats", "record counts"),
        ("/quit  /exit", "exit the CLI"),
    ];
    println!();
    println!("{}", "Mnemo Commands".bold().underline());
    for (usage, what) in rows {
        println!("  {:<58} {}", usage.bold().cyan(), what.dimmed());
    }
    println!();
}

/// Human-readable age of a timestamp, e.g. `3h ago`.
fn age(record: &Record) -> String {
    let secs = (Utc::now() - record.created_at).num_seconds().max(0);
    match secs {
        s if s < 60 => format!("{s}s ago"),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s => format!("{}d ago", s / 86_400),
    }
}

/// One-line plain-text summary of a record.
fn describe(record: &Record) -> String {
    match &record.body {
        RecordBody::Todo(t) => format!(
            "{} [{} {}] {}{}",
            record.id,
            t.priority,
            t.status,
            t.title,
            t.project
                .as_deref()
                .map(|p| format!(" ({p})"))
                .unwrap_or_default()
        ),
        RecordBody::Relationship(r) => format!(
            "{} – {} – affection {:+.2}, {} note(s)",
            r.person_id,
            r.relationship_type,
            r.affection,
            r.notes.len()
        ),
        _ => format!(
            "{} [{}] {}",
            record.id,
            record.body.scope(),
            record.content
        ),
    }
}

fn print_created(record: &Record) {
    println!(
        "{} stored {} {} (importance {:.2})",
        "✓".green().bold(),
        record.kind(),
        record.id.to_string().bold(),
        record.importance
    );
}

fn print_records(records: &[Record]) {
    if records.is_empty() {
        println!("  {}", "(nothing found)".dimmed());
    }
    for record in records {
        println!("  {} {}", age(record).dimmed(), describe(record));
    }
}

fn print_scored(hits: &[ScoredRecord]) {
    if hits.is_empty() {
        println!("  {}", "(nothing found)".dimmed());
    }
    for hit in hits {
        println!(
            "  {} {} {}",
            format!("{:.2}", hit.score).yellow(),
            age(&hit.record).dimmed(),
            describe(&hit.record)
        );
    }
}

fn print_person(record: &Record) {
    println!("  {}", describe(record).bold());
    if let Some(r) = record.as_relationship() {
        for note in &r.notes {
            println!("    • {}", note);
        }
        for moment in &r.moments {
            println!("    ★ {} {}", moment.at.format("%Y-%m-%d").to_string().dimmed(), moment.text);
        }
    }
}

fn print_error(e: &MemoryError) {
    let label = if e.is_retryable() {
        "Temporary failure".yellow()
    } else {
        "Error".red()
    };
    println!("{}: {}", label, e);
}
