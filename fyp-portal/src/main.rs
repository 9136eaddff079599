//! fyp-portal - command-line client for the FYP document review portal
//!
//! Resolves configuration (CLI > environment > TOML > defaults), hydrates
//! the session, then runs one subcommand. `watch` and `chat` keep polling
//! until Ctrl+C.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDateTime};
use clap::{Parser, Subcommand};
use fyp_common::config::{CliOverrides, PortalConfig};
use fyp_common::events::PortalEvent;
use fyp_common::models::{Deadline, Document, DocumentKind, NewGrade, Notification};
use fyp_common::stats::DashboardStats;
use fyp_common::time::{describe_until, format_timestamp};
use fyp_common::{DocumentStatus, ReviewDecision, Role};
use fyp_portal::api::{FileUpload, NewDeadline, Registration};
use fyp_portal::live::{ChatTranscript, NotificationWatcher};
use fyp_portal::views::DocumentScope;
use fyp_portal::{Confirm, Portal, PortalError};
use serde::Serialize;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for fyp-portal
#[derive(Parser, Debug)]
#[command(name = "fyp-portal")]
#[command(about = "Client for the FYP document review and grading portal")]
#[command(version)]
struct Args {
    /// Backend base URL (overrides FYP_API_BASE_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Persist the session in this file between runs
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Account email; other commands sign in with it when no session is stored
    #[arg(long, global = true, env = "FYP_EMAIL")]
    email: Option<String>,

    #[arg(long, global = true, env = "FYP_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Answer yes to confirmation prompts
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in (with --email and --password) and store the session
    Login,
    /// Create an account (with --email and --password)
    Register {
        #[arg(long)]
        full_name: String,
        #[arg(long, value_parser = parse_role)]
        role: Role,
        #[arg(long)]
        registration_number: Option<String>,
        #[arg(long)]
        department: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List documents
    Documents {
        /// Only documents in this status
        #[arg(long, value_parser = parse_status)]
        status: Option<DocumentStatus>,
        /// Only documents waiting on you
        #[arg(long)]
        pending: bool,
    },
    /// Submit a document for review
    Submit { document_id: i64 },
    /// Upload a new document or a new version of one
    Upload {
        file: PathBuf,
        /// Existing document to add a version to
        #[arg(long, conflicts_with_all = ["kind", "title"])]
        document: Option<i64>,
        /// Kind of a new document (Proposal, Design Document, ...)
        #[arg(long, value_parser = parse_kind, requires = "title")]
        kind: Option<DocumentKind>,
        #[arg(long)]
        title: Option<String>,
        /// Description, or change notes for a version
        #[arg(long)]
        description: Option<String>,
    },
    /// Review a document
    Review {
        document_id: i64,
        /// Approved, revision or rejected
        #[arg(long, value_parser = parse_decision, required_unless_present_any = ["begin", "finalize"])]
        decision: Option<ReviewDecision>,
        #[arg(long, default_value = "")]
        comments: String,
        /// Only pick the document up for review
        #[arg(long, conflicts_with_all = ["decision", "finalize"])]
        begin: bool,
        /// Give final approval (committee)
        #[arg(long, conflicts_with = "decision")]
        finalize: bool,
    },
    /// Version history of a document
    Versions { document_id: i64 },
    /// Review history and versions of a document
    Feedback { document_id: i64 },
    /// Grades of a document
    Grades { document_id: i64 },
    /// Score one rubric criterion of a document (evaluator)
    Score {
        document_id: i64,
        #[arg(long)]
        criterion: String,
        #[arg(long)]
        score: f64,
        #[arg(long)]
        max: f64,
        #[arg(long)]
        feedback: Option<String>,
        /// Correct this existing, unreleased grade instead
        #[arg(long)]
        correct: Option<i64>,
    },
    /// Release all grades of a document to the student
    ReleaseGrades { document_id: i64 },
    /// Detailed Marks Certificate
    Dmc {
        /// Student to report on (defaults to yourself)
        #[arg(long)]
        student: Option<i64>,
    },
    /// Deadlines, with per-document status for students
    Deadlines {
        /// Include deactivated deadlines
        #[arg(long)]
        all: bool,
        /// Only deadlines due within this many hours
        #[arg(long)]
        within_hours: Option<i64>,
    },
    /// Set a new deadline (committee)
    AddDeadline {
        /// Label shown to students ("Proposal", "Code Files", ...)
        label: String,
        /// Due date, "YYYY-MM-DD HH:MM"
        #[arg(long, value_parser = parse_due)]
        due: NaiveDateTime,
        /// Document kind the deadline governs
        #[arg(long, value_parser = parse_kind)]
        kind: Option<DocumentKind>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Stop a deadline from applying, keeping its documents
    DeactivateDeadline { deadline_id: i64 },
    /// Delete a deadline (and its documents)
    DeleteDeadline { deadline_id: i64 },
    /// List notifications
    Notifications {
        #[arg(long)]
        unread: bool,
    },
    /// Mark notifications read
    MarkRead {
        #[arg(required_unless_present = "all")]
        notification_id: Option<i64>,
        #[arg(long, conflicts_with = "notification_id")]
        all: bool,
    },
    /// Delete a notification
    DeleteNotification { notification_id: i64 },
    /// Follow notifications live
    Watch,
    /// Follow a group chat, or send to it
    Chat {
        group_id: i64,
        #[arg(long)]
        send: Option<String>,
    },
    /// Dashboard counts
    Stats,
}

fn parse_role(s: &str) -> std::result::Result<Role, String> {
    s.to_ascii_uppercase().replace('-', "_").parse::<Role>().map_err(|e| format!("{}", e))
}

fn parse_status(s: &str) -> std::result::Result<DocumentStatus, String> {
    s.to_ascii_uppercase().replace('-', "_").parse::<DocumentStatus>().map_err(|e| format!("{}", e))
}

fn parse_kind(s: &str) -> std::result::Result<DocumentKind, String> {
    s.replace(['-', '_'], " ").parse::<DocumentKind>().map_err(|e| format!("{}", e))
}

fn parse_due(s: &str) -> std::result::Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").map_err(|e| format!("{}", e))
}

fn parse_decision(s: &str) -> std::result::Result<ReviewDecision, String> {
    s.parse::<ReviewDecision>().map_err(|e| format!("{}", e))
}

/// Confirmation on the terminal, unless `--yes`
struct TerminalConfirm {
    assume_yes: bool,
}

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{} [y/N] ", prompt);
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = PortalConfig::resolve(&CliOverrides {
        api_base_url: args.api_url.clone(),
        session_file: args.session_file.clone(),
        config_file: args.config.clone(),
    })
    .context("Failed to load configuration")?;

    // Initialize tracing (stderr, so command output stays clean)
    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("fyp_portal={level},fyp_common={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting fyp-portal v{} against {}",
        env!("CARGO_PKG_VERSION"),
        config.api_base_url
    );

    let portal = Portal::init(config).context("Failed to initialise portal")?;
    match run(&portal, &args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Some(portal_err) = e.downcast_ref::<PortalError>() {
                warn!(kind = portal_err.kind(), "Command failed: {}", portal_err);
                bail!("{}", portal_err.user_message());
            }
            Err(e)
        }
    }
}

async fn run(portal: &Portal, args: &Args) -> Result<()> {
    let confirm = TerminalConfirm { assume_yes: args.yes };

    match &args.command {
        Command::Login => {
            let (email, password) = credentials(args)?;
            let user = portal.api.login(email, password).await?;
            println!("Signed in as {} ({})", user.full_name, user.role);
            if portal.config.session_file.is_none() {
                println!("No session file configured; the session ends with this process.");
            }
            return Ok(());
        }
        Command::Register {
            full_name,
            role,
            registration_number,
            department,
        } => {
            let (email, password) = credentials(args)?;
            let registered = portal
                .api
                .register(&Registration {
                    email: email.to_string(),
                    password: password.to_string(),
                    full_name: full_name.clone(),
                    role: *role,
                    registration_number: registration_number.clone(),
                    department: department.clone(),
                })
                .await?;
            println!("Registered user {} ({})", registered.user_id, registered.email);
            return Ok(());
        }
        Command::Logout => {
            portal.api.logout();
            println!("Signed out");
            return Ok(());
        }
        _ => {}
    }

    ensure_signed_in(portal, args).await?;
    let user = portal.session.require_user()?;

    match &args.command {
        Command::Whoami => {
            if args.json {
                return print_json(&user);
            }
            println!("{} <{}>", user.full_name, user.email);
            println!("Role: {}  User id: {}", user.role, user.user_id);
        }

        Command::Documents { status, pending } => {
            let view = match status {
                Some(status) => portal.documents_in(DocumentScope::Status(*status)),
                None => portal.documents()?,
            };
            view.load().await?;
            let documents = if *pending {
                view.pending(user.role)
            } else {
                view.documents()
            };
            if args.json {
                return print_json(&documents);
            }
            print_documents(&documents);
        }

        Command::Submit { document_id } => {
            let view = portal.documents()?;
            view.load().await?;
            let document = view.submit(*document_id).await?;
            println!("Document {} is now {}", document.id, document.status.label());
        }

        Command::Upload {
            file,
            document,
            kind,
            title,
            description,
        } => {
            let upload = FileUpload::from_path(file).await?;
            let view = portal.documents()?;
            view.load().await?;
            let stored = match (document, kind, title) {
                (Some(id), _, _) => {
                    view.upload_version(*id, upload, description.as_deref())
                        .await?
                }
                (None, Some(kind), Some(title)) => {
                    view.create(*kind, title, description.as_deref(), upload)
                        .await?
                }
                _ => bail!("Give --document for a new version, or --kind and --title for a new document"),
            };
            println!(
                "Document {} \"{}\" at version {} ({})",
                stored.id,
                stored.title,
                stored.version,
                stored.status.label()
            );
        }

        Command::Review {
            document_id,
            decision,
            comments,
            begin,
            finalize,
        } => {
            let view = portal.documents()?;
            view.load().await?;
            if *begin {
                let document = view.begin_review(*document_id).await?;
                println!("Document {} is now {}", document.id, document.status.label());
            } else if *finalize {
                let document = view.finalize(*document_id).await?;
                println!("Document {} is now {}", document.id, document.status.label());
            } else if let Some(decision) = decision {
                let review = view.review(*document_id, *decision, comments).await?;
                println!(
                    "Recorded review {} (round {}) on document {}",
                    review.id, review.review_round, review.document_id
                );
                if let Some(document) = view.document(*document_id) {
                    println!("Document {} is now {}", document.id, document.status.label());
                }
            }
        }

        Command::Versions { document_id } => {
            let versions = portal.api.document_versions(*document_id).await?;
            if args.json {
                return print_json(&versions);
            }
            for v in versions {
                println!(
                    "v{:<3} {:<40} {}{}",
                    v.version_number,
                    v.file_name,
                    format_timestamp(v.uploaded_at),
                    if v.was_submitted { "  submitted" } else { "" }
                );
                if let Some(change) = v.change_description {
                    println!("      {}", change);
                }
            }
        }

        Command::Feedback { document_id } => {
            let feedback = portal.documents()?.feedback(*document_id).await?;
            if args.json {
                return print_json(&feedback);
            }
            if feedback.reviews.is_empty() {
                println!("No reviews yet");
            }
            for review in &feedback.reviews {
                let reviewer = match (&review.reviewer_name, review.reviewer_role) {
                    (Some(name), Some(role)) => format!("{} ({})", name, role),
                    (Some(name), None) => name.clone(),
                    (None, Some(role)) => role.to_string(),
                    (None, None) => "Reviewer".to_string(),
                };
                println!(
                    "{}  round {:<2} {:<20} {}",
                    format_timestamp(review.reviewed_at),
                    review.review_round,
                    review.decision.label(),
                    reviewer
                );
                println!("      {}", review.comments);
            }
            println!("{} version(s) uploaded", feedback.versions.len());
            if let Some(latest) = &feedback.latest {
                println!("Latest decision: {}", latest.decision.label());
            }
        }

        Command::Grades { document_id } => {
            let view = portal.grades();
            view.load_document(*document_id).await?;
            let grades = view.items();
            if args.json {
                return print_json(&grades);
            }
            for g in &grades {
                println!(
                    "{:<30} {:>6.1}/{:<6.1} {}",
                    g.rubric_criteria,
                    g.score,
                    g.max_score,
                    if g.is_released { "released" } else { "" }
                );
            }
            let document = portal.api.get_document(*document_id).await?;
            match view.summary(&document) {
                Some(summary) => println!(
                    "Released: {:.2}% {} (GPA {:.2})",
                    summary.percentage, summary.letter, summary.gpa
                ),
                None => println!("No grades released yet"),
            }
            if user.role == Role::Evaluator && !view.is_grading_complete(*document_id)? {
                println!("Grading incomplete: not every criterion has a score from you");
            }
        }

        Command::Score {
            document_id,
            criterion,
            score,
            max,
            feedback,
            correct,
        } => {
            let view = portal.grades();
            let grade = NewGrade {
                document_id: *document_id,
                rubric_criteria: criterion.clone(),
                score: *score,
                max_score: *max,
                feedback: feedback.clone(),
            };
            let stored = match correct {
                Some(grade_id) => {
                    view.load_document(*document_id).await?;
                    view.correct(*grade_id, &grade).await?
                }
                None => view.grade(&grade).await?,
            };
            println!(
                "{}: {:.1}/{:.1} (grade {})",
                stored.rubric_criteria, stored.score, stored.max_score, stored.id
            );
            if !view.is_grading_complete(*document_id)? {
                println!("Grading incomplete: not every criterion has a score from you");
            }
        }

        Command::ReleaseGrades { document_id } => {
            let view = portal.grades();
            view.load_document(*document_id).await?;
            view.release_all(*document_id).await?;
            println!("Released grades for document {}", document_id);
        }

        Command::Dmc { student } => {
            let student_id = match (student, user.role) {
                (Some(id), _) => *id,
                (None, Role::Student) => user.user_id,
                (None, _) => bail!("--student is required"),
            };
            let certificate = portal.grades().marks_certificate(student_id).await?;
            if args.json {
                return print_json(&certificate);
            }
            for doc in &certificate.documents {
                println!(
                    "{:<40} {:>6.1}/{:<6.1} {:>6.2}%  {:<2}  {:.2}",
                    doc.title, doc.total_score, doc.total_max, doc.percentage, doc.letter, doc.gpa
                );
            }
            println!(
                "Overall: {:.1}/{:.1} {:.2}%  {}",
                certificate.overall_total_score,
                certificate.overall_max_score,
                certificate.overall_percentage,
                certificate.overall_grade
            );
            println!("CGPA: {:.2}", certificate.overall_gpa);
        }

        Command::Deadlines { all, within_hours } => {
            let view = portal.deadlines(*all);
            view.load().await?;
            let now = portal.clock.now();

            if let Some(hours) = within_hours {
                let due = view.approaching(Duration::hours(*hours));
                if args.json {
                    return print_json(&due);
                }
                print_deadlines(&due, now);
            } else if user.role == Role::Student {
                let documents = portal.api.student_documents(user.user_id).await?;
                let rows = view.rows(&documents);
                if args.json {
                    return print_json(&rows);
                }
                for row in rows {
                    let state = match (&row.document, row.is_missed) {
                        (_, true) => "MISSED".to_string(),
                        (Some(doc), _) => doc.status.label().to_string(),
                        (None, _) => "Not uploaded".to_string(),
                    };
                    println!(
                        "{:<24} {}  {:<28} {}{}",
                        row.label,
                        format_timestamp(row.deadline.due),
                        state,
                        if row.can_upload { "[upload] " } else { "" },
                        if row.can_submit { "[submit]" } else { "" }
                    );
                }
            } else {
                let deadlines = view.items();
                if args.json {
                    return print_json(&deadlines);
                }
                print_deadlines(&deadlines, now);
            }
        }

        Command::AddDeadline {
            label,
            due,
            kind,
            description,
        } => {
            let view = portal.deadlines(true);
            let created = view
                .create(&NewDeadline {
                    deadline_type: label.clone(),
                    due: *due,
                    description: description.clone(),
                    document_type: *kind,
                })
                .await?;
            println!(
                "Deadline {} \"{}\" due {}",
                created.id,
                created.deadline_type,
                format_timestamp(created.due)
            );
            if let Some(superseded) = created
                .linked_kind()
                .and_then(|k| view.in_force(k))
                .filter(|d| d.id != created.id)
            {
                println!("Note: deadline {} still governs this kind", superseded.id);
            }
        }

        Command::DeactivateDeadline { deadline_id } => {
            let view = portal.deadlines(true);
            view.load().await?;
            view.deactivate(*deadline_id).await?;
            println!("Deactivated deadline {}", deadline_id);
        }

        Command::DeleteDeadline { deadline_id } => {
            let view = portal.deadlines(true);
            view.load().await?;
            view.delete(&confirm, *deadline_id).await?;
            println!("Deleted deadline {}", deadline_id);
        }

        Command::Notifications { unread } => {
            let view = portal.notifications(*unread)?;
            view.load().await?;
            let items = view.items();
            if args.json {
                return print_json(&items);
            }
            print_notifications(&items);
            println!("{} unread", view.unread());
        }

        Command::MarkRead { notification_id, all } => {
            let view = portal.notifications(false)?;
            view.load().await?;
            if *all {
                view.mark_all_read().await?;
                println!("All notifications marked read");
            } else if let Some(id) = notification_id {
                view.mark_read(*id).await?;
                println!("Notification {} marked read", id);
            }
        }

        Command::DeleteNotification { notification_id } => {
            let view = portal.notifications(false)?;
            view.load().await?;
            view.delete(&confirm, *notification_id).await?;
            println!("Deleted notification {}", notification_id);
        }

        Command::Watch => {
            let mut events = portal.events.subscribe();
            let watcher = NotificationWatcher::start(
                Arc::clone(&portal.api),
                user.user_id,
                &portal.config.polling,
                portal.events.clone(),
                user.role == Role::Student,
            );
            println!("Watching notifications for {} (Ctrl+C to stop)", user.full_name);
            loop {
                tokio::select! {
                    _ = signal::ctrl_c() => break,
                    event = events.recv() => match event {
                        Ok(event) => print_event(&event, args.json)?,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            warn!("Skipped {} events", n);
                        }
                        Err(_) => break,
                    },
                }
            }
            drop(watcher);
        }

        Command::Chat { group_id, send } => {
            let mut chat = ChatTranscript::for_api(
                Arc::clone(&portal.api),
                portal.config.polling.chat(),
                portal.events.clone(),
            );
            chat.select_group(*group_id);

            if let Some(content) = send {
                let sent = chat.send(&portal.api, user.user_id, content).await?;
                println!("Sent message {}", sent.id);
                return Ok(());
            }

            let mut events = portal.events.subscribe();
            let mut shown = 0usize;
            println!("Group {} chat (Ctrl+C to stop)", group_id);
            loop {
                tokio::select! {
                    _ = signal::ctrl_c() => break,
                    event = events.recv() => match event {
                        Ok(PortalEvent::ChatUpdated { .. }) => {
                            let messages = chat.messages();
                            for m in messages.iter().skip(shown) {
                                let sender = m
                                    .sender
                                    .as_ref()
                                    .and_then(|s| s.full_name.clone())
                                    .unwrap_or_else(|| "unknown".to_string());
                                println!("[{}] {}: {}", format_timestamp(m.sent_at), sender, m.content);
                            }
                            shown = messages.len();
                        }
                        Ok(PortalEvent::SessionEnded { .. }) => break,
                        Ok(_) => {}
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                        Err(_) => break,
                    },
                }
            }
            chat.close();
        }

        Command::Stats => {
            let view = portal.documents()?;
            view.load().await?;
            let stats = view.stats();
            if args.json {
                return print_json(&stats);
            }
            print_stats(&stats, view.pending(user.role).len());
        }

        Command::Login | Command::Register { .. } | Command::Logout => {}
    }

    Ok(())
}

fn credentials(args: &Args) -> Result<(&str, &str)> {
    match (&args.email, &args.password) {
        (Some(email), Some(password)) => Ok((email.as_str(), password.as_str())),
        _ => bail!("--email and --password (or FYP_EMAIL and FYP_PASSWORD) are required"),
    }
}

/// Sign in with `--email`/`--password` when nothing was restored
async fn ensure_signed_in(portal: &Portal, args: &Args) -> Result<()> {
    if portal.session.is_active() {
        return Ok(());
    }
    match (&args.email, &args.password) {
        (Some(email), Some(password)) => {
            portal.api.login(email, password).await?;
            Ok(())
        }
        _ => Err(PortalError::SessionExpired.into()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_documents(documents: &[Document]) {
    if documents.is_empty() {
        println!("No documents");
        return;
    }
    for d in documents {
        println!(
            "{:>5}  {:<18} {:<36} v{:<3} {}",
            d.id,
            d.kind_label(),
            d.title,
            d.version,
            d.status.label()
        );
    }
}

fn print_deadlines(deadlines: &[Deadline], now: chrono::NaiveDateTime) {
    if deadlines.is_empty() {
        println!("No deadlines");
        return;
    }
    for d in deadlines {
        println!(
            "{:>5}  {:<24} {}  ({}){}",
            d.id,
            d.deadline_type,
            format_timestamp(d.due),
            describe_until(d.due, now),
            if d.is_active { "" } else { "  inactive" }
        );
    }
}

fn print_notifications(items: &[Notification]) {
    for n in items {
        println!(
            "{:>5} {} {}  {}: {}",
            n.id,
            if n.is_read { " " } else { "*" },
            format_timestamp(n.created_at),
            n.title,
            n.message
        );
    }
}

fn print_stats(stats: &DashboardStats, pending: usize) {
    println!("Total documents:    {}", stats.total);
    println!("Submitted:          {}", stats.submitted());
    println!("Under review:       {}", stats.under_review);
    println!("Approved:           {}", stats.approved);
    println!("Revision requested: {}", stats.revision_requested);
    println!("Final approved:     {}", stats.final_approved);
    println!("Rejected:           {}", stats.rejected);
    println!("Waiting on you:     {}", pending);
}

fn print_event(event: &PortalEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        PortalEvent::NotificationPopup { title, message, .. } => {
            println!("🔔 {}: {}", title, message)
        }
        PortalEvent::UnreadCountChanged { count, .. } => println!("Unread: {}", count),
        PortalEvent::SessionEnded { reason, .. } => println!("Session ended: {}", reason),
        _ => {}
    }
    Ok(())
}
