//! CLI entry point for the ticket triage core.
//!
//! Answers one question directly, or a `::`-separated batch through the
//! worker pool. Repeated questions are served from the response cache.
//!
//! # Usage
//!
//! ```bash
//! # Single question
//! triage -q "How do I update my payment method?"
//!
//! # Batch, processed concurrently
//! triage --batch "server is down::where is my invoice"
//!
//! # Per-ticket details
//! triage -q "I want to speak to a human" --details
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use ticket_triage::{
    ConversationContext, KeywordClassifier, ResponseCache, TemplateGenerator, Ticket,
    TicketStatus, TicketWorkflow, TriageConfig, WorkerPool,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// One question to triage
    #[arg(short, long)]
    question: Option<String>,

    /// Batch of questions separated by "::", processed by the worker pool
    #[arg(long)]
    batch: Option<String>,

    /// Print per-ticket processing details
    #[arg(long, default_value_t = false)]
    details: bool,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ticket_triage=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => TriageConfig::from_path(path)?,
        None => TriageConfig::default(),
    };

    let cache = Arc::new(ResponseCache::new(config.cache.clone()));
    let maintenance = ResponseCache::spawn_maintenance(&cache);
    let workflow = Arc::new(TicketWorkflow::new(
        KeywordClassifier::new(),
        TemplateGenerator::new(),
        config.workflow.clone(),
    ));

    match (args.question, args.batch) {
        (Some(question), _) => {
            run_single(&workflow, &cache, &question, args.details).await;
        }
        (None, Some(batch)) => {
            let questions: Vec<String> = batch
                .split("::")
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(String::from)
                .collect();
            run_batch(workflow, &cache, &questions, args.details).await;
        }
        (None, None) => {
            anyhow::bail!("nothing to do: pass --question or --batch");
        }
    }

    maintenance.abort();
    Ok(())
}

async fn run_single(
    workflow: &TicketWorkflow<KeywordClassifier, TemplateGenerator>,
    cache: &ResponseCache,
    question: &str,
    details: bool,
) {
    if let Some(cached) = cache.get(question) {
        println!("(cached) {}", cached.message);
        return;
    }

    let mut context = ConversationContext::new();
    let ticket = workflow.process(question, &mut context).await;
    if ticket.status == TicketStatus::Resolved {
        if let Some(response) = &ticket.response {
            cache.put(question, response.clone());
        }
    }
    print_ticket(&ticket, details);
}

async fn run_batch(
    workflow: Arc<TicketWorkflow<KeywordClassifier, TemplateGenerator>>,
    cache: &ResponseCache,
    questions: &[String],
    details: bool,
) {
    let pool = WorkerPool::new(workflow, TriageConfig::default().pool);

    let mut pending = Vec::new();
    for question in questions {
        if let Some(cached) = cache.get(question) {
            println!("[cached] {question}\n  {}\n", cached.message);
            continue;
        }
        match pool.submit(question) {
            Ok(task_id) => pending.push((task_id, question.clone())),
            Err(e) => eprintln!("[rejected] {question}: {e}"),
        }
    }

    let ids: Vec<String> = pending.iter().map(|(id, _)| id.clone()).collect();
    let report = pool
        .wait_for_completion(&ids, Some(Duration::from_secs(60)))
        .await;
    for id in &report.timed_out {
        eprintln!("[timed out] task {id}");
    }

    for (task_id, question) in &pending {
        match pool.task_status(task_id) {
            Some(task) => {
                println!("[{}] {question}", task.state);
                if let Some(ticket) = &task.result {
                    if ticket.status == TicketStatus::Resolved {
                        if let Some(response) = &ticket.response {
                            cache.put(question, response.clone());
                        }
                    }
                    print_ticket(ticket, details);
                }
            }
            None => println!("[lost] {question}"),
        }
    }

    let stats = pool.performance_stats();
    println!(
        "batch done: {} completed, {} failed, avg {:.1}ms",
        stats.total_completed, stats.total_failed, stats.average_processing_time_ms
    );
    if details {
        let wf = pool.workflow().stats();
        println!(
            "workflow:   {} processed, {} escalated, {} failed",
            wf.tickets_processed, wf.tickets_escalated, wf.tickets_failed
        );
        for worker in &stats.workers {
            println!(
                "worker {}:   {} tasks, efficiency {:.2}, avg {:.1}ms",
                worker.worker_id,
                worker.tasks_processed,
                worker.efficiency(),
                worker.average_processing_time_ms()
            );
        }
    }

    pool.shutdown(true, Some(Duration::from_secs(10))).await;
}

fn print_ticket(ticket: &Ticket, details: bool) {
    if let Some(response) = &ticket.response {
        println!("{}", response.message);
        if !response.suggested_actions.is_empty() {
            for action in &response.suggested_actions {
                println!("  - {action}");
            }
        }
    }
    if details {
        println!();
        println!("ticket:     {}", ticket.ticket_id);
        println!("status:     {}", ticket.status);
        println!("priority:   {}", ticket.priority);
        if let Some(c) = &ticket.classification {
            println!("category:   {} ({:.2})", c.category, c.confidence);
        }
        if let Some(info) = &ticket.escalation_info {
            println!("escalated:  {} -> {}", info.reason, info.suggested_department);
        }
        println!("retries:    {}/{}", ticket.retry_count, ticket.max_retries);
        println!(
            "timing:     total {:.1}ms (classify {:.1}ms, generate {:.1}ms)",
            ticket.metrics.total_processing_time_ms,
            ticket.metrics.classification_time_ms,
            ticket.metrics.response_generation_time_ms
        );
        for warning in &ticket.warnings {
            println!("warning:    {warning}");
        }
        for error in &ticket.errors {
            println!("error:      {error}");
        }
    }
    println!();
}
