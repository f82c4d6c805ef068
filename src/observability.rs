// Observability - structured logging and run counters for DocSEO
// Every per-document event goes through log_operation so warnings and
// summaries share one format.

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

// Process-wide counters, reported by get_metrics
static DOCUMENTS_ANALYZED: AtomicU64 = AtomicU64::new(0);
static DOCUMENTS_WRITTEN: AtomicU64 = AtomicU64::new(0);
static DOCUMENT_FAILURES: AtomicU64 = AtomicU64::new(0);
static ENHANCEMENT_FAILURES: AtomicU64 = AtomicU64::new(0);

/// Initialize the logging and tracing infrastructure
pub fn init_logging() -> Result<()> {
    init_logging_with_level(false, false)
}

/// Initialize logging with configurable verbosity
pub fn init_logging_with_level(verbose: bool, quiet: bool) -> Result<()> {
    let filter_level = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("docseo=debug,info")
    } else {
        // Per-file warnings and run progress stay visible by default
        EnvFilter::new("docseo=info,warn")
    };

    // --quiet always wins over RUST_LOG
    let env_filter = if quiet {
        EnvFilter::new("error")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::try_from_default_env().unwrap_or(filter_level)
    } else {
        filter_level
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(verbose)
        .with_line_number(verbose)
        .with_file(verbose)
        .with_ansi(true);

    match tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
    {
        Ok(()) => {
            debug!("DocSEO observability initialized");
            Ok(())
        }
        // Already initialized, which is fine in test environments
        Err(_) => Ok(()),
    }
}

/// Per-document and run-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    DocumentAnalyzed {
        document: String,
        issue_count: usize,
    },
    DocumentSkipped {
        document: String,
        reason: String,
    },
    FrontmatterSynthesized {
        document: String,
        preview: bool,
    },
    DocumentWritten {
        document: String,
        size_bytes: usize,
    },
    /// Unreadable or unwritable document; logged with the error
    DocumentFailed {
        document: String,
    },
    EnhancementFailed {
        document: String,
        kind: String,
    },
    RunCompleted {
        succeeded: usize,
        failed: usize,
    },
}

/// Operation context carrying the run's trace id
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub trace_id: Uuid,
    pub operation: String,
    pub start_time: Instant,
}

impl OperationContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            operation: operation.into(),
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Log an operation with full context
pub fn log_operation(ctx: &OperationContext, op: &Operation, result: &Result<()>) {
    match result {
        Ok(()) => {
            match op {
                Operation::DocumentSkipped { document, reason } => {
                    warn!(trace_id = %ctx.trace_id, operation = %ctx.operation, "Skipped {}: {}", document, reason);
                }
                Operation::EnhancementFailed { document, kind } => {
                    warn!(trace_id = %ctx.trace_id, operation = %ctx.operation, "Enhancement ({}) unavailable for {}, using heuristics", kind, document);
                }
                _ => {
                    debug!(trace_id = %ctx.trace_id, operation = %ctx.operation, "Operation completed: {:?}", op);
                }
            }
        }
        Err(e) => {
            error!(
                trace_id = %ctx.trace_id,
                operation = %ctx.operation,
                elapsed_ms = ctx.elapsed().as_millis(),
                error = %e,
                "Operation failed: {:?}", op
            );
            DOCUMENT_FAILURES.fetch_add(1, Ordering::Relaxed);
        }
    }

    match op {
        Operation::DocumentAnalyzed { .. } => {
            DOCUMENTS_ANALYZED.fetch_add(1, Ordering::Relaxed);
        }
        Operation::DocumentWritten { .. } if result.is_ok() => {
            DOCUMENTS_WRITTEN.fetch_add(1, Ordering::Relaxed);
        }
        Operation::EnhancementFailed { .. } => {
            ENHANCEMENT_FAILURES.fetch_add(1, Ordering::Relaxed);
        }
        _ => {}
    }
}

/// Execute a future inside a traced operation
pub async fn with_trace_id<F, T>(operation: &str, f: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    let ctx = OperationContext::new(operation);
    info!(trace_id = %ctx.trace_id, "Starting {}", operation);

    let result = f.await;

    match &result {
        Ok(_) => info!(
            trace_id = %ctx.trace_id,
            elapsed_ms = ctx.elapsed().as_millis(),
            "Finished {}", operation
        ),
        Err(e) => error!(
            trace_id = %ctx.trace_id,
            elapsed_ms = ctx.elapsed().as_millis(),
            error = %e,
            "{} failed", operation
        ),
    }

    result
}

/// Current counter snapshot
pub fn get_metrics() -> serde_json::Value {
    serde_json::json!({
        "documents": {
            "analyzed": DOCUMENTS_ANALYZED.load(Ordering::Relaxed),
            "written": DOCUMENTS_WRITTEN.load(Ordering::Relaxed),
            "failed": DOCUMENT_FAILURES.load(Ordering::Relaxed),
        },
        "enhancement_failures": ENHANCEMENT_FAILURES.load(Ordering::Relaxed),
        "timestamp": Utc::now().to_rfc3339(),
    })
}

/// Success/failure tally of one run, shown to the user at completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub seen: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunCounters {
    pub fn merge(&mut self, other: RunCounters) {
        self.seen += other.seen;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_initializes_twice() {
        assert!(init_logging_with_level(false, true).is_ok());
        assert!(init_logging().is_ok());
    }

    #[test]
    fn test_log_operation_updates_counters() {
        let ctx = OperationContext::new("test");
        let before = DOCUMENTS_ANALYZED.load(Ordering::Relaxed);
        log_operation(
            &ctx,
            &Operation::DocumentAnalyzed {
                document: "a.md".to_string(),
                issue_count: 2,
            },
            &Ok(()),
        );
        assert!(DOCUMENTS_ANALYZED.load(Ordering::Relaxed) > before);

        let metrics = get_metrics();
        assert!(metrics["documents"]["analyzed"].as_u64().unwrap() >= 1);
    }

    #[test]
    fn test_document_failure_is_counted() {
        let ctx = OperationContext::new("test");
        let before = DOCUMENT_FAILURES.load(Ordering::Relaxed);
        log_operation(
            &ctx,
            &Operation::DocumentFailed {
                document: "broken.md".to_string(),
            },
            &Err(anyhow::anyhow!("stream did not contain valid UTF-8")),
        );
        assert!(DOCUMENT_FAILURES.load(Ordering::Relaxed) > before);
    }

    #[tokio::test]
    async fn test_with_trace_id_passes_result_through() {
        let value = with_trace_id("unit", async { Ok::<_, anyhow::Error>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_run_counters_merge() {
        let mut total = RunCounters::default();
        total.merge(RunCounters { seen: 2, succeeded: 1, failed: 1, skipped: 0 });
        total.merge(RunCounters { seen: 1, succeeded: 0, failed: 0, skipped: 1 });
        assert_eq!(total, RunCounters { seen: 3, succeeded: 1, failed: 1, skipped: 1 });
    }
}
