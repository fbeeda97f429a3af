/*!
 * Structured Tracing
 * Subscriber setup and unit-of-work spans using the tracing crate
 *
 * Features:
 * - JSON-formatted logs for structured parsing
 * - One span per unit of work, correlated by context id
 * - Slow units reported at warn level
 */

use crate::config::GuardConfig;
use crate::core::types::ContextId;
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Units of work slower than this are reported at warn level
const SLOW_UNIT: Duration = Duration::from_millis(100);

/// Initialize structured tracing from the environment
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - GUARD_TRACE_JSON: Enable JSON output (default: false)
///
/// Returns false when a global subscriber was already installed.
pub fn init_tracing() -> bool {
    let use_json = std::env::var("GUARD_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);
    install(use_json)
}

/// Initialize structured tracing as configured
pub fn init_tracing_with(config: &GuardConfig) -> bool {
    install(config.trace_json)
}

fn install(use_json: bool) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "guard tracing initialized");
    }
    installed
}

/// Span covering one unit of work run under a bound authority
pub struct UnitSpan {
    span: tracing::Span,
    start: Instant,
    context: ContextId,
}

impl UnitSpan {
    pub fn new(context: ContextId, authority: &str) -> Self {
        let span = span!(
            Level::DEBUG,
            "unit_of_work",
            context = %context,
            authority = authority,
            duration_us = tracing::field::Empty,
            result = tracing::field::Empty,
            error = tracing::field::Empty,
        );
        span.in_scope(|| debug!(authority, "unit of work started"));

        Self {
            span,
            start: Instant::now(),
            context,
        }
    }

    pub fn record_result(&self, success: bool) {
        self.span.record("result", if success { "success" } else { "error" });
    }

    pub fn record_error(&self, error: &str) {
        self.span.record("error", error);
        self.span.record("result", "error");
    }

    /// Enter the span for the duration of the returned guard
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for UnitSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration > SLOW_UNIT {
            warn!(
                context = %self.context,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow unit of work"
            );
        } else {
            debug!(context = %self.context, duration_us = duration.as_micros() as u64, "unit of work completed");
        }
    }
}
