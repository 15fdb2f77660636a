//! OpenTelemetry tracing with file-based export.
//!
//! ```text
//! tracing macros → tracing-opentelemetry → FileSpanExporter → aptdesk-otlp.json
//! ```
//!
//! Each exported batch is one line of OTLP JSON. The file rotates at 10MB and
//! keeps three timestamped backups.
//!
//! The filter directive comes from `RUST_LOG` when set, then the
//! `trace_level` config option, then `info`. Setting `log_to_stderr` adds a
//! plain-text layer for interactive debugging.

mod file_writer;
mod init;
mod span_formatter;
mod tracer;

pub use file_writer::{FileWriter, RotationPolicy, DEFAULT_MAX_BACKUPS, DEFAULT_MAX_FILE_BYTES};
pub use init::{init_tracing, trace_file_path, SERVICE_NAME, TRACE_FILE_NAME};
pub use tracer::create_tracer_provider;
