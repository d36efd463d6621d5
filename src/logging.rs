//! The crate's default logger: terminal-formatted, asynchronous, with
//! `RUST_LOG`-style level filtering via `slog-envlogger`.

use slog::Drain;

pub fn default_logger() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::new(drain);
    let drain = slog_async::Async::new(drain).build().fuse();
    slog::Logger::root(drain, slog::o!())
}
