use colored::Colorize;
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// Event formatter for the diagnostic channel.
///
/// Liveness and progress lines are meant for a human watching the run, so
/// each event is emitted as its bare message colored by severity, without
/// timestamps or target metadata. Warnings and errors keep a level tag so
/// they stand out in a scrolling stream of liveness lines.
pub struct DiagnosticFormatter;

impl<S, N> FormatEvent<S, N> for DiagnosticFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        // Buffer the fields first so the whole line gets one color.
        let mut message = String::new();
        ctx.format_fields(Writer::new(&mut message), event)?;

        let line = match *event.metadata().level() {
            Level::ERROR => format!("ERROR: {message}").red(),
            Level::WARN => format!("WARN: {message}").yellow(),
            Level::INFO => message.normal(),
            Level::DEBUG => message.blue(),
            Level::TRACE => message.dimmed(),
        };

        writeln!(writer, "{line}")
    }
}
