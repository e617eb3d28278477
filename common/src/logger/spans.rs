use super::TraceId;
use tracing::{Span, field};

/// Root span for one unit of work (an evaluation pass, a bootstrap run).
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "root",
        name = %name,
        trace_id = %trace_id.as_str(),
        symbols = field::Empty
    )
}

/// Child span; inherits the trace id from the enclosing root span.
pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!("child", name = %name, symbol = field::Empty)
}
