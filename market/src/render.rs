use std::io::Write;

use parking_lot::Mutex;
use tracing::warn;

/// One display row per tracked symbol, already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRow {
    pub symbol: String,
    /// One cell per configured window, in window order.
    pub changes: Vec<String>,
    pub latest_price: String,
    pub source: String,
}

/// Receives the full row list once per evaluation pass.
pub trait RenderSink: Send + Sync {
    fn render(&self, rows: &[RenderRow]);
}

pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("${p:.6}"),
        None => "N/A".to_string(),
    }
}

/// Plain-text table written to any `Write`, stdout in the binary.
pub struct TableRenderer<W: Write + Send> {
    labels: Vec<String>,
    out: Mutex<W>,
}

impl TableRenderer<std::io::Stdout> {
    pub fn stdout(labels: Vec<String>) -> Self {
        Self::new(labels, std::io::stdout())
    }
}

impl<W: Write + Send> TableRenderer<W> {
    pub fn new(labels: Vec<String>, out: W) -> Self {
        Self {
            labels,
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write_table(&self, out: &mut W, rows: &[RenderRow]) -> std::io::Result<()> {
        let mut header = vec![pad("Symbol", 14)];
        header.extend(self.labels.iter().map(|l| pad(&format!("{l} %"), 18)));
        header.push(pad("Latest Price", 20));
        header.push("Source".to_string());
        writeln!(out, "{}", header.join(" "))?;

        for row in rows {
            let mut line = vec![pad(&row.symbol, 14)];
            line.extend(row.changes.iter().map(|c| pad(c, 18)));
            line.push(pad(&row.latest_price, 20));
            line.push(row.source.clone());
            writeln!(out, "{}", line.join(" "))?;
        }

        writeln!(out)?;
        out.flush()
    }
}

impl<W: Write + Send> RenderSink for TableRenderer<W> {
    fn render(&self, rows: &[RenderRow]) {
        let mut out = self.out.lock();
        if let Err(e) = self.write_table(&mut out, rows) {
            warn!(error = ?e, "failed to render table");
        }
    }
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - len))
    }
}
