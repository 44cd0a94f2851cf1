//! Console rendering for dry runs

use crate::discord::Notifier;
use crate::error::Result;
use crate::notify::Embed;
use async_trait::async_trait;

/// Output format for console rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}

/// Pretty printer for embeds
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Render an embed as a tree, one branch per field
    pub fn render_embed(embed: &Embed) -> String {
        let mut out = format!("📣 {} (#{:06X})\n", embed.title, embed.color);
        if embed.fields.is_empty() {
            out.push_str("└─ (no fields)\n");
            return out;
        }

        for (i, field) in embed.fields.iter().enumerate() {
            let last = i == embed.fields.len() - 1;
            let (branch, indent) = if last { ("└─", "   ") } else { ("├─", "│  ") };
            out.push_str(&format!("{} {}\n", branch, field.name));
            for line in field.value.lines() {
                out.push_str(&format!("{}   {}\n", indent, line));
            }
        }
        out
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }
}

/// Notifier that writes embeds to stdout instead of a chat channel
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    format: OutputFormat,
}

impl ConsoleNotifier {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn render(&self, embed: &Embed) -> Result<String> {
        match self.format {
            OutputFormat::Pretty => Ok(PrettyPrinter::render_embed(embed)),
            OutputFormat::Json => JsonFormatter::format(embed),
        }
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn resolve_channel(&self) -> Result<()> {
        Ok(())
    }

    async fn send(&self, embed: &Embed) -> Result<()> {
        println!("{}", self.render(embed)?);
        Ok(())
    }
}
