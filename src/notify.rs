//! Rendering diff entries into chat embeds

use crate::schema::{Position, RowLayout};
use crate::snapshot::{DiffEntry, Row};
use serde::{Deserialize, Serialize};

/// Default number of diff entries per outbound message
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Platform cap on an embed field name
pub const MAX_FIELD_NAME: usize = 256;

/// Platform cap on an embed field value
pub const MAX_FIELD_VALUE: usize = 1024;

/// Platform cap on the combined title, field name and field value text of one embed
pub const MAX_EMBED_TEXT: usize = 6000;

const MISSING: &str = "?";
const EMPTY_VALUE: &str = "-";

/// A single name/value pair within an embed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn new(name: &str, value: &str) -> Self {
        Self {
            name: clip(name, MAX_FIELD_NAME),
            value: clip(if value.is_empty() { EMPTY_VALUE } else { value }, MAX_FIELD_VALUE),
            inline: false,
        }
    }
}

/// A structured chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
}

impl Embed {
    /// Characters counted against [`MAX_EMBED_TEXT`]
    pub fn text_len(&self) -> usize {
        self.title.chars().count()
            + self
                .fields
                .iter()
                .map(EmbedField::text_len)
                .sum::<usize>()
    }
}

impl EmbedField {
    fn text_len(&self) -> usize {
        self.name.chars().count() + self.value.chars().count()
    }
}

/// Presentation settings for announcements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageStyle {
    pub title: String,
    pub color: u32,
    pub link_label: String,
    /// Syllabus URL template; `{year}` and `{key}` are substituted
    pub link_template: String,
    pub layout: RowLayout,
}

impl Default for MessageStyle {
    fn default() -> Self {
        Self {
            title: "新着情報".to_string(),
            color: 0x00FF00,
            link_label: "シラバス".to_string(),
            link_template: "https://eduweb.sta.kanazawa-u.ac.jp/Portal/Public/Syllabus/DetailMain.aspx?student=1&lct_year={year}&lct_cd={key}&je_cd=1&ActingAccess=1".to_string(),
            layout: RowLayout::default(),
        }
    }
}

impl MessageStyle {
    pub fn with_layout(layout: RowLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    pub fn syllabus_url(&self, key: &str, year: i32) -> String {
        self.link_template
            .replace("{year}", &year.to_string())
            .replace("{key}", key)
    }

    /// Render one batch of entries as a single embed
    pub fn render(&self, batch: &[DiffEntry], year: i32) -> Embed {
        Embed {
            title: self.title.clone(),
            color: self.color,
            fields: batch.iter().map(|e| self.render_entry(e, year)).collect(),
        }
    }

    /// Render `entries` in batches of `size`, splitting any batch whose text
    /// would exceed [`MAX_EMBED_TEXT`] over several embeds
    pub fn render_batches(&self, entries: &[DiffEntry], size: usize, year: i32) -> Vec<Embed> {
        let mut embeds = Vec::new();

        for batch in batches(entries, size) {
            let mut embed = self.empty_embed();
            for entry in batch {
                let field = self.render_entry(entry, year);
                if !embed.fields.is_empty() && embed.text_len() + field.text_len() > MAX_EMBED_TEXT {
                    embeds.push(std::mem::replace(&mut embed, self.empty_embed()));
                }
                embed.fields.push(field);
            }
            if !embed.fields.is_empty() {
                embeds.push(embed);
            }
        }
        embeds
    }

    fn empty_embed(&self) -> Embed {
        Embed {
            title: self.title.clone(),
            color: self.color,
            fields: Vec::new(),
        }
    }

    fn render_entry(&self, entry: &DiffEntry, year: i32) -> EmbedField {
        let current = &entry.current;
        match &entry.previous {
            None => EmbedField::new(
                field(&self.layout.key, current),
                field(&self.layout.summary, current),
            ),
            Some(previous) => {
                let mut lines: Vec<String> = self
                    .layout
                    .tracked
                    .iter()
                    .map(|t| {
                        format!(
                            "{} → {}",
                            field(&t.position, previous),
                            field(&t.position, current)
                        )
                    })
                    .collect();
                lines.push(format!(
                    "[{}]({})",
                    self.link_label,
                    self.syllabus_url(field(&self.layout.key, current), year)
                ));
                EmbedField::new(field(&self.layout.label, previous), &lines.join("\n"))
            }
        }
    }
}

fn field<'a>(position: &Position, row: &'a Row) -> &'a str {
    position.get(row).unwrap_or(MISSING)
}

/// Split entries into contiguous chunks of at most `size`, keeping order
pub fn batches(entries: &[DiffEntry], size: usize) -> impl Iterator<Item = &[DiffEntry]> {
    entries.chunks(size.max(1))
}

fn clip(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
