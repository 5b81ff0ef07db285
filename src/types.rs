use serde::{Deserialize, Serialize};

// ── One email event, as loaded from the input table ────────────────

/// A single parsed email header row. Immutable input; resolution
/// annotates a copy rather than mutating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Canonical id of the mailbox owner this row came from.
    pub person_id: String,
    /// Folder label, possibly a path ("smith-j/sent_items/12").
    pub folder: String,
    /// Raw free-text sender field.
    pub sender_field: String,
    /// Raw free-text recipient field, comma-separated, possibly empty.
    pub recipient_field: String,
    /// Seconds since epoch; not necessarily unique within a person.
    pub timestamp: i64,
}

// ── A name token extracted from a header field ─────────────────────

/// One extracted token, tagged with which shape of the alternation
/// produced it. The three shapes are mutually exclusive; precedence is
/// structured, then address, then bare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    /// "Lastname, Firstname <address>"-style; the angle-bracket address
    /// is already stripped from `display`.
    Structured { display: String, has_comma: bool },
    /// A bare (possibly quoted) email address.
    Email { address: String },
    /// An unadorned name with no address; only matches when it spans
    /// the entire field.
    Bare { text: String },
}

impl NameMatch {
    /// Normalize to the single lowercase string key used everywhere
    /// downstream. Addresses keep their case; they are literal keys.
    pub fn canonical_key(&self) -> String {
        match self {
            NameMatch::Structured { display, .. } => {
                let display = match display.find('<') {
                    Some(i) => &display[..i],
                    None => display.as_str(),
                };
                display.trim().to_lowercase()
            }
            NameMatch::Email { address } => {
                address.trim().trim_matches(|c| c == '\'' || c == '"').to_string()
            }
            NameMatch::Bare { text } => text.trim().to_lowercase(),
        }
    }
}

// ── A record annotated with resolved identities ────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedRecord {
    #[serde(flatten)]
    pub record: Record,
    /// Resolved sender, or None when the sender field is empty or names
    /// someone outside the known-person universe.
    pub resolved_sender_id: Option<String>,
    /// One entry per parsed recipient token, order preserved; misses
    /// stay in position as None.
    pub resolved_recipient_ids: Vec<Option<String>>,
}

// ── Final per-person output ────────────────────────────────────────

/// Ordered, duplicate-free send-event timestamps for one person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonSeries {
    pub timestamps: Vec<i64>,
    pub count: usize,
}
