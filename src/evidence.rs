use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;
use crate::error::Result;
use crate::parser;
use crate::types::Record;

// ── Ordered frequency tally ────────────────────────────────────────

/// A frequency tally that remembers first-seen order, so ranking is
/// deterministic when counts tie. Hash-map iteration order never leaks
/// into the output.
#[derive(Debug, Default)]
pub struct NameTally {
    counts: HashMap<String, usize>,
    order: Vec<String>,
}

impl NameTally {
    pub fn add(&mut self, name: String) {
        match self.counts.get_mut(&name) {
            Some(n) => *n += 1,
            None => {
                self.counts.insert(name.clone(), 1);
                self.order.push(name);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// (name, count) pairs, count descending, first-seen order on ties.
    pub fn ranked(&self) -> Vec<(String, usize)> {
        let mut pairs: Vec<(usize, String, usize)> = self
            .order
            .iter()
            .enumerate()
            .map(|(seen, name)| (seen, name.clone(), self.counts[name]))
            .collect();
        pairs.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
        pairs.into_iter().map(|(_, name, count)| (name, count)).collect()
    }
}

// ── Per-person evidence ────────────────────────────────────────────

/// How often each canonical name-string appears in the sender fields of
/// one person's own sent mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonEvidence {
    pub person_id: String,
    /// Number of sent-class records the evidence was drawn from.
    pub sent_records: usize,
    /// Candidate names, count descending.
    pub candidates: Vec<NameCount>,
}

/// Scan each person's own sent folders and tally the canonical names
/// appearing in their sender fields.
///
/// A person with no sent-class records (or fewer than the configured
/// minimum) has no usable evidence; they are warned about and left out
/// of the identity mapping entirely.
pub fn build_evidence(records: &[Record], cfg: &Config) -> Result<Vec<PersonEvidence>> {
    let mut by_person: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for r in records {
        by_person.entry(r.person_id.as_str()).or_default().push(r);
    }

    let mut out = Vec::new();
    for (person_id, rows) in &by_person {
        let sent: Vec<&&Record> = rows
            .iter()
            .filter(|r| cfg.is_sent_folder(&r.folder))
            .collect();

        if sent.is_empty() {
            warn!("{person_id}: no sent-class records, excluded from identity mapping");
            continue;
        }
        if sent.len() < cfg.min_sent_evidence {
            warn!(
                "{person_id}: only {} sent-class record(s) (minimum {}), excluded",
                sent.len(),
                cfg.min_sent_evidence
            );
            continue;
        }

        let mut tally = NameTally::default();
        for r in &sent {
            for m in parser::scan_field(&r.sender_field)? {
                tally.add(m.canonical_key());
            }
        }
        if tally.is_empty() {
            warn!("{person_id}: sent-class records but no parseable sender names, excluded");
            continue;
        }

        out.push(PersonEvidence {
            person_id: person_id.to_string(),
            sent_records: sent.len(),
            candidates: tally
                .ranked()
                .into_iter()
                .map(|(name, count)| NameCount { name, count })
                .collect(),
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(person_id: &str, folder: &str, sender: &str) -> Record {
        Record {
            person_id: person_id.to_string(),
            folder: folder.to_string(),
            sender_field: sender.to_string(),
            recipient_field: String::new(),
            timestamp: 0,
        }
    }

    #[test]
    fn tally_ranks_by_count_then_first_seen() {
        let mut tally = NameTally::default();
        for name in ["b", "a", "a", "c", "b"] {
            tally.add(name.to_string());
        }
        // a and b both have 2; b was seen first.
        let ranked = tally.ranked();
        assert_eq!(
            ranked,
            vec![
                ("b".to_string(), 2),
                ("a".to_string(), 2),
                ("c".to_string(), 1)
            ]
        );
    }

    #[test]
    fn only_sent_folders_contribute() {
        let records = vec![
            record("smith-j", "sent", "Smith, John <jsmith@x.com>"),
            record("smith-j", "inbox", "Doe, Jane <jdoe@x.com>"),
            record("smith-j", "smith-j/sent_items/4", "Smith, John <jsmith@x.com>"),
        ];
        let evidence = build_evidence(&records, &Config::default()).unwrap();
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].sent_records, 2);
        assert_eq!(evidence[0].candidates.len(), 1);
        assert_eq!(evidence[0].candidates[0].name, "smith, john");
        assert_eq!(evidence[0].candidates[0].count, 2);
    }

    #[test]
    fn person_without_sent_evidence_is_excluded() {
        let records = vec![record("smith-j", "inbox", "Smith, John <jsmith@x.com>")];
        let evidence = build_evidence(&records, &Config::default()).unwrap();
        assert!(evidence.is_empty());
    }
}
