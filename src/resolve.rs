use crate::error::Result;
use crate::identity::ReverseNameIndex;
use crate::parser;
use crate::types::{NameMatch, Record, ResolvedRecord};

/// Counters accumulated over one resolution pass.
#[derive(Debug, Default)]
pub struct ResolveStats {
    pub senders_resolved: usize,
    pub senders_unresolved: usize,
    pub recipient_slots: usize,
    pub recipients_resolved: usize,
    pub structured_comma: usize,
    pub structured_plain: usize,
    pub address_tokens: usize,
    pub bare_tokens: usize,
}

impl ResolveStats {
    fn count_shape(&mut self, m: &NameMatch) {
        match m {
            NameMatch::Structured { has_comma: true, .. } => self.structured_comma += 1,
            NameMatch::Structured { has_comma: false, .. } => self.structured_plain += 1,
            NameMatch::Email { .. } => self.address_tokens += 1,
            NameMatch::Bare { .. } => self.bare_tokens += 1,
        }
    }
}

/// Annotate every record with its resolved sender and recipients.
///
/// A lookup miss is expected — header fields routinely name third
/// parties who were never mailbox owners — so misses become None, never
/// errors. Recipient misses stay in position so the list keeps one
/// entry per parsed token.
pub fn resolve_records(
    records: &[Record],
    index: &ReverseNameIndex,
) -> Result<(Vec<ResolvedRecord>, ResolveStats)> {
    let mut stats = ResolveStats::default();
    let mut out = Vec::with_capacity(records.len());

    for record in records {
        let resolved_sender_id = match parser::first_match(&record.sender_field)? {
            Some(m) => {
                stats.count_shape(&m);
                index.lookup(&m.canonical_key()).map(str::to_string)
            }
            None => None,
        };
        match resolved_sender_id {
            Some(_) => stats.senders_resolved += 1,
            None => stats.senders_unresolved += 1,
        }

        let mut resolved_recipient_ids = Vec::new();
        for m in parser::scan_field(&record.recipient_field)? {
            stats.count_shape(&m);
            let id = index.lookup(&m.canonical_key()).map(str::to_string);
            stats.recipient_slots += 1;
            if id.is_some() {
                stats.recipients_resolved += 1;
            }
            resolved_recipient_ids.push(id);
        }

        out.push(ResolvedRecord {
            record: record.clone(),
            resolved_sender_id,
            resolved_recipient_ids,
        });
    }

    Ok((out, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::evidence::{NameCount, PersonEvidence};
    use crate::identity::{build_identity_sets, ReverseNameIndex};

    fn index_for(people: &[(&str, &str)]) -> ReverseNameIndex {
        let evidence: Vec<PersonEvidence> = people
            .iter()
            .map(|(id, name)| PersonEvidence {
                person_id: id.to_string(),
                sent_records: 1,
                candidates: vec![NameCount {
                    name: name.to_string(),
                    count: 1,
                }],
            })
            .collect();
        let sets = build_identity_sets(&evidence, &Config::default());
        ReverseNameIndex::build(&sets).unwrap()
    }

    fn record(sender: &str, recipients: &str) -> Record {
        Record {
            person_id: "smith-j".to_string(),
            folder: "inbox".to_string(),
            sender_field: sender.to_string(),
            recipient_field: recipients.to_string(),
            timestamp: 0,
        }
    }

    #[test]
    fn sender_and_recipients_resolve_in_order() {
        let index = index_for(&[("smith-j", "smith, john"), ("doe-j", "doe, jane")]);
        let records = vec![record(
            "Smith, John <jsmith@x.com>",
            "Doe, Jane <jdoe@x.com>, Smith, John <jsmith@x.com>",
        )];
        let (resolved, stats) = resolve_records(&records, &index).unwrap();
        assert_eq!(resolved[0].resolved_sender_id.as_deref(), Some("smith-j"));
        assert_eq!(
            resolved[0].resolved_recipient_ids,
            vec![Some("doe-j".to_string()), Some("smith-j".to_string())]
        );
        assert_eq!(stats.senders_resolved, 1);
        assert_eq!(stats.recipients_resolved, 2);
    }

    #[test]
    fn unknown_third_party_stays_in_position() {
        let index = index_for(&[("smith-j", "smith, john")]);
        let records = vec![record(
            "Outsider, Pat <pat@elsewhere.com>",
            "Stranger, Sam <sam@elsewhere.com>, Smith, John <jsmith@x.com>",
        )];
        let (resolved, stats) = resolve_records(&records, &index).unwrap();
        assert_eq!(resolved[0].resolved_sender_id, None);
        assert_eq!(
            resolved[0].resolved_recipient_ids,
            vec![None, Some("smith-j".to_string())]
        );
        assert_eq!(stats.senders_unresolved, 1);
        assert_eq!(stats.recipient_slots, 2);
        assert_eq!(stats.recipients_resolved, 1);
    }

    #[test]
    fn empty_fields_resolve_to_nothing() {
        let index = index_for(&[("smith-j", "smith, john")]);
        let records = vec![record("", "")];
        let (resolved, _) = resolve_records(&records, &index).unwrap();
        assert_eq!(resolved[0].resolved_sender_id, None);
        assert!(resolved[0].resolved_recipient_ids.is_empty());
    }
}
