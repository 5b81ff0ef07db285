use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::evidence::PersonEvidence;

// ── Accepted name set per person ───────────────────────────────────

/// The set of canonical name-strings accepted as referring to one
/// person. No name may appear in more than one person's set; the
/// reverse-index build enforces that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySet {
    pub person_id: String,
    /// Surname component used by the candidate filter.
    pub surname: String,
    pub names: BTreeSet<String>,
}

/// The surname component of a person id: the text before the first
/// separator, lowercased. Enron-style ids look like "smith-j".
pub fn surname_of(person_id: &str) -> String {
    let end = person_id
        .find(['-', '_', '.'])
        .unwrap_or(person_id.len());
    person_id[..end].to_lowercase()
}

/// Keep only candidates containing the surname as a substring — unless
/// there is exactly one candidate, which is kept unconditionally so the
/// filter can never erase a person's only evidence.
///
/// Plain substring containment is deliberate: short surnames can match
/// inside unrelated words, and the accepted sets downstream were
/// validated against exactly this behavior.
fn filter_candidates(surname: &str, candidates: &[String]) -> Vec<String> {
    if candidates.len() <= 1 {
        return candidates.to_vec();
    }
    candidates
        .iter()
        .filter(|name| name.contains(surname))
        .cloned()
        .collect()
}

/// Derive the inverse spelling of a canonical name.
///
/// "lastname, firstname" → "firstname lastname", and back. A comma-free
/// name with no internal whitespace (a bare address) has no inverse.
pub fn invert_name(name: &str) -> Option<String> {
    if let Some((last, first)) = name.split_once(',') {
        let first = first.split_whitespace().collect::<Vec<_>>().join(" ");
        let last = last.trim();
        if first.is_empty() || last.is_empty() {
            return None;
        }
        return Some(format!("{first} {last}"));
    }

    let tokens: Vec<&str> = name.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    let (surname, given) = tokens.split_last().unwrap();
    Some(format!("{}, {}", surname, given.join(" ")))
}

/// Expand a candidate list into the final name set: every retained name
/// plus its inverse spelling, coalesced as a set.
fn expand_variants(names: &[String]) -> BTreeSet<String> {
    let mut set = BTreeSet::new();
    for name in names {
        set.insert(name.clone());
        if let Some(inverse) = invert_name(name) {
            set.insert(inverse);
        }
    }
    set
}

/// Run the filter and expansion stages over every person's evidence,
/// then apply the manual overrides, which fully replace the algorithmic
/// result for the ids they list.
pub fn build_identity_sets(evidence: &[PersonEvidence], cfg: &Config) -> Vec<IdentitySet> {
    let mut sets: BTreeMap<String, IdentitySet> = BTreeMap::new();

    for ev in evidence {
        let surname = surname_of(&ev.person_id);
        let candidates: Vec<String> = ev.candidates.iter().map(|c| c.name.clone()).collect();
        let retained = filter_candidates(&surname, &candidates);
        if retained.is_empty() {
            warn!(
                "{}: all {} candidates fail the surname filter ({surname:?}), empty name set",
                ev.person_id,
                candidates.len()
            );
        }
        sets.insert(
            ev.person_id.clone(),
            IdentitySet {
                person_id: ev.person_id.clone(),
                surname,
                names: expand_variants(&retained),
            },
        );
    }

    for (person_id, names) in &cfg.manual_name_overrides {
        sets.insert(
            person_id.clone(),
            IdentitySet {
                person_id: person_id.clone(),
                surname: surname_of(person_id),
                names: names.clone(),
            },
        );
    }

    sets.into_values().collect()
}

// ── Reverse lookup ─────────────────────────────────────────────────

/// Global canonical name-string → person id index. Built once, then
/// read-only for the whole resolution pass.
#[derive(Debug, Clone)]
pub struct ReverseNameIndex {
    map: BTreeMap<String, String>,
}

impl ReverseNameIndex {
    /// Invert all identity sets. A name claimed by two ids makes the
    /// whole mapping unusable, so that is a hard error, not an
    /// overwrite.
    pub fn build(sets: &[IdentitySet]) -> Result<ReverseNameIndex> {
        let mut map: BTreeMap<String, String> = BTreeMap::new();
        for set in sets {
            for name in &set.names {
                if let Some(existing) = map.get(name) {
                    return Err(Error::NameCollision {
                        name: name.clone(),
                        first_id: existing.clone(),
                        second_id: set.person_id.clone(),
                    });
                }
                map.insert(name.clone(), set.person_id.clone());
            }
        }
        debug_assert_eq!(
            map.len(),
            sets.iter().map(|s| s.names.len()).sum::<usize>()
        );
        Ok(ReverseNameIndex { map })
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
