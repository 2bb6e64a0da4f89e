// Heuristic mapping from raw form fields to a canonical contact draft.
//
// Detectors run in fixed priority order over each field's normalized
// label+key text. A field is consumed by the first detector whose slot is
// still open, even when extraction comes back empty. Filled slots are never
// overwritten; unmatched fields are ignored.

pub mod email;
pub mod phone;

use std::collections::HashSet;

use regex::Regex;

use crate::models::{ContactDraft, RawField};
use email::EmailExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Email,
    FirstName,
    LastName,
    FullName,
    Company,
    Phone,
    Message,
}

impl Slot {
    fn is_open(self, draft: &ContactDraft) -> bool {
        match self {
            Slot::Email => draft.email.is_empty(),
            Slot::FirstName => draft.first_name.is_empty(),
            Slot::LastName => draft.last_name.is_empty(),
            // A combined name only applies while both name slots are untouched.
            Slot::FullName => draft.first_name.is_empty() && draft.last_name.is_empty(),
            Slot::Company => draft.company.is_empty(),
            Slot::Phone => draft.phone.is_empty(),
            Slot::Message => draft.message.is_empty(),
        }
    }
}

struct Detector {
    slot: Slot,
    keywords: Regex,
}

pub struct FieldMapper {
    detectors: Vec<Detector>,
    email: EmailExtractor,
    block_markup: Regex,
    tag_markup: Regex,
}

impl FieldMapper {
    pub fn new() -> Self {
        let detector = |slot, pattern: &str| Detector {
            slot,
            keywords: Regex::new(pattern).unwrap(),
        };
        Self {
            // English + Swedish synonyms; order is the contract.
            detectors: vec![
                detector(Slot::Email, r"\b(e-?post|email|e-?mail|mejl)\b"),
                detector(Slot::FirstName, r"\b(first|förnamn|given)\b"),
                detector(Slot::LastName, r"\b(last|efternamn|surname|family)\b"),
                detector(Slot::FullName, r"\b(namn|name)\b"),
                detector(
                    Slot::Company,
                    r"\b(företag|company|bolag|organisation|org|brand|varumärke)\b",
                ),
                detector(Slot::Phone, r"\b(telefon|phone|mobil|tel|kontakt.*nummer)\b"),
                detector(
                    Slot::Message,
                    r"\b(message|meddelande|kommentar|ämne|subject|beskriv)\b",
                ),
            ],
            email: EmailExtractor::new(),
            block_markup: Regex::new(r"(?is)<(?:script|style)[^>]*>.*?</(?:script|style)>")
                .unwrap(),
            tag_markup: Regex::new(r"<[^>]*>").unwrap(),
        }
    }

    pub fn map_fields(&self, fields: &[RawField], allowed_tlds: &HashSet<String>) -> ContactDraft {
        let mut draft = ContactDraft::default();
        for field in fields {
            let lookup = format!(
                "{} {}",
                normalize_header(&field.label),
                normalize_header(&field.key)
            );
            for detector in &self.detectors {
                if !detector.slot.is_open(&draft) || !detector.keywords.is_match(&lookup) {
                    continue;
                }
                self.fill(detector.slot, &mut draft, &field.value, allowed_tlds);
                break;
            }
        }
        draft
    }

    fn fill(&self, slot: Slot, draft: &mut ContactDraft, value: &str, tlds: &HashSet<String>) {
        match slot {
            Slot::Email => draft.email = self.email.extract(value, tlds),
            Slot::FirstName => draft.first_name = value.trim().to_string(),
            Slot::LastName => draft.last_name = value.trim().to_string(),
            Slot::FullName => {
                let (first, last) = split_name(value);
                draft.first_name = first;
                draft.last_name = last;
            }
            Slot::Company => draft.company = value.trim().to_string(),
            Slot::Phone => draft.phone = phone::normalize_se(value),
            Slot::Message => draft.message = self.strip_markup(value),
        }
    }

    fn strip_markup(&self, value: &str) -> String {
        let without_blocks = self.block_markup.replace_all(value, " ");
        let without_tags = self.tag_markup.replace_all(&without_blocks, "");
        without_tags.trim().to_string()
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_header(raw: &str) -> String {
    raw.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a combined name: the last token becomes the last name, the remainder
/// the first name. A single token becomes the first name only.
fn split_name(value: &str) -> (String, String) {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    match tokens.as_slice() {
        [] => (String::new(), String::new()),
        [only] => (only.to_string(), String::new()),
        [rest @ .., last] => (rest.join(" "), last.to_string()),
    }
}
