use crate::source::SourceEntry;

/// A headword ready for the store: one canonical meaning per normalized key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub key: String,
    pub word: String,
    pub meaning: String,
}

/// Why an entry didn't make it into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingWord,
    MissingMeaning,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransformStats {
    pub seen: usize,
    pub kept: usize,
    pub missing_word: usize,
    pub missing_meaning: usize,
}

/// Lookup key for a headword: trimmed and lower-cased.
pub fn normalize_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Derive the record for one entry. The meaning is the first definition that
/// still has text after trimming.
pub fn normalize(entry: &SourceEntry) -> Result<NormalizedRecord, Rejection> {
    let word = entry.entry.trim();
    if word.is_empty() {
        return Err(Rejection::MissingWord);
    }

    let meaning = entry
        .defs
        .iter()
        .map(|d| d.entry.trim())
        .find(|text| !text.is_empty())
        .ok_or(Rejection::MissingMeaning)?;

    Ok(NormalizedRecord {
        key: normalize_key(word),
        word: word.to_string(),
        meaning: meaning.to_string(),
    })
}

/// Normalize every entry, keeping input order. Duplicate keys are left for
/// the store to resolve.
pub fn transform(entries: &[SourceEntry]) -> (Vec<NormalizedRecord>, TransformStats) {
    let mut stats = TransformStats::default();
    let mut records = Vec::with_capacity(entries.len());

    for entry in entries {
        stats.seen += 1;
        match normalize(entry) {
            Ok(record) => {
                stats.kept += 1;
                records.push(record);
            }
            Err(Rejection::MissingWord) => stats.missing_word += 1,
            Err(Rejection::MissingMeaning) => stats.missing_meaning += 1,
        }
    }

    (records, stats)
}
