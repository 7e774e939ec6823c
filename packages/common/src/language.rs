//! Mapping from human-readable language names to judge language ids.
//!
//! The table is the single source of truth: adding a language is a new
//! row here and nothing else.

/// Canonical languages and their judge ids.
const LANGUAGES: &[(&str, u32)] = &[
    ("javascript", 63),
    ("python", 71),
    ("java", 62),
    ("c", 50),
    ("c++", 54),
    ("go", 60),
    ("rust", 73),
    ("typescript", 74),
];

/// Alternative spellings accepted on input.
const ALIASES: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("python3", "python"),
    ("cpp", "c++"),
    ("golang", "go"),
    ("ts", "typescript"),
];

fn canonical(name: &str) -> Option<&'static str> {
    let name = name.trim().to_ascii_lowercase();
    if let Some((canonical, _)) = LANGUAGES.iter().find(|(n, _)| *n == name) {
        return Some(canonical);
    }
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| *canonical)
}

/// Look up the judge language id for a language name (case-insensitive).
pub fn language_id(name: &str) -> Option<u32> {
    let canonical = canonical(name)?;
    LANGUAGES
        .iter()
        .find(|(n, _)| *n == canonical)
        .map(|(_, id)| *id)
}

/// Reverse lookup: canonical name for a judge language id.
pub fn language_name(id: u32) -> Option<&'static str> {
    LANGUAGES.iter().find(|(_, i)| *i == id).map(|(n, _)| *n)
}

/// Iterate the canonical `(name, id)` entries.
pub fn languages() -> impl Iterator<Item = (&'static str, u32)> {
    LANGUAGES.iter().copied()
}

/// Returns true if two language names refer to the same language.
pub fn same_language(a: &str, b: &str) -> bool {
    match (canonical(a), canonical(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

/// Split a comma-separated language list into normalized names.
pub fn parse_language_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
