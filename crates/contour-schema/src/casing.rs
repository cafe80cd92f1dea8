//! Naming helpers used when deriving display defaults from identifiers.

use convert_case::{Case, Casing};

/// Title-case an identifier: `user_account` becomes `User Account`.
#[must_use]
pub fn title(ident: &str) -> String {
    ident.to_case(Case::Title)
}

/// Lower-camel a label: `User Accounts` becomes `userAccounts`.
#[must_use]
pub fn lower_camel(label: &str) -> String {
    label.to_case(Case::Camel)
}

/// Check an identifier is snake_case.
#[must_use]
pub fn is_snake(ident: &str) -> bool {
    ident == ident.to_case(Case::Snake)
}

/// Naive English pluralization, applied to the last word of a label.
///
/// Good enough for display defaults; callers needing irregular nouns
/// set `label_plural` explicitly.
#[must_use]
pub fn plural(label: &str) -> String {
    // slice by char offsets so trailing or multi-byte whitespace
    // cannot land inside the last word
    let end = label.trim_end().len();
    let (head, tail) = label.split_at(end);

    let start = head
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map_or(0, |(i, c)| i + c.len_utf8());

    let word = &head[start..];
    if word.is_empty() {
        return label.to_string();
    }

    format!("{}{}{tail}", &head[..start], plural_word(word))
}

fn plural_word(word: &str) -> String {
    let lower = word.to_lowercase();

    if lower.ends_with('y') && !ends_with_vowel_y(&lower) {
        let stem = &word[..word.len() - 1];
        return format!("{stem}ies");
    }

    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{word}es");
    }

    format!("{word}s")
}

// "day" -> "days", "city" -> "cities"
fn ends_with_vowel_y(lower: &str) -> bool {
    let mut chars = lower.chars().rev();
    let Some('y') = chars.next() else {
        return false;
    };

    matches!(chars.next(), Some('a' | 'e' | 'i' | 'o' | 'u'))
}
