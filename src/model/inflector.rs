//! English singularization for table names.
//!
//! Used to turn a join prefix (`activity_types`) into a relation name
//! (`activity_type`) and to derive default foreign keys (`users` -> `user_id`).
//! Only the last `_` segment is inflected.

const UNCOUNTABLE: &[&str] = &[
    "audio",
    "data",
    "equipment",
    "feedback",
    "fish",
    "information",
    "media",
    "metadata",
    "money",
    "news",
    "rice",
    "series",
    "sheep",
    "species",
    "staff",
    "status",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("criteria", "criterion"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("halves", "half"),
    ("heroes", "hero"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("men", "man"),
    ("mice", "mouse"),
    ("movies", "movie"),
    ("oxen", "ox"),
    ("people", "person"),
    ("potatoes", "potato"),
    ("shoes", "shoe"),
    ("teeth", "tooth"),
    ("wives", "wife"),
    ("women", "woman"),
];

/// Singular form of a snake_case table or relation name.
///
/// ```
/// use lifeguard_support::model::singular;
///
/// assert_eq!(singular("activity_types"), "activity_type");
/// assert_eq!(singular("categories"), "category");
/// assert_eq!(singular("people"), "person");
/// assert_eq!(singular("author"), "author");
/// ```
pub fn singular(word: &str) -> String {
    match word.rsplit_once('_') {
        Some((head, last)) => format!("{head}_{}", singular_word(last)),
        None => singular_word(word),
    }
}

fn singular_word(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if lower.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, single)) = IRREGULAR.iter().find(|(plural, _)| *plural == lower) {
        return (*single).to_string();
    }

    let stem = |suffix_len: usize| &word[..word.len() - suffix_len];

    if lower.len() > 3 && lower.ends_with("ies") {
        return format!("{}y", stem(3));
    }
    if lower.ends_with("sses") {
        return stem(2).to_string();
    }
    // statuses -> status, but houses -> house
    if lower.ends_with("uses") {
        let before = lower[..lower.len() - 4].chars().last();
        if matches!(before, Some(c) if !"aeiou".contains(c)) {
            return stem(2).to_string();
        }
    }
    if ["xes", "ches", "shes", "zzes"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
    {
        return stem(2).to_string();
    }
    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return word.to_string();
    }
    if lower.ends_with('s') {
        return stem(1).to_string();
    }
    word.to_string()
}
