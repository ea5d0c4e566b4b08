use crate::models::ParticipationRecord;

pub fn capitalize_first_letter(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// "ada", "lovelace" -> "Ada Lovelace"
pub fn format_label(first_name: &str, last_name: &str) -> String {
    format!(
        "{} {}",
        capitalize_first_letter(first_name),
        capitalize_first_letter(last_name)
    )
}

pub fn format_participation_labels(records: &[ParticipationRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| format_label(&r.first_name, &r.last_name))
        .collect()
}

/// Percentages print like the API sends them: `25`, `12.5`, `-3`.
pub fn format_percentage(value: f64) -> String {
    format!("{}%", value)
}
