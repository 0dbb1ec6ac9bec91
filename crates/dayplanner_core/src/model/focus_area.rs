//! Focus-area model.

/// Backend read model for one focus area.
///
/// The store keeps focus areas as an ordered list of names; `sort_order` is
/// only materialized by the relational backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusArea {
    pub name: String,
    pub sort_order: i64,
}

/// Trims a focus-area name; `None` when nothing remains.
pub fn normalize_focus_area_name(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}
