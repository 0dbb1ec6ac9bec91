//! Drag-and-drop move over an ordered sequence.

/// Moves the source element next to the target element.
///
/// The source is removed first. When it started before the target it lands
/// immediately after the target, otherwise immediately before it.
///
/// Returns `false` (sequence untouched) when either element is missing or
/// both predicates select the same element.
pub fn move_item<T>(
    items: &mut Vec<T>,
    is_source: impl Fn(&T) -> bool,
    is_target: impl Fn(&T) -> bool,
) -> bool {
    let Some(source_index) = items.iter().position(&is_source) else {
        return false;
    };
    let Some(target_index) = items.iter().position(&is_target) else {
        return false;
    };
    if source_index == target_index {
        return false;
    }

    let moved = items.remove(source_index);
    let Some(target_after_removal) = items.iter().position(&is_target) else {
        items.insert(source_index, moved);
        return false;
    };
    let insert_index = if source_index < target_index {
        target_after_removal + 1
    } else {
        target_after_removal
    };
    items.insert(insert_index, moved);
    true
}

#[cfg(test)]
mod tests {
    use super::move_item;

    fn moved(items: &[&str], source: &str, target: &str) -> Vec<String> {
        let mut values: Vec<String> = items.iter().map(|value| value.to_string()).collect();
        move_item(&mut values, |value| value == source, |value| value == target);
        values
    }

    #[test]
    fn forward_move_lands_after_target() {
        assert_eq!(moved(&["a", "b", "c", "d"], "a", "c"), ["b", "c", "a", "d"]);
    }

    #[test]
    fn backward_move_lands_before_target() {
        assert_eq!(moved(&["a", "b", "c", "d"], "d", "b"), ["a", "d", "b", "c"]);
    }

    #[test]
    fn adjacent_moves_swap() {
        assert_eq!(moved(&["a", "b", "c"], "a", "b"), ["b", "a", "c"]);
        assert_eq!(moved(&["a", "b", "c"], "c", "b"), ["a", "c", "b"]);
    }

    #[test]
    fn reverse_move_does_not_restore_order_across_gaps() {
        let once = moved(&["a", "b", "c"], "a", "c");
        assert_eq!(once, ["b", "c", "a"]);
        let refs: Vec<&str> = once.iter().map(String::as_str).collect();
        assert_eq!(moved(&refs, "c", "a"), ["b", "a", "c"]);
    }

    #[test]
    fn missing_or_identical_keys_are_noops() {
        let mut values = vec![1, 2, 3];
        assert!(!move_item(&mut values, |v| *v == 9, |v| *v == 1));
        assert!(!move_item(&mut values, |v| *v == 2, |v| *v == 2));
        assert_eq!(values, [1, 2, 3]);
    }
}
