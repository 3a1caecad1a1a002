//! Short excerpt of a hit's content around the first query term found.

pub const DEFAULT_FRAGMENT_SIZE: usize = 200;

const MIN_USEFUL_CHARS: usize = 50;

/// Window of `fragment_size` characters centred on the first query token
/// that occurs in `content` (case-insensitive), followed by `...`. Falls
/// back to the start of `content` when no token yields a useful window.
pub fn preview(content: &str, query: &str, fragment_size: usize) -> String {
    let chars: Vec<char> = content.chars().collect();
    // Lower-cased text with, for each lowered char, the index of its source char.
    let mut lowered = Vec::with_capacity(chars.len());
    let mut origin = Vec::with_capacity(chars.len());
    for (i, c) in chars.iter().enumerate() {
        for lc in c.to_lowercase() {
            lowered.push(lc);
            origin.push(i);
        }
    }
    let min_useful = MIN_USEFUL_CHARS.min(fragment_size / 2);

    for token in query.split_whitespace() {
        let needle: Vec<char> = token.to_lowercase().chars().collect();
        let Some(found) = lowered.windows(needle.len()).position(|w| w == needle.as_slice()) else {
            continue;
        };
        let pos = origin[found];
        let start = pos.saturating_sub(fragment_size / 2);
        let end = chars.len().min(start + fragment_size);
        let window: String = chars[start..end].iter().collect();
        let window = window.trim();
        if window.chars().count() > min_useful {
            return format!("{window}...");
        }
    }

    let head: String = chars.iter().take(fragment_size).collect();
    format!("{}...", head.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_contains_the_matched_term() {
        let p = preview("The quick brown fox", "brown", 10);
        assert!(p.contains("brown"), "{p}");
        assert!(p.ends_with("..."));
    }

    #[test]
    fn falls_back_to_the_beginning() {
        assert_eq!(preview("short", "absent", 200), "short...");
    }

    #[test]
    fn matching_ignores_case() {
        let content = format!("{} Bilge Pump priming steps {}", "a".repeat(300), "b".repeat(300));
        let p = preview(&content, "bilge", 200);
        assert!(p.contains("Bilge Pump"));
        assert_eq!(p.trim_end_matches("...").chars().count(), 200);
    }

    #[test]
    fn later_tokens_are_tried_when_earlier_ones_miss() {
        let content = format!("{} needle {}", "x".repeat(120), "y".repeat(120));
        let p = preview(&content, "absent needle", 200);
        assert!(p.contains("needle"));
    }

    #[test]
    fn multibyte_content_is_sliced_on_char_boundaries() {
        let content = "ação ".repeat(100) + "manutenção da bomba " + &"ção ".repeat(100);
        let p = preview(&content, "BOMBA", 60);
        assert!(p.contains("bomba"));
    }

    #[test]
    fn empty_query_uses_the_head() {
        assert_eq!(preview("  leading spaces", "", 200), "leading spaces...");
    }
}
