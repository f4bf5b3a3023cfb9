//! Markdown block used to hand search results to the synthesis prompt
//!
//! Each result renders as
//!
//! ```text
//! ### 1. Title
//! [https://example.com](https://example.com)
//!
//! Snippet text
//! ```
//!
//! and entries are separated by a `---` rule.

use super::types::SearchResult;
use once_cell::sync::Lazy;
use regex::Regex;

const ENTRY_SEPARATOR: &str = "\n---\n\n";

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### (\d+)\. ").unwrap());
static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^### \d+\. (.*)$").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(.*)\]\((.*)\)$").unwrap());

/// Render results as numbered markdown entries
pub fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(index, result)| {
            format!(
                "### {}. {}\n[{}]({})\n\n{}\n",
                index + 1,
                result.title,
                result.link,
                result.link,
                result.snippet
            )
        })
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}

/// Recover results from a block produced by [`format_results`].
///
/// An entry starts at a `### {i}. ` heading that carries the next expected
/// number and opens the block or follows the separator, so snippets may
/// themselves contain separators. Text before the first entry is skipped.
pub fn parse_formatted_results(block: &str) -> Vec<SearchResult> {
    let mut starts = Vec::new();
    for caps in HEADING.captures_iter(block) {
        let start = caps.get(0).map_or(0, |m| m.start());
        let number: usize = caps[1].parse().unwrap_or(0);
        if number == starts.len() + 1
            && (start == 0 || block[..start].ends_with(ENTRY_SEPARATOR))
        {
            starts.push(start);
        }
    }

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &start)| {
            let end = starts
                .get(i + 1)
                .map_or(block.len(), |next| next - ENTRY_SEPARATOR.len());
            parse_entry(&block[start..end])
        })
        .collect()
}

fn parse_entry(entry: &str) -> Option<SearchResult> {
    let (heading, rest) = entry.split_once('\n').unwrap_or((entry, ""));
    let title = TITLE.captures(heading)?.get(1)?.as_str().to_string();

    let (link_line, body) = rest.split_once('\n').unwrap_or((rest, ""));
    let link = LINK
        .captures(link_line)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    // undo the blank line before and the newline after the snippet
    let body = body.strip_prefix('\n').unwrap_or(body);
    let snippet = body.strip_suffix('\n').unwrap_or(body).to_string();

    Some(SearchResult {
        title,
        link,
        snippet,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<SearchResult> {
        vec![
            SearchResult::new(
                "Weather Forecast",
                "https://weather.example.com",
                "Sunny, 24°C",
            ),
            SearchResult::new(
                "Radar",
                "https://radar.example.com/live",
                "Live radar\nupdated hourly",
            ),
            SearchResult::new("Almanac", "https://almanac.example.com", ""),
        ]
    }

    #[test]
    fn test_format_layout() {
        let block = format_results(&sample()[..1]);
        assert_eq!(
            block,
            "### 1. Weather Forecast\n[https://weather.example.com](https://weather.example.com)\n\nSunny, 24°C\n"
        );
    }

    #[test]
    fn test_format_numbers_and_separates_entries() {
        let block = format_results(&sample());
        assert!(block.contains("### 1. Weather Forecast"));
        assert!(block.contains("### 2. Radar"));
        assert!(block.contains("### 3. Almanac"));
        assert_eq!(block.matches(ENTRY_SEPARATOR).count(), 2);
    }

    #[test]
    fn test_parse_recovers_entries_in_order() {
        let original = sample();
        let parsed = parse_formatted_results(&format_results(&original));

        assert_eq!(parsed.len(), original.len());
        for (parsed, original) in parsed.iter().zip(&original) {
            assert_eq!(parsed.title, original.title);
            assert_eq!(parsed.snippet, original.snippet);
            assert_eq!(parsed.link, original.link);
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(format_results(&[]), "");
        assert!(parse_formatted_results("").is_empty());
    }

    #[test]
    fn test_parse_skips_entries_without_heading() {
        let block = "not a heading\n\ntext\n---\n\n### 1. Kept\n[a](a)\n\nbody\n";
        let parsed = parse_formatted_results(block);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].title, "Kept");
    }

    #[test]
    fn test_parse_keeps_snippet_whitespace_and_separators() {
        let original = vec![
            SearchResult::new("A", "https://a.example", "  padded snippet  "),
            SearchResult::new("B", "https://b.example", "line one\n---\n\nline two"),
            SearchResult::new("C", "https://c.example", "ok"),
        ];
        let parsed = parse_formatted_results(&format_results(&original));
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parse_ignores_out_of_sequence_headings() {
        let original = vec![
            SearchResult::new("A", "https://a.example", "see\n---\n\n### 7. not an entry"),
            SearchResult::new("B", "https://b.example", ""),
        ];
        let parsed = parse_formatted_results(&format_results(&original));
        assert_eq!(parsed, original);
    }
}
