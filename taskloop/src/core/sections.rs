//! Heading-delimited section parsing and relevance filtering.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::{SpecSection, TaskRecord};

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("heading regex should be valid"));

/// Words too common to signal relevance, alongside the length cutoff.
const STOP_WORDS: [&str; 10] = [
    "with", "from", "that", "this", "will", "have", "been", "were", "they", "them",
];

/// Parse a markdown document into heading-delimited sections.
///
/// Every line belongs to the most recently opened heading, including the
/// heading line itself. Lines before the first heading are dropped.
pub fn parse_sections(text: &str) -> Vec<SpecSection> {
    let mut sections = Vec::new();
    let mut current: Option<(String, u8, Vec<&str>)> = None;

    for line in text.lines() {
        if let Some(caps) = HEADING_RE.captures(line) {
            if let Some((title, level, body)) = current.take() {
                sections.push(section(title, level, &body));
            }
            let level = caps[1].len() as u8;
            current = Some((caps[2].to_string(), level, vec![line]));
        } else if let Some((_, _, body)) = current.as_mut() {
            body.push(line);
        }
    }

    if let Some((title, level, body)) = current {
        sections.push(section(title, level, &body));
    }
    sections
}

fn section(title: String, level: u8, body: &[&str]) -> SpecSection {
    SpecSection {
        title,
        body: body.join("\n").trim().to_string(),
        level,
    }
}

/// Extract relevance keywords from a task description: lowercased,
/// punctuation stripped, longer than 3 characters, stop words removed.
pub fn extract_keywords(description: &str) -> Vec<String> {
    description
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|word| word.len() > 3)
        .filter(|word| !STOP_WORDS.contains(word))
        .map(String::from)
        .collect()
}

/// Whether a section is relevant to a task.
///
/// A section qualifies when its title or body contains a task keyword, when
/// it is overview material (depth <= 2), or when it mentions one of the
/// task's target file paths. These tie-break rules are deliberate; the
/// budget allocation downstream assumes this selection policy's yield.
pub fn section_relevant(section: &SpecSection, task: &TaskRecord, keywords: &[String]) -> bool {
    let haystack = format!("{} {}", section.title, section.body).to_lowercase();

    if keywords.iter().any(|word| haystack.contains(word)) {
        return true;
    }
    if section.level <= 2 {
        return true;
    }
    task.files
        .iter()
        .any(|file| haystack.contains(&file.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with(description: &str, files: &[&str]) -> TaskRecord {
        TaskRecord {
            id: "TASK-001".to_string(),
            description: description.to_string(),
            complexity: "medium".to_string(),
            dependencies: Vec::new(),
            files: files.iter().map(|f| (*f).to_string()).collect(),
        }
    }

    #[test]
    fn parses_sections_with_heading_in_body() {
        let text = "# Overview\nIntro text.\n\n## Detail\nMore text.\n";
        let sections = parse_sections(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Overview");
        assert_eq!(sections[0].level, 1);
        assert_eq!(sections[0].body, "# Overview\nIntro text.");
        assert_eq!(sections[1].level, 2);
    }

    #[test]
    fn content_before_first_heading_is_dropped() {
        let sections = parse_sections("floating preamble\n\n## Real\nbody\n");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Real");
    }

    #[test]
    fn document_without_headings_yields_nothing() {
        assert!(parse_sections("just prose\nno headings").is_empty());
    }

    #[test]
    fn keywords_drop_short_and_stop_words() {
        let words = extract_keywords("Parse the budget-file with this tokenizer");
        assert_eq!(words, vec!["parse", "budget", "file", "tokenizer"]);
    }

    #[test]
    fn deep_section_matches_on_keyword() {
        let section = SpecSection {
            title: "Parser internals".to_string(),
            body: "### Parser internals\nHow the parser works.".to_string(),
            level: 3,
        };
        let task = task_with("Improve parser error recovery", &[]);
        let keywords = extract_keywords(&task.description);
        assert!(section_relevant(&section, &task, &keywords));
    }

    #[test]
    fn shallow_sections_always_match() {
        let section = SpecSection {
            title: "Licensing".to_string(),
            body: "## Licensing\nMIT.".to_string(),
            level: 2,
        };
        let task = task_with("Unrelated work", &[]);
        let keywords = extract_keywords(&task.description);
        assert!(section_relevant(&section, &task, &keywords));
    }

    #[test]
    fn deep_section_matches_on_target_file_mention() {
        let section = SpecSection {
            title: "Storage".to_string(),
            body: "#### Storage\nSee src/store.rs for layout.".to_string(),
            level: 4,
        };
        let task = task_with("Completely unrelated words", &["src/store.rs"]);
        let keywords = extract_keywords(&task.description);
        assert!(section_relevant(&section, &task, &keywords));
    }

    #[test]
    fn deep_unrelated_section_is_filtered_out() {
        let section = SpecSection {
            title: "Metrics".to_string(),
            body: "### Metrics\nCounters only.".to_string(),
            level: 3,
        };
        let task = task_with("Rework storage layout", &["src/store.rs"]);
        let keywords = extract_keywords(&task.description);
        assert!(!section_relevant(&section, &task, &keywords));
    }
}
