const MARKDOWN_MARKERS: [&str; 4] = ["### ", "## ", "# ", "**"];

/// Splits a comma separated answer into trimmed tags.
pub fn split_tags(answer: Option<&str>) -> Vec<String> {
    match answer {
        Some(answer) if !answer.is_empty() => answer
            .split(',')
            .map(|tag| tag.trim().to_string())
            .collect(),
        _ => Vec::new(),
    }
}

pub fn is_english(language: &str) -> bool {
    language.to_lowercase().contains("english")
}

pub fn language_prompt(template: &str, language: &str) -> String {
    template.replace("{language}", language)
}

/// Removes heading and bold markers everywhere in `text`.
pub fn strip_markdown_markers(text: &str) -> String {
    MARKDOWN_MARKERS
        .iter()
        .fold(text.to_string(), |acc, marker| acc.replace(marker, ""))
}

/// Trims the answer and unwraps it when the model put the whole thing in a
/// single code fence.
pub fn clean_detail(answer: &str) -> String {
    let trimmed = answer.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(body) = rest.strip_suffix("```") {
            // Drop the info string (```markdown) on the opening line.
            let body = match body.split_once('\n') {
                Some((info, content)) if !info.contains(' ') => content,
                _ => body,
            };
            if !body.contains("```") {
                return body.trim().to_string();
            }
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags(Some("a, b ,c")), vec!["a", "b", "c"]);
        assert_eq!(split_tags(Some("")), Vec::<String>::new());
        assert_eq!(split_tags(None), Vec::<String>::new());
        assert_eq!(split_tags(Some("single")), vec!["single"]);
    }

    #[rstest]
    #[case("English", true)]
    #[case("english", true)]
    #[case("British ENGLISH", true)]
    #[case("French", false)]
    #[case("", false)]
    fn test_is_english(#[case] language: &str, #[case] expected: bool) {
        assert_eq!(is_english(language), expected);
    }

    #[test]
    fn test_language_prompt() {
        assert_eq!(
            language_prompt("Translate into {language}. Keep {language} idioms.", "German"),
            "Translate into German. Keep German idioms."
        );
    }

    #[test]
    fn test_strip_markdown_markers() {
        assert_eq!(
            strip_markdown_markers("### Titre\n**Gras** et ## milieu\n# Fin"),
            "Titre\nGras et milieu\nFin"
        );
        assert_eq!(strip_markdown_markers("#hashtag"), "#hashtag");
    }

    #[rstest]
    #[case("  plain answer \n", "plain answer")]
    #[case("```markdown\n# Tool\nBody\n```", "# Tool\nBody")]
    #[case("```\nBody\n```", "Body")]
    #[case("```a``` and ```b```", "```a``` and ```b```")]
    fn test_clean_detail(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean_detail(input), expected);
    }
}
