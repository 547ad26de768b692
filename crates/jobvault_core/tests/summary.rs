use jobvault_core::{render_summary, JobRecord, MISSING_FULL_COMMAND, MISSING_PROMPT};
use pretty_assertions::assert_eq;
use serde_json::json;

fn record(value: serde_json::Value) -> JobRecord {
    JobRecord::from_value(value).unwrap()
}

#[test]
fn short_fields_render_under_labels() {
    let summary = render_summary(&record(json!({
        "prompt": "a red fox",
        "full_command": "a red fox --ar 3:2",
    })));
    assert_eq!(
        summary,
        "Prompt:\n    a red fox\n\nFull command:\n    a red fox --ar 3:2\n"
    );
}

#[test]
fn missing_fields_get_placeholders() {
    let summary = render_summary(&record(json!({"id": "J1"})));
    assert_eq!(
        summary,
        format!("Prompt:\n    {MISSING_PROMPT}\n\nFull command:\n    {MISSING_FULL_COMMAND}\n")
    );
}

#[test]
fn long_prompts_wrap_at_eighty_columns_with_hanging_indent() {
    let words: Vec<String> = (0..60).map(|i| format!("word{i}")).collect();
    let prompt = words.join(" ");
    let summary = render_summary(&record(json!({"prompt": prompt, "full_command": "x"})));

    let prompt_lines: Vec<&str> = summary
        .lines()
        .skip(1)
        .take_while(|line| !line.is_empty())
        .collect();
    assert!(prompt_lines.len() > 1);
    for line in &prompt_lines {
        assert!(line.len() <= 80, "line too long: {line:?}");
        assert!(line.starts_with("    "));
        assert!(!line.starts_with("     "));
    }
    let rejoined: Vec<&str> = prompt_lines
        .iter()
        .flat_map(|line| line.split_whitespace())
        .collect();
    assert_eq!(rejoined, words.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn long_words_and_hyphens_are_kept_whole() {
    let url = format!("https://example.com/{}", "a".repeat(100));
    let hyphenated = "state-of-the-art-hyper-detailed-cinematic-lighting-octane-render-trending";
    let prompt = format!("{url} {hyphenated} {hyphenated}");
    let summary = render_summary(&record(json!({"prompt": prompt})));

    assert!(summary.contains(&format!("    {url}\n")));
    assert_eq!(summary.matches(hyphenated).count(), 2);
}

#[test]
fn embedded_newlines_become_spaces() {
    let summary = render_summary(&record(json!({
        "prompt": "line one\nline two",
        "full_command": "cmd",
    })));
    assert!(summary.starts_with("Prompt:\n    line one line two\n"));
}
