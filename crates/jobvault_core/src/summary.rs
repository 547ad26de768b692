use textwrap::{Options, WordSeparator, WordSplitter};

use crate::record::JobRecord;

pub const SUMMARY_WIDTH: usize = 80;
pub const SUMMARY_INDENT: &str = "    ";
pub const MISSING_PROMPT: &str = "[No Prompt Available]";
pub const MISSING_FULL_COMMAND: &str = "[No Full Command Available]";

/// Human readable companion of an archived record: prompt and full command,
/// each under a label and wrapped with a hanging indent.
pub fn render_summary(record: &JobRecord) -> String {
    let prompt = record.prompt().unwrap_or(MISSING_PROMPT);
    let full_command = record.full_command().unwrap_or(MISSING_FULL_COMMAND);

    let mut out = String::new();
    out.push_str("Prompt:\n");
    out.push_str(&wrap_block(prompt));
    out.push('\n');
    out.push_str("\nFull command:\n");
    out.push_str(&wrap_block(full_command));
    out.push('\n');
    out
}

fn wrap_block(text: &str) -> String {
    // Embedded line breaks are treated as plain spaces.
    let flattened: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    if flattened.trim().is_empty() {
        return String::new();
    }
    let options = Options::new(SUMMARY_WIDTH)
        .initial_indent(SUMMARY_INDENT)
        .subsequent_indent(SUMMARY_INDENT)
        .break_words(false)
        .word_separator(WordSeparator::AsciiSpace)
        .word_splitter(WordSplitter::NoHyphenation);
    textwrap::fill(flattened.trim(), &options)
}
