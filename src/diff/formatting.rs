use super::error::DiffError;
use crate::diff::structured::{Change, ChangeType};
use similar::{ChangeTag, TextDiff};
use std::{collections::BTreeMap, fmt::Write};

/// Git-style unified diff of the pretty-printed revisions.
pub(crate) fn generate_git_diff(
    old_json: &str,
    new_json: &str,
    label: &str,
) -> Result<String, DiffError> {
    let diff = TextDiff::from_lines(old_json, new_json);

    let mut output = String::new();
    writeln!(output, "--- a/{label}.json")?;
    writeln!(output, "+++ b/{label}.json")?;

    if old_json == new_json {
        output.push_str("\nNo changes detected.\n");
        return Ok(output);
    }

    for group in diff.grouped_ops(3) {
        let (old_line, new_line) = group.first().map_or((0, 0), |op| {
            (op.old_range().start + 1, op.new_range().start + 1)
        });
        let old_len: usize = group.iter().map(|op| op.old_range().len()).sum();
        let new_len: usize = group.iter().map(|op| op.new_range().len()).sum();
        writeln!(output, "@@ -{old_line},{old_len} +{new_line},{new_len} @@")?;

        for op in group {
            for change in diff.iter_inline_changes(&op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };
                output.push(sign);
                for &(_emphasized, value) in change.values() {
                    output.push_str(value);
                }
                if change.missing_newline() {
                    output.push('\n');
                }
            }
        }
    }
    Ok(output)
}

/// Splits `slides[3].body.question` into `(Some(3), "body.question")`.
fn parse_slide_path(path: &str) -> (Option<usize>, &str) {
    let Some(rest) = path.strip_prefix("slides[") else {
        return (None, path);
    };
    let Some((index, rest)) = rest.split_once(']') else {
        return (None, path);
    };
    match index.parse() {
        Ok(index) => (Some(index), rest.strip_prefix('.').unwrap_or(rest)),
        Err(_) => (None, path),
    }
}

/// What a path inside a slide (or lesson) record refers to.
fn describe_change_target(path: &str) -> &'static str {
    let head = path.split(['.', '[']).next().unwrap_or(path);
    match head {
        "t" => "Title",
        "s" => "Subtitle",
        "cat" => "Category",
        "narration" => "Narration",
        "type" => "Slide Type",
        "title" => "Course Title",
        "media" => "Media",
        "body" => describe_body_target(&path[head.len()..]),
        "" => "Slide",
        _ => "Property",
    }
}

fn describe_body_target(rest: &str) -> &'static str {
    let field = rest
        .trim_start_matches('.')
        .split(['.', '['])
        .next()
        .unwrap_or_default();
    match field {
        "blocks" => "Block",
        "question" => "Question",
        "options" => "Option",
        "correct" => "Correct Answer",
        "explanations" => "Explanation",
        "pairs" => "Matching Pair",
        "correct_order" => "Ordering Item",
        "instructions" => "Instructions",
        "chips" | "parts" => "Prompt Chips",
        "placeholder" => "Placeholder",
        "emoji" => "Emoji",
        "message" => "Message",
        "takeaways" => "Takeaway",
        "cta" => "Call To Action",
        "" => "Body",
        _ => "Body Field",
    }
}

/// Descriptions kept when the summary is simplified to what a reviewer reads.
const SIMPLIFIED_DESCRIPTIONS: &[&str] = &[
    "Course Title",
    "Title",
    "Subtitle",
    "Narration",
    "Slide Type",
    "Question",
    "Option",
    "Correct Answer",
    "Block",
    "Slide",
];

fn format_location(path: &str, is_simplify: bool) -> String {
    if path.is_empty() || is_simplify {
        String::new()
    } else {
        format!(" (at `{path}`)")
    }
}

fn describe_line(change: &Change, desc: &str, location: &str) -> String {
    match (&change.change_type, &change.old_value, &change.new_value) {
        (ChangeType::Added, _, Some(new)) => {
            format!("- Added {desc} {}{location}", new.format_for_display())
        }
        (ChangeType::Removed, Some(old), _) => {
            format!("- Removed {desc} {}{location}", old.format_for_display())
        }
        (ChangeType::Modified, Some(old), Some(new)) => format!(
            "- Changed {desc} from {} to {}{location}",
            old.format_for_display(),
            new.format_for_display()
        ),
        _ => format!("- Modified {desc}{location}"),
    }
}

/// Human-readable summary, grouped by slide.
pub(crate) fn generate_readable_summary(
    changes: &[Change],
    is_simplify: bool,
) -> Result<String, DiffError> {
    let mut by_slide: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    let mut general: Vec<String> = Vec::new();
    let mut counts = (0usize, 0usize, 0usize);

    for change in changes {
        let (slide, rest) = parse_slide_path(&change.path);
        let desc = describe_change_target(rest);
        if is_simplify && !SIMPLIFIED_DESCRIPTIONS.contains(&desc) {
            continue;
        }
        match change.change_type {
            ChangeType::Added => counts.0 += 1,
            ChangeType::Removed => counts.1 += 1,
            ChangeType::Modified => counts.2 += 1,
        }
        let line = describe_line(change, desc, &format_location(rest, is_simplify));
        match slide {
            Some(index) => by_slide.entry(index).or_default().push(line),
            None => general.push(line),
        }
    }

    let total = counts.0 + counts.1 + counts.2;
    let mut summary = String::new();
    write!(
        summary,
        "## Summary:\nDetected {total} changes: {} additions, {} removals, {} modifications.",
        counts.0, counts.1, counts.2
    )?;
    if total == 0 {
        summary.push_str("\n\nNo relevant changes detected.");
        return Ok(summary);
    }

    summary.push_str("\n\n## Details:");
    if !general.is_empty() {
        summary.push_str("\n\n### General Changes:\n");
        summary.push_str(&general.join("\n"));
    }
    for (index, lines) in &by_slide {
        write!(summary, "\n\n### Slide {}:\n", index + 1)?;
        summary.push_str(&lines.join("\n"));
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::structured::ValueRepr;

    fn modified(path: &str, old: &str, new: &str) -> Change {
        Change {
            path: path.into(),
            change_type: ChangeType::Modified,
            old_value: Some(ValueRepr::String(old.into())),
            new_value: Some(ValueRepr::String(new.into())),
        }
    }

    #[test]
    fn slide_paths_are_split() {
        assert_eq!(parse_slide_path("slides[12].body.question"), (Some(12), "body.question"));
        assert_eq!(parse_slide_path("slides[0]"), (Some(0), ""));
        assert_eq!(parse_slide_path("title"), (None, "title"));
        assert_eq!(describe_change_target("body.options[1]"), "Option");
        assert_eq!(describe_change_target("body.blocks[0].html"), "Block");
    }

    #[test]
    fn summary_groups_by_slide() {
        let changes = vec![
            modified("title", "Old", "New"),
            modified("slides[1].t", "Check", "Quick check"),
            modified("slides[1].body.explanations.wrong", "", "Nope"),
        ];
        let summary = generate_readable_summary(&changes, false).unwrap();
        assert!(summary.contains("Detected 3 changes"));
        assert!(summary.contains("### General Changes:\n- Changed Course Title from 'Old' to 'New'"));
        assert!(summary.contains("### Slide 2:\n- Changed Title from 'Check' to 'Quick check' (at `t`)"));

        let simple = generate_readable_summary(&changes, true).unwrap();
        assert!(simple.contains("Detected 2 changes"));
        assert!(!simple.contains("Explanation"));
    }

    #[test]
    fn git_diff_marks_changed_lines() {
        let diff = generate_git_diff("{\n  \"t\": \"A\"\n}\n", "{\n  \"t\": \"B\"\n}\n", "slide").unwrap();
        assert!(diff.starts_with("--- a/slide.json\n+++ b/slide.json\n@@ -1,3 +1,3 @@"));
        assert!(diff.contains("-  \"t\": \"A\"\n"));
        assert!(diff.contains("+  \"t\": \"B\"\n"));
        assert!(generate_git_diff("x\n", "x\n", "slide").unwrap().contains("No changes detected."));
    }
}
