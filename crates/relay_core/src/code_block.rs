//! Cleanup applied to file-edit proposals once their content is complete.

const RMD_FENCE: &str = "````";
const FENCE: &str = "```";

/// Strips one surrounding markdown code fence from `content`.
///
/// A four-backtick fence wins over a three-backtick one and spans the first
/// and last occurrence; YAML front matter right after it is dropped. Content
/// without a complete fence comes back unchanged. Nothing is trimmed.
pub fn strip_code_fence(content: &str) -> String {
    if content.trim().is_empty() {
        return content.to_owned();
    }

    if content.contains(RMD_FENCE) {
        return strip_rmd_fence(content).unwrap_or_else(|| content.to_owned());
    }

    if let Some(start) = content.find(FENCE) {
        let after_open = start + FENCE.len();
        if let Some(offset) = content[after_open..].find(FENCE) {
            let end = after_open + offset;
            if let Some(line_end) = first_line_end(content, start).filter(|&i| i < end) {
                return content[line_end + 1..end].to_owned();
            }
        }
    }
    content.to_owned()
}

fn strip_rmd_fence(content: &str) -> Option<String> {
    let start = content.find(RMD_FENCE)?;
    let end = content.rfind(RMD_FENCE)?;
    if end <= start {
        return None;
    }
    let line_end = first_line_end(content, start).filter(|&i| i < end)?;
    let mut extracted = &content[line_end + 1..end];
    if extracted.starts_with("---\n") {
        if let Some(yaml_end) = extracted.find("\n---\n") {
            extracted = &extracted[yaml_end + 5..];
        }
    }
    Some(extracted.to_owned())
}

fn first_line_end(content: &str, from: usize) -> Option<usize> {
    content[from..].find('\n').map(|i| from + i)
}

/// Language tag for syntax highlighting, from the file extension.
pub fn language_for_filename(filename: &str) -> Option<&'static str> {
    let lower = filename.to_ascii_lowercase();
    let ext = lower.rsplit_once('.').map(|(_, ext)| ext)?;
    let language = match ext {
        "r" => "r",
        "py" => "python",
        "js" => "javascript",
        "java" => "java",
        "cpp" | "c" => "cpp",
        "sh" | "bash" => "bash",
        "sql" => "sql",
        "html" => "html",
        "css" => "css",
        "json" => "json",
        "rmd" => "rmd",
        _ => return None,
    };
    Some(language)
}
