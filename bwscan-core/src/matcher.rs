use bwscan_scanner::error::Result;
use regex::{Regex, RegexBuilder};

/// Compile the user's pattern. `^` and `$` always match at line boundaries.
pub fn compile_pattern(pattern: &str, ignore_case: bool) -> Result<Regex> {
    let regex = RegexBuilder::new(pattern)
        .multi_line(true)
        .case_insensitive(ignore_case)
        .build()?;
    Ok(regex)
}

pub fn is_match(body: &str, pattern: &Regex) -> bool {
    pattern.is_match(body)
}
