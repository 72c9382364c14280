//! CLI parsing helpers for clap value parsers.

pub(super) fn parse_jobs(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("{s} is not a valid number"))?;
    if (1..=super::MAX_JOBS).contains(&value) {
        Ok(value)
    } else {
        Err(format!("jobs must be between 1 and {}", super::MAX_JOBS))
    }
}

/// Split one `-X` value into compiler words.
///
/// Values with unbalanced quotes are passed through unchanged.
pub(super) fn split_flag(flag: &str) -> Vec<String> {
    shlex::split(flag)
        .filter(|words| !words.is_empty())
        .unwrap_or_else(|| vec![flag.to_owned()])
}
