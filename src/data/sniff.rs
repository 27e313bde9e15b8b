/// Delimiter candidates in priority order.  The order matters for the
/// relaxed pass, which simply takes the first candidate that splits.
pub const CANDIDATES: [char; 6] = ['\t', '~', '#', ',', ';', ' '];

/// Infer the field delimiter from a representative line (the header).
///
/// * Tab wins outright whenever it appears.
/// * Strict pass: first candidate that splits the line into more than one
///   part with every part non-blank.
/// * Relaxed pass: first candidate that splits the line at all.
///
/// Returns `None` when nothing splits the line.
pub fn detect_separator(line: &str) -> Option<char> {
    let line = line.trim();

    if line.contains('\t') {
        return Some('\t');
    }

    let strict = CANDIDATES.iter().copied().find(|&sep| {
        let parts: Vec<&str> = line.split(sep).collect();
        parts.len() > 1 && parts.iter().all(|p| !p.trim().is_empty())
    });
    if strict.is_some() {
        return strict;
    }

    CANDIDATES
        .iter()
        .copied()
        .find(|&sep| line.split(sep).count() > 1)
}
