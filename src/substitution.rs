use regex::Captures;

/// Replace `$1`..`$9` in `template` with the corresponding capture
/// group, then trim surrounding whitespace. A group that did not
/// participate in the match substitutes as the empty string; `$0` also
/// substitutes as empty. A result that trims down to nothing becomes
/// `None` (no value for that field).
///
/// No other interpolation syntax is recognised, and a literal `$` is
/// not escapable (the rule corpus never needs one): `$` followed by
/// anything but a digit passes through verbatim.
pub(crate) fn substitute(template: &str, captures: &Captures<'_>) -> Option<String> {
    // Fast path: no placeholders → only trimming can change the template.
    if !template.contains('$') {
        let trimmed = template.trim();
        return (!trimmed.is_empty()).then(|| trimmed.to_owned());
    }

    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' {
            if let Some(&d) = chars.peek() {
                if d.is_ascii_digit() {
                    chars.next();
                    let idx = (d as u8 - b'0') as usize;
                    if let Some(m) = (idx > 0).then(|| captures.get(idx)).flatten() {
                        result.push_str(m.as_str());
                    }
                    continue;
                }
            }
        }
        result.push(c);
    }

    let trimmed = result.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Fallback extraction for a field with no template: capture group
/// `idx` if it exists and participated, trimmed, empty → `None`.
pub(crate) fn group(captures: &Captures<'_>, idx: usize) -> Option<String> {
    let s = captures.get(idx)?.as_str().trim();
    (!s.is_empty()).then(|| s.to_owned())
}

/// Resolve a field: through its template when one is present, else
/// from `default_group`.
pub(crate) fn resolve(
    template: Option<&str>,
    captures: &Captures<'_>,
    default_group: usize,
) -> Option<String> {
    match template {
        Some(t) => substitute(t, captures),
        None => group(captures, default_group),
    }
}

/// The highest capture group a template references, 0 when it
/// references none. Used to validate templates against the compiled
/// pattern at load time.
pub(crate) fn max_group_ref(template: &str) -> usize {
    let mut max = 0;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' {
            if let Some(&d) = chars.peek() {
                if d.is_ascii_digit() {
                    chars.next();
                    max = max.max((d as u8 - b'0') as usize);
                }
            }
        }
    }
    max
}
