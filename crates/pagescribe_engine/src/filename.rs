const MAX_STEM_LEN: usize = 80;

/// Turn a free-form title into a file stem that is safe on every platform.
pub fn sanitize_title(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();

    let mut stem = String::with_capacity(replaced.len());
    let mut prev_underscore = false;
    for c in replaced.trim_matches(&['_', ' ', '.'][..]).chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        stem.push(c);
    }

    // Titles are often CJK; cut on a char boundary, not a byte count.
    if let Some((cut, _)) = stem.char_indices().nth(MAX_STEM_LEN) {
        stem.truncate(cut);
    }
    let stem = stem.trim_end_matches(&['_', ' ', '.'][..]).to_string();

    if stem.is_empty() {
        return "untitled".to_string();
    }
    if is_reserved_windows_name(&stem) {
        return format!("{stem}_");
    }
    stem
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
