use serde_json::{json, Value};

/// Safely truncates a UTF-8 string without breaking character boundaries.
/// If `s` length exceeds `max`, returns a string cut at a valid char boundary and appends `suffix`.
/// The resulting string length will be <= max whenever possible (suffix included). If `max` < suffix length,
/// the function returns a safely cut string without suffix, not exceeding `max` bytes.
pub fn safe_truncate_utf8(s: &str, max: usize, suffix: &str) -> String {
    if s.len() <= max {
        return s.to_string();
    }

    if max == 0 {
        return String::new();
    }

    let suffix_len = suffix.len();
    if max <= suffix_len {
        let mut end = max;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        return s[..end].to_string();
    }

    let mut end = max - suffix_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut result = String::with_capacity(end + suffix_len);
    result.push_str(&s[..end]);
    result.push_str(suffix);
    result
}

/// Builds a standardized error payload string for tool errors.
/// First line: short human-readable message.
/// Then a JSON object with fields: code, message, details.
pub fn build_error_payload(code: &str, message: &str, details: Value) -> String {
    let obj = json!({
        "code": code,
        "message": message,
        "details": details,
    });
    let mut out = String::new();
    out.push_str(message);
    out.push('\n');
    out.push_str(&obj.to_string());
    out
}
