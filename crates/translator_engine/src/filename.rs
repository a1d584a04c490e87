use crate::disposition::ContentDisposition;

const MAX_FILENAME_BYTES: usize = 150;

/// Name to save a translated artifact under.
///
/// Uses the server's `Content-Disposition` suggestion when there is one,
/// otherwise `translated_<original stem>.<docx|pptx>`. Never empty.
pub fn resolve_filename(content_disposition: Option<&str>, original_name: &str) -> String {
    content_disposition
        .and_then(ContentDisposition::parse)
        .and_then(|disposition| disposition.filename())
        .map(|suggested| sanitize_filename(&suggested))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| fallback_filename(original_name))
}

/// `translated_<stem>.<ext>`; the service returns PowerPoint for PowerPoint
/// input and Word for everything else.
pub fn fallback_filename(original_name: &str) -> String {
    let base = last_component(original_name);
    let (stem, extension) = match base.rfind('.') {
        Some(idx) if idx > 0 => (&base[..idx], &base[idx + 1..]),
        _ => (base, ""),
    };
    let output_ext = if extension.eq_ignore_ascii_case("pptx") {
        "pptx"
    } else {
        "docx"
    };
    let stem = if stem.trim().is_empty() { "document" } else { stem };
    let name = sanitize_filename(&format!("translated_{stem}.{output_ext}"));
    if name.is_empty() {
        format!("translated_document.{output_ext}")
    } else {
        name
    }
}

/// Windows-safe file name: no directories, no forbidden characters, no
/// reserved device names. May return an empty string.
pub fn sanitize_filename(input: &str) -> String {
    let cleaned: String = last_component(input)
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let mut name = cleaned.trim_matches(&[' ', '.'][..]).to_string();
    if name.chars().all(|c| c == '_') {
        return String::new();
    }

    if name.len() > MAX_FILENAME_BYTES {
        name = truncate_keeping_extension(&name, MAX_FILENAME_BYTES);
    }

    let stem_len = name.find('.').unwrap_or(name.len());
    if is_reserved_windows_name(&name[..stem_len]) {
        name.insert(stem_len, '_');
    }
    name
}

fn last_component(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn truncate_keeping_extension(name: &str, max: usize) -> String {
    let (stem, extension) = match name.rfind('.') {
        Some(idx) if idx > 0 && name.len() - idx <= 16 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    };
    let mut end = max.saturating_sub(extension.len()).min(stem.len());
    while end > 0 && !stem.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &stem[..end], extension)
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
