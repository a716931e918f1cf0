// Text repair rules for near-JSON catalog dumps
// Each rule is a pure String -> String transform and knows which characters sit
// inside string literals, so URLs and apostrophes in quoted text survive.

const TRUNCATION_MARKER: &str = "...[Truncated]";

/// Marks every char that belongs to a string literal (delimiters included).
/// Both quote styles open a literal; a raw newline terminates an unclosed one.
/// Also returns the quote still open at the end of the text, if any.
fn scan_strings(chars: &[char]) -> (Vec<bool>, Option<char>) {
    let mut mask = Vec::with_capacity(chars.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for &c in chars {
        match quote {
            Some(q) => {
                if c == '\n' {
                    quote = None;
                    escaped = false;
                    mask.push(false);
                    continue;
                }
                mask.push(true);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                    mask.push(true);
                } else {
                    mask.push(false);
                }
            }
        }
    }

    (mask, quote)
}

fn string_mask(chars: &[char]) -> Vec<bool> {
    scan_strings(chars).0
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Rule 1: drop `//` comments up to the end of their line
pub fn strip_line_comments(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mask = string_mask(&chars);
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if !mask[i] && chars[i] == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

/// Rule 2: `{title: ...}` -> `{"title": ...}`
/// Only identifiers that open an object member (after `{`, `,` or at the very
/// start) and are followed by `:` are quoted.
pub fn quote_bare_keys(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mask = string_mask(&chars);
    let mut out = String::with_capacity(text.len() + 16);
    let mut last_significant: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if mask[i] {
            out.push(c);
            last_significant = Some('"');
            i += 1;
            continue;
        }

        if is_key_char(c) {
            let start = i;
            while i < chars.len() && !mask[i] && is_key_char(chars[i]) {
                i += 1;
            }
            let mut k = i;
            while k < chars.len() && !mask[k] && chars[k].is_whitespace() {
                k += 1;
            }

            let opens_member = matches!(last_significant, None | Some('{') | Some(','));
            let word: String = chars[start..i].iter().collect();
            if opens_member && chars.get(k) == Some(&':') && !mask[k] {
                out.push('"');
                out.push_str(&word);
                out.push('"');
            } else {
                out.push_str(&word);
            }
            last_significant = chars.get(i - 1).copied();
            continue;
        }

        if !c.is_whitespace() {
            last_significant = Some(c);
        }
        out.push(c);
        i += 1;
    }

    out
}

/// Rule 3: `'text'` -> `"text"`
/// Inner double quotes are escaped and `\'` becomes a plain apostrophe. A
/// literal left open at the end of a line is left as it was found.
pub fn single_to_double_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_double = false;
    let mut in_single = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if in_double {
            out.push(c);
            if c == '\\' {
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 2;
                    continue;
                }
            } else if c == '"' || c == '\n' {
                in_double = false;
            }
            i += 1;
            continue;
        }

        if in_single {
            match c {
                '\\' => match chars.get(i + 1) {
                    Some('\'') => {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    Some(&next) => {
                        out.push('\\');
                        out.push(next);
                        i += 2;
                        continue;
                    }
                    None => out.push('\\'),
                },
                '"' => out.push_str("\\\""),
                '\'' => {
                    out.push('"');
                    in_single = false;
                }
                '\n' => {
                    out.push('\n');
                    in_single = false;
                }
                _ => out.push(c),
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_double = true;
                out.push('"');
            }
            '\'' => {
                in_single = true;
                out.push('"');
            }
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

/// Rule 4: `[1, 2,]` -> `[1, 2]`
pub fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mask = string_mask(&chars);
    let mut out = String::with_capacity(text.len());

    for i in 0..chars.len() {
        if !mask[i] && chars[i] == ',' {
            let mut k = i + 1;
            while k < chars.len() && !mask[k] && chars[k].is_whitespace() {
                k += 1;
            }
            if k < chars.len() && !mask[k] && (chars[k] == '}' || chars[k] == ']') {
                continue;
            }
        }
        out.push(chars[i]);
    }

    out
}

/// Counts opening minus closing delimiters outside string literals
fn delimiter_balance(text: &str) -> (i64, i64) {
    let chars: Vec<char> = text.chars().collect();
    let mask = string_mask(&chars);
    let mut braces = 0i64;
    let mut brackets = 0i64;

    for (c, masked) in chars.iter().zip(mask) {
        if masked {
            continue;
        }
        match c {
            '{' => braces += 1,
            '}' => braces -= 1,
            '[' => brackets += 1,
            ']' => brackets -= 1,
            _ => {}
        }
    }

    (braces, brackets)
}

/// Rule 5: strip commas and braces left over from hand-concatenated objects.
/// `},\n{...},\n{...},` -> `{...},\n{...}`
pub fn trim_stray_delimiters(text: &str) -> String {
    let mut s = text
        .trim()
        .trim_start_matches(|c: char| c == ',' || c == '}' || c == ']' || c.is_whitespace())
        .trim_end_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string();

    loop {
        let (braces, brackets) = delimiter_balance(&s);
        let stray = match s.chars().last() {
            Some('}') if braces < 0 => true,
            Some(']') if brackets < 0 => true,
            Some('{') if braces > 0 => true,
            Some('[') if brackets > 0 => true,
            _ => false,
        };
        if !stray {
            break;
        }
        s.pop();
        let trimmed_len = s
            .trim_end_matches(|c: char| c == ',' || c.is_whitespace())
            .len();
        s.truncate(trimmed_len);
    }

    s
}

/// Rule 6: make the document array-shaped
pub fn wrap_in_array(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        trimmed.to_string()
    } else {
        format!("[{}]", trimmed)
    }
}

/// `type: movie,` -> `type: "movie",`; `true`, `false` and `null` stay bare
pub fn quote_bare_values(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mask = string_mask(&chars);
    let mut out = String::with_capacity(text.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;

        if mask[i - 1] || c != ':' {
            continue;
        }

        let mut start = i;
        while start < chars.len() && !mask[start] && chars[start].is_whitespace() {
            start += 1;
        }
        let Some(&first) = chars.get(start) else {
            continue;
        };
        if mask[start] || !(first.is_alphabetic() || first == '_') {
            continue;
        }

        let mut end = start;
        while end < chars.len() && !mask[end] && (chars[end].is_alphanumeric() || chars[end] == '_')
        {
            end += 1;
        }
        let mut k = end;
        while k < chars.len() && !mask[k] && (chars[k] == ' ' || chars[k] == '\t') {
            k += 1;
        }
        let terminated = match chars.get(k) {
            None => true,
            Some(&t) => !mask[k] && matches!(t, ',' | '}' | ']' | '\n' | '\r'),
        };
        if !terminated {
            continue;
        }

        let leading: String = chars[i..start].iter().collect();
        let word: String = chars[start..end].iter().collect();
        out.push_str(&leading);
        if matches!(word.as_str(), "true" | "false" | "null") {
            out.push_str(&word);
        } else {
            out.push('"');
            out.push_str(&word);
            out.push('"');
        }
        i = end;
    }

    out
}

/// `"Long text...[Truncated]` -> `"Long text...`
pub fn replace_truncation_markers(text: &str) -> String {
    text.replace(TRUNCATION_MARKER, "...")
}

/// Closes a string literal left open at the end and any unclosed `{` / `[`
pub fn close_open_delimiters(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let (mask, open_quote) = scan_strings(&chars);
    let mut stack = Vec::new();

    for (c, masked) in chars.iter().zip(&mask) {
        if *masked {
            continue;
        }
        match c {
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.last() == Some(c) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    let mut out = text.to_string();
    if let Some(q) = open_quote {
        out.push(q);
    }
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}

/// Full-document cleanup: rules 1-6 in order
pub fn clean_document(text: &str) -> String {
    let s = strip_line_comments(text);
    let s = quote_bare_keys(&s);
    let s = single_to_double_quotes(&s);
    let s = strip_trailing_commas(&s);
    let s = trim_stray_delimiters(&s);
    wrap_in_array(&s)
}

/// Record-level cleanup for a single object fragment
pub fn clean_fragment(fragment: &str) -> String {
    let s = replace_truncation_markers(fragment);
    let s = strip_line_comments(&s);
    let s = quote_bare_keys(&s);
    let s = quote_bare_values(&s);
    let s = single_to_double_quotes(&s);
    let s = strip_trailing_commas(&s);
    let s = trim_stray_delimiters(&s);

    let s = if s.starts_with('{') {
        s
    } else {
        format!("{{{}", s)
    };
    strip_trailing_commas(&close_open_delimiters(&s))
}

/// Splits text into top-level `{...}` fragments by tracking brace depth line by
/// line. Text between fragments is discarded; a fragment still open at the end
/// of the input is returned as-is for the caller to complete.
pub fn split_fragments(text: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for line in text.lines() {
        let line = strip_line_comments(line);
        let chars: Vec<char> = line.chars().collect();
        let mask = string_mask(&chars);

        for (&c, &masked) in chars.iter().zip(&mask) {
            if masked {
                if depth > 0 {
                    current.push(c);
                }
                continue;
            }
            match c {
                '{' => {
                    if depth == 0 {
                        current.clear();
                    }
                    depth += 1;
                    current.push(c);
                }
                '}' if depth > 0 => {
                    current.push(c);
                    depth -= 1;
                    if depth == 0 {
                        fragments.push(std::mem::take(&mut current));
                    }
                }
                _ => {
                    if depth > 0 {
                        current.push(c);
                    }
                }
            }
        }

        if depth > 0 {
            current.push('\n');
        }
    }

    if depth > 0 && !current.trim().is_empty() {
        fragments.push(current);
    }

    fragments
}
