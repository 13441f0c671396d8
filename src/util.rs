//! Shared utility helpers.

/// Case-insensitive substring search without allocating an uppercase copy.
#[inline]
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    find_ci(haystack, needle).is_some()
}

/// Case-insensitive starts_with check without allocating.
#[inline]
pub fn starts_with_ci(haystack: &str, needle: &str) -> bool {
    haystack.len() >= needle.len()
        && haystack.as_bytes()[..needle.len()].eq_ignore_ascii_case(needle.as_bytes())
}

/// Case-insensitive find — returns byte offset of first occurrence of `needle` in `haystack`.
#[inline]
pub fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let needle_bytes = needle.as_bytes();
    let haystack_bytes = haystack.as_bytes();
    if needle_bytes.len() > haystack_bytes.len() {
        return None;
    }
    haystack_bytes
        .windows(needle_bytes.len())
        .position(|window| window.eq_ignore_ascii_case(needle_bytes))
}

/// Strips brackets `[]` and double quotes `""` from an identifier.
pub fn normalize_identifier(ident: &str) -> String {
    ident
        .trim()
        .trim_matches(|c| c == '[' || c == ']' || c == '"')
        .to_string()
}

/// Incremental, quote-aware parenthesis tracker for T-SQL text.
///
/// Parentheses inside `'...'` string literals and `[...]` identifiers are
/// ignored. State carries across calls to [`ParenScanner::feed`], so a
/// statement split over several physical lines can be fed line by line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParenScanner {
    depth: i32,
    in_quote: bool,
    in_bracket: bool,
    opened: bool,
}

impl ParenScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, text: &str) {
        for c in text.chars() {
            self.step(c);
        }
    }

    /// Advance by one character. Returns true when this character closed
    /// the outermost parenthesis.
    pub(crate) fn step(&mut self, c: char) -> bool {
        if self.in_quote {
            // A doubled quote toggles twice and stays inside the literal.
            if c == '\'' {
                self.in_quote = false;
            }
            return false;
        }
        if self.in_bracket {
            if c == ']' {
                self.in_bracket = false;
            }
            return false;
        }
        match c {
            '\'' => self.in_quote = true,
            '[' => self.in_bracket = true,
            '(' => {
                self.depth += 1;
                self.opened = true;
            }
            ')' => {
                self.depth -= 1;
                return self.depth == 0;
            }
            _ => {}
        }
        false
    }

    /// Current nesting depth; negative when more `)` than `(` were seen.
    #[inline]
    pub fn depth(&self) -> i32 {
        self.depth
    }

    #[inline]
    pub fn in_quote(&self) -> bool {
        self.in_quote
    }

    #[inline]
    pub fn in_bracket(&self) -> bool {
        self.in_bracket
    }

    /// True when outside any literal, identifier and parenthesis
    #[inline]
    pub fn at_top_level(&self) -> bool {
        self.depth == 0 && !self.in_quote && !self.in_bracket
    }

    /// True once at least one `(` was seen and every one has been closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.opened && self.depth == 0 && !self.in_quote
    }
}

/// Byte offset of the `)` matching the `(` at `open`, honouring quotes and
/// bracketed identifiers.
pub fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    if text.as_bytes().get(open) != Some(&b'(') {
        return None;
    }
    let mut scanner = ParenScanner::new();
    for (offset, c) in text[open..].char_indices() {
        if scanner.step(c) {
            return Some(open + offset);
        }
        if scanner.depth() < 0 {
            return None;
        }
    }
    None
}
