/// Lexical state while walking SQL text.
#[derive(Clone)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// A placeholder found outside literals and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Token<'a> {
    /// A bare `?`.
    Bare,
    /// `?` followed by an identifier such as `?1` or `?userid`.
    Question(&'a str),
    /// `$` followed by digits.
    Dollar(usize),
}

/// Placeholder with its byte span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Placeholder<'a> {
    pub start: usize,
    pub end: usize,
    pub token: Token<'a>,
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn scan_while(bytes: &[u8], start: usize, pred: impl Fn(u8) -> bool) -> usize {
    let mut idx = start;
    while idx < bytes.len() && pred(bytes[idx]) {
        idx += 1;
    }
    idx
}

fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let end = scan_while(bytes, start + 1, is_ident_byte);
    if bytes.get(end) == Some(&b'$') && !bytes[start + 1..end].iter().all(u8::is_ascii_digit) {
        let tag = String::from_utf8(bytes[start + 1..end].to_vec()).ok()?;
        Some((tag, end))
    } else if end == start + 1 && bytes.get(end) == Some(&b'$') {
        // `$$` opens an anonymous dollar-quoted body
        Some((String::new(), end))
    } else {
        None
    }
}

fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let end = idx + 1 + tag.len();
    end < bytes.len()
        && bytes[idx + 1..end] == *tag.as_bytes()
        && bytes.get(end) == Some(&b'$')
}

/// Collect every placeholder in `sql`, skipping quoted strings, quoted identifiers,
/// comments, and dollar-quoted bodies.
pub(super) fn placeholders(sql: &str) -> Vec<Placeholder<'_>> {
    let bytes = sql.as_bytes();
    let mut found = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    idx += 1;
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    } else {
                        let end = scan_while(bytes, idx + 1, |c| c.is_ascii_digit());
                        if end > idx + 1 {
                            let index = sql[idx + 1..end].parse().unwrap_or(usize::MAX);
                            found.push(Placeholder {
                                start: idx,
                                end,
                                token: Token::Dollar(index),
                            });
                            idx = end - 1;
                        }
                    }
                }
                b'?' => {
                    let end = scan_while(bytes, idx + 1, is_ident_byte);
                    let token = if end > idx + 1 {
                        Token::Question(&sql[idx + 1..end])
                    } else {
                        Token::Bare
                    };
                    found.push(Placeholder {
                        start: idx,
                        end,
                        token,
                    });
                    idx = end - 1;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let tag_len = tag.len();
                    state = State::Normal;
                    idx += tag_len + 1;
                }
            }
        }
        idx += 1;
    }

    found
}
