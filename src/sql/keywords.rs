//! Lightweight keyword sniffing
//!
//! Splits SQL into bare words while skipping string literals, quoted
//! identifiers and comments. This is not a parser: callers only ask
//! "which keyword comes first" and "does this keyword appear at all".

/// A bare word found in SQL text, with byte offsets into the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    /// Parenthesis nesting depth at the word
    pub depth: usize,
}

impl Word<'_> {
    /// Case-insensitive keyword comparison
    pub fn is(&self, keyword: &str) -> bool {
        self.text.eq_ignore_ascii_case(keyword)
    }
}

/// Result of scanning a SQL string
#[derive(Debug, Default)]
pub struct Scan<'a> {
    pub words: Vec<Word<'a>>,
    /// Byte offsets of `;` outside literals and comments
    pub semicolons: Vec<usize>,
    /// Byte offsets of `,` at depth 0
    pub commas: Vec<usize>,
    /// Byte offset just past the last character outside comments
    pub code_end: usize,
}

pub fn scan(sql: &str) -> Scan<'_> {
    let mut out = Scan::default();
    let bytes = sql.as_bytes();
    let mut depth = 0usize;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '\'' | '"' | '`' => skip_until(&mut chars, c),
            '[' => skip_until(&mut chars, ']'),
            '-' if bytes.get(i + 1) == Some(&b'-') => {
                skip_until(&mut chars, '\n');
                continue;
            }
            '/' if bytes.get(i + 1) == Some(&b'*') => {
                chars.next();
                let mut prev = ' ';
                for (_, c) in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                continue;
            }
            c if c.is_whitespace() => continue,
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' => out.semicolons.push(i),
            ',' if depth == 0 => out.commas.push(i),
            c if c.is_alphabetic() || c == '_' => {
                let mut end = i + c.len_utf8();
                while let Some(&(j, n)) = chars.peek() {
                    if n.is_alphanumeric() || n == '_' || n == '$' {
                        end = j + n.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.words.push(Word {
                    text: &sql[i..end],
                    start: i,
                    end,
                    depth,
                });
            }
            c if c.is_ascii_digit() => {
                // numeric literals like 1e10 must not yield an `e10` word
                while let Some(&(_, n)) = chars.peek() {
                    if n.is_alphanumeric() || n == '_' || n == '.' {
                        chars.next();
                    } else {
                        break;
                    }
                }
            }
            _ => {}
        }
        out.code_end = chars.peek().map_or(sql.len(), |&(j, _)| j);
    }
    out
}

fn skip_until(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, close: char) {
    for (_, c) in chars.by_ref() {
        if c == close {
            break;
        }
    }
}

/// All bare words of `sql`
pub fn words(sql: &str) -> Vec<Word<'_>> {
    scan(sql).words
}

/// First keyword, upper-cased
pub fn first_keyword(sql: &str) -> Option<String> {
    words(sql).first().map(|w| w.text.to_ascii_uppercase())
}

/// Whether `keyword` appears anywhere outside literals and comments
pub fn has_keyword(sql: &str, keyword: &str) -> bool {
    words(sql).iter().any(|w| w.is(keyword))
}

/// Whether `sql` holds more than one statement. A trailing `;`, even one
/// followed by comments, does not count.
pub fn has_statement_separator(sql: &str) -> bool {
    let scan = scan(sql);
    scan.semicolons.iter().any(|&i| i + 1 < scan.code_end)
}

/// Offset where trailing comments and whitespace begin
pub fn code_end(sql: &str) -> usize {
    scan(sql).code_end
}

/// Strip trailing whitespace and semicolons
pub fn trim_statement(sql: &str) -> &str {
    sql.trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}
