//! Module `scanner` implements a one‑pass, streaming lexer for the Zinc language.
//!
//! It transforms a source string into a sequence of [`Token`]s, skipping
//! whitespace and `//` comments, and emitting exactly one `EOF` token at the
//! end. Designed as a `FusedIterator`, it can be chained safely with other
//! iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input text.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token, ZincError>` on each `.next()`. A lexing error does
//!   not stop the scanner: the offending input has already been consumed, so
//!   the following call resumes with the next lexeme and several errors can
//!   surface in one pass.
//!
//! - `scan_tokens(src) -> (Vec<Token>, Vec<ZincError>)`
//!   Drains a scanner, splitting tokens from diagnostics.
//!
//! # Token Recognition (`scan_token`)
//!
//! - Single‑character punctuators: `( ) { } [ ] , ; ~ | & ^`.
//! - Maximal‑munch operators: `+ ++ +=`, `- -- -=`, `* ** *= **=`, `/ /=`,
//!   `% %=`, `! !=`, `= ==`, `< <= <<`, `> >= >>`.
//! - Number literals: digits with at most one decimal point; `.5` is accepted,
//!   `5.` and `1.2.3` are reported as malformed.
//! - String literals: `"` … `"`, multi‑line, with backslash escapes.
//! - Identifiers/keywords resolved via a perfect‑hash `KEYWORDS` map.
//!
//! # Example
//!
//! ```rust
//! use zinc::scanner::Scanner;
//!
//! let mut scanner = Scanner::new("println 123; // example");
//! for result in &mut scanner {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! ```

use crate::error::{Result, ZincError};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"      => TokenType::AND,
    b"break"    => TokenType::BREAK,
    b"class"    => TokenType::CLASS,
    b"continue" => TokenType::CONTINUE,
    b"elif"     => TokenType::ELIF,
    b"else"     => TokenType::ELSE,
    b"false"    => TokenType::FALSE,
    b"fun"      => TokenType::FUN,
    b"for"      => TokenType::FOR,
    b"if"       => TokenType::IF,
    b"null"     => TokenType::NULL,
    b"or"       => TokenType::OR,
    b"print"    => TokenType::PRINT,
    b"println"  => TokenType::PRINTLN,
    b"return"   => TokenType::RETURN,
    b"super"    => TokenType::SUPER,
    b"this"     => TokenType::THIS,
    b"true"     => TokenType::TRUE,
    b"var"      => TokenType::VAR,
    b"while"    => TokenType::WHILE,
};

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s.
pub struct Scanner<'a> {
    src: &'a str,               // entire source text
    bytes: &'a [u8],            // `src` viewed as bytes for cheap peeking
    start: usize,               // index of the *first* byte of the current lexeme
    curr: usize,                // index *one past* the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            bytes: src.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Are we at (or past) the end of input?
    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it. Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.bytes[self.curr]
        }
    }

    /// Peek one byte beyond [`peek`].  Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.bytes[self.curr + 1]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume one whole (possibly multi‑byte) character starting at `at`
    /// and return it; `curr` ends up on the next char boundary.
    fn consume_char_at(&mut self, at: usize) -> char {
        let ch = self.src[at..].chars().next().unwrap_or('\0');
        self.curr = at + ch.len_utf8().max(1);
        ch
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* lexeme starting at `self.curr`.  If it produces an
    /// actual token the kind is stored in `self.pending`.  Whitespace and
    /// comments are skipped by returning `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        let tt = match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b'[' => TokenType::LEFT_BRACKET,
            b']' => TokenType::RIGHT_BRACKET,
            b',' => TokenType::COMMA,
            b';' => TokenType::SEMICOLON,
            b'~' => TokenType::TILDE,
            b'|' => TokenType::PIPE,
            b'&' => TokenType::AMPERSAND,
            b'^' => TokenType::CARET,

            // ── '.' is either a DOT or the start of `.5` ────────────────
            b'.' => {
                if self.peek().is_ascii_digit() {
                    return self.parse_number(true);
                }

                TokenType::DOT
            }

            // ── maximal‑munch operators ─────────────────────────────────
            b'+' => {
                if self.match_byte(b'+') {
                    TokenType::PLUS_PLUS
                } else if self.match_byte(b'=') {
                    TokenType::PLUS_EQUAL
                } else {
                    TokenType::PLUS
                }
            }

            b'-' => {
                if self.match_byte(b'-') {
                    TokenType::MINUS_MINUS
                } else if self.match_byte(b'=') {
                    TokenType::MINUS_EQUAL
                } else {
                    TokenType::MINUS
                }
            }

            b'*' => {
                if self.match_byte(b'*') {
                    if self.match_byte(b'=') {
                        TokenType::STAR_STAR_EQUAL
                    } else {
                        TokenType::STAR_STAR
                    }
                } else if self.match_byte(b'=') {
                    TokenType::STAR_EQUAL
                } else {
                    TokenType::STAR
                }
            }

            b'%' => {
                if self.match_byte(b'=') {
                    TokenType::PERCENT_EQUAL
                } else {
                    TokenType::PERCENT
                }
            }

            b'!' => {
                if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                }
            }

            b'=' => {
                if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                }
            }

            b'<' => {
                if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else if self.match_byte(b'<') {
                    TokenType::LESS_LESS
                } else {
                    TokenType::LESS
                }
            }

            b'>' => {
                if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else if self.match_byte(b'>') {
                    TokenType::GREATER_GREATER
                } else {
                    TokenType::GREATER
                }
            }

            // ── comments (// … until newline) or division ───────────────
            b'/' => {
                if self.match_byte(b'/') {
                    // Fast‑forward to the next newline; the newline itself is
                    // left for the main loop so the line counter stays right.
                    match memchr(b'\n', &self.bytes[self.curr..]) {
                        Some(pos) => self.curr += pos,
                        None => self.curr = self.len(),
                    }

                    return Ok(());
                }

                if self.match_byte(b'=') {
                    TokenType::SLASH_EQUAL
                } else {
                    TokenType::SLASH
                }
            }

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => return Ok(()),

            b'\n' => {
                self.line += 1;

                return Ok(());
            }

            b'"' => return self.parse_string(),

            b'0'..=b'9' => return self.parse_number(false),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();

                return Ok(());
            }

            // ── unexpected character ─────────────────────────────────────
            _ => {
                let ch = self.consume_char_at(self.start);

                return Err(ZincError::lex(
                    self.line,
                    format!("Unexpected character: {}", ch),
                ));
            }
        };

        self.pending = Some(tt);

        Ok(())
    }

    /// Parse a double‑quoted string literal.
    ///
    /// * `self.start` points to the opening `"`.
    /// * On success `self.curr` points **past** the closing `"`.
    ///
    /// A backslash always escapes the following character, so `"\\"` is a
    /// one‑character string and `"\""` is a lone quote.
    fn parse_string(&mut self) -> Result<()> {
        let mut value = String::new();
        let mut segment = self.curr;
        let mut bad_escape: Option<String> = None;

        loop {
            if self.is_at_end() {
                return Err(ZincError::lex(self.line, "Unterminated string."));
            }

            match self.peek() {
                b'"' => break,

                b'\\' => {
                    value.push_str(&self.src[segment..self.curr]);
                    self.advance();

                    if self.is_at_end() {
                        return Err(ZincError::lex(self.line, "Unterminated string."));
                    }

                    let escaped = self.consume_char_at(self.curr);

                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '0' => value.push('\0'),
                        '\\' => value.push('\\'),
                        '"' => value.push('"'),
                        other => {
                            if other == '\n' {
                                self.line += 1;
                            }

                            if bad_escape.is_none() {
                                bad_escape = Some(other.escape_debug().to_string());
                            }
                        }
                    }

                    segment = self.curr;
                }

                b'\n' => {
                    self.line += 1;
                    self.advance();
                }

                _ => {
                    self.advance();
                }
            }
        }

        value.push_str(&self.src[segment..self.curr]);
        self.advance(); // closing quote

        if let Some(esc) = bad_escape {
            return Err(ZincError::lex(
                self.line,
                format!("Invalid escape sequence '\\{}'.", esc),
            ));
        }

        self.pending = Some(TokenType::STRING(value));

        Ok(())
    }

    /// Parse a numeric literal (`123`, `3.14`, `.5`).
    ///
    /// `seen_dot` is set when the literal started with its decimal point.
    fn parse_number(&mut self, seen_dot: bool) -> Result<()> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if !seen_dot && self.peek() == b'.' {
            if !self.peek_next().is_ascii_digit() {
                self.advance(); // swallow the dangling '.'

                return Err(ZincError::lex(
                    self.line,
                    "Invalid number format (trailing decimal point).",
                ));
            }

            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        if self.peek() == b'.' {
            // Swallow the rest of the malformed run so it is reported once.
            while self.peek() == b'.' || self.peek().is_ascii_digit() {
                self.advance();
            }

            return Err(ZincError::lex(
                self.line,
                "Invalid number format (multiple decimal points).",
            ));
        }

        let text: &str = &self.src[self.start..self.curr];
        let parsed = if text.starts_with('.') {
            format!("0{}", text).parse::<f64>()
        } else {
            text.parse::<f64>()
        };

        match parsed {
            Ok(n) => {
                self.pending = Some(TokenType::NUMBER(n));

                Ok(())
            }

            Err(_) => Err(ZincError::lex(
                self.line,
                format!("Invalid number format: {}", text),
            )),
        }
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.bytes[self.start..self.curr];

        let tt: TokenType = KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER);

        self.pending = Some(tt);
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        // Loop until we either emit a token, hit EOF, or see an error.
        while self.curr <= self.len() {
            // 1. EOF guard – emit exactly one EOF then terminate.
            if self.curr == self.len() {
                self.curr += 1; // ensure fused semantics
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            // 2. Reset per‑token state.
            self.start = self.curr;
            self.pending = None;

            // 3. Attempt to scan a token.
            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            // 4. If a real token was recognised, build and return it.
            if let Some(tt) = self.pending.take() {
                let lexeme: &str = &self.src[self.start..self.curr];
                debug!("Scanned token ({:?}) on line {}", tt, self.line);

                return Some(Ok(Token::new(tt, lexeme, self.line)));
            }
            // Otherwise it was whitespace / comment → continue loop.
        }

        None // already yielded EOF
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan `src` completely, separating tokens from lexical diagnostics.
///
/// The token vector always ends with the `EOF` sentinel.
pub fn scan_tokens(src: &str) -> (Vec<Token>, Vec<ZincError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for item in Scanner::new(src) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    info!(
        "Scanned {} token(s) with {} error(s)",
        tokens.len(),
        errors.len()
    );

    (tokens, errors)
}
