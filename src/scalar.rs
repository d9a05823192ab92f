//! Scalar minifying state machine.
//!
//! A single-pass automaton that walks input bytes, validates the JSON
//! grammar, and emits every kept byte. Each input byte causes at most one
//! state transition and at most one output byte. This machine is the
//! correctness reference for all modes: the SIMD paths must produce
//! byte-identical output.
//!
//! The only lossy rule is the whitespace policy: `0x20 0x09 0x0A 0x0D` are
//! dropped whenever the machine is outside a string. Everything else is
//! copied through verbatim. Number content is never reparsed; any nonempty
//! run over the number alphabet passes through in input order.
//!
//! # Example
//!
//! ```
//! use jsonmin::scalar::ScalarMinifier;
//!
//! let mut machine = ScalarMinifier::new();
//! let mut out = Vec::new();
//! machine.feed(b"{ \"a\" : 1 }", &mut out).unwrap();
//! machine.finish().unwrap();
//! assert_eq!(out, b"{\"a\":1}");
//! ```

use crate::classify::{classify, is_number_byte, ByteClass};
use crate::error::{Error, ErrorKind};

/// Maximum container nesting depth.
pub const MAX_DEPTH: usize = 128;

/// Container kind on the context stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// `{` ... `}`
    Object,
    /// `[` ... `]`
    Array,
}

/// Fixed-capacity stack of container kinds, one bit per level.
///
/// Bounded depth keeps the machine constant-size, which is what lets ECO run
/// in O(1) memory and makes checkpoint/restore a plain copy.
#[derive(Debug, Clone)]
struct ContextStack {
    words: [u64; MAX_DEPTH / 64],
    len: usize,
}

impl ContextStack {
    const fn new() -> Self {
        Self {
            words: [0; MAX_DEPTH / 64],
            len: 0,
        }
    }

    /// Push a container kind. Returns false when the depth limit is hit.
    #[inline]
    fn push(&mut self, kind: Container) -> bool {
        if self.len == MAX_DEPTH {
            return false;
        }
        let word = self.len / 64;
        let bit = 1u64 << (self.len % 64);
        match kind {
            Container::Object => self.words[word] |= bit,
            Container::Array => self.words[word] &= !bit,
        }
        self.len += 1;
        true
    }

    #[inline]
    fn pop(&mut self) -> Option<Container> {
        let top = self.top()?;
        self.len -= 1;
        Some(top)
    }

    #[inline]
    fn top(&self) -> Option<Container> {
        if self.len == 0 {
            return None;
        }
        let idx = self.len - 1;
        let bit = self.words[idx / 64] >> (idx % 64) & 1;
        Some(if bit == 1 {
            Container::Object
        } else {
            Container::Array
        })
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// The JSON keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    True,
    False,
    Null,
}

impl Keyword {
    #[inline]
    fn bytes(self) -> &'static [u8] {
        match self {
            Self::True => b"true",
            Self::False => b"false",
            Self::Null => b"null",
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Self::True => "remainder of 'true'",
            Self::False => "remainder of 'false'",
            Self::Null => "remainder of 'null'",
        }
    }
}

/// What kind of non-container, non-string value is being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    /// Number literal: any run over `0-9 + - . e E`.
    Number,
    /// `true` / `false` / `null`, matched byte by byte.
    Keyword { word: Keyword, matched: u8 },
}

/// Parser state. Every transition is deterministic on the input byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the root value, or after it ended.
    TopLevel,
    /// Scanning a number or keyword literal.
    InValue(ValueKind),
    /// Inside a string literal, no pending escape.
    InString,
    /// The next byte is the escape payload.
    InStringEscape,
    /// Consuming the n-th of 4 hex digits after `\u`.
    InStringUnicode(u8),
    /// Just consumed a structural byte or finished a value; whitespace may
    /// be skipped here.
    StructuralPending,
}

/// What the grammar allows next. Tracked alongside the state so structural
/// errors are caught exactly where the grammar is violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// A value (root position, after `:`, after `,` in an array).
    Value,
    /// A value or `]` (right after `[`).
    ValueOrClose,
    /// A string key (after `,` in an object).
    Key,
    /// A string key or `}` (right after `{`).
    KeyOrClose,
    /// `:` after an object key.
    Colon,
    /// `,` or the matching close of the enclosing container.
    CommaOrClose,
    /// Nothing but trailing whitespace.
    End,
}

enum ValueStep {
    /// The byte was consumed as part of the value.
    Consumed,
    /// The value ended before this byte; reprocess it structurally.
    Ended,
}

/// The scalar minifying state machine.
///
/// Feed input with [`feed`](Self::feed), then call
/// [`finish`](Self::finish). The machine is reentrant: `feed` may be called
/// any number of times with arbitrary slice boundaries, and
/// [`reset`](Self::reset) returns a used machine to its initial state.
#[derive(Debug, Clone)]
pub struct ScalarMinifier {
    state: State,
    expect: Expect,
    stack: ContextStack,
    string_is_key: bool,
    offset: usize,
}

impl Default for ScalarMinifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalarMinifier {
    /// Create a machine positioned before the root value.
    pub fn new() -> Self {
        Self {
            state: State::TopLevel,
            expect: Expect::Value,
            stack: ContextStack::new(),
            string_is_key: false,
            offset: 0,
        }
    }

    /// Seed a machine mid-document: one level deep inside the outermost
    /// container, immediately after an element separator. Used for parallel
    /// chunk workers.
    pub(crate) fn resume_in_container(kind: Container, base_offset: usize) -> Self {
        let mut stack = ContextStack::new();
        // depth 1 < MAX_DEPTH, cannot fail
        let _ = stack.push(kind);
        Self {
            state: State::StructuralPending,
            expect: match kind {
                Container::Object => Expect::Key,
                Container::Array => Expect::Value,
            },
            stack,
            string_is_key: false,
            offset: base_offset,
        }
    }

    /// Return the machine to its initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Absolute input offset of the next byte.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// True at a safe chunk boundary: before or after the root value, or
    /// between tokens with every container closed.
    pub fn is_quiescent(&self) -> bool {
        matches!(self.state, State::TopLevel | State::StructuralPending) && self.stack.is_empty()
    }

    /// True while inside a string with no pending escape. The fast path may
    /// bulk-copy string bytes in this state.
    #[inline]
    pub(crate) fn in_plain_string(&self) -> bool {
        self.state == State::InString
    }

    /// True when the machine is outside all string sub-states, i.e. block
    /// processing of whitespace is legal.
    #[inline]
    pub(crate) fn outside_string(&self) -> bool {
        !matches!(
            self.state,
            State::InString | State::InStringEscape | State::InStringUnicode(_)
        )
    }

    /// Advance the offset past bytes consumed by a bulk fast path.
    #[inline]
    pub(crate) fn advance_bulk(&mut self, count: usize) {
        self.offset += count;
    }

    /// Feed a slice, appending every kept byte to `out`.
    pub fn feed(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), Error> {
        for &byte in input {
            if self.transition(byte)? {
                out.push(byte);
            }
        }
        Ok(())
    }

    /// Consume one byte, tracking the input offset. Returns whether the byte
    /// is kept.
    #[inline]
    pub fn transition(&mut self, byte: u8) -> Result<bool, Error> {
        let emit = self.apply(byte)?;
        self.offset += 1;
        Ok(emit)
    }

    /// Consume one byte without touching the offset. Bulk paths use this to
    /// grammar-check bytes whose positions are re-derived on the error path.
    #[inline]
    pub(crate) fn apply(&mut self, byte: u8) -> Result<bool, Error> {
        loop {
            match self.state {
                State::InString => return self.string_byte(byte),
                State::InStringEscape => return self.escape_byte(byte),
                State::InStringUnicode(n) => return self.unicode_byte(byte, n),
                State::InValue(kind) => match self.value_byte(byte, kind)? {
                    ValueStep::Consumed => return Ok(true),
                    ValueStep::Ended => continue,
                },
                State::TopLevel | State::StructuralPending => {
                    if classify(byte) == ByteClass::Whitespace {
                        return Ok(false);
                    }
                    return self.structural_byte(byte);
                }
            }
        }
    }

    /// End the stream. Numbers still in progress complete here; anything
    /// else unterminated is a `Truncated` error.
    pub fn finish(&mut self) -> Result<(), Error> {
        match self.state {
            State::InString => {
                return Err(self.err(ErrorKind::Truncated {
                    expected: "closing '\"'",
                }))
            }
            State::InStringEscape => {
                return Err(self.err(ErrorKind::Truncated {
                    expected: "escape character",
                }))
            }
            State::InStringUnicode(_) => {
                return Err(self.err(ErrorKind::Truncated {
                    expected: "hex digit",
                }))
            }
            State::InValue(ValueKind::Keyword { word, .. }) => {
                return Err(self.err(ErrorKind::Truncated {
                    expected: word.expected(),
                }))
            }
            State::InValue(ValueKind::Number) => self.after_value(),
            State::TopLevel | State::StructuralPending => {}
        }

        if self.expect == Expect::End {
            return Ok(());
        }
        if self.offset == 0 {
            // Empty input: empty output, not an error.
            return Ok(());
        }
        Err(self.err(ErrorKind::Truncated {
            expected: self.pending_expectation(),
        }))
    }

    /// Chunk-tail variant of [`finish`](Self::finish): the chunk must end
    /// immediately after an element separator one level inside the outermost
    /// container, which is the only place the boundary resolver cuts.
    pub(crate) fn finish_chunk(&mut self) -> Result<(), Error> {
        if self.state == State::StructuralPending
            && matches!(self.expect, Expect::Key | Expect::Value)
            && self.stack.len() == 1
        {
            Ok(())
        } else {
            Err(self.err(ErrorKind::Truncated {
                expected: "element boundary",
            }))
        }
    }

    // ------------------------------------------------------------------
    // Per-state byte handlers
    // ------------------------------------------------------------------

    #[inline]
    fn string_byte(&mut self, byte: u8) -> Result<bool, Error> {
        match byte {
            b'"' => {
                if self.string_is_key {
                    self.state = State::StructuralPending;
                    self.expect = Expect::Colon;
                } else {
                    self.after_value();
                }
                Ok(true)
            }
            b'\\' => {
                self.state = State::InStringEscape;
                Ok(true)
            }
            // Everything else, including raw control bytes and multi-byte
            // UTF-8, passes through verbatim.
            _ => Ok(true),
        }
    }

    #[inline]
    fn escape_byte(&mut self, byte: u8) -> Result<bool, Error> {
        match byte {
            b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => {
                self.state = State::InString;
                Ok(true)
            }
            b'u' => {
                self.state = State::InStringUnicode(0);
                Ok(true)
            }
            _ => Err(self.err(ErrorKind::InvalidEscape { byte })),
        }
    }

    #[inline]
    fn unicode_byte(&mut self, byte: u8, digit: u8) -> Result<bool, Error> {
        if byte.is_ascii_hexdigit() {
            self.state = if digit == 3 {
                State::InString
            } else {
                State::InStringUnicode(digit + 1)
            };
            Ok(true)
        } else {
            Err(self.err(ErrorKind::InvalidUnicodeEscape { byte }))
        }
    }

    #[inline]
    fn value_byte(&mut self, byte: u8, kind: ValueKind) -> Result<ValueStep, Error> {
        match kind {
            ValueKind::Number => {
                if is_number_byte(byte) {
                    Ok(ValueStep::Consumed)
                } else {
                    self.after_value();
                    Ok(ValueStep::Ended)
                }
            }
            ValueKind::Keyword { word, matched } => {
                let bytes = word.bytes();
                let m = matched as usize;
                if byte == bytes[m] {
                    if m + 1 == bytes.len() {
                        self.after_value();
                    } else {
                        self.state = State::InValue(ValueKind::Keyword {
                            word,
                            matched: matched + 1,
                        });
                    }
                    Ok(ValueStep::Consumed)
                } else {
                    Err(self.err(ErrorKind::UnexpectedByte {
                        byte,
                        expected: word.expected(),
                    }))
                }
            }
        }
    }

    fn structural_byte(&mut self, byte: u8) -> Result<bool, Error> {
        match self.expect {
            Expect::Value => self.value_start(byte),
            Expect::ValueOrClose => {
                if byte == b']' {
                    self.close_container(byte)
                } else {
                    self.value_start(byte)
                }
            }
            Expect::Key => self.key_start(byte),
            Expect::KeyOrClose => {
                if byte == b'}' {
                    self.close_container(byte)
                } else {
                    self.key_start(byte)
                }
            }
            Expect::Colon => {
                if byte == b':' {
                    self.state = State::StructuralPending;
                    self.expect = Expect::Value;
                    Ok(true)
                } else {
                    Err(self.err(ErrorKind::UnexpectedByte {
                        byte,
                        expected: "':'",
                    }))
                }
            }
            Expect::CommaOrClose => match byte {
                b',' => {
                    self.state = State::StructuralPending;
                    self.expect = match self.stack.top() {
                        Some(Container::Object) => Expect::Key,
                        _ => Expect::Value,
                    };
                    Ok(true)
                }
                b'}' | b']' => self.close_container(byte),
                _ => Err(self.err(ErrorKind::UnexpectedByte {
                    byte,
                    expected: self.pending_expectation(),
                })),
            },
            Expect::End => Err(self.err(ErrorKind::UnexpectedByte {
                byte,
                expected: "end of input",
            })),
        }
    }

    fn value_start(&mut self, byte: u8) -> Result<bool, Error> {
        match byte {
            b'{' => {
                self.push(Container::Object)?;
                self.state = State::StructuralPending;
                self.expect = Expect::KeyOrClose;
                Ok(true)
            }
            b'[' => {
                self.push(Container::Array)?;
                self.state = State::StructuralPending;
                self.expect = Expect::ValueOrClose;
                Ok(true)
            }
            b'"' => {
                self.string_is_key = false;
                self.state = State::InString;
                Ok(true)
            }
            b't' => self.start_keyword(Keyword::True),
            b'f' => self.start_keyword(Keyword::False),
            b'n' => self.start_keyword(Keyword::Null),
            b'-' | b'0'..=b'9' => {
                self.state = State::InValue(ValueKind::Number);
                Ok(true)
            }
            _ => Err(self.err(ErrorKind::UnexpectedByte {
                byte,
                expected: "JSON value",
            })),
        }
    }

    #[inline]
    fn start_keyword(&mut self, word: Keyword) -> Result<bool, Error> {
        self.state = State::InValue(ValueKind::Keyword { word, matched: 1 });
        Ok(true)
    }

    fn key_start(&mut self, byte: u8) -> Result<bool, Error> {
        if byte == b'"' {
            self.string_is_key = true;
            self.state = State::InString;
            Ok(true)
        } else {
            Err(self.err(ErrorKind::UnexpectedByte {
                byte,
                expected: "string key",
            }))
        }
    }

    fn close_container(&mut self, byte: u8) -> Result<bool, Error> {
        let Some(top) = self.stack.top() else {
            return Err(self.err(ErrorKind::UnexpectedByte {
                byte,
                expected: "JSON value",
            }));
        };
        let want = match top {
            Container::Object => b'}',
            Container::Array => b']',
        };
        if byte != want {
            // Mismatched closes only arise from the comma-or-close position.
            return Err(self.err(ErrorKind::UnexpectedByte {
                byte,
                expected: match top {
                    Container::Object => "',' or '}'",
                    Container::Array => "',' or ']'",
                },
            }));
        }
        self.stack.pop();
        self.after_value();
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// A value just ended: decide what the grammar wants next.
    #[inline]
    fn after_value(&mut self) {
        if self.stack.is_empty() {
            self.state = State::TopLevel;
            self.expect = Expect::End;
        } else {
            self.state = State::StructuralPending;
            self.expect = Expect::CommaOrClose;
        }
    }

    #[inline]
    fn push(&mut self, kind: Container) -> Result<(), Error> {
        if self.stack.push(kind) {
            Ok(())
        } else {
            Err(self.err(ErrorKind::NestingTooDeep { limit: MAX_DEPTH }))
        }
    }

    fn pending_expectation(&self) -> &'static str {
        match self.expect {
            Expect::Value => "JSON value",
            Expect::ValueOrClose => "JSON value or ']'",
            Expect::Key => "string key",
            Expect::KeyOrClose => "string key or '}'",
            Expect::Colon => "':'",
            Expect::CommaOrClose => match self.stack.top() {
                Some(Container::Object) => "',' or '}'",
                _ => "',' or ']'",
            },
            Expect::End => "end of input",
        }
    }

    #[inline]
    fn err(&self, kind: ErrorKind) -> Error {
        Error::new(kind, self.offset)
    }
}
