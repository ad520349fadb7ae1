//! Character-by-character matching of the JSON literals `true`, `false` and
//! `null`.

use crate::value::Value;

/// What happened after feeding one more character into the literal matcher.
#[derive(Debug)]
pub(crate) enum Step {
    /// Character matched, but the literal is not finished yet.
    NeedMore,
    /// Character matched *and* completed the literal.
    Done(Value),
    /// Character did not match the expected byte.
    Reject,
}

/// Matches the remainder of a literal after its first character was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LiteralBuffer {
    remaining: &'static [u8],
    literal: &'static str,
}

impl LiteralBuffer {
    /// Starts matching after the first character (`t`, `f` or `n`).
    ///
    /// Callers dispatch on the first character themselves, so anything else
    /// here is a logic error.
    pub(crate) fn new(first: char) -> Self {
        let (remaining, literal) = match first {
            't' => (b"rue".as_slice(), "true"),
            'f' => (b"alse".as_slice(), "false"),
            'n' => (b"ull".as_slice(), "null"),
            _ => unreachable!("literal dispatch on {first:?}"),
        };
        Self { remaining, literal }
    }

    /// The full literal being matched, for error messages.
    pub(crate) fn expecting(&self) -> &'static str {
        self.literal
    }

    /// Feeds the next input character.
    pub(crate) fn step(&mut self, ch: char) -> Step {
        match self.remaining.split_first() {
            Some((&expected, rest)) if expected as char == ch => {
                if rest.is_empty() {
                    Step::Done(match self.literal {
                        "true" => Value::Boolean(true),
                        "false" => Value::Boolean(false),
                        _ => Value::Null,
                    })
                } else {
                    self.remaining = rest;
                    Step::NeedMore
                }
            }
            _ => Step::Reject,
        }
    }
}
