//! Consuming one balanced JSON value without emitting it anywhere.
//!
//! Used by the permissive unknown-field mode: after an undeclared key, the
//! whole value (scalar, string, object or array, at any nesting depth) is
//! swallowed. Depth counting is string-aware so braces and brackets inside
//! string literals do not unbalance the skip.

/// What to do after offering one character to the skipper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Continue,
    /// The value ended with this character (closing quote, brace or bracket).
    DoneConsumed,
    /// The value ended *before* this character (scalar terminator); the
    /// caller must re-dispatch it.
    DoneRedispatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Bare scalar: anything up to a structural terminator.
    Scalar,
    /// Inside a string literal.
    InString,
    /// Inside a string literal, directly after a backslash.
    StringEscape,
    /// Inside an object or array, between strings.
    Container,
}

#[derive(Debug)]
pub(crate) struct ValueSkipper {
    mode: Mode,
    depth: u32,
}

impl ValueSkipper {
    /// Starts skipping at the first character of the value.
    ///
    /// The first character is consumed: a quote opens a string, a brace or
    /// bracket opens a container, anything else is treated as a scalar.
    pub(crate) fn begin(first: char) -> Self {
        match first {
            '"' => Self {
                mode: Mode::InString,
                depth: 0,
            },
            '{' | '[' => Self {
                mode: Mode::Container,
                depth: 1,
            },
            _ => Self {
                mode: Mode::Scalar,
                depth: 0,
            },
        }
    }

    pub(crate) fn step(&mut self, ch: char) -> Step {
        match self.mode {
            Mode::Scalar => match ch {
                ',' | '}' | ']' | ' ' | '\t' | '\n' | '\r' => Step::DoneRedispatch,
                _ => Step::Continue,
            },
            Mode::InString => match ch {
                '\\' => {
                    self.mode = Mode::StringEscape;
                    Step::Continue
                }
                '"' if self.depth == 0 => Step::DoneConsumed,
                '"' => {
                    self.mode = Mode::Container;
                    Step::Continue
                }
                _ => Step::Continue,
            },
            Mode::StringEscape => {
                self.mode = Mode::InString;
                Step::Continue
            }
            Mode::Container => match ch {
                '"' => {
                    self.mode = Mode::InString;
                    Step::Continue
                }
                '{' | '[' => {
                    self.depth += 1;
                    Step::Continue
                }
                '}' | ']' => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        Step::DoneConsumed
                    } else {
                        Step::Continue
                    }
                }
                _ => Step::Continue,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Step, ValueSkipper};

    /// Skips `input` and returns how many characters were left unconsumed.
    fn skip(input: &str) -> usize {
        let mut chars = input.chars();
        let mut skipper = ValueSkipper::begin(chars.next().unwrap());
        let mut remaining = input.chars().count() - 1;
        for ch in chars {
            match skipper.step(ch) {
                Step::Continue => remaining -= 1,
                Step::DoneConsumed => return remaining - 1,
                Step::DoneRedispatch => return remaining,
            }
        }
        panic!("value left unfinished");
    }

    #[test]
    fn scalar_stops_at_terminator() {
        assert_eq!(skip("123,"), 1);
        assert_eq!(skip("true}"), 1);
        assert_eq!(skip("null ,"), 2);
    }

    #[test]
    fn string_consumes_closing_quote() {
        assert_eq!(skip(r#""hello","#), 1);
        assert_eq!(skip(r#""he\"llo","#), 1);
        assert_eq!(skip(r#""a}b{c","#), 1);
    }

    #[test]
    fn containers_balance() {
        assert_eq!(skip(r#"{"a": {"b": [1, 2]}},"#), 1);
        assert_eq!(skip(r#"[1, [2, 3], {"x": "y"}],"#), 1);
    }

    #[test]
    fn braces_inside_strings_ignored() {
        assert_eq!(skip(r#"{"a": "}}}"},"#), 1);
        assert_eq!(skip(r#"["[", "]"],"#), 1);
    }
}
