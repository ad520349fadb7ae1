//! The JSON number grammar as an explicit state machine, plus coercion of
//! the accumulated literal into the field's declared kind.

use crate::{error::DemuxError, schema::ValueKind, value::Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumState {
    /// Just consumed a leading `-`.
    Sign,
    /// Consumed a leading `0`; only `.`, `e`/`E` or a terminator may follow.
    Zero,
    Integer,
    /// Just consumed the decimal point.
    Point,
    Fraction,
    /// Just consumed `e`/`E`.
    Exponent,
    /// Just consumed the exponent sign.
    ExponentSign,
    ExponentInteger,
}

/// What to do with the character just offered to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Consumed,
    /// The character is not part of the number; the caller must close the
    /// number and re-dispatch this character in the follow-up state.
    Terminated,
}

#[derive(Debug)]
pub(crate) struct NumberBuffer {
    buffer: String,
    state: NumState,
    saw_fraction: bool,
    saw_exponent: bool,
}

impl NumberBuffer {
    pub(crate) fn new() -> Self {
        Self {
            buffer: String::new(),
            state: NumState::Integer,
            saw_fraction: false,
            saw_exponent: false,
        }
    }

    /// Begins a number with its first character (`-` or a digit).
    ///
    /// Callers dispatch on the first character themselves, so anything else
    /// here is a logic error.
    pub(crate) fn start(&mut self, first: char) {
        self.buffer.clear();
        self.buffer.push(first);
        self.saw_fraction = false;
        self.saw_exponent = false;
        self.state = match first {
            '-' => NumState::Sign,
            '0' => NumState::Zero,
            '1'..='9' => NumState::Integer,
            _ => unreachable!("number dispatch on {first:?}"),
        };
    }

    /// Feeds the next input character.
    ///
    /// # Errors
    ///
    /// [`DemuxError::MalformedInput`] when the character can neither extend
    /// the number nor terminate it (e.g. a bare `-` or a trailing `.`).
    pub(crate) fn step(&mut self, ch: char) -> Result<Step, DemuxError> {
        use NumState::{
            Exponent, ExponentInteger, ExponentSign, Fraction, Integer, Point, Sign, Zero,
        };

        let next = match (self.state, ch) {
            (Sign, '0') => Some(Zero),
            (Sign, '1'..='9') => Some(Integer),
            (Sign, _) => None,

            (Integer, '0'..='9') => Some(Integer),
            (Point | Fraction, '0'..='9') => Some(Fraction),
            (Exponent | ExponentSign | ExponentInteger, '0'..='9') => Some(ExponentInteger),

            (Zero | Integer, '.') => {
                self.saw_fraction = true;
                Some(Point)
            }
            (Zero | Integer | Fraction, 'e' | 'E') => {
                self.saw_exponent = true;
                Some(Exponent)
            }
            (Exponent, '+' | '-') => Some(ExponentSign),

            (Zero | Integer | Fraction | ExponentInteger, _) => return Ok(Step::Terminated),
            (Point | Exponent | ExponentSign, _) => None,
        };

        match next {
            Some(state) => {
                self.buffer.push(ch);
                self.state = state;
                Ok(Step::Consumed)
            }
            None => Err(DemuxError::malformed(ch, "a digit")),
        }
    }

    /// Coerces the accumulated literal into `kind`, resetting the buffer.
    ///
    /// Only called after [`step`](Self::step) returned
    /// [`Step::Terminated`], so the literal is a complete JSON number.
    ///
    /// # Errors
    ///
    /// [`DemuxError::TypeMismatch`] for a fractional or exponent literal on
    /// an integer field, [`DemuxError::NumericOverflow`] for an integer
    /// outside the `i64` range.
    pub(crate) fn finish(&mut self, field: &str, kind: &ValueKind) -> Result<Value, DemuxError> {
        let literal = std::mem::take(&mut self.buffer);
        match kind {
            ValueKind::Integer => {
                if self.saw_fraction || self.saw_exponent {
                    return Err(DemuxError::type_mismatch(
                        field,
                        "integer",
                        format!("number {literal:?} with a fractional or exponent part"),
                    ));
                }
                literal
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| DemuxError::NumericOverflow {
                        field: field.to_owned(),
                        literal,
                    })
            }
            // The grammar above only admits valid JSON numbers, all of which
            // parse as f64 (huge magnitudes round to infinity).
            ValueKind::Float => Ok(Value::Float(literal.parse::<f64>().unwrap())),
            other => Err(DemuxError::type_mismatch(field, other.name(), "number")),
        }
    }
}
