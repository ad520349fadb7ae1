use crate::{StreamSink, Value};

/// Concatenates the string fragments pushed into a stream sink so far.
pub(crate) fn concat_fragments(sink: &StreamSink<Value>) -> String {
    sink.fragments()
        .iter()
        .map(|fragment| fragment.as_str().expect("string fragment").to_owned())
        .collect()
}

/// Escapes `text` as the contents of a JSON string literal.
pub(crate) fn json_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < '\u{20}' => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}
