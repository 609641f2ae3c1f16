//! Byte-at-a-time JSON tokenizer
//!
//! An explicit state machine fed one byte at a time. It buffers only the
//! token currently being assembled (a string or a number), never the
//! document, and reports structure through a [`JsonListener`] injected per
//! feed call. One byte can complete up to two events (a delimiter both ends a
//! number and closes its container), which is why the listener is a callback
//! rather than a return value.

use crate::{Result, SenMLError};

/// Structural event produced by the tokenizer
#[derive(Debug, PartialEq)]
pub enum JsonEvent<'a> {
    StartArray,
    EndArray,
    StartObject,
    EndObject,
    /// An object key (the string before a `:`)
    Key(&'a str),
    /// A string value
    Str(&'a str),
    Number(f64),
    Bool(bool),
    Null,
}

/// Receiver for tokenizer events
pub trait JsonListener {
    fn event(&mut self, event: JsonEvent<'_>) -> Result<()>;
}

impl<F: FnMut(JsonEvent<'_>) -> Result<()>> JsonListener for F {
    fn event(&mut self, event: JsonEvent<'_>) -> Result<()> {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Container {
    Array,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    /// Expecting a value (or `]` for an empty/tolerantly-comma'd array)
    Value,
    /// Inside an object, expecting a key string or `}`
    Key,
    /// Between a key and its `:`
    Colon,
    /// After a value inside a container
    CommaOrEnd,
    InString { is_key: bool },
    Escape { is_key: bool },
    Unicode { is_key: bool, acc: u32, digits: u8 },
    Number,
    Literal { literal: &'static str, matched: usize },
    Done,
}

/// Streaming JSON tokenizer
#[derive(Debug)]
pub struct JsonTokenizer {
    stack: Vec<Container>,
    state: State,
    buf: Vec<u8>,
    pending_surrogate: Option<u32>,
    pos: usize,
}

impl Default for JsonTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonTokenizer {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            state: State::Value,
            buf: Vec::new(),
            pending_surrogate: None,
            pos: 0,
        }
    }

    /// Feed one input byte, reporting any completed events to `listener`
    pub fn feed<L: JsonListener>(&mut self, byte: u8, listener: &mut L) -> Result<()> {
        self.pos += 1;
        self.step(byte, listener)
    }

    /// Signal end of input; flushes a trailing top-level number and verifies
    /// the document closed cleanly
    pub fn finish<L: JsonListener>(&mut self, listener: &mut L) -> Result<()> {
        if self.state == State::Number {
            self.end_number(listener)?;
        }
        match self.state {
            State::Done => Ok(()),
            State::Value if self.stack.is_empty() && self.pos == 0 => Ok(()), // empty input
            _ => Err(SenMLError::UnexpectedEof),
        }
    }

    fn step<L: JsonListener>(&mut self, byte: u8, listener: &mut L) -> Result<()> {
        match self.state {
            State::Value => self.value_byte(byte, listener),
            State::Key => self.key_byte(byte, listener),
            State::Colon => match byte {
                b':' => {
                    self.state = State::Value;
                    Ok(())
                }
                b if b.is_ascii_whitespace() => Ok(()),
                b => self.unexpected(b, "expected ':'"),
            },
            State::CommaOrEnd => match byte {
                b',' => {
                    self.state = match self.stack.last() {
                        Some(Container::Object) => State::Key,
                        _ => State::Value,
                    };
                    Ok(())
                }
                b']' => self.close(Container::Array, JsonEvent::EndArray, listener),
                b'}' => self.close(Container::Object, JsonEvent::EndObject, listener),
                b if b.is_ascii_whitespace() => Ok(()),
                b => self.unexpected(b, "expected ',' or a closing bracket"),
            },
            State::InString { is_key } => self.string_byte(byte, is_key, listener),
            State::Escape { is_key } => self.escape_byte(byte, is_key),
            State::Unicode { is_key, acc, digits } => {
                self.unicode_byte(byte, is_key, acc, digits)
            }
            State::Number => match byte {
                b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E' => {
                    self.buf.push(byte);
                    Ok(())
                }
                b => {
                    self.end_number(listener)?;
                    // the terminating byte belongs to the enclosing state
                    self.step(b, listener)
                }
            },
            State::Literal { literal, matched } => {
                if literal.as_bytes().get(matched) == Some(&byte) {
                    let matched = matched + 1;
                    if matched == literal.len() {
                        self.after_value();
                        listener.event(match literal {
                            "true" => JsonEvent::Bool(true),
                            "false" => JsonEvent::Bool(false),
                            _ => JsonEvent::Null,
                        })
                    } else {
                        self.state = State::Literal { literal, matched };
                        Ok(())
                    }
                } else {
                    self.unexpected(byte, "malformed literal")
                }
            }
            State::Done => match byte {
                b if b.is_ascii_whitespace() => Ok(()),
                b => self.unexpected(b, "trailing bytes after document"),
            },
        }
    }

    fn value_byte<L: JsonListener>(&mut self, byte: u8, listener: &mut L) -> Result<()> {
        match byte {
            b'[' => {
                self.stack.push(Container::Array);
                listener.event(JsonEvent::StartArray)
            }
            b'{' => {
                self.stack.push(Container::Object);
                self.state = State::Key;
                listener.event(JsonEvent::StartObject)
            }
            b'"' => {
                self.buf.clear();
                self.state = State::InString { is_key: false };
                Ok(())
            }
            b'-' | b'0'..=b'9' => {
                self.buf.clear();
                self.buf.push(byte);
                self.state = State::Number;
                Ok(())
            }
            b't' => self.start_literal("true"),
            b'f' => self.start_literal("false"),
            b'n' => self.start_literal("null"),
            b']' => self.close(Container::Array, JsonEvent::EndArray, listener),
            b if b.is_ascii_whitespace() => Ok(()),
            b => self.unexpected(b, "expected a value"),
        }
    }

    fn key_byte<L: JsonListener>(&mut self, byte: u8, listener: &mut L) -> Result<()> {
        match byte {
            b'"' => {
                self.buf.clear();
                self.state = State::InString { is_key: true };
                Ok(())
            }
            b'}' => self.close(Container::Object, JsonEvent::EndObject, listener),
            b if b.is_ascii_whitespace() => Ok(()),
            b => self.unexpected(b, "expected an object key"),
        }
    }

    fn string_byte<L: JsonListener>(
        &mut self,
        byte: u8,
        is_key: bool,
        listener: &mut L,
    ) -> Result<()> {
        match byte {
            b'"' => {
                self.flush_dangling_surrogate();
                let text = std::str::from_utf8(&self.buf)
                    .map_err(|_| SenMLError::InvalidUtf8 { context: "JSON string" })?;
                if is_key {
                    self.state = State::Colon;
                    listener.event(JsonEvent::Key(text))
                } else {
                    self.state = if self.stack.is_empty() {
                        State::Done
                    } else {
                        State::CommaOrEnd
                    };
                    listener.event(JsonEvent::Str(text))
                }
            }
            b'\\' => {
                self.state = State::Escape { is_key };
                Ok(())
            }
            0x00..=0x1f => self.unexpected(byte, "control character in string"),
            b => {
                self.flush_dangling_surrogate();
                self.buf.push(b);
                Ok(())
            }
        }
    }

    fn escape_byte(&mut self, byte: u8, is_key: bool) -> Result<()> {
        if byte == b'u' {
            self.state = State::Unicode {
                is_key,
                acc: 0,
                digits: 0,
            };
            return Ok(());
        }
        self.flush_dangling_surrogate();
        let decoded = match byte {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b => return self.unexpected(b, "invalid escape"),
        };
        self.buf.push(decoded);
        self.state = State::InString { is_key };
        Ok(())
    }

    fn unicode_byte(&mut self, byte: u8, is_key: bool, acc: u32, digits: u8) -> Result<()> {
        let digit = match byte {
            b'0'..=b'9' => u32::from(byte - b'0'),
            b'a'..=b'f' => u32::from(byte - b'a' + 10),
            b'A'..=b'F' => u32::from(byte - b'A' + 10),
            b => return self.unexpected(b, "invalid unicode escape"),
        };
        let acc = (acc << 4) | digit;
        let digits = digits + 1;
        if digits < 4 {
            self.state = State::Unicode { is_key, acc, digits };
            return Ok(());
        }

        self.state = State::InString { is_key };
        match (self.pending_surrogate.take(), acc) {
            (Some(high), 0xdc00..=0xdfff) => {
                let combined = 0x10000 + ((high - 0xd800) << 10) + (acc - 0xdc00);
                self.push_char(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            (high, 0xd800..=0xdbff) => {
                if high.is_some() {
                    self.push_char(char::REPLACEMENT_CHARACTER);
                }
                self.pending_surrogate = Some(acc);
            }
            (high, _) => {
                if high.is_some() {
                    self.push_char(char::REPLACEMENT_CHARACTER);
                }
                self.push_char(char::from_u32(acc).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        }
        Ok(())
    }

    /// A high surrogate not followed by its pair becomes U+FFFD
    fn flush_dangling_surrogate(&mut self) {
        if self.pending_surrogate.take().is_some() {
            self.push_char(char::REPLACEMENT_CHARACTER);
        }
    }

    fn push_char(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn start_literal(&mut self, literal: &'static str) -> Result<()> {
        self.state = State::Literal { literal, matched: 1 };
        Ok(())
    }

    fn end_number<L: JsonListener>(&mut self, listener: &mut L) -> Result<()> {
        let text = std::str::from_utf8(&self.buf)
            .map_err(|_| SenMLError::invalid_json(self.pos, "bad number"))?;
        let value: f64 = text
            .parse()
            .map_err(|_| SenMLError::invalid_json(self.pos, format!("bad number '{text}'")))?;
        self.after_value();
        listener.event(JsonEvent::Number(value))
    }

    fn close<L: JsonListener>(
        &mut self,
        expected: Container,
        event: JsonEvent<'_>,
        listener: &mut L,
    ) -> Result<()> {
        match self.stack.pop() {
            Some(c) if c == expected => {
                self.after_value();
                listener.event(event)
            }
            _ => self.unexpected(
                if expected == Container::Array { b']' } else { b'}' },
                "mismatched closing bracket",
            ),
        }
    }

    fn after_value(&mut self) {
        self.state = if self.stack.is_empty() {
            State::Done
        } else {
            State::CommaOrEnd
        };
    }

    fn unexpected(&self, byte: u8, message: &str) -> Result<()> {
        Err(SenMLError::invalid_json(
            self.pos,
            format!("{message} (got 0x{byte:02x})"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Owned {
        StartArray,
        EndArray,
        StartObject,
        EndObject,
        Key(String),
        Str(String),
        Number(f64),
        Bool(bool),
        Null,
    }

    fn tokenize(input: &str) -> Result<Vec<Owned>> {
        let mut events = Vec::new();
        let mut listener = |ev: JsonEvent<'_>| {
            events.push(match ev {
                JsonEvent::StartArray => Owned::StartArray,
                JsonEvent::EndArray => Owned::EndArray,
                JsonEvent::StartObject => Owned::StartObject,
                JsonEvent::EndObject => Owned::EndObject,
                JsonEvent::Key(k) => Owned::Key(k.to_string()),
                JsonEvent::Str(s) => Owned::Str(s.to_string()),
                JsonEvent::Number(n) => Owned::Number(n),
                JsonEvent::Bool(b) => Owned::Bool(b),
                JsonEvent::Null => Owned::Null,
            });
            Ok(())
        };
        let mut tokenizer = JsonTokenizer::new();
        for byte in input.bytes() {
            tokenizer.feed(byte, &mut listener)?;
        }
        tokenizer.finish(&mut listener)?;
        Ok(events)
    }

    #[test]
    fn test_simple_document() {
        let events = tokenize(r#"[{"n":"temp","v":20.5}]"#).unwrap();
        assert_eq!(
            events,
            vec![
                Owned::StartArray,
                Owned::StartObject,
                Owned::Key("n".into()),
                Owned::Str("temp".into()),
                Owned::Key("v".into()),
                Owned::Number(20.5),
                Owned::EndObject,
                Owned::EndArray,
            ]
        );
    }

    #[test]
    fn test_literals_and_negative_numbers() {
        let events = tokenize(r#"[true, false, null, -2.5e1]"#).unwrap();
        assert_eq!(
            events,
            vec![
                Owned::StartArray,
                Owned::Bool(true),
                Owned::Bool(false),
                Owned::Null,
                Owned::Number(-25.0),
                Owned::EndArray,
            ]
        );
    }

    #[test]
    fn test_number_terminated_by_closing_brace() {
        // one byte ('}') completes two events
        let events = tokenize(r#"{"v":7}"#).unwrap();
        assert_eq!(
            events,
            vec![
                Owned::StartObject,
                Owned::Key("v".into()),
                Owned::Number(7.0),
                Owned::EndObject,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        let events = tokenize(r#"["a\"b\\c\ndA"]"#).unwrap();
        assert_eq!(
            events,
            vec![
                Owned::StartArray,
                Owned::Str("a\"b\\c\ndA".into()),
                Owned::EndArray,
            ]
        );
    }

    #[test]
    fn test_unicode_escape() {
        let events = tokenize(r#"["\u0041\u00e9"]"#).unwrap();
        assert_eq!(
            events,
            vec![Owned::StartArray, Owned::Str("Aé".into()), Owned::EndArray]
        );
    }

    #[test]
    fn test_surrogate_pair_escape() {
        let events = tokenize(r#"["\ud83d\ude00"]"#).unwrap();
        assert_eq!(
            events,
            vec![Owned::StartArray, Owned::Str("\u{1f600}".into()), Owned::EndArray]
        );
    }

    #[test]
    fn test_raw_multibyte_utf8_passthrough() {
        let events = tokenize(r#"["温度"]"#).unwrap();
        assert_eq!(
            events,
            vec![Owned::StartArray, Owned::Str("温度".into()), Owned::EndArray]
        );
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(tokenize("[]").unwrap(), vec![Owned::StartArray, Owned::EndArray]);
        assert_eq!(
            tokenize("{}").unwrap(),
            vec![Owned::StartObject, Owned::EndObject]
        );
    }

    #[test]
    fn test_nested() {
        let events = tokenize(r#"[[1],{"a":[2]}]"#).unwrap();
        assert_eq!(events.len(), 11);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(tokenize("[:").is_err());
        assert!(tokenize("[1}").is_err());
        assert!(tokenize("tru!").is_err());
    }

    #[test]
    fn test_truncated_is_an_error() {
        assert!(tokenize(r#"[{"n":"#).is_err());
        assert!(tokenize("[1,").is_err());
    }

    #[test]
    fn test_top_level_number_flushed_on_finish() {
        assert_eq!(tokenize("42").unwrap(), vec![Owned::Number(42.0)]);
    }
}
