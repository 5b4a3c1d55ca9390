//! Performance scripts: timed MIDI messages in a text file.
//!
//! One event per line, `<sample offset> <hex MIDI bytes>`, where the offset
//! is the engine tick at which the message takes effect.  Offsets must not
//! decrease.  Everything after a `#` is a comment.
//!
//! ```text
//! # A major triad, released after half a second at 28160 Hz
//! 0     90 21 64
//! 0     90 25 64
//! 0     90 28 64
//! 14080 80 21 00
//! 14080 80 25 00
//! 14080 80 28 00
//! ```

use std::path::Path;

use wmidi::MidiMessage;

/// One timed MIDI message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptEvent {
    /// Engine tick at which the message takes effect
    pub offset: u64,
    bytes: Vec<u8>,
}

impl ScriptEvent {
    /// The raw MIDI bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
    /// The parsed message.  Events only hold bytes that parsed when the
    /// script was read, so this is `None` only for a hand-built event.
    pub fn message(&self) -> Option<MidiMessage<'_>> {
        MidiMessage::try_from(self.bytes.as_slice()).ok()
    }
}

/// What was wrong with a script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptErrorKind {
    /// The line has an offset but no MIDI bytes
    MissingBytes,
    /// The offset is not a decimal integer
    BadOffset(String),
    /// A MIDI byte is not a two-digit hex number
    BadByte(String),
    /// The bytes are not a MIDI message
    BadMessage(String),
    /// The offset is earlier than the previous event's
    OutOfOrder {
        /// The previous event's offset
        previous: u64,
        /// This line's offset
        offset: u64,
    },
}

/// A script that could not be read
#[derive(Debug)]
pub enum ScriptError {
    /// The file could not be read
    Io(std::io::Error),
    /// A line could not be parsed (lines are numbered from 1)
    Parse {
        /// Line number
        line: usize,
        /// The problem
        kind: ScriptErrorKind,
    },
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Unable to read script: {}", e),
            Self::Parse { line, kind } => {
                write!(f, "Line {}: ", line)?;
                match kind {
                    ScriptErrorKind::MissingBytes => write!(f, "no MIDI bytes"),
                    ScriptErrorKind::BadOffset(s) => write!(f, "bad sample offset \"{}\"", s),
                    ScriptErrorKind::BadByte(s) => write!(f, "bad MIDI byte \"{}\"", s),
                    ScriptErrorKind::BadMessage(s) => write!(f, "not a MIDI message ({})", s),
                    ScriptErrorKind::OutOfOrder { previous, offset } => write!(
                        f,
                        "offset {} is earlier than the previous event ({})",
                        offset, previous
                    ),
                }
            }
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse { .. } => None,
        }
    }
}

impl From<std::io::Error> for ScriptError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// A parsed performance script
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    events: Vec<ScriptEvent>,
}

impl Script {
    /// Parse script text
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut events: Vec<ScriptEvent> = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let err = |kind| ScriptError::Parse {
                line: idx + 1,
                kind,
            };
            let line = match line.split_once('#') {
                Some((content, _comment)) => content,
                None => line,
            };
            let mut fields = line.split_whitespace();
            let Some(offset) = fields.next() else {
                continue;
            };
            let offset: u64 = offset
                .parse()
                .map_err(|_| err(ScriptErrorKind::BadOffset(offset.to_owned())))?;
            let bytes = fields
                .map(|field| {
                    if field.len() != 2 {
                        return Err(err(ScriptErrorKind::BadByte(field.to_owned())));
                    }
                    u8::from_str_radix(field, 16)
                        .map_err(|_| err(ScriptErrorKind::BadByte(field.to_owned())))
                })
                .collect::<Result<Vec<u8>, _>>()?;
            if bytes.is_empty() {
                return Err(err(ScriptErrorKind::MissingBytes));
            }
            if let Err(e) = MidiMessage::try_from(bytes.as_slice()) {
                return Err(err(ScriptErrorKind::BadMessage(format!("{:?}", e))));
            }
            if let Some(prev) = events.last() {
                if offset < prev.offset {
                    return Err(err(ScriptErrorKind::OutOfOrder {
                        previous: prev.offset,
                        offset,
                    }));
                }
            }
            events.push(ScriptEvent { offset, bytes });
        }
        Ok(Self { events })
    }
    /// Read and parse the script at `path`
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let text = std::fs::read_to_string(path)?;
        let script = Self::parse(&text)?;
        log::info!(
            "Loaded {} events from {}",
            script.events.len(),
            path.display()
        );
        Ok(script)
    }
    /// The events, in order
    pub fn events(&self) -> &[ScriptEvent] {
        &self.events
    }
    /// The offset of the last event, or 0 for an empty script
    pub fn duration(&self) -> u64 {
        self.events.last().map_or(0, |ev| ev.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_err(text: &str) -> (usize, ScriptErrorKind) {
        match Script::parse(text) {
            Err(ScriptError::Parse { line, kind }) => (line, kind),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn parses_events_and_comments() {
        let script = Script::parse(
            "# header\n\
             0 90 21 64   # A1 on\n\
             \n\
             100 b0 40 7f\n\
             100 80 21 00\n",
        )
        .unwrap();
        assert_eq!(script.events().len(), 3);
        assert_eq!(script.events()[0].offset, 0);
        assert_eq!(script.events()[0].bytes(), &[0x90, 0x21, 0x64]);
        assert!(matches!(
            script.events()[1].message(),
            Some(MidiMessage::ControlChange(..))
        ));
        assert_eq!(script.duration(), 100);
    }
    #[test]
    fn empty_script() {
        let script = Script::parse("# nothing\n\n").unwrap();
        assert!(script.events().is_empty());
        assert_eq!(script.duration(), 0);
    }
    #[test]
    fn errors_carry_line_numbers() {
        assert_eq!(
            parse_err("0 90 21 64\nfoo 90 21 64"),
            (2, ScriptErrorKind::BadOffset("foo".to_owned()))
        );
        assert_eq!(
            parse_err("\n\n5 90 2g 64"),
            (3, ScriptErrorKind::BadByte("2g".to_owned()))
        );
        assert_eq!(
            parse_err("5 90 121 64"),
            (1, ScriptErrorKind::BadByte("121".to_owned()))
        );
        assert_eq!(parse_err("7"), (1, ScriptErrorKind::MissingBytes));
        assert_eq!(
            parse_err("10 90 21 64\n5 80 21 00"),
            (
                2,
                ScriptErrorKind::OutOfOrder {
                    previous: 10,
                    offset: 5
                }
            )
        );
    }
    #[test]
    fn incomplete_messages_are_rejected() {
        let (line, kind) = parse_err("0 90 21");
        assert_eq!(line, 1);
        assert!(matches!(kind, ScriptErrorKind::BadMessage(_)));
    }
    #[test]
    fn error_messages_name_the_line() {
        let err = Script::parse("0 zz").unwrap_err();
        assert_eq!(err.to_string(), "Line 1: bad MIDI byte \"zz\"");
    }
}
