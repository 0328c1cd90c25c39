//! Minimal HL7v2 segment access.
//!
//! Only what the ADT and ACK codecs need: segment lookup by name, field
//! access by HL7 position, first repetition / component / subcomponent.
//! Missing pieces read as empty strings.

use crate::error::Hl7Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Delimiters {
    pub field: char,
    pub component: char,
    pub repetition: char,
    pub escape: char,
    pub subcomponent: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            field: '|',
            component: '^',
            repetition: '~',
            escape: '\\',
            subcomponent: '&',
        }
    }
}

#[derive(Debug)]
pub(crate) struct RawMessage<'a> {
    delimiters: Delimiters,
    segments: Vec<&'a str>,
}

impl<'a> RawMessage<'a> {
    pub(crate) fn parse(payload: &'a [u8]) -> Result<Self, Hl7Error> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| Hl7Error::parse(format!("payload is not UTF-8: {e}")))?;
        let text = text.trim_start_matches(['\r', '\n']);
        if text.is_empty() {
            return Err(Hl7Error::parse("empty message"));
        }
        if !text.starts_with("MSH") {
            return Err(Hl7Error::parse("message does not start with an MSH segment"));
        }

        let mut header = text[3..].chars();
        let field = header
            .next()
            .filter(|c| !matches!(c, '\r' | '\n'))
            .ok_or_else(|| Hl7Error::parse("MSH segment has no field separator"))?;

        let defaults = Delimiters::default();
        let encoding: Vec<char> = header.take_while(|c| *c != field).collect();
        let delimiters = Delimiters {
            field,
            component: encoding.first().copied().unwrap_or(defaults.component),
            repetition: encoding.get(1).copied().unwrap_or(defaults.repetition),
            escape: encoding.get(2).copied().unwrap_or(defaults.escape),
            subcomponent: encoding.get(3).copied().unwrap_or(defaults.subcomponent),
        };

        let segments = text
            .split(['\r', '\n'])
            .filter(|s| !s.trim().is_empty())
            .collect();

        Ok(Self {
            delimiters,
            segments,
        })
    }

    /// First segment with the given name.
    pub(crate) fn segment(&self, name: &str) -> Option<Segment<'a>> {
        self.segments
            .iter()
            .map(|raw| Segment {
                fields: raw.split(self.delimiters.field).collect(),
                is_header: name == "MSH",
                delimiters: self.delimiters,
            })
            .find(|segment| segment.fields.first().copied() == Some(name))
    }
}

#[derive(Debug)]
pub(crate) struct Segment<'a> {
    fields: Vec<&'a str>,
    is_header: bool,
    delimiters: Delimiters,
}

impl<'a> Segment<'a> {
    /// Raw field by HL7 position (MSH-1 is the field separator itself, so
    /// MSH positions are shifted by one relative to the split).
    pub(crate) fn field(&self, position: usize) -> &'a str {
        let index = if self.is_header {
            position.saturating_sub(1)
        } else {
            position
        };
        self.fields.get(index).copied().unwrap_or_default()
    }

    /// Field with escape sequences resolved.
    pub(crate) fn value(&self, position: usize) -> String {
        unescape(self.field(position), &self.delimiters)
    }

    fn raw_component(&self, position: usize, component: usize) -> &'a str {
        let repetition = self
            .field(position)
            .split(self.delimiters.repetition)
            .next()
            .unwrap_or_default();
        repetition
            .split(self.delimiters.component)
            .nth(component.saturating_sub(1))
            .unwrap_or_default()
    }

    /// Component `component` (1-based) of the first repetition.
    pub(crate) fn component(&self, position: usize, component: usize) -> String {
        unescape(self.raw_component(position, component), &self.delimiters)
    }

    /// First subcomponent of a component of the first repetition.
    pub(crate) fn subcomponent(&self, position: usize, component: usize) -> String {
        let value = self
            .raw_component(position, component)
            .split(self.delimiters.subcomponent)
            .next()
            .unwrap_or_default();
        unescape(value, &self.delimiters)
    }
}

/// Replace `\F\`, `\S\`, `\T\`, `\R\` and `\E\` with the delimiters they stand for.
pub(crate) fn unescape(value: &str, delimiters: &Delimiters) -> String {
    let escape = delimiters.escape;
    if !value.contains(escape) {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find(escape) {
        out.push_str(&rest[..start]);
        let after = &rest[start + escape.len_utf8()..];
        let Some(end) = after.find(escape) else {
            out.push_str(&rest[start..]);
            return out;
        };
        match &after[..end] {
            "F" => out.push(delimiters.field),
            "S" => out.push(delimiters.component),
            "T" => out.push(delimiters.subcomponent),
            "R" => out.push(delimiters.repetition),
            "E" => out.push(escape),
            other => {
                out.push(escape);
                out.push_str(other);
                out.push(escape);
            }
        }
        rest = &after[end + escape.len_utf8()..];
    }
    out.push_str(rest);
    out
}

/// Escape delimiter characters in a value written into a field.
pub(crate) fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\E\\"),
            '|' => out.push_str("\\F\\"),
            '^' => out.push_str("\\S\\"),
            '&' => out.push_str("\\T\\"),
            '~' => out.push_str("\\R\\"),
            '\r' | '\n' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MSG: &[u8] = b"MSH|^~\\&|RECEPTION|CLINIC|HIS|HOSPITAL|20240301101530||ADT^A04|abc-1|P|2.5\rPID|||7~8||Smith&Jr^Jane^Ann||19900101|F";

    #[test]
    fn header_positions() {
        let raw = RawMessage::parse(MSG).unwrap();
        let msh = raw.segment("MSH").unwrap();
        assert_eq!(msh.field(2), "^~\\&");
        assert_eq!(msh.field(3), "RECEPTION");
        assert_eq!(msh.field(9), "ADT^A04");
        assert_eq!(msh.field(10), "abc-1");
        assert_eq!(msh.component(9, 2), "A04");
    }

    #[test]
    fn pid_components() {
        let raw = RawMessage::parse(MSG).unwrap();
        let pid = raw.segment("PID").unwrap();
        assert_eq!(pid.component(3, 1), "7");
        assert_eq!(pid.subcomponent(5, 1), "Smith");
        assert_eq!(pid.component(5, 2), "Jane");
        assert_eq!(pid.component(5, 3), "Ann");
        assert_eq!(pid.field(8), "F");
        assert_eq!(pid.field(30), "");
    }

    #[test]
    fn newline_separated_segments() {
        let raw = RawMessage::parse(b"MSH|^~\\&|A\r\nMSA|AA|1\nPID|||x").unwrap();
        assert_eq!(raw.segment("MSA").unwrap().field(2), "1");
        assert_eq!(raw.segment("PID").unwrap().field(3), "x");
        assert!(raw.segment("EVN").is_none());
    }

    #[test]
    fn rejects_garbage() {
        assert!(RawMessage::parse(b"").is_err());
        assert!(RawMessage::parse(b"PID|||1").is_err());
        assert!(RawMessage::parse(b"MSH").is_err());
        assert!(RawMessage::parse(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn escape_round_trip() {
        let delimiters = Delimiters::default();
        let value = "O'Neil|Smith^Jr & Co~\\";
        assert_eq!(unescape(&escape(value), &delimiters), value);
        assert_eq!(unescape("a\\X0D\\b", &delimiters), "a\\X0D\\b");
    }
}
