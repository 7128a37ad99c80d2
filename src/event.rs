// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Log events and their metadata.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use indexmap::IndexMap;
use jiff::Timestamp;
use jiff::TimestampDisplayWithOffset;
use jiff::tz::Offset;
use jiff::tz::TimeZone;

use crate::Error;
use crate::template::MessageTemplate;
use crate::value::PropertyValue;

/// The severity of a log event, from most verbose to most severe.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Anything and everything you might want to know about a running block of code.
    Verbose,
    /// Internal system events that aren't necessarily observable from the outside.
    Debug,
    /// The lifeblood of operational intelligence - things happen.
    Information,
    /// Service is degraded or endangered.
    Warning,
    /// Functionality is unavailable, invariants are broken or data is lost.
    Error,
    /// If you have a pager, it goes off when one of these occurs.
    Fatal,
}

impl Level {
    /// Return the name of the `Level`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub fn name(&self) -> &'static str {
        match self {
            Level::Verbose => "Verbose",
            Level::Debug => "Debug",
            Level::Information => "Information",
            Level::Warning => "Warning",
            Level::Error => "Error",
            Level::Fatal => "Fatal",
        }
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Level, Self::Err> {
        for (names, level) in [
            (&["verbose", "trace"][..], Level::Verbose),
            (&["debug"][..], Level::Debug),
            (&["information", "info"][..], Level::Information),
            (&["warning", "warn"][..], Level::Warning),
            (&["error"][..], Level::Error),
            (&["fatal", "crit"][..], Level::Fatal),
        ] {
            if names.iter().any(|name| s.eq_ignore_ascii_case(name)) {
                return Ok(level);
            }
        }

        Err(Error::new(format!("malformed level: {s:?}")))
    }
}

#[cfg(feature = "bridge-log")]
impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warning,
            log::Level::Info => Level::Information,
            log::Level::Debug => Level::Debug,
            log::Level::Trace => Level::Verbose,
        }
    }
}

fn parse_hex<T>(
    s: &str,
    digits: usize,
    parse: fn(&str, u32) -> Result<T, ParseIntError>,
) -> Result<T, Error> {
    if s.len() != digits {
        return Err(Error::new(format!("expected {digits} hex digits")).with_context("input", s));
    }
    parse(s, 16).map_err(|err| {
        Error::new("malformed hex identifier")
            .with_context("input", s)
            .with_source(err)
    })
}

/// A W3C trace identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TraceId(pub u128);

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl FromStr for TraceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex(s, 32, u128::from_str_radix).map(TraceId)
    }
}

/// A W3C span identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SpanId(pub u64);

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for SpanId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex(s, 16, u64::from_str_radix).map(SpanId)
    }
}

/// The descriptive text of an error captured alongside a log event.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Exception(String);

impl Exception {
    /// Capture an exception from its full text.
    pub fn new(text: impl Into<String>) -> Self {
        Exception(text.into())
    }

    /// Capture an error and its chain of sources.
    ///
    /// Each source is appended on its own line, prefixed with ` ---> `.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut text = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            text.push_str("\n ---> ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        Exception(text)
    }

    /// Capture an [`anyhow::Error`], including its context chain and backtrace if captured.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        Exception(format!("{err:?}"))
    }

    /// The full descriptive text.
    pub fn text(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One structured log event.
#[derive(Clone, Debug)]
pub struct LogEvent {
    // the observed time
    timestamp: Timestamp,
    offset: Offset,

    level: Level,
    template: MessageTemplate,

    // correlation
    trace_id: Option<TraceId>,
    span_id: Option<SpanId>,

    exception: Option<Exception>,

    // structural logging
    properties: IndexMap<String, PropertyValue>,
}

impl LogEvent {
    /// The observed time.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The UTC offset the event was observed at.
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// The observed time with its offset, ready for display.
    ///
    /// Use a precision to control the number of fractional digits, for example `{:.7}`.
    pub fn timestamp_display(&self) -> TimestampDisplayWithOffset {
        self.timestamp.display_with_offset(self.offset)
    }

    /// The severity of the event.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The message template.
    pub fn message_template(&self) -> &MessageTemplate {
        &self.template
    }

    /// The trace identifier, if the event was recorded inside a trace.
    pub fn trace_id(&self) -> Option<TraceId> {
        self.trace_id
    }

    /// The span identifier, if the event was recorded inside a span.
    pub fn span_id(&self) -> Option<SpanId> {
        self.span_id
    }

    /// The captured exception.
    pub fn exception(&self) -> Option<&Exception> {
        self.exception.as_ref()
    }

    /// The properties, in insertion order.
    pub fn properties(&self) -> &IndexMap<String, PropertyValue> {
        &self.properties
    }

    /// Render the message template against the event's properties.
    pub fn render_message(&self) -> String {
        self.template.render(&self.properties)
    }

    /// Returns a new builder.
    pub fn builder() -> LogEventBuilder {
        LogEventBuilder::default()
    }

    /// Create a builder initialized with the current event's values.
    pub fn to_builder(&self) -> LogEventBuilder {
        LogEventBuilder {
            event: self.clone(),
        }
    }
}

/// Builder for [`LogEvent`].
///
/// # Examples
///
/// ```
/// use logforth_layout_filtered_json::Level;
/// use logforth_layout_filtered_json::LogEvent;
///
/// let event = LogEvent::builder()
///     .level(Level::Warning)
///     .message_template("Disk {Mount} is {Percent}% full")
///     .property("Mount", "/var")
///     .property("Percent", 93)
///     .build();
///
/// assert_eq!(event.render_message(), r#"Disk "/var" is 93% full"#);
/// ```
#[derive(Debug)]
pub struct LogEventBuilder {
    event: LogEvent,
}

impl Default for LogEventBuilder {
    fn default() -> Self {
        let timestamp = Timestamp::now();
        LogEventBuilder {
            event: LogEvent {
                timestamp,
                offset: TimeZone::system().to_offset(timestamp),
                level: Level::Information,
                template: MessageTemplate::new(""),
                trace_id: None,
                span_id: None,
                exception: None,
                properties: IndexMap::new(),
            },
        }
    }
}

impl LogEventBuilder {
    /// Set [`timestamp`](LogEvent::timestamp) and [`offset`](LogEvent::offset).
    pub fn timestamp(mut self, timestamp: Timestamp, offset: Offset) -> Self {
        self.event.timestamp = timestamp;
        self.event.offset = offset;
        self
    }

    /// Set [`level`](LogEvent::level).
    pub fn level(mut self, level: Level) -> Self {
        self.event.level = level;
        self
    }

    /// Set [`message_template`](LogEvent::message_template).
    pub fn message_template(mut self, template: impl Into<MessageTemplate>) -> Self {
        self.event.template = template.into();
        self
    }

    /// Set [`trace_id`](LogEvent::trace_id).
    pub fn trace_id(mut self, trace_id: TraceId) -> Self {
        self.event.trace_id = Some(trace_id);
        self
    }

    /// Set [`span_id`](LogEvent::span_id).
    pub fn span_id(mut self, span_id: SpanId) -> Self {
        self.event.span_id = Some(span_id);
        self
    }

    /// Set [`exception`](LogEvent::exception).
    pub fn exception(mut self, exception: Exception) -> Self {
        self.event.exception = Some(exception);
        self
    }

    /// Add a property. A property with the same name is replaced in place.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.event.properties.insert(name.into(), value.into());
        self
    }

    /// Add properties from an iterator.
    pub fn properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        for (name, value) in properties {
            self.event.properties.insert(name.into(), value.into());
        }
        self
    }

    /// Invoke the builder and return a `LogEvent`.
    pub fn build(self) -> LogEvent {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_and_parsing() {
        assert_eq!(Level::Information.to_string(), "Information");
        assert_eq!(format!("{:>8}", Level::Debug), "   Debug");
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!("trace".parse::<Level>().unwrap(), Level::Verbose);
        assert_eq!("Fatal".parse::<Level>().unwrap(), Level::Fatal);
        assert!("loud".parse::<Level>().is_err());
        assert!(Level::Verbose < Level::Fatal);
    }

    #[test]
    fn identifiers_display_as_padded_hex() {
        let trace = TraceId(0xabc);
        assert_eq!(trace.to_string(), "00000000000000000000000000000abc");
        assert_eq!(trace.to_string().parse::<TraceId>().unwrap(), trace);

        let span = SpanId(0x1f);
        assert_eq!(span.to_string(), "000000000000001f");
        assert_eq!(span.to_string().parse::<SpanId>().unwrap(), span);

        assert!("1f".parse::<SpanId>().is_err());
        assert!("zzzzzzzzzzzzzzzz".parse::<SpanId>().is_err());
    }

    #[test]
    fn exception_includes_source_chain() {
        #[derive(Debug)]
        struct Outer(std::io::Error);

        impl fmt::Display for Outer {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("request failed")
            }
        }

        impl std::error::Error for Outer {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let err = Outer(std::io::Error::other("connection reset"));
        let exception = Exception::from_error(&err);
        assert_eq!(exception.text(), "request failed\n ---> connection reset");

        let err = anyhow::anyhow!("connection reset").context("request failed");
        let exception = Exception::from_anyhow(&err);
        assert!(exception.text().starts_with("request failed"));
        assert!(exception.text().contains("Caused by:"));
        assert!(exception.text().contains("connection reset"));
    }

    #[test]
    fn properties_keep_insertion_order_and_replace_in_place() {
        let event = LogEvent::builder()
            .property("b", 1)
            .property("a", 2)
            .property("b", 3)
            .build();

        let names = event.properties().keys().collect::<Vec<_>>();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(event.properties()["b"], PropertyValue::from(3));
    }

    #[test]
    fn timestamp_displays_with_offset_and_seven_digits() {
        let ts: Timestamp = "2024-01-01T00:00:00Z".parse().unwrap();
        let event = LogEvent::builder().timestamp(ts, Offset::UTC).build();
        assert_eq!(
            format!("{:.7}", event.timestamp_display()),
            "2024-01-01T00:00:00.0000000+00:00"
        );

        let offset = Offset::from_hours(8).unwrap();
        let event = event.to_builder().timestamp(ts, offset).build();
        assert_eq!(
            format!("{:.7}", event.timestamp_display()),
            "2024-01-01T08:00:00.0000000+08:00"
        );
    }
}
