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

//! Formatters that write log events as text.

use std::fmt;
use std::io;
use std::sync::Arc;

use serde::Serialize;

use crate::Error;
use crate::allow_list::AllowList;
use crate::event::LogEvent;
use crate::template::FormatProvider;

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// A formatter that writes one log event to a sink.
pub trait TextFormatter: fmt::Debug + Send + Sync + 'static {
    /// Write `event` to `output`.
    ///
    /// The first failing write aborts formatting and its error is returned; output already
    /// written is not rolled back.
    fn format(&self, event: &LogEvent, output: &mut dyn io::Write) -> Result<(), Error>;

    /// Format `event` into a new buffer.
    fn format_to_vec(&self, event: &LogEvent) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        self.format(event, &mut buf)?;
        Ok(buf)
    }
}

impl<T: TextFormatter> From<T> for Box<dyn TextFormatter> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// A JSON formatter that emits only allowed properties.
///
/// Output format:
///
/// ```json
/// {"Timestamp":"2024-08-11T22:44:57.1720510+08:00","Level":"Information","MessageTemplate":"Request finished in {Elapsed} ms","Properties":{"Elapsed":12.5,"StatusCode":200}}
/// {"Timestamp":"2024-08-11T22:44:57.1721870+08:00","Level":"Error","MessageTemplate":"Lookup failed","TraceId":"4bf92f3577b34da6a3ce929d0e0e4736","SpanId":"00f067aa0ba902b7","Exception":"not found","Properties":{}}
/// ```
///
/// Members appear in a fixed order: `Timestamp`, `Level`, `MessageTemplate`, then
/// `RenderedMessage`, `TraceId`, `SpanId` and `Exception` when present, and `Properties` last.
/// `Properties` is written whenever the event has at least one property, even if the
/// [`AllowList`] drops all of them.
///
/// # Examples
///
/// ```
/// use logforth_layout_filtered_json::EventFormatter;
///
/// let formatter = EventFormatter::default()
///     .render_message(true)
///     .allow_properties("clear,UserId,StatusCode");
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventFormatter {
    closing_delimiter: String,
    render_message: bool,
    format_provider: Option<Arc<dyn FormatProvider>>,
    allow_list: AllowList,
}

impl EventFormatter {
    /// Set the text written after the closing brace and before the line terminator.
    ///
    /// # Examples
    ///
    /// ```
    /// use logforth_layout_filtered_json::EventFormatter;
    ///
    /// let formatter = EventFormatter::default().closing_delimiter(",");
    /// ```
    pub fn closing_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.closing_delimiter = delimiter.into();
        self
    }

    /// Whether to also write the rendered message as `RenderedMessage`.
    pub fn render_message(mut self, render_message: bool) -> Self {
        self.render_message = render_message;
        self
    }

    /// Set the provider used to format scalars in the rendered message.
    pub fn format_provider(mut self, provider: impl FormatProvider) -> Self {
        self.format_provider = Some(Arc::new(provider));
        self
    }

    /// Resolve the allow-list from a comma-separated list of names.
    ///
    /// See [`AllowList`] for how the list is interpreted.
    pub fn allow_properties(self, allow_properties: &str) -> Self {
        self.allow_list(AllowList::new(Some(allow_properties)))
    }

    /// Set the allow-list.
    pub fn allow_list(mut self, allow_list: AllowList) -> Self {
        self.allow_list = allow_list;
        self
    }

    /// The resolved allow-list.
    pub fn allowed(&self) -> &AllowList {
        &self.allow_list
    }
}

fn write_str(output: &mut dyn io::Write, s: &str) -> Result<(), Error> {
    output.write_all(s.as_bytes()).map_err(Error::from_io_error)
}

fn write_json<T>(output: &mut dyn io::Write, value: &T) -> Result<(), Error>
where
    T: Serialize + ?Sized,
{
    serde_json::to_writer(output, value).map_err(Error::from_encode_error)
}

impl TextFormatter for EventFormatter {
    fn format(&self, event: &LogEvent, output: &mut dyn io::Write) -> Result<(), Error> {
        write_str(output, "{\"Timestamp\":\"")?;
        write!(output, "{:.7}", event.timestamp_display()).map_err(Error::from_io_error)?;
        write_str(output, "\",\"Level\":\"")?;
        write_str(output, event.level().name())?;
        write_str(output, "\",\"MessageTemplate\":")?;
        write_json(output, event.message_template().text())?;

        if self.render_message {
            let message = event
                .message_template()
                .render_with(event.properties(), self.format_provider.as_deref());
            write_str(output, ",\"RenderedMessage\":")?;
            write_json(output, &message)?;
        }

        if let Some(trace_id) = event.trace_id() {
            write_str(output, ",\"TraceId\":")?;
            write_json(output, &trace_id.to_string())?;
        }

        if let Some(span_id) = event.span_id() {
            write_str(output, ",\"SpanId\":")?;
            write_json(output, &span_id.to_string())?;
        }

        if let Some(exception) = event.exception() {
            write_str(output, ",\"Exception\":")?;
            write_json(output, exception.text())?;
        }

        // decided by the unfiltered properties
        if !event.properties().is_empty() {
            write_str(output, ",\"Properties\":{")?;

            let mut delimiter = "";
            for (name, value) in event.properties() {
                if !self.allow_list.contains(name) {
                    continue;
                }

                write_str(output, delimiter)?;
                delimiter = ",";

                write_json(output, name.as_str())?;
                write_str(output, ":")?;
                write_json(output, value)?;
            }

            write_str(output, "}")?;
        }

        write_str(output, "}")?;
        write_str(output, &self.closing_delimiter)?;
        write_str(output, LINE_ENDING)
    }
}
