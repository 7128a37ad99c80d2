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

//! Bridge from the [`log`] crate's records to [`LogEvent`]s.

use crate::Error;
use crate::event::LogEvent;
use crate::event::LogEventBuilder;
use crate::value::PropertyValue;
use crate::value::Scalar;

struct PropertyCollector {
    builder: Option<LogEventBuilder>,
}

impl<'kvs> log::kv::VisitSource<'kvs> for PropertyCollector {
    fn visit_pair(
        &mut self,
        key: log::kv::Key<'kvs>,
        value: log::kv::Value<'kvs>,
    ) -> Result<(), log::kv::Error> {
        if let Some(builder) = self.builder.take() {
            self.builder = Some(builder.property(key.as_str(), to_property_value(&value)));
        }
        Ok(())
    }
}

fn to_property_value(value: &log::kv::Value) -> PropertyValue {
    let scalar = if let Some(v) = value.to_bool() {
        Scalar::Bool(v)
    } else if let Some(v) = value.to_i64() {
        Scalar::I64(v)
    } else if let Some(v) = value.to_u64() {
        Scalar::U64(v)
    } else if let Some(v) = value.to_i128() {
        Scalar::I128(v)
    } else if let Some(v) = value.to_u128() {
        Scalar::U128(v)
    } else if let Some(v) = value.to_f64() {
        Scalar::F64(v)
    } else if let Some(v) = value.to_char() {
        Scalar::Char(v)
    } else if let Some(v) = value.to_borrowed_str() {
        Scalar::String(v.to_string())
    } else {
        Scalar::String(value.to_string())
    };
    PropertyValue::Scalar(scalar)
}

impl LogEvent {
    /// Capture a [`log::Record`] as an event observed now.
    ///
    /// The formatted arguments become the message template and the record's key-values
    /// become properties, in the order they were visited.
    ///
    /// # Examples
    ///
    /// ```
    /// use logforth_layout_filtered_json::Level;
    /// use logforth_layout_filtered_json::LogEvent;
    ///
    /// let record = log::Record::builder()
    ///     .args(format_args!("cache miss"))
    ///     .level(log::Level::Warn)
    ///     .build();
    /// let event = LogEvent::from_log_record(&record).unwrap();
    /// assert_eq!(event.level(), Level::Warning);
    /// assert_eq!(event.message_template().text(), "cache miss");
    /// ```
    pub fn from_log_record(record: &log::Record) -> Result<LogEvent, Error> {
        let builder = LogEvent::builder()
            .level(record.level().into())
            .message_template(record.args().to_string());

        let mut collector = PropertyCollector {
            builder: Some(builder),
        };
        record.key_values().visit(&mut collector).map_err(|err| {
            Error::new("failed to visit key-values")
                .with_context("target", record.target())
                .with_source(err)
        })?;

        let builder = collector.builder.unwrap_or_default();
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Level;

    #[test]
    fn captures_level_message_and_key_values() {
        let kvs: &[(&str, log::kv::Value)] = &[
            ("StatusCode", log::kv::Value::from(404u16)),
            ("Path", log::kv::Value::from("/missing")),
            ("Elapsed", log::kv::Value::from(1.5f64)),
            ("Cached", log::kv::Value::from(false)),
        ];
        let record = log::Record::builder()
            .args(format_args!("request for /missing failed"))
            .level(log::Level::Error)
            .target("http")
            .key_values(&kvs)
            .build();

        let event = LogEvent::from_log_record(&record).unwrap();
        assert_eq!(event.level(), Level::Error);
        assert_eq!(event.message_template().text(), "request for /missing failed");

        let properties = event.properties();
        assert_eq!(
            properties.keys().collect::<Vec<_>>(),
            vec!["StatusCode", "Path", "Elapsed", "Cached"]
        );
        assert_eq!(properties["StatusCode"], PropertyValue::from(404i64));
        assert_eq!(properties["Path"], PropertyValue::from("/missing"));
        assert_eq!(properties["Elapsed"], PropertyValue::from(1.5));
        assert_eq!(properties["Cached"], PropertyValue::from(false));
    }

    #[test]
    fn maps_every_log_level() {
        for (level, expected) in [
            (log::Level::Trace, Level::Verbose),
            (log::Level::Debug, Level::Debug),
            (log::Level::Info, Level::Information),
            (log::Level::Warn, Level::Warning),
            (log::Level::Error, Level::Error),
        ] {
            assert_eq!(Level::from(level), expected);
        }
    }
}
