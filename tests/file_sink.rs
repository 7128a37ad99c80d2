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

use std::fs::File;
use std::io::BufWriter;
use std::io::Write;

use logforth_layout_filtered_json::FormatterConfig;
use logforth_layout_filtered_json::LogEvent;
use logforth_layout_filtered_json::TextFormatter;

#[test]
fn writes_one_line_per_log_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.log");

    let formatter = FormatterConfig {
        closing_delimiter: None,
        render_message: true,
        allow_properties: Some("clear,StatusCode,Path".to_string()),
    }
    .build();

    let kvs: &[(&str, log::kv::Value)] = &[
        ("Path", log::kv::Value::from("/orders")),
        ("Token", log::kv::Value::from("secret")),
        ("StatusCode", log::kv::Value::from(201u16)),
    ];
    let records = [
        log::Record::builder()
            .args(format_args!("order created"))
            .level(log::Level::Info)
            .key_values(&kvs)
            .build(),
        log::Record::builder()
            .args(format_args!("shutting down"))
            .level(log::Level::Warn)
            .build(),
    ];

    let mut writer = BufWriter::new(File::create(&path).unwrap());
    for record in records.iter() {
        let event = LogEvent::from_log_record(record).unwrap();
        formatter.format(&event, &mut writer).unwrap();
    }
    writer.flush().unwrap();
    drop(writer);

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines = contents.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 2, "{contents}");

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["Level"], "Information");
    assert_eq!(first["MessageTemplate"], "order created");
    assert_eq!(first["RenderedMessage"], "order created");
    assert_eq!(
        first["Properties"],
        serde_json::json!({"Path": "/orders", "StatusCode": 201})
    );

    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["Level"], "Warning");
    assert!(second.get("Properties").is_none());
}

#[test]
fn failing_sink_stops_at_first_error() {
    struct Limited {
        written: Vec<u8>,
        limit: usize,
    }

    impl Write for Limited {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.written.len() + buf.len() > self.limit {
                return Err(std::io::Error::other("disk full"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let event = LogEvent::builder()
        .message_template("a long enough message to overflow the sink")
        .build();
    let mut sink = Limited {
        written: Vec::new(),
        limit: 16,
    };

    let err = FormatterConfig::default()
        .build()
        .format(&event, &mut sink)
        .unwrap_err();
    assert_eq!(err.message(), "failed to perform io");
    assert!(sink.written.len() <= 16);
    assert!(sink.written.starts_with(b"{\"Timestamp\":\""));
}
