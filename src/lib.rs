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

//! A JSON line formatter for structured log events that only emits allowed properties.
//!
//! # Overview
//!
//! An [`EventFormatter`] writes each [`LogEvent`] as a single JSON object followed by a line
//! terminator. The timestamp, level and message template are always written; the rendered
//! message, trace and span identifiers and exception are written when available; properties are
//! filtered through an [`AllowList`] of case-insensitive names.
//!
//! # Examples
//!
//! ```
//! use logforth_layout_filtered_json::EventFormatter;
//! use logforth_layout_filtered_json::LogEvent;
//! use logforth_layout_filtered_json::TextFormatter;
//!
//! let formatter = EventFormatter::default().allow_properties("clear,UserId");
//!
//! let event = LogEvent::builder()
//!     .message_template("User {UserId} logged in from {Ip}")
//!     .property("UserId", 42)
//!     .property("Ip", "10.0.0.1")
//!     .build();
//!
//! let mut output = Vec::new();
//! formatter.format(&event, &mut output).unwrap();
//!
//! let line = String::from_utf8(output).unwrap();
//! assert!(line.trim_end().ends_with(r#""Properties":{"UserId":42}}"#));
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod allow_list;
pub mod event;
pub mod formatter;
pub mod template;
pub mod value;

#[cfg(feature = "bridge-log")]
mod bridge;
mod config;
mod error;

pub use allow_list::AllowList;
pub use config::FormatterConfig;
pub use error::Error;
pub use event::Exception;
pub use event::Level;
pub use event::LogEvent;
pub use event::LogEventBuilder;
pub use event::SpanId;
pub use event::TraceId;
pub use formatter::EventFormatter;
pub use formatter::TextFormatter;
pub use template::FormatProvider;
pub use template::MessageTemplate;
pub use value::PropertyValue;
pub use value::Scalar;
pub use value::Structure;
