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

//! The set of property names a formatter is allowed to emit.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::str::FromStr;

/// Property names allowed when no allow-list is configured.
pub const DEFAULT_ALLOWED_PROPERTIES: &[&str] = &[
    "ConnectionId",
    "ContentLength",
    "DeviceId",
    "Duration",
    "Elapsed",
    "ElapsedMilliseconds",
    "EventId",
    "Headers",
    "Host",
    "HostingRequestFinishedLog",
    "Ip",
    "MachineName",
    "Method",
    "Path",
    "Protocol",
    "QueryString",
    "RequestId",
    "ResponseHeaders",
    "Scheme",
    "SourceContext",
    "StatusCode",
    "ThreadId",
    "TraceIdentifier",
    "Traffic",
    "Url",
    "User",
    "UserAgent",
    "XRequestId",
];

const WILDCARD: &str = "*";
const CLEAR: &str = "clear";

/// A case-insensitive set of property names.
///
/// The list is resolved once from a comma-separated configuration string:
///
/// * nothing configured: the [default names](DEFAULT_ALLOWED_PROPERTIES);
/// * the list contains `clear`: exactly the other names in the list, so `clear` alone allows
///   nothing;
/// * the list contains `*`: every property;
/// * any other list: the default names. The configured names are **not** added, so a plain
///   list such as `Foo,Bar` has no effect unless combined with `clear`.
///
/// # Examples
///
/// ```
/// use logforth_layout_filtered_json::AllowList;
///
/// let allow = AllowList::new(Some("clear, UserId, TenantId"));
/// assert!(allow.contains("userid"));
/// assert!(!allow.contains("StatusCode"));
///
/// let allow = AllowList::new(Some("*"));
/// assert!(allow.contains("anything"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    // lower-cased
    names: BTreeSet<String>,
    wildcard: bool,
}

impl Default for AllowList {
    fn default() -> Self {
        AllowList::from_names(DEFAULT_ALLOWED_PROPERTIES.iter().copied())
    }
}

impl AllowList {
    /// Resolve an allow-list from an optional comma-separated list of names.
    pub fn new(allow_properties: Option<&str>) -> Self {
        let names = allow_properties
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        if names.is_empty() {
            AllowList::default()
        } else if names.contains(&CLEAR) {
            AllowList::from_names(
                names
                    .into_iter()
                    .filter(|name| !name.eq_ignore_ascii_case(CLEAR)),
            )
        } else if names.contains(&WILDCARD) {
            AllowList::wildcard()
        } else {
            AllowList::default()
        }
    }

    /// An allow-list that matches every property.
    pub fn wildcard() -> Self {
        AllowList {
            names: BTreeSet::new(),
            wildcard: true,
        }
    }

    /// An allow-list that matches no property.
    pub fn none() -> Self {
        AllowList {
            names: BTreeSet::new(),
            wildcard: false,
        }
    }

    fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let names = names
            .into_iter()
            .map(str::to_lowercase)
            .collect::<BTreeSet<_>>();
        let wildcard = names.contains(WILDCARD);
        AllowList { names, wildcard }
    }

    /// Whether `name` may be emitted, ignoring case.
    pub fn contains(&self, name: &str) -> bool {
        self.wildcard || self.names.contains(&name.to_lowercase())
    }

    /// Whether every property is allowed.
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// The number of explicitly allowed names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no name is explicitly allowed.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The explicitly allowed names, lower-cased and sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl FromStr for AllowList {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AllowList::new(Some(s)))
    }
}
