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

use std::borrow::Cow;

use serde::Deserialize;

use crate::Error;
use crate::allow_list::AllowList;
use crate::formatter::EventFormatter;

const DEFAULT_ENV_PREFIX: &str = "LOGFORTH_JSON";

/// Construction parameters of an [`EventFormatter`].
///
/// Every field is optional, so the config can be embedded in an application's own settings:
///
/// ```
/// use logforth_layout_filtered_json::FormatterConfig;
///
/// let config: FormatterConfig =
///     serde_json::from_str(r#"{"render_message": true, "allow_properties": "clear,UserId"}"#)
///         .unwrap();
/// let formatter = config.build();
/// assert!(formatter.allowed().contains("userid"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// Text written after the closing brace of each event.
    pub closing_delimiter: Option<String>,
    /// Whether to write the rendered message.
    pub render_message: bool,
    /// Comma-separated property names, see [`AllowList`].
    pub allow_properties: Option<String>,
}

impl FormatterConfig {
    /// Load the config from the environment using the default prefix `LOGFORTH_JSON`.
    ///
    /// Reads `LOGFORTH_JSON_CLOSING_DELIMITER`, `LOGFORTH_JSON_RENDER_MESSAGE` and
    /// `LOGFORTH_JSON_ALLOW_PROPERTIES`. Unset variables keep their defaults.
    pub fn from_default_env() -> Result<Self, Error> {
        FormatterConfig::from_env(DEFAULT_ENV_PREFIX)
    }

    /// Load the config from the environment using a specific variable prefix.
    ///
    /// # Examples
    ///
    /// ```
    /// use logforth_layout_filtered_json::FormatterConfig;
    ///
    /// let config = FormatterConfig::from_env("MY_APP_LOG").unwrap();
    /// ```
    pub fn from_env<'a, P>(prefix: P) -> Result<Self, Error>
    where
        P: Into<Cow<'a, str>>,
    {
        let prefix = prefix.into();
        let var = |suffix: &str| {
            let name = format!("{prefix}_{suffix}");
            std::env::var(&name).ok().map(|value| (name, value))
        };

        let mut config = FormatterConfig::default();
        if let Some((_, value)) = var("CLOSING_DELIMITER") {
            config.closing_delimiter = Some(value);
        }
        if let Some((name, value)) = var("RENDER_MESSAGE") {
            config.render_message = value.trim().parse().map_err(|err| {
                Error::new("failed to parse formatter config")
                    .with_context("variable", name)
                    .with_context("value", &value)
                    .with_source(err)
            })?;
        }
        if let Some((_, value)) = var("ALLOW_PROPERTIES") {
            config.allow_properties = Some(value);
        }
        Ok(config)
    }

    /// Resolve the allow-list this config describes.
    pub fn allow_list(&self) -> AllowList {
        AllowList::new(self.allow_properties.as_deref())
    }

    /// Build the formatter.
    pub fn build(self) -> EventFormatter {
        let allow_list = self.allow_list();
        EventFormatter::default()
            .closing_delimiter(self.closing_delimiter.unwrap_or_default())
            .render_message(self.render_message)
            .allow_list(allow_list)
    }
}

impl From<FormatterConfig> for EventFormatter {
    fn from(config: FormatterConfig) -> Self {
        config.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // each test uses its own prefix since the environment is process-wide
    fn set(name: &str, value: &str) {
        // SAFETY: variables are unique to the calling test
        unsafe { std::env::set_var(name, value) };
    }

    #[test]
    fn missing_variables_keep_defaults() {
        let config = FormatterConfig::from_env("LOGFORTH_JSON_TEST_UNSET").unwrap();
        assert_eq!(config, FormatterConfig::default());
        assert_eq!(config.allow_list(), AllowList::default());
    }

    #[test]
    fn variables_are_read_with_prefix() {
        set("LOGFORTH_JSON_TEST_SET_CLOSING_DELIMITER", ",");
        set("LOGFORTH_JSON_TEST_SET_RENDER_MESSAGE", " true ");
        set("LOGFORTH_JSON_TEST_SET_ALLOW_PROPERTIES", "*");

        let config = FormatterConfig::from_env("LOGFORTH_JSON_TEST_SET").unwrap();
        assert_eq!(
            config,
            FormatterConfig {
                closing_delimiter: Some(",".to_string()),
                render_message: true,
                allow_properties: Some("*".to_string()),
            }
        );
        assert!(config.build().allowed().is_wildcard());
    }

    #[test]
    fn malformed_bool_reports_variable() {
        set("LOGFORTH_JSON_TEST_BAD_RENDER_MESSAGE", "yes please");

        let err = FormatterConfig::from_env("LOGFORTH_JSON_TEST_BAD").unwrap_err();
        assert_eq!(err.message(), "failed to parse formatter config");
        assert_eq!(
            err.context("variable"),
            Some("LOGFORTH_JSON_TEST_BAD_RENDER_MESSAGE")
        );
        assert_eq!(err.context("value"), Some("yes please"));
    }

    #[test]
    fn deserializes_partial_config() {
        let config: FormatterConfig = serde_json::from_str(r#"{"closing_delimiter": ""}"#).unwrap();
        assert_eq!(config.closing_delimiter.as_deref(), Some(""));
        assert!(!config.render_message);
        assert_eq!(config.allow_properties, None);
    }
}
