//! Chart-wide naming rules
//!
//! Resources generated into one chart share the chart's name and usually a
//! common name prefix (`my-app-web`, `my-app-pdb`). Templates and values are
//! keyed by the resource name with that prefix removed.

use crate::error::{CoreError, Result};

/// Characters stripped from the front of a name after prefix removal
const NAME_SEPARATORS: &[char] = &['-', '.', '_'];

/// Naming context for one chart-generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartMeta {
    chart_name: String,
    common_prefix: Option<String>,
    preserve_namespace: bool,
}

impl ChartMeta {
    /// Create metadata for the chart `chart_name`
    ///
    /// The name ends up in `include "<name>.labels"` style references, so it
    /// must be non-empty and free of whitespace and quotes.
    pub fn new(chart_name: impl Into<String>) -> Result<Self> {
        let chart_name = chart_name.into();
        if chart_name.is_empty() {
            return Err(CoreError::InvalidChartName {
                name: chart_name,
                message: "name must not be empty".to_string(),
            });
        }
        let invalid = chart_name
            .chars()
            .find(|c| c.is_whitespace() || *c == '"' || *c == '\'');
        if let Some(c) = invalid {
            return Err(CoreError::InvalidChartName {
                message: format!("unexpected character {:?}", c),
                name: chart_name,
            });
        }

        Ok(Self {
            chart_name,
            common_prefix: None,
            preserve_namespace: false,
        })
    }

    /// Set the prefix shared by all resource names
    pub fn with_common_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.common_prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Detect the common prefix from the resource names of this run
    pub fn with_detected_prefix<'a, I>(self, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        match detect_common_prefix(names) {
            Some(prefix) => self.with_common_prefix(prefix),
            None => self,
        }
    }

    /// Keep the source namespace in generated metadata
    pub fn with_preserve_namespace(mut self, preserve: bool) -> Self {
        self.preserve_namespace = preserve;
        self
    }

    /// Chart identifier used in helper references
    pub fn chart_name(&self) -> &str {
        &self.chart_name
    }

    pub fn common_prefix(&self) -> Option<&str> {
        self.common_prefix.as_deref()
    }

    pub fn preserve_namespace(&self) -> bool {
        self.preserve_namespace
    }

    /// Remove chart-wide prefixes from a resource name
    ///
    /// The common prefix goes first, then `<chart>-`, then any leading
    /// separators. A name that would become empty is returned unchanged.
    pub fn trim_name(&self, name: &str) -> String {
        let mut trimmed = name;
        if let Some(prefix) = &self.common_prefix {
            trimmed = trimmed.strip_prefix(prefix.as_str()).unwrap_or(trimmed);
        }
        if let Some(rest) = trimmed
            .strip_prefix(self.chart_name.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
        {
            trimmed = rest;
        }
        let trimmed = trimmed.trim_start_matches(NAME_SEPARATORS);

        if trimmed.is_empty() {
            name.to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Logical name: the trimmed name in lower camel case
    pub fn logical_name(&self, name: &str) -> String {
        to_lower_camel(&self.trim_name(name))
    }
}

/// Convert a resource name to lowerCamelCase
///
/// Every non-alphanumeric character separates words. The first character of
/// the first word is lowercased, the first character of each following word
/// uppercased; everything else is kept as written.
pub fn to_lower_camel(s: &str) -> String {
    let mut result = String::with_capacity(s.len());

    for word in s.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if result.is_empty() {
                result.extend(first.to_lowercase());
            } else {
                result.extend(first.to_uppercase());
            }
            result.push_str(chars.as_str());
        }
    }

    result
}

/// Find the `-`-delimited prefix shared by every name
///
/// Needs at least two names. The prefix always ends with `-` and never
/// swallows a whole name.
pub fn detect_common_prefix<'a, I>(names: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut names = names.into_iter();
    let first = names.next()?;
    let mut prefix: Vec<&str> = first.split('-').collect();
    // The last segment of a name is never part of the prefix
    prefix.pop();
    let mut count = 1;

    for name in names {
        count += 1;
        let segments: Vec<&str> = name.split('-').collect();
        let shared = prefix
            .iter()
            .zip(&segments[..segments.len() - 1])
            .take_while(|(a, b)| a == b)
            .count();
        prefix.truncate(shared);
    }

    if count < 2 || prefix.is_empty() {
        return None;
    }

    Some(format!("{}-", prefix.join("-")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_lower_camel() {
        assert_eq!(to_lower_camel("pdb"), "pdb");
        assert_eq!(to_lower_camel("my-pdb"), "myPdb");
        assert_eq!(to_lower_camel("web_api.v2"), "webApiV2");
        assert_eq!(to_lower_camel("Controller-Manager"), "controllerManager");
        assert_eq!(to_lower_camel("--edge--case--"), "edgeCase");
        assert_eq!(to_lower_camel(""), "");
    }

    #[test]
    fn test_trim_name_with_prefix() {
        let meta = ChartMeta::new("my-app").unwrap().with_common_prefix("my-app-");
        assert_eq!(meta.trim_name("my-app-pdb"), "pdb");
        assert_eq!(meta.logical_name("my-app-pdb"), "pdb");
        assert_eq!(meta.logical_name("my-app-web-pdb"), "webPdb");
    }

    #[test]
    fn test_trim_name_by_chart_name() {
        let meta = ChartMeta::new("shop").unwrap();
        assert_eq!(meta.trim_name("shop-frontend"), "frontend");
        assert_eq!(meta.trim_name("shopfront"), "shopfront");
        assert_eq!(meta.trim_name("other"), "other");
    }

    #[test]
    fn test_trim_name_never_empty() {
        let meta = ChartMeta::new("app").unwrap().with_common_prefix("app");
        assert_eq!(meta.trim_name("app"), "app");
        assert_eq!(meta.trim_name("app-"), "app-");
    }

    #[test]
    fn test_invalid_chart_names() {
        assert!(ChartMeta::new("").is_err());
        assert!(ChartMeta::new("my chart").is_err());
        assert!(ChartMeta::new("my\"chart").is_err());
    }

    #[test]
    fn test_detect_common_prefix() {
        assert_eq!(
            detect_common_prefix(["my-app-web", "my-app-pdb", "my-app-db-config"]),
            Some("my-app-".to_string())
        );
        assert_eq!(detect_common_prefix(["web", "pdb"]), None);
        assert_eq!(detect_common_prefix(["my-app-web"]), None);
        assert_eq!(detect_common_prefix(["my-app", "my-app-pdb"]), Some("my-".to_string()));
        assert_eq!(detect_common_prefix(std::iter::empty()), None);
    }

    #[test]
    fn test_detected_prefix_on_meta() {
        let meta = ChartMeta::new("chart")
            .unwrap()
            .with_detected_prefix(["team-a-web", "team-a-pdb"]);
        assert_eq!(meta.common_prefix(), Some("team-a-"));
        assert_eq!(meta.logical_name("team-a-web"), "web");
    }
}
