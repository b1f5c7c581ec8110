//! Location rewrite rules.
//!
//! Rules come from `protocol.mapping.<pattern> = <replacement>` properties.
//! They are evaluated in declaration order and the first rule whose pattern
//! matches anywhere in the location rewrites it. Only that rule is applied
//! and only its first match is replaced.
//!
//! ```text
//! "protocol.mapping.^s3a?://"   = "abfss://lake@acct.dfs.core.windows.net/"
//! "protocol.mapping.^gs://(\w+)/" = "mem://$1/"
//!
//! s3://bucket/t/data.parquet -> abfss://lake@acct.dfs.core.windows.net/bucket/t/data.parquet
//! gs://b1/x                  -> mem://b1/x
//! file:///tmp/x              -> file:///tmp/x   (no match, borrowed)
//! ```
//!
//! # Replacement templates
//!
//! Templates use the `regex` crate syntax: `$1`, `${1}`, `$name`, `${name}`
//! and `$$` for a literal dollar sign. `$name` is greedy, so write `${1}a`
//! rather than `$1a`. A template that references a group the pattern does not
//! define makes the rule defective: locations matching it fail with
//! [`FileIoError::Rewrite`] instead of being rewritten with an empty group.

use regex::Regex;
use std::borrow::Cow;
use tracing::{debug, warn};

use crate::error::{FileIoError, Result};
use crate::properties::Properties;

/// Property prefix that declares a rewrite rule.
pub const PROTOCOL_MAPPING_PREFIX: &str = "protocol.mapping.";

/// A single `(pattern, replacement)` rewrite rule.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: String,
    defect: Option<String>,
}

impl RewriteRule {
    /// Compile a rule.
    ///
    /// # Errors
    ///
    /// Returns `FileIoError::Config` if the pattern is empty or is not a valid
    /// regular expression. An unusable replacement template is not an error
    /// here; it is reported when a location matches the rule.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        if pattern.is_empty() {
            return Err(FileIoError::Config(format!(
                "Empty pattern in '{}' property",
                PROTOCOL_MAPPING_PREFIX
            )));
        }

        let pattern = Regex::new(pattern).map_err(|e| {
            FileIoError::Config(format!("Invalid protocol mapping pattern '{}': {}", pattern, e))
        })?;
        let replacement = replacement.into();
        let defect = check_template(&pattern, &replacement);

        Ok(Self {
            pattern,
            replacement,
            defect,
        })
    }

    /// Pattern text.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Replacement template.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Why the replacement template cannot be applied, if it cannot.
    pub fn defect(&self) -> Option<&str> {
        self.defect.as_deref()
    }

    /// Check whether the pattern matches anywhere in `location`.
    pub fn is_match(&self, location: &str) -> bool {
        self.pattern.is_match(location)
    }

    /// Replace the first match in a location already known to match.
    fn apply(&self, location: &str) -> Result<String> {
        if let Some(reason) = &self.defect {
            return Err(FileIoError::Rewrite {
                location: location.to_string(),
                pattern: self.pattern().to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .pattern
            .replacen(location, 1, self.replacement.as_str())
            .into_owned())
    }
}

/// Ordered collection of rewrite rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build rules from every `protocol.mapping.*` property, in declaration order.
    pub fn from_properties(properties: &Properties) -> Result<Self> {
        let mut rules = RuleSet::new();
        for (pattern, replacement) in properties.strip_prefix(PROTOCOL_MAPPING_PREFIX) {
            let rule = RewriteRule::new(pattern, replacement)?;
            if let Some(reason) = rule.defect() {
                warn!(
                    "Protocol mapping '{}' -> '{}' cannot be applied: {}",
                    pattern, replacement, reason
                );
            }
            rules.push(rule);
        }
        debug!("Loaded {} protocol mapping rule(s)", rules.len());
        Ok(rules)
    }

    /// Append a rule; it is tried after every rule already present.
    pub fn push(&mut self, rule: RewriteRule) {
        self.rules.push(rule);
    }

    /// Add a rule (for method chaining).
    pub fn with_rule(mut self, rule: RewriteRule) -> Self {
        self.push(rule);
        self
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over rules in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &RewriteRule> {
        self.rules.iter()
    }

    /// First rule matching `location`.
    pub fn first_match(&self, location: &str) -> Option<&RewriteRule> {
        self.rules.iter().find(|rule| rule.is_match(location))
    }
}

/// Maps logical locations to physical locations using a [`RuleSet`].
#[derive(Debug, Clone, Default)]
pub struct LocationRewriter {
    rules: RuleSet,
}

impl LocationRewriter {
    /// Create a rewriter over `rules`.
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Create a rewriter from `protocol.mapping.*` properties.
    pub fn from_properties(properties: &Properties) -> Result<Self> {
        Ok(Self::new(RuleSet::from_properties(properties)?))
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Whether no rules are configured.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrite a logical location into a physical one.
    ///
    /// Returns the input borrowed when no rule matches.
    ///
    /// # Errors
    ///
    /// Returns `FileIoError::Rewrite` if the first matching rule has an
    /// unusable replacement template.
    pub fn rewrite<'a>(&self, location: &'a str) -> Result<Cow<'a, str>> {
        let Some(rule) = self.rules.first_match(location) else {
            return Ok(Cow::Borrowed(location));
        };

        let rewritten = rule.apply(location)?;
        debug!("Adjusted location from '{}' to '{}'", location, rewritten);
        Ok(Cow::Owned(rewritten))
    }
}

/// Validate the group references of `template` against `pattern`.
fn check_template(pattern: &Regex, template: &str) -> Option<String> {
    for group in group_references(template) {
        let known = match group.parse::<usize>() {
            Ok(index) => index < pattern.captures_len(),
            Err(_) => pattern.capture_names().flatten().any(|name| name == group),
        };
        if !known {
            return Some(format!("replacement references unknown group '{}'", group));
        }
    }
    None
}

/// Group names or indices referenced by a replacement template.
fn group_references(template: &str) -> Vec<&str> {
    let mut refs = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        rest = &rest[pos + 1..];

        if let Some(after) = rest.strip_prefix('$') {
            rest = after;
            continue;
        }

        if let Some(braced) = rest.strip_prefix('{') {
            // An unclosed brace leaves the `$` literal; `${}` names the empty group.
            if let Some(end) = braced.find('}') {
                refs.push(&braced[..end]);
                rest = &braced[end + 1..];
            }
            continue;
        }

        let len = rest
            .find(|c: char| !(c == '_' || c.is_ascii_alphanumeric()))
            .unwrap_or(rest.len());
        if len > 0 {
            refs.push(&rest[..len]);
            rest = &rest[len..];
        }
    }

    refs
}
