//! HTML extraction using named CSS selector rules
//!
//! Documents are parsed with html5ever (through `scraper`), which recovers
//! from malformed markup the way browsers do, so extraction never fails once
//! the rules have been compiled.

use crate::config::SelectorRule;
use crate::record::ExtractionResult;
use crate::{ConfigError, ConfigResult};
use scraper::{ElementRef, Html, Selector};

/// A selector rule with its CSS already parsed
#[derive(Debug)]
pub struct CompiledRule {
    name: String,
    selector: Selector,
    attribute: Option<String>,
}

impl CompiledRule {
    /// Compiles a rule
    ///
    /// # Returns
    ///
    /// * `Ok(CompiledRule)` - The CSS parsed
    /// * `Err(ConfigError::InvalidSelector)` - The CSS is not a valid selector
    pub fn compile(rule: &SelectorRule) -> ConfigResult<Self> {
        let selector =
            Selector::parse(&rule.css).map_err(|e| ConfigError::InvalidSelector {
                name: rule.name.clone(),
                message: format!("{:?}", e),
            })?;

        Ok(Self {
            name: rule.name.clone(),
            selector,
            attribute: rule.attribute.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn values(&self, document: &Html) -> Vec<String> {
        document
            .select(&self.selector)
            .filter_map(|element| match &self.attribute {
                Some(attribute) => attribute_value(element, attribute),
                None => Some(text_value(element)),
            })
            .collect()
    }
}

/// Applies an ordered set of compiled rules to page content
#[derive(Debug)]
pub struct Extractor {
    rules: Vec<CompiledRule>,
}

impl Extractor {
    /// Compiles every rule up front so a bad selector is reported before any
    /// network activity
    pub fn new(rules: &[SelectorRule]) -> ConfigResult<Self> {
        let rules = rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Names of the rules, in order
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(CompiledRule::name)
    }

    /// Extracts values for every rule from `content`
    ///
    /// The document is parsed once. A rule that matches nothing yields an
    /// empty sequence; the result always contains every rule name.
    ///
    /// # Example
    ///
    /// ```
    /// use ripple_scrape::config::SelectorRule;
    /// use ripple_scrape::pipeline::Extractor;
    ///
    /// let extractor = Extractor::new(&[SelectorRule::text("title", "title")]).unwrap();
    /// let result = extractor.extract("<html><head><title> Hi </title></head></html>");
    /// assert_eq!(result.get("title"), Some(&["Hi".to_string()][..]));
    /// ```
    pub fn extract(&self, content: &str) -> ExtractionResult {
        let document = Html::parse_document(content);

        let mut result = ExtractionResult::new();
        for rule in &self.rules {
            result.insert(rule.name.clone(), rule.values(&document));
        }
        result
    }
}

/// Text nodes of the element, each trimmed, empty ones dropped, joined by a
/// single space
///
/// Every matched element yields a value, even when it has no text.
fn text_value(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn attribute_value(element: ElementRef<'_>, attribute: &str) -> Option<String> {
    element
        .value()
        .attr(attribute)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
