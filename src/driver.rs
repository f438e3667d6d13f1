//! The browser capability everything above the driver is written against.
//!
//! A driver is single-threaded and stateful (it has a current page), so
//! every call takes `&mut self`. Element handles are opaque values that
//! stay valid until the page they came from is left.

use std::fmt;

use crate::error::DriverError;

/// How to find an element on the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Element with the given `id` attribute.
    Id(String),
    /// Compound selector: optional tag plus every listed class.
    Selector {
        tag: Option<String>,
        classes: Vec<String>,
    },
    /// Element of `tag` whose own text contains `text`.
    ContainsText { tag: String, text: String },
}

impl Locator {
    pub fn id(id: &str) -> Self {
        Locator::Id(id.to_string())
    }

    /// Parses `tag.class.class`, `.class` or a bare `tag`.
    pub fn css(selector: &str) -> Self {
        let mut parts = selector.split('.');
        let tag = parts
            .next()
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let classes = parts
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        Locator::Selector { tag, classes }
    }

    pub fn containing(tag: &str, text: &str) -> Self {
        Locator::ContainsText {
            tag: tag.to_string(),
            text: text.to_string(),
        }
    }

    /// XPath rendering for WebDriver-style backends. Relative paths start
    /// with `.//` so they only search below the parent element.
    pub fn to_xpath(&self, relative: bool) -> String {
        let prefix = if relative { ".//" } else { "//" };
        match self {
            Locator::Id(id) => format!("{prefix}*[@id='{id}']"),
            Locator::Selector { tag, classes } => {
                let tag = tag.as_deref().unwrap_or("*");
                let predicates: String = classes
                    .iter()
                    .map(|c| {
                        format!("[contains(concat(' ', normalize-space(@class), ' '), ' {c} ')]")
                    })
                    .collect();
                format!("{prefix}{tag}{predicates}")
            }
            Locator::ContainsText { tag, text } => {
                format!("{prefix}{tag}[contains(text(), '{text}')]")
            }
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{id}"),
            Locator::Selector { tag, classes } => {
                write!(f, "{}", tag.as_deref().unwrap_or(""))?;
                for class in classes {
                    write!(f, ".{class}")?;
                }
                Ok(())
            }
            Locator::ContainsText { tag, text } => write!(f, "{tag}:contains('{text}')"),
        }
    }
}

/// Element lookup, interaction and navigation primitives.
pub trait BrowserDriver {
    type Element: Clone + fmt::Debug;

    fn find(&mut self, locator: &Locator) -> Result<Self::Element, DriverError>;

    /// All matches in document order; an empty vector is not an error.
    fn find_all(&mut self, locator: &Locator) -> Result<Vec<Self::Element>, DriverError>;

    fn find_within(
        &mut self,
        parent: &Self::Element,
        locator: &Locator,
    ) -> Result<Self::Element, DriverError>;

    fn find_all_within(
        &mut self,
        parent: &Self::Element,
        locator: &Locator,
    ) -> Result<Vec<Self::Element>, DriverError>;

    fn text(&mut self, element: &Self::Element) -> Result<String, DriverError>;

    fn click(&mut self, element: &Self::Element) -> Result<(), DriverError>;

    fn clear(&mut self, element: &Self::Element) -> Result<(), DriverError>;

    fn send_keys(&mut self, element: &Self::Element, text: &str) -> Result<(), DriverError>;

    fn is_displayed(&mut self, element: &Self::Element) -> Result<bool, DriverError>;

    fn current_url(&mut self) -> Result<String, DriverError>;

    fn goto(&mut self, url: &str) -> Result<(), DriverError>;

    fn back(&mut self) -> Result<(), DriverError>;

    fn refresh(&mut self) -> Result<(), DriverError>;
}
