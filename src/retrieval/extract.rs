//! Readable-text extraction from HTML.
//!
//! Pages are parsed with a full HTML5 parser, so paragraphs without a
//! closing tag end where the browser would end them. The text of heading
//! (`h1`..`h5`) and paragraph elements is concatenated in document order,
//! skipping anything inside script, style or noscript. Each line is split
//! on double spaces and blank phrases are dropped.

use scraper::{ElementRef, Html, Selector};

use crate::error::ProviderError;

const HIDDEN: [&str; 3] = ["script", "style", "noscript"];

/// Title and body text extracted from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// Contents of `<title>`, empty if absent.
    pub title: String,
    /// Extracted body text, one phrase per line.
    pub text: String,
}

/// HTML text extractor.
#[derive(Debug)]
pub struct HtmlExtractor {
    blocks: Selector,
    title: Selector,
}

impl HtmlExtractor {
    /// Builds the element selectors.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Parse`] if a selector is rejected.
    pub fn new() -> Result<Self, ProviderError> {
        Ok(Self {
            blocks: selector("p, h1, h2, h3, h4, h5")?,
            title: selector("title")?,
        })
    }

    /// Extracts the title and readable text of `html`.
    #[must_use]
    pub fn extract(&self, html: &str) -> Extracted {
        let document = Html::parse_document(html);

        let title = document
            .select(&self.title)
            .next()
            .map(|t| collapse_whitespace(&t.text().collect::<String>()))
            .unwrap_or_default();

        let mut raw = String::new();
        for block in document.select(&self.blocks) {
            raw.push_str(&visible_text(block));
            raw.push('\n');
        }

        Extracted {
            title,
            text: normalize_lines(&raw),
        }
    }

    /// Strips tags and decodes entities from an HTML fragment.
    #[must_use]
    pub fn inline_text(&self, fragment: &str) -> String {
        Html::parse_fragment(fragment)
            .root_element()
            .text()
            .collect()
    }
}

fn selector(css: &'static str) -> Result<Selector, ProviderError> {
    Selector::parse(css).map_err(|e| ProviderError::Parse {
        backend: "extractor".to_string(),
        message: format!("selector '{css}': {e}"),
    })
}

/// Text nodes under `element`, minus those inside hidden elements.
fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .take_while(|a| a.id() != element.id())
            .filter_map(ElementRef::wrap)
            .any(|a| HIDDEN.contains(&a.value().name()));
        if !hidden {
            out.push_str(text);
        }
    }
    out
}

fn normalize_lines(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
