//! Combines base64 HTML fragments into one printable document.
//!
//! Each fragment becomes one or more pages of the final PDF: a forced page
//! break is inserted between consecutive fragments, never after the last.
//!
//! # Example
//!
//! ```rust
//! use html2pdf_gateway::assembler::{assemble, PAGE_BREAK};
//!
//! // "<p>one</p>" and "<p>two</p>"
//! let fragments = vec!["PHA+b25lPC9wPg==".to_string(), "PHA+dHdvPC9wPg==".to_string()];
//! let html = assemble(&fragments, Some("p { color: red; }")).unwrap();
//!
//! assert!(html.contains("<style>\np { color: red; }\n</style>"));
//! assert_eq!(html.matches(PAGE_BREAK).count(), 1);
//! assert!(html.find("<p>one</p>").unwrap() < html.find("<p>two</p>").unwrap());
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Marker emitted between consecutive fragments.
pub const PAGE_BREAK: &str = "<div style='page-break-after:always;'>&nbsp;</div>";

const DOCUMENT_HEAD: &str = "<!doctype html><html><head><meta charset='utf-8'/>\n";
const DOCUMENT_BODY_OPEN: &str = "</head><body>\n";
const DOCUMENT_TAIL: &str = "</body></html>\n";

/// A fragment that could not be turned into HTML text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    /// No fragments were supplied.
    #[error("HtmlData is required to generate PDF.")]
    Empty,

    /// Not valid standard-alphabet base64.
    #[error("HtmlData[{index}] is not valid base64: {reason}")]
    InvalidBase64 {
        /// Position in `HtmlData`.
        index: usize,
        /// Decoder message.
        reason: String,
    },

    /// Decoded bytes are not UTF-8.
    #[error("HtmlData[{index}] is not valid UTF-8 text: {reason}")]
    InvalidUtf8 {
        /// Position in `HtmlData`.
        index: usize,
        /// Decoder message.
        reason: String,
    },
}

impl AssemblyError {
    /// Position of the offending fragment, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            AssemblyError::Empty => None,
            AssemblyError::InvalidBase64 { index, .. } | AssemblyError::InvalidUtf8 { index, .. } => {
                Some(*index)
            }
        }
    }
}

/// Decode one fragment. ASCII whitespace (line wrapping) is ignored.
pub fn decode_fragment(index: usize, encoded: &str) -> Result<String, AssemblyError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| AssemblyError::InvalidBase64 {
            index,
            reason: e.to_string(),
        })?;

    String::from_utf8(bytes).map_err(|e| AssemblyError::InvalidUtf8 {
        index,
        reason: e.to_string(),
    })
}

/// Build the full document from ordered fragments and optional CSS.
///
/// Every fragment is decoded before anything is emitted, so a failure never
/// yields a partial document.
///
/// # Errors
///
/// Returns [`AssemblyError`] naming the first fragment that fails to decode,
/// or [`AssemblyError::Empty`] for an empty list.
pub fn assemble(fragments: &[String], css: Option<&str>) -> Result<String, AssemblyError> {
    if fragments.is_empty() {
        return Err(AssemblyError::Empty);
    }

    let decoded = fragments
        .iter()
        .enumerate()
        .map(|(i, f)| decode_fragment(i, f))
        .collect::<Result<Vec<_>, _>>()?;

    let css = css.filter(|c| !c.trim().is_empty());
    let capacity = DOCUMENT_HEAD.len()
        + css.map_or(0, |c| c.len() + 20)
        + DOCUMENT_BODY_OPEN.len()
        + decoded.iter().map(|d| d.len() + 1).sum::<usize>()
        + (decoded.len() - 1) * (PAGE_BREAK.len() + 1)
        + DOCUMENT_TAIL.len();

    let mut html = String::with_capacity(capacity);
    html.push_str(DOCUMENT_HEAD);
    if let Some(css) = css {
        html.push_str("<style>\n");
        html.push_str(css);
        html.push_str("\n</style>\n");
    }
    html.push_str(DOCUMENT_BODY_OPEN);

    for (i, fragment) in decoded.iter().enumerate() {
        if i > 0 {
            html.push_str(PAGE_BREAK);
            html.push('\n');
        }
        html.push_str(fragment);
        html.push('\n');
    }

    html.push_str(DOCUMENT_TAIL);
    log::trace!(
        "Assembled {} fragment(s) into {} bytes of HTML",
        decoded.len(),
        html.len()
    );
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(s: &str) -> String {
        STANDARD.encode(s)
    }

    #[test]
    fn test_single_fragment_exact_output() {
        let html = assemble(&[encode("<h1>Hello</h1>")], None).unwrap();
        assert_eq!(
            html,
            "<!doctype html><html><head><meta charset='utf-8'/>\n\
             </head><body>\n\
             <h1>Hello</h1>\n\
             </body></html>\n"
        );
    }

    #[test]
    fn test_page_breaks_between_fragments_only() {
        let fragments: Vec<String> = (0..4).map(|i| encode(&format!("<p>{}</p>", i))).collect();
        let html = assemble(&fragments, None).unwrap();

        assert_eq!(html.matches(PAGE_BREAK).count(), 3);
        assert!(!html.contains(&format!("{}\n</body>", PAGE_BREAK)));

        let positions: Vec<usize> = (0..4)
            .map(|i| html.find(&format!("<p>{}</p>", i)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_css_block_emitted_when_present() {
        let html = assemble(&[encode("x")], Some("body { margin: 0; }")).unwrap();
        assert!(html.contains("<style>\nbody { margin: 0; }\n</style>\n</head>"));
    }

    #[test]
    fn test_blank_css_omitted() {
        let html = assemble(&[encode("x")], Some("   \n")).unwrap();
        assert!(!html.contains("<style>"));
    }

    #[test]
    fn test_whitespace_in_base64_is_ignored() {
        let encoded = "PGgx\nPkhl bGxv\r\nPC9oMT4=";
        assert_eq!(decode_fragment(0, encoded).unwrap(), "<h1>Hello</h1>");
    }

    #[test]
    fn test_invalid_base64_names_index() {
        let err = assemble(&[encode("ok"), "***not base64***".to_string()], None).unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert!(err.to_string().starts_with("HtmlData[1] is not valid base64"));
    }

    #[test]
    fn test_invalid_utf8_names_index() {
        let err = assemble(&[STANDARD.encode([0xff, 0xfe, 0xfd])], None).unwrap_err();
        assert!(matches!(err, AssemblyError::InvalidUtf8 { index: 0, .. }));
    }

    #[test]
    fn test_empty_fragment_list() {
        assert_eq!(assemble(&[], None).unwrap_err(), AssemblyError::Empty);
    }

    #[test]
    fn test_unicode_survives() {
        let html = assemble(&[encode("<p>Grüße ✓ 日本</p>")], None).unwrap();
        assert!(html.contains("<p>Grüße ✓ 日本</p>"));
    }
}
