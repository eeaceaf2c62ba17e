//! Table-of-contents derivation
//!
//! Best-effort: scans the first page for numbered heading lines
//! (e.g. "3. Exponent Rules"). Documents without such a page simply get an
//! empty table of contents.

use crate::pdf::PageText;
use regex_lite::Regex;

/// Derive table-of-contents entries from the first page of the document
pub fn derive_toc(pages: &[PageText]) -> Vec<String> {
    let Some(first) = pages.first() else {
        return Vec::new();
    };

    let heading = Regex::new(r"^\d{1,2}\.\s").unwrap();

    first
        .text
        .lines()
        .filter(|line| heading.is_match(line))
        .map(|line| line.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: u32, text: &str) -> PageText {
        PageText {
            number,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_numbered_headings_collected_in_order() {
        let pages = vec![page(
            1,
            "Algebra Review\n1. Solving Equations\n2. Exponent Rules\nSome intro text\n10. Word Problems",
        )];
        let toc = derive_toc(&pages);
        assert_eq!(
            toc,
            vec!["1. Solving Equations", "2. Exponent Rules", "10. Word Problems"]
        );
    }

    #[test]
    fn test_only_first_page_is_scanned() {
        let pages = vec![page(1, "No headings here"), page(2, "1. Late heading")];
        assert!(derive_toc(&pages).is_empty());
    }

    #[test]
    fn test_decimals_are_not_headings() {
        let pages = vec![page(1, "The value 3.14 appears mid-text\n127. Too long a number")];
        assert!(derive_toc(&pages).is_empty());
    }

    #[test]
    fn test_no_pages() {
        assert!(derive_toc(&[]).is_empty());
    }
}
