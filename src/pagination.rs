//! Page counts and the bounded navigation bar for category listings.

use thiserror::Error;

/// Listings with at most this many pages link every page.
pub const MAX_LINKS: u64 = 25;

/// Below this page the bar shows the leading block 2..=MAX_LINKS.
const LEADING_BLOCK_UNTIL: u64 = 10;
/// Within this many pages of the end the bar runs through to the last page.
const TRAILING_SPAN: u64 = 15;
/// Links shown before the current page in the sliding window.
const LOOKBEHIND: u64 = 5;
/// Links shown after the current page in the sliding window.
const LOOKAHEAD: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid page number")]
pub struct InvalidPage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub page: u64,
    pub href: String,
}

/// Number of pages needed for `total_rows`. Callers handle the empty listing
/// before asking.
pub fn page_count(total_rows: u64, page_size: u64) -> u64 {
    debug_assert!(total_rows >= 1, "page_count called for an empty listing");
    debug_assert!(page_size >= 1, "page size must be positive");
    (total_rows - 1) / page_size + 1
}

/// Parse the `p` query parameter. Missing or empty means page 1.
pub fn parse_page_number(param: Option<&str>) -> Result<u64, InvalidPage> {
    match param.map(str::trim) {
        None | Some("") => Ok(1),
        Some(raw) => match raw.parse::<u64>() {
            Ok(0) | Err(_) => Err(InvalidPage),
            Ok(page) => Ok(page),
        },
    }
}

/// Link for one page of a category listing
pub fn page_href(category: &str, page: u64) -> String {
    format!("/categories/{category}?p={page}")
}

/// Build the navigation bar for `current_page` of `pages_count`.
///
/// Short listings link every page. Longer ones always link the first and last
/// page and, between them, one of three bands picked by where the current page
/// sits: the leading block, a window running to the end, or a window from five
/// before to fifteen after the current page.
pub fn build_navigation_bar(pages_count: u64, current_page: u64, category: &str) -> Vec<NavLink> {
    let link = |page| NavLink {
        page,
        href: page_href(category, page),
    };

    if pages_count <= MAX_LINKS {
        return (1..=pages_count).map(link).collect();
    }

    let middle = if current_page < LEADING_BLOCK_UNTIL {
        2..=MAX_LINKS
    } else if current_page >= pages_count - TRAILING_SPAN {
        (current_page - LOOKBEHIND)..=(pages_count - 1)
    } else {
        (current_page - LOOKBEHIND)..=(current_page + LOOKAHEAD)
    };

    std::iter::once(1)
        .chain(middle)
        .chain(std::iter::once(pages_count))
        .map(link)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(bar: &[NavLink]) -> Vec<u64> {
        bar.iter().map(|l| l.page).collect()
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(1, 15), 1);
        assert_eq!(page_count(15, 15), 1);
        assert_eq!(page_count(16, 15), 2);
        assert_eq!(page_count(45, 15), 3);
        assert_eq!(page_count(46, 15), 4);
    }

    #[test]
    fn test_parse_page_number() {
        assert_eq!(parse_page_number(None), Ok(1));
        assert_eq!(parse_page_number(Some("")), Ok(1));
        assert_eq!(parse_page_number(Some("3")), Ok(3));
        assert_eq!(parse_page_number(Some("0")), Err(InvalidPage));
        assert_eq!(parse_page_number(Some("-2")), Err(InvalidPage));
        assert_eq!(parse_page_number(Some("abc")), Err(InvalidPage));
        assert_eq!(parse_page_number(Some("1.5")), Err(InvalidPage));
    }

    #[test]
    fn test_single_page() {
        let bar = build_navigation_bar(1, 1, "x");
        assert_eq!(
            bar,
            vec![NavLink {
                page: 1,
                href: "/categories/x?p=1".to_string()
            }]
        );
    }

    #[test]
    fn test_short_listing_links_every_page() {
        assert_eq!(pages(&build_navigation_bar(3, 1, "x")), vec![1, 2, 3]);
        assert_eq!(
            pages(&build_navigation_bar(25, 20, "x")),
            (1..=25).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_leading_block() {
        let bar = build_navigation_bar(100, 9, "games");
        let mut expected = vec![1];
        expected.extend(2..=25);
        expected.push(100);
        assert_eq!(pages(&bar), expected);
        assert_eq!(bar.last().unwrap().href, "/categories/games?p=100");
    }

    #[test]
    fn test_trailing_window_near_end() {
        // 16 >= 30 - 15, so the window runs from 11 to the page before last
        let bar = build_navigation_bar(30, 16, "other");
        let mut expected = vec![1];
        expected.extend(11..=29);
        expected.push(30);
        assert_eq!(pages(&bar), expected);
    }

    #[test]
    fn test_sliding_window_in_the_middle() {
        let bar = build_navigation_bar(100, 50, "music");
        let mut expected = vec![1];
        expected.extend(45..=65);
        expected.push(100);
        assert_eq!(pages(&bar), expected);
        assert_eq!(bar.len(), 23);
    }

    #[test]
    fn test_band_boundaries() {
        // Page 10 leaves the leading block
        assert_eq!(pages(&build_navigation_bar(100, 10, "x"))[1], 5);
        // 84 is the last page of the middle band for 100 pages
        let bar = pages(&build_navigation_bar(100, 84, "x"));
        assert_eq!(bar[bar.len() - 2], 99);
        assert_eq!(bar[1], 79);
        let bar = pages(&build_navigation_bar(100, 85, "x"));
        assert_eq!(bar[1], 80);
        assert_eq!(bar[bar.len() - 2], 99);
    }
}
