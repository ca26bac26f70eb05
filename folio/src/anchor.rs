//! Heading anchors and link targets found in a Markdown note.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use std::collections::HashMap;

/// A heading and the anchor name it can be reached by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub title: String,
    pub slug: String,
}

/// An inline link as written in the note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub text: String,
    pub target: String,
}

/// Headings and links of one document, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub headings: Vec<Heading>,
    pub links: Vec<Link>,
}

impl Outline {
    pub fn scan(src: &str) -> Self {
        let mut outline = Outline::default();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut heading: Option<(u8, String)> = None;
        let mut link: Option<(String, String)> = None;

        for event in Parser::new(src) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    heading = Some((level_number(level), String::new()));
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, title)) = heading.take() {
                        let title = title.trim().to_string();
                        let slug = unique_slug(&mut seen, slugify(&title));
                        outline.headings.push(Heading { level, title, slug });
                    }
                }
                Event::Start(Tag::Link { dest_url, .. }) => {
                    link = Some((String::new(), dest_url.into_string()));
                }
                Event::End(TagEnd::Link) => {
                    if let Some((text, target)) = link.take() {
                        outline.links.push(Link { text, target });
                    }
                }
                Event::Text(s) | Event::Code(s) => {
                    if let Some((_, title)) = heading.as_mut() {
                        title.push_str(&s);
                    }
                    if let Some((text, _)) = link.as_mut() {
                        text.push_str(&s);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if let Some((_, title)) = heading.as_mut() {
                        title.push(' ');
                    }
                    if let Some((text, _)) = link.as_mut() {
                        text.push(' ');
                    }
                }
                _ => {}
            }
        }
        outline
    }
}

fn level_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn unique_slug(seen: &mut HashMap<String, usize>, slug: String) -> String {
    let count = seen.entry(slug.clone()).or_insert(0);
    let out = if *count == 0 {
        slug
    } else {
        format!("{slug}-{count}")
    };
    *count += 1;
    out
}

/// Anchor name for a heading title: lowercase, whitespace and `-` become `-`,
/// `_` and alphanumerics are kept, everything else is dropped.
pub fn slugify(title: &str) -> String {
    title
        .trim()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() || c == '_' {
                Some(c.to_lowercase().collect::<String>())
            } else if c.is_whitespace() || c == '-' {
                Some("-".to_string())
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slugify_common_headings() {
        assert_eq!(slugify("Section 1"), "section-1");
        assert_eq!(slugify("section1"), "section1");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("snake_case & more"), "snake_case--more");
        assert_eq!(slugify("  Padded  "), "padded");
    }

    #[test]
    fn test_scan_collects_headings_in_order() {
        let outline = Outline::scan("# Intro\n\ntext\n\n## Details `code`\n\n### Intro\n");
        let slugs: Vec<_> = outline.headings.iter().map(|h| h.slug.as_str()).collect();
        assert_eq!(slugs, ["intro", "details-code", "intro-1"]);
        assert_eq!(outline.headings[1].level, 2);
        assert_eq!(outline.headings[1].title, "Details code");
    }

    #[test]
    fn test_scan_collects_links() {
        let outline =
            Outline::scan("See [below](#section1) or [the web](https://example.com).\n");
        assert_eq!(
            outline.links,
            vec![
                Link {
                    text: "below".into(),
                    target: "#section1".into()
                },
                Link {
                    text: "the web".into(),
                    target: "https://example.com".into()
                },
            ]
        );
    }

    #[test]
    fn test_headings_inside_code_blocks_are_ignored() {
        let outline = Outline::scan("```\n# not a heading\n```\n\n# Real\n");
        assert_eq!(outline.headings.len(), 1);
        assert_eq!(outline.headings[0].title, "Real");
    }

    proptest! {
        #[test]
        fn prop_slug_has_no_uppercase_or_spaces(title in "[ -~]{0,40}") {
            let slug = slugify(&title);
            prop_assert!(!slug.chars().any(|c| c.is_uppercase() || c.is_whitespace()));
            prop_assert_eq!(slugify(&slug), slug.clone());
        }
    }
}
