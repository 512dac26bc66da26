//! Awesome list documents: markdown link lists and link classification.
//!
//! A seed document groups list items under level-2 headings. Each heading is a
//! Category and each item below it a Subcategory whose link points to another
//! list document. Inside a Subcategory document every list item is a Repo.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::error::DomainError;
use crate::domain::tree::TreeNode;

/// Sections of a seed document that only repeat other headings.
const SKIPPED_SECTIONS: &[&str] = &["contents", "table of contents"];

/// Raw document filenames tried for a list repository, in order.
const README_NAMES: &[&str] = &["readme.md", "README.md"];

/// One `- [label](link)` item of a list document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Nearest preceding level-2 heading, if any
    pub section: Option<String>,
    pub label: String,
    pub link: String,
}

/// How a link found in a list document is treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkKind {
    /// Another list document on GitHub that can be expanded
    List { owner: String, repo: String },
    /// Any other absolute web link
    Terminal,
    /// Anchors, relative links and non-web schemes
    Ignored,
}

fn item_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // One level of nesting: `[a [b]]` labels, `(a_(b))` links
        Regex::new(
            r#"^\s*[-*+]\s+\[(?P<label>(?:[^\[\]]|\[[^\[\]]*\])+)\]\((?P<link>(?:[^()\s]|\([^()\s]*\))+)(?:\s+"[^"]*")?\)"#,
        )
        .expect("valid list item regex")
    })
}

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<level>#{1,6})\s+(?P<title>.+?)\s*#*\s*$").expect("valid heading regex"))
}

fn github_repo_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^https?://(?:www\.)?github\.com/(?P<owner>[A-Za-z0-9_.-]+)/(?P<repo>[A-Za-z0-9_.-]+?)(?:\.git)?(?:/|/blob/[^/]+/readme(?:\.md)?|/tree/[^/#?]+)?(?:#readme)?/?$",
        )
        .expect("valid github regex")
    })
}

/// Strip markdown emphasis and code marks from a label.
fn clean_label(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '*' || c == '_' || c == '`')
        .trim()
        .to_string()
}

/// Parse every list item of a markdown document.
///
/// Items inside fenced code blocks are skipped. Only level-2 headings start a
/// new section; deeper headings stay within the current one.
pub fn parse_entries(text: &str) -> Vec<ListEntry> {
    let mut entries = Vec::new();
    let mut section: Option<String> = None;
    let mut in_fence = false;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }

        if let Some(caps) = heading_regex().captures(trimmed) {
            if caps["level"].len() == 2 {
                section = Some(clean_label(&caps["title"]));
            }
            continue;
        }

        if let Some(caps) = item_regex().captures(line) {
            let label = clean_label(&caps["label"]);
            if label.is_empty() {
                continue;
            }
            entries.push(ListEntry {
                section: section.clone(),
                label,
                link: caps["link"].to_string(),
            });
        }
    }
    entries
}

impl LinkKind {
    /// Classify a link. Anything that is not clearly a GitHub list repository
    /// is never expanded.
    pub fn classify(link: &str) -> Self {
        let link = link.trim();
        if let Some(caps) = github_repo_regex().captures(link) {
            let owner = caps["owner"].to_string();
            let repo = caps["repo"].to_string();
            // Organisation level paths like github.com/topics/awesome are not lists
            if !matches!(owner.as_str(), "topics" | "orgs" | "sponsors" | "marketplace") {
                return LinkKind::List { owner, repo };
            }
        }
        let lower = link.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            LinkKind::Terminal
        } else {
            LinkKind::Ignored
        }
    }

    /// Candidate raw document URLs for a list link, in the order to try them.
    pub fn document_urls(&self) -> Vec<String> {
        match self {
            LinkKind::List { owner, repo } => README_NAMES
                .iter()
                .map(|name| {
                    format!(
                        "https://raw.githubusercontent.com/{}/{}/HEAD/{}",
                        owner, repo, name
                    )
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Candidate document URLs to fetch for a seed or subcategory link.
///
/// GitHub repository links are mapped to their raw readme; other web and
/// `file://` links are used as given.
pub fn document_urls_for(link: &str) -> Vec<String> {
    match LinkKind::classify(link) {
        kind @ LinkKind::List { .. } => kind.document_urls(),
        LinkKind::Terminal => vec![link.trim().to_string()],
        LinkKind::Ignored if link.trim().starts_with("file://") => vec![link.trim().to_string()],
        LinkKind::Ignored => Vec::new(),
    }
}

/// Build categories (with their subcategories, unexpanded) from a seed document.
///
/// Subcategory links that do not point to a list document are left out,
/// since a leaf at subcategory depth would break the Repo depth invariant.
pub fn parse_seed(source: &str, text: &str) -> Result<Vec<TreeNode>, DomainError> {
    let mut categories: Vec<TreeNode> = Vec::new();

    for entry in parse_entries(text) {
        let Some(section) = entry.section else {
            continue;
        };
        if SKIPPED_SECTIONS.contains(&section.to_ascii_lowercase().as_str()) {
            continue;
        }
        if !matches!(LinkKind::classify(&entry.link), LinkKind::List { .. }) {
            continue;
        }

        let idx = match categories.iter().position(|c| c.name == section) {
            Some(idx) => idx,
            None => {
                categories.push(TreeNode::new(section));
                categories.len() - 1
            }
        };
        categories[idx].add_node(TreeNode::with_url(entry.label, entry.link));
    }

    if categories.is_empty() {
        return Err(DomainError::InvalidDocument {
            url: source.to_string(),
            message: "no categories with list links found".to_string(),
        });
    }
    Ok(categories)
}

/// Build the Repo leaves of a subcategory document.
pub fn parse_repos(source: &str, text: &str) -> Result<Vec<TreeNode>, DomainError> {
    let mut parent = TreeNode::new("");
    for entry in parse_entries(text) {
        if matches!(LinkKind::classify(&entry.link), LinkKind::Ignored) {
            continue;
        }
        parent.add_node(TreeNode::with_url(entry.label, entry.link));
    }

    if parent.is_leaf() {
        return Err(DomainError::InvalidDocument {
            url: source.to_string(),
            message: "no repository links found".to_string(),
        });
    }
    Ok(parent.children().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"# Awesome

[![Awesome](https://awesome.re/badge.svg)](https://awesome.re)

## Contents

- [Platforms](#platforms)

## Platforms

- [Node.js](https://github.com/sindresorhus/awesome-nodejs#readme) - JavaScript runtime.
- [Website](https://nodejs.org) - not a list.

### Nested heading

- [Rust](https://github.com/rust-unofficial/awesome-rust#readme)

## Tools

```
- [Fenced](https://github.com/ignored/list)
```
- [CLI](https://github.com/agarrharr/awesome-cli-apps#readme)
"#;

    #[test]
    fn given_parenthesised_link_when_parsing_then_keeps_closing_paren() {
        let entries = parse_entries(
            "- [Rust](https://en.wikipedia.org/wiki/Rust_(programming_language)) - lang\n",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "Rust");
        assert_eq!(
            entries[0].link,
            "https://en.wikipedia.org/wiki/Rust_(programming_language)"
        );
    }

    #[test]
    fn given_bracketed_label_when_parsing_then_item_kept() {
        let entries = parse_entries(
            "- [Awesome [beta]](https://github.com/a/b)\n- [Docs](https://example.com/d \"Title\")\n",
        );
        let found: Vec<_> = entries
            .iter()
            .map(|e| (e.label.as_str(), e.link.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("Awesome [beta]", "https://github.com/a/b"),
                ("Docs", "https://example.com/d"),
            ]
        );
    }

    #[test]
    fn given_seed_when_parsing_then_builds_categories_with_list_links() {
        let categories = parse_seed("seed", SEED).unwrap();
        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Platforms", "Tools"]);
        assert_eq!(categories[0].child_names(), vec!["Node.js", "Rust"]);
        assert_eq!(categories[1].child_names(), vec!["CLI"]);
    }

    #[test]
    fn given_document_without_lists_when_parsing_seed_then_errors() {
        assert!(parse_seed("seed", "# Title\n\nplain text").is_err());
    }

    #[test]
    fn given_subcategory_document_when_parsing_repos_then_flattens_sections() {
        let text = "## Web\n- [express](https://github.com/expressjs/express)\n\
                    ## Tools\n- [nodemon](https://nodemon.io/) - restart\n- [anchor](#web)\n\
                    - [express](https://example.com/duplicate)\n";
        let repos = parse_repos("doc", text).unwrap();
        let names: Vec<_> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["express", "nodemon"]);
        assert_eq!(repos[0].url, "https://github.com/expressjs/express");
    }

    #[test]
    fn given_github_links_when_classifying_then_detects_lists() {
        assert_eq!(
            LinkKind::classify("https://github.com/sindresorhus/awesome-nodejs#readme"),
            LinkKind::List {
                owner: "sindresorhus".into(),
                repo: "awesome-nodejs".into()
            }
        );
        assert!(matches!(
            LinkKind::classify("https://github.com/a/b/blob/main/readme.md"),
            LinkKind::List { .. }
        ));
        assert_eq!(
            LinkKind::classify("https://github.com/a/b/issues/1"),
            LinkKind::Terminal
        );
        assert_eq!(
            LinkKind::classify("https://github.com/topics/awesome"),
            LinkKind::Terminal
        );
        assert_eq!(LinkKind::classify("#contents"), LinkKind::Ignored);
        assert_eq!(LinkKind::classify("docs/readme.md"), LinkKind::Ignored);
    }

    #[test]
    fn given_list_link_when_building_document_urls_then_tries_raw_readmes() {
        let urls = document_urls_for("https://github.com/a/b#readme");
        assert_eq!(
            urls,
            vec![
                "https://raw.githubusercontent.com/a/b/HEAD/readme.md",
                "https://raw.githubusercontent.com/a/b/HEAD/README.md",
            ]
        );
        assert_eq!(
            document_urls_for("https://example.com/list.md"),
            vec!["https://example.com/list.md"]
        );
        assert_eq!(
            document_urls_for("file:///tmp/seed.md"),
            vec!["file:///tmp/seed.md"]
        );
        assert!(document_urls_for("#anchor").is_empty());
    }
}
