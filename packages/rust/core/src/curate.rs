//! Link curation: doc-likeness scoring, categorisation and top-N selection.

use std::collections::HashSet;

use docsift_shared::{CandidatePage, Category};
use tracing::debug;

/// Substring keywords and their points. Each matches at most once.
const KEYWORDS: &[(&str, i64)] = &[
    ("getting-started", 55),
    ("get started", 55),
    ("getting started", 50),
    ("quickstart", 50),
    ("installation", 40),
    ("install", 35),
    ("introduction", 35),
    ("overview", 35),
    ("your first", 40),
    ("tutorial", 30),
    ("guide", 25),
    ("how to", 25),
    ("api", 30),
    ("reference", 28),
    ("configuration", 20),
    ("cli", 18),
    ("examples", 18),
    ("faq", 15),
    ("troubleshooting", 15),
    ("changelog", 8),
    ("release", 8),
    ("migration", 8),
];

const SHALLOW_BONUS_MAX: i64 = 10;
const LANDING_BONUS: i64 = 10;

/// Category keyword groups, checked in order; the first hit wins.
const CATEGORY_RULES: &[(Category, &[&str])] = &[
    (
        Category::Reference,
        &["reference", "references", "sdk", "cli", "configuration", "config", "schema"],
    ),
    (Category::Guides, &["tutorial", "guide", "how-to", "how to", "cookbook"]),
    (Category::Examples, &["example", "examples", "sample"]),
    (Category::Faq, &["faq", "troubleshooting", "troubleshoot", "error"]),
    (Category::Optional, &["changelog", "release", "migration"]),
];

/// Sum of keyword points found in `text` (matched case-insensitively).
pub fn keyword_score(text: &str) -> i64 {
    let text = text.to_lowercase();
    KEYWORDS
        .iter()
        .filter(|(kw, _)| text.contains(kw))
        .map(|(_, points)| points)
        .sum()
}

/// Non-empty `/`-separated segments of `path`.
pub fn path_depth(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

fn is_landing(page: &CandidatePage) -> bool {
    let title = page.title.trim().to_lowercase();
    if title == "index" || title == "home" {
        return true;
    }
    [page.link.as_str(), page.scoring_path()].iter().any(|s| {
        let s = s.trim_end_matches('/');
        s.ends_with("/docs") || s.ends_with("/documentation")
    })
}

/// Doc-likeness of one candidate.
///
/// Keywords over `title + " " + path`, plus `max(0, 10 - depth)`, plus 10 for
/// landing pages (title `index`/`home`, or a path ending in `/docs` or
/// `/documentation`). The shallowness and landing bonuses stack.
pub fn score(page: &CandidatePage) -> i64 {
    let path = page.scoring_path();
    let mut total = keyword_score(&format!("{} {}", page.title, path));
    total += (SHALLOW_BONUS_MAX - path_depth(path) as i64).max(0);
    if is_landing(page) {
        total += LANDING_BONUS;
    }
    total
}

/// Section for a page with this title and path.
pub fn classify(title: &str, path: &str) -> Category {
    let text = format!("{title} {path}").to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Docs)
}

/// Rank, deduplicate and truncate candidates.
///
/// Ordered by score descending, then category name, then lower-cased
/// title. The first (highest-ranked) candidate per canonical link is kept.
pub fn select(candidates: Vec<CandidatePage>, max_links: usize) -> Vec<CandidatePage> {
    let total = candidates.len();
    let mut scored: Vec<(i64, String, CandidatePage)> = candidates
        .into_iter()
        .map(|page| (score(&page), page.title.to_lowercase(), page))
        .collect();
    scored.sort_by(|(sa, ta, a), (sb, tb, b)| {
        sb.cmp(sa)
            .then_with(|| a.category.name().cmp(b.category.name()))
            .then_with(|| ta.cmp(tb))
    });

    let mut seen = HashSet::new();
    let curated: Vec<CandidatePage> = scored
        .into_iter()
        .map(|(_, _, page)| page)
        .filter(|page| seen.insert(page.dedup_key()))
        .take(max_links)
        .collect();

    debug!(candidates = total, curated = curated.len(), max_links, "curated links");
    curated
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn web(url: &str, title: &str) -> CandidatePage {
        let url = Url::parse(url).unwrap();
        let category = classify(title, url.path());
        CandidatePage::web(url, title, category)
    }

    #[test]
    fn quickstart_scores_keyword_plus_shallowness() {
        let page = web("https://example.com/docs/quickstart", "Quickstart");
        assert_eq!(score(&page), 50 + 8);
    }

    #[test]
    fn keywords_count_once_and_add_up() {
        assert_eq!(keyword_score("Install install INSTALL"), 35);
        // "installation" also contains "install".
        assert_eq!(keyword_score("Installation"), 40 + 35);
        assert_eq!(keyword_score("api reference"), 30 + 28);
        assert_eq!(keyword_score("blog post"), 0);
    }

    #[test]
    fn landing_and_shallow_bonuses_stack() {
        let docs_root = web("https://example.com/docs/", "Welcome");
        assert_eq!(score(&docs_root), 9 + 10);

        let home = web("https://example.com/", "Home");
        assert_eq!(score(&home), 10 + 10);

        let deep = web("https://example.com/a/b/c/d/e/f/g/h/i/j/k/l", "Leaf");
        assert_eq!(score(&deep), 0);
    }

    #[test]
    fn repo_candidates_score_on_source_path() {
        let page = CandidatePage::repo(
            "docs/guide/install.md",
            "https://github.com/acme/widget/blob/main/docs/guide/install.md",
            None,
            "Setup",
            Category::Guides,
        );
        // guide 25 + install 35 + depth 3 -> 7
        assert_eq!(score(&page), 25 + 35 + 7);
    }

    #[test]
    fn classification_order() {
        assert_eq!(classify("CLI Guide", "/docs/cli"), Category::Reference);
        assert_eq!(classify("Writing plugins", "/docs/guides/plugins"), Category::Guides);
        assert_eq!(classify("Samples", "/docs/samples"), Category::Examples);
        assert_eq!(classify("Common errors", "/docs/errors"), Category::Faq);
        assert_eq!(classify("Changelog", "/changelog"), Category::Optional);
        assert_eq!(classify("Overview", "/docs/overview"), Category::Docs);
    }

    #[test]
    fn ties_break_on_category_then_title() {
        let a = CandidatePage::web(Url::parse("https://example.com/x/zeta").unwrap(), "zeta", Category::Reference);
        let b = CandidatePage::web(Url::parse("https://example.com/x/Beta").unwrap(), "Beta", Category::Docs);
        let c = CandidatePage::web(Url::parse("https://example.com/x/alpha").unwrap(), "alpha", Category::Docs);
        assert_eq!(score(&a), score(&b));
        assert_eq!(score(&b), score(&c));

        let titles: Vec<String> = select(vec![a, b, c], 10).into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["alpha", "Beta", "zeta"]);
    }

    #[test]
    fn query_and_fragment_variants_collapse() {
        let pages = vec![
            web("https://example.com/docs/intro?ref=nav", "Intro"),
            web("https://example.com/docs/intro#setup", "Intro"),
            web("https://example.com/docs/intro/", "Intro"),
        ];
        assert_eq!(select(pages, 10).len(), 1);
    }

    #[test]
    fn output_length_is_min_of_unique_and_cap() {
        let pages: Vec<CandidatePage> = (0..12)
            .map(|i| web(&format!("https://example.com/p{}", i % 8), &format!("Page {}", i % 8)))
            .collect();
        assert_eq!(select(pages.clone(), 5).len(), 5);
        assert_eq!(select(pages, 30).len(), 8);
    }

    #[test]
    fn highest_scoring_duplicate_wins() {
        let plain = CandidatePage::web(Url::parse("https://example.com/start").unwrap(), "Start", Category::Docs);
        let better = CandidatePage::web(
            Url::parse("https://example.com/start?x=1").unwrap(),
            "Quickstart",
            Category::Docs,
        );
        let curated = select(vec![plain, better], 10);
        assert_eq!(curated.len(), 1);
        assert_eq!(curated[0].title, "Quickstart");
    }
}
