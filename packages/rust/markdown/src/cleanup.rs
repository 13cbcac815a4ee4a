//! Cleanup passes applied to converter output.
//!
//! Every pass is `&str -> String` and they run in a fixed order. Fenced code
//! blocks are left alone by the passes that touch inline markup.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("heading regex"));

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank run regex"));

static FENCE_LANG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(\s*)```(?:language-|lang-|highlight-|sourceCode\s+)([\w+#-]+)").expect("fence language regex")
});

static WRAPPER_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"</?(?:div|span|section|article|aside|header|figure|figcaption|details|summary|font|center)(?:\s[^>]*)?>",
    )
    .expect("wrapper tag regex")
});

/// Heading permalinks (`[¶](#x)`, `[#](#x)`) and links with no text.
static PERMALINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(?:¶|#|🔗|\\#)?\]\(#[^)]*\)").expect("permalink regex"));

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[([^\]]*)\]\(([^)\s]+)((?:\s+[^)]*)?)\)").expect("link regex"));

/// Run every pass over converter output.
pub fn tidy(md: &str, base_url: Option<&Url>) -> String {
    let mut out = md.replace("\r\n", "\n");
    out = demote_extra_h1s(&out);
    out = fix_fence_languages(&out);
    out = outside_fences(&out, |line| {
        let line = WRAPPER_TAG_RE.replace_all(line, "");
        PERMALINK_RE.replace_all(&line, "").into_owned()
    });
    if let Some(base) = base_url {
        out = outside_fences(&out, |line| absolutize_links(line, base));
    }
    out = trim_line_ends(&out);
    out = BLANK_RUN_RE.replace_all(&out, "\n\n").into_owned();
    finish(&out)
}

/// Apply `f` to each line that is not inside a fenced code block.
fn outside_fences(md: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut in_fence = false;
    md.lines()
        .map(|line| {
            if line.trim_start().starts_with("```") {
                in_fence = !in_fence;
                line.to_string()
            } else if in_fence {
                line.to_string()
            } else {
                f(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep the first H1; later ones become H2.
fn demote_extra_h1s(md: &str) -> String {
    let mut seen_h1 = false;
    outside_fences(md, |line| match HEADING_RE.captures(line) {
        Some(caps) if &caps[1] == "#" => {
            if seen_h1 {
                format!("## {}", &caps[2])
            } else {
                seen_h1 = true;
                line.to_string()
            }
        }
        _ => line.to_string(),
    })
}

fn fix_fence_languages(md: &str) -> String {
    FENCE_LANG_RE.replace_all(md, "$1```$2").into_owned()
}

fn absolutize_links(line: &str, base: &Url) -> String {
    LINK_RE
        .replace_all(line, |caps: &Captures| {
            let href = &caps[3];
            let keep = href.starts_with('#')
                || href.contains("://")
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
                || href.starts_with("data:");
            let target = if keep {
                href.to_string()
            } else {
                base.join(href).map(|u| u.to_string()).unwrap_or_else(|_| href.to_string())
            };
            format!("{}[{}]({}{})", &caps[1], &caps[2], target, &caps[4])
        })
        .into_owned()
}

fn trim_line_ends(md: &str) -> String {
    md.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

/// No leading blank lines, exactly one trailing newline; empty stays empty.
fn finish(md: &str) -> String {
    let body = md.trim_start_matches('\n').trim_end();
    if body.is_empty() {
        String::new()
    } else {
        format!("{body}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn second_h1_is_demoted_but_not_inside_code() {
        let md = "# One\n\ntext\n\n```sh\n# comment\n```\n\n# Two\n";
        assert_eq!(demote_extra_h1s(md), "# One\n\ntext\n\n```sh\n# comment\n```\n\n## Two");
    }

    #[test]
    fn fence_language_prefixes_are_stripped() {
        assert_eq!(fix_fence_languages("```language-js\nx\n```"), "```js\nx\n```");
        assert_eq!(fix_fence_languages("  ```lang-c++\n"), "  ```c++\n");
        assert_eq!(fix_fence_languages("```rust\n"), "```rust\n");
    }

    #[test]
    fn wrappers_and_permalinks_go_outside_code() {
        let md = "## Setup [¶](#setup)\n<div class=\"note\">Heads up</div>\n```html\n<div>kept</div>\n```";
        let out = tidy(md, None);
        assert_eq!(out, "## Setup\nHeads up\n```html\n<div>kept</div>\n```\n");
    }

    #[test]
    fn links_and_images_resolve_against_page() {
        let page = base("https://docs.example.com/guide/intro/");
        let out = absolutize_links(
            r#"[next](../setup/) ![logo](img/logo.png "Logo") [ext](https://other.dev/x) [top](#top) [mail](mailto:a@b.c)"#,
            &page,
        );
        assert_eq!(
            out,
            r#"[next](https://docs.example.com/guide/setup/) ![logo](https://docs.example.com/guide/intro/img/logo.png "Logo") [ext](https://other.dev/x) [top](#top) [mail](mailto:a@b.c)"#
        );
    }

    #[test]
    fn links_inside_code_are_untouched() {
        let page = base("https://example.com/a/");
        let md = "```md\n[rel](b)\n```\n[rel](b)";
        assert_eq!(tidy(md, Some(&page)), "```md\n[rel](b)\n```\n[rel](https://example.com/a/b)\n");
    }

    #[test]
    fn whitespace_is_normalised() {
        assert_eq!(tidy("\n\nLine 1   \r\n\n\n\n\nLine 2\t\n\n\n", None), "Line 1\n\nLine 2\n");
        assert_eq!(tidy("  \n\n", None), "");
    }
}
