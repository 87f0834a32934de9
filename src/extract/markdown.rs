use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Rule-based DOM → GFM walker. Fixed dialect: ATX headings, `-` bullets,
/// fenced code blocks that keep `<pre>` whitespace, `---` rules, `*`/`**`
/// emphasis, reference-style links. Image sources resolve against the
/// conversion base URL; with `preserve_images` off, `<img>`, `<figure>` and
/// `<iframe>` disappear entirely.
pub fn convert(html: &str, base: &Url, preserve_images: bool) -> String {
    let mut renderer = Renderer {
        base: base.clone(),
        preserve_images,
        refs: Vec::new(),
    };

    let fragment = Html::parse_fragment(html);
    let body = renderer.render_children(fragment.root_element(), Ctx::default());
    let mut out = tidy(&body);

    if !renderer.refs.is_empty() {
        out.push_str("\n\n");
        for (index, (href, title)) in renderer.refs.iter().enumerate() {
            match title {
                Some(t) => out.push_str(&format!("[{}]: {} \"{}\"\n", index + 1, href, t)),
                None => out.push_str(&format!("[{}]: {}\n", index + 1, href)),
            }
        }
    }

    out.trim().to_string()
}

#[derive(Clone, Copy, Default)]
struct Ctx {
    list_depth: usize,
}

struct Renderer {
    base: Url,
    preserve_images: bool,
    // Reference-link targets in first-use order; emitted as a trailer.
    refs: Vec<(String, Option<String>)>,
}

impl Renderer {
    fn render_children(&mut self, el: ElementRef, ctx: Ctx) -> String {
        let mut out = String::new();
        for child in el.children() {
            match child.value() {
                Node::Text(text) => {
                    let raw: &str = &text.text;
                    out.push_str(&collapse_whitespace(raw));
                }
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        out.push_str(&self.render_element(child_el, ctx));
                    }
                }
                _ => {}
            }
        }
        out
    }

    fn render_element(&mut self, el: ElementRef, ctx: Ctx) -> String {
        let name = el.value().name();
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                let text = self.render_children(el, ctx);
                let text = text.trim();
                if text.is_empty() {
                    String::new()
                } else {
                    format!("\n\n{} {}\n\n", "#".repeat(level), text)
                }
            }
            "p" => {
                let text = self.render_children(el, ctx);
                let text = text.trim();
                if text.is_empty() {
                    String::new()
                } else {
                    format!("\n\n{}\n\n", text)
                }
            }
            "br" => "\n".to_string(),
            "hr" => "\n\n---\n\n".to_string(),
            "strong" | "b" => self.wrap_inline(el, ctx, "**"),
            "em" | "i" => self.wrap_inline(el, ctx, "*"),
            "code" => {
                let text: String = el.text().collect();
                let text = text.trim();
                if text.is_empty() {
                    String::new()
                } else {
                    format!("`{}`", text)
                }
            }
            "pre" => self.render_code_block(el),
            "a" => self.render_link(el, ctx),
            "img" => self.render_image(el),
            "figure" => self.render_figure(el),
            // Reached only when no enclosing figure consumed it.
            "figcaption" => self.render_children(el, ctx),
            "ul" => self.render_list(el, false, ctx),
            "ol" => self.render_list(el, true, ctx),
            "li" => self.render_children(el, ctx),
            "blockquote" => self.render_blockquote(el, ctx),
            "table" => self.render_table(el, ctx),
            "iframe" | "script" | "style" | "noscript" | "template" | "head" | "svg" => {
                String::new()
            }
            "div" | "section" | "article" | "main" | "aside" | "header" | "footer" | "nav"
            | "body" | "html" => {
                let inner = self.render_children(el, ctx);
                if inner.trim().is_empty() {
                    String::new()
                } else {
                    format!("\n\n{}\n\n", inner.trim())
                }
            }
            _ => self.render_children(el, ctx),
        }
    }

    fn wrap_inline(&mut self, el: ElementRef, ctx: Ctx, marker: &str) -> String {
        let text = self.render_children(el, ctx);
        let text = text.trim();
        if text.is_empty() {
            String::new()
        } else {
            format!("{}{}{}", marker, text, marker)
        }
    }

    /// Fenced code block preserving the `<pre>` whitespace verbatim; the
    /// language comes from a `language-*`/`lang-*` class on the inner code
    /// element.
    fn render_code_block(&mut self, el: ElementRef) -> String {
        let code: String = el.text().collect();
        let code = code.trim_end_matches('\n').trim_start_matches('\n');
        if code.trim().is_empty() {
            return String::new();
        }

        let language = Selector::parse("code")
            .ok()
            .and_then(|sel| el.select(&sel).next())
            .and_then(|code_el| {
                code_el.value().classes().find_map(|class| {
                    class
                        .strip_prefix("language-")
                        .or_else(|| class.strip_prefix("lang-"))
                        .map(|l| l.to_string())
                })
            })
            .unwrap_or_default();

        format!("\n\n```{}\n{}\n```\n\n", language, code)
    }

    fn render_link(&mut self, el: ElementRef, ctx: Ctx) -> String {
        let text = self.render_children(el, ctx);
        let text = text.trim().to_string();
        let href = el.value().attr("href").map(str::trim).unwrap_or_default();
        if href.is_empty() {
            return text;
        }
        if text.is_empty() {
            return String::new();
        }
        let title = el
            .value()
            .attr("title")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string());
        self.refs.push((href.to_string(), title));
        format!("[{}][{}]", text, self.refs.len())
    }

    fn render_image(&mut self, el: ElementRef) -> String {
        if !self.preserve_images {
            return String::new();
        }
        let Some(src) = image_source(el) else {
            return String::new();
        };
        let resolved = resolve_source(&self.base, &src);

        let alt = el
            .value()
            .attr("alt")
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .or_else(|| el.value().attr("title").map(str::trim).filter(|t| !t.is_empty()))
            .unwrap_or("image");
        let title = el
            .value()
            .attr("title")
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != alt);

        match title {
            Some(t) => format!("![{}]({} \"{}\")", alt, resolved, t),
            None => format!("![{}]({})", alt, resolved),
        }
    }

    /// `<figure>` with an `<img>` becomes a standalone image whose alt text
    /// prefers the `<figcaption>`.
    fn render_figure(&mut self, el: ElementRef) -> String {
        if !self.preserve_images {
            return String::new();
        }

        let img = Selector::parse("img")
            .ok()
            .and_then(|sel| el.select(&sel).next());
        let Some(img) = img else {
            let inner = self.render_children(el, Ctx::default());
            let inner = inner.trim().to_string();
            return if inner.is_empty() {
                String::new()
            } else {
                format!("\n\n{}\n\n", inner)
            };
        };

        let Some(src) = image_source(img) else {
            return String::new();
        };
        let resolved = resolve_source(&self.base, &src);

        let caption = Selector::parse("figcaption")
            .ok()
            .and_then(|sel| el.select(&sel).next())
            .map(|cap| collapse_whitespace(&cap.text().collect::<String>()).trim().to_string())
            .filter(|c| !c.is_empty());
        let alt = caption
            .or_else(|| {
                img.value()
                    .attr("alt")
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(|a| a.to_string())
            })
            .or_else(|| {
                img.value()
                    .attr("title")
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(|t| t.to_string())
            })
            .unwrap_or_else(|| "image".to_string());

        format!("\n\n![{}]({})\n\n", alt, resolved)
    }

    fn render_list(&mut self, el: ElementRef, ordered: bool, ctx: Ctx) -> String {
        let inner_ctx = Ctx {
            list_depth: ctx.list_depth + 1,
        };

        let mut items = Vec::new();
        let mut index = 0usize;
        for child in el.children() {
            let Some(li) = ElementRef::wrap(child) else {
                continue;
            };
            if li.value().name() != "li" {
                continue;
            }
            index += 1;

            let content = self.render_children(li, inner_ctx);
            let content = tidy(content.trim());
            let marker = if ordered {
                format!("{}. ", index)
            } else {
                "- ".to_string()
            };
            let continuation = " ".repeat(marker.len());

            let mut lines = content.lines();
            let mut item = String::new();
            if let Some(first) = lines.next() {
                item.push_str(&marker);
                item.push_str(first);
            }
            for line in lines {
                item.push('\n');
                if line.is_empty() {
                    continue;
                }
                item.push_str(&continuation);
                item.push_str(line);
            }
            items.push(item);
        }

        if items.is_empty() {
            return String::new();
        }

        let list = items.join("\n");
        if ctx.list_depth == 0 {
            format!("\n\n{}\n\n", list)
        } else {
            // Nested list: newline-joined into the parent item, which indents it.
            format!("\n{}", list)
        }
    }

    fn render_blockquote(&mut self, el: ElementRef, ctx: Ctx) -> String {
        let inner = self.render_children(el, ctx);
        let inner = tidy(inner.trim());
        if inner.is_empty() {
            return String::new();
        }
        let quoted: Vec<String> = inner
            .lines()
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {}", line)
                }
            })
            .collect();
        format!("\n\n{}\n\n", quoted.join("\n"))
    }

    fn render_table(&mut self, el: ElementRef, ctx: Ctx) -> String {
        let row_sel = match Selector::parse("tr") {
            Ok(sel) => sel,
            Err(_) => return String::new(),
        };

        let mut rows: Vec<Vec<String>> = Vec::new();
        for tr in el.select(&row_sel) {
            let mut cells = Vec::new();
            for child in tr.children() {
                let Some(cell) = ElementRef::wrap(child) else {
                    continue;
                };
                if !matches!(cell.value().name(), "td" | "th") {
                    continue;
                }
                let text = self.render_children(cell, ctx);
                cells.push(text.trim().replace('\n', " ").replace('|', "\\|"));
            }
            if !cells.is_empty() {
                rows.push(cells);
            }
        }

        if rows.is_empty() {
            return String::new();
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut out = String::new();
        for (i, row) in rows.iter().enumerate() {
            let mut padded = row.clone();
            padded.resize(width, String::new());
            out.push_str(&format!("| {} |\n", padded.join(" | ")));
            if i == 0 {
                out.push_str(&format!("|{}\n", " --- |".repeat(width)));
            }
        }
        format!("\n\n{}\n\n", out.trim_end())
    }
}

/// Lazy-load attributes first; a populated `src` is often a placeholder.
/// Empty and `data:` sources are dropped.
fn image_source(el: ElementRef) -> Option<String> {
    let src = ["data-src", "data-lazy-src", "src"]
        .iter()
        .copied()
        .find_map(|attr| el.value().attr(attr).map(str::trim).filter(|s| !s.is_empty()))?;
    if src.starts_with("data:") {
        return None;
    }
    Some(src.to_string())
}

/// Resolve an image source against the conversion base URL. Already-absolute
/// URLs (any scheme) pass through unchanged; protocol-relative, absolute-path
/// and bare-relative forms join against the base.
fn resolve_source(base: &Url, src: &str) -> String {
    if Url::parse(src).is_ok() {
        return src.to_string();
    }
    base.join(src)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| src.to_string())
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out
}

/// Normalize block spacing: at most one blank line between blocks, trailing
/// space stripped, fenced code left untouched.
fn tidy(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_blank = false;
    let mut in_fence = false;

    for line in input.lines() {
        let is_fence_marker = line.trim_start().starts_with("```");

        if in_fence {
            out.push('\n');
            out.push_str(line);
            if is_fence_marker {
                in_fence = false;
            }
            continue;
        }

        if line.trim().is_empty() {
            pending_blank = true;
            continue;
        }

        if !out.is_empty() {
            out.push_str(if pending_blank { "\n\n" } else { "\n" });
        }
        pending_blank = false;
        out.push_str(line.trim_end());
        if is_fence_marker {
            in_fence = true;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://ex.com/x/y.html").expect("base url")
    }

    fn md(html: &str) -> String {
        convert(html, &base(), true)
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let out = md("<h1>Top</h1><p>First para.</p><h3>Deep</h3><p>Second para.</p>");
        assert_eq!(out, "# Top\n\nFirst para.\n\n### Deep\n\nSecond para.");
    }

    #[test]
    fn test_emphasis_and_rule() {
        let out = md("<p>plain <em>soft</em> and <strong>hard</strong></p><hr><p>after</p>");
        assert!(out.contains("plain *soft* and **hard**"));
        assert!(out.contains("\n\n---\n\n"));
    }

    #[test]
    fn test_unordered_and_ordered_lists() {
        let out = md("<ul><li>one</li><li>two</li></ul><ol><li>first</li><li>second</li></ol>");
        assert!(out.contains("- one\n- two"));
        assert!(out.contains("1. first\n2. second"));
    }

    #[test]
    fn test_nested_list_indented() {
        let out = md("<ul><li>outer<ul><li>inner</li></ul></li></ul>");
        assert!(out.contains("- outer\n  - inner"));
    }

    #[test]
    fn test_fenced_code_preserves_whitespace() {
        let out = md("<pre><code class=\"language-rust\">fn main() {\n    let x = 1;\n}\n</code></pre>");
        assert!(out.contains("```rust\nfn main() {\n    let x = 1;\n}\n```"));
    }

    #[test]
    fn test_reference_links() {
        let out = md(r#"<p>See <a href="https://example.com/doc">the docs</a> for more.</p>"#);
        assert!(out.contains("[the docs][1]"));
        assert!(out.ends_with("[1]: https://example.com/doc"));
    }

    #[test]
    fn test_image_lazy_source_resolution() {
        let out = md(r#"<p><img data-src="/a/b.png" src="data:image/png;base64,AAAA"></p>"#);
        assert!(out.contains("![image](https://ex.com/a/b.png)"));
        assert!(!out.contains("data:image"));
    }

    #[test]
    fn test_image_relative_forms() {
        assert!(md(r#"<img src="//cdn.ex.com/i.png" alt="cdn">"#)
            .contains("![cdn](https://cdn.ex.com/i.png)"));
        assert!(md(r#"<img src="pic.jpg" alt="near">"#)
            .contains("![near](https://ex.com/x/pic.jpg)"));
        assert!(md(r#"<img src="https://other.org/p.gif" alt="far">"#)
            .contains("![far](https://other.org/p.gif)"));
    }

    #[test]
    fn test_image_title_distinct_from_alt() {
        let out = md(r#"<img src="/i.png" alt="a chart" title="Quarterly totals">"#);
        assert!(out.contains(r#"![a chart](https://ex.com/i.png "Quarterly totals")"#));
    }

    #[test]
    fn test_preserve_images_off_elides_everything() {
        let html = r#"<p>text</p><img src="/i.png"><figure><img src="/j.png"><figcaption>cap</figcaption></figure><iframe src="/embed"></iframe>"#;
        let out = convert(html, &base(), false);
        assert_eq!(out, "text");
    }

    #[test]
    fn test_figure_uses_figcaption_as_alt() {
        let out = md(r#"<figure><img src="/shot.png" alt="raw"><figcaption>The control room</figcaption></figure>"#);
        assert!(out.contains("![The control room](https://ex.com/shot.png)"));
    }

    #[test]
    fn test_blockquote() {
        let out = md("<blockquote><p>quoted line</p></blockquote>");
        assert!(out.contains("> quoted line"));
    }

    #[test]
    fn test_simple_table() {
        let out = md(
            "<table><tr><th>Name</th><th>Count</th></tr><tr><td>a</td><td>1</td></tr></table>",
        );
        assert!(out.contains("| Name | Count |"));
        assert!(out.contains("| --- | --- |"));
        assert!(out.contains("| a | 1 |"));
    }

    #[test]
    fn test_inline_code() {
        let out = md("<p>run <code>cargo doc</code> locally</p>");
        assert!(out.contains("run `cargo doc` locally"));
    }

    #[test]
    fn test_container_noise_dropped() {
        let out = md("<div><script>alert(1)</script><p>kept</p><style>p{}</style></div>");
        assert_eq!(out, "kept");
    }
}
