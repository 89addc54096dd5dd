use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Tags whose content never counts as visible text.
const REMOVED_TAGS: &[&str] = &[
    "script", "style", "iframe", "noscript", "img", "svg", "video", "audio", "template",
];

/// Plain-text rendering of the visible part of a document's body.
///
/// Used when the markdown conversion fails. Elements hidden through the
/// `hidden` attribute, `aria-hidden="true"` or an inline `display:none` /
/// `visibility:hidden` style are skipped along with their subtree.
pub fn visible_text(document: &Html) -> String {
    let mut ctx = TextContext::default();
    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next());
    match body {
        Some(body) => visit_children(*body, &mut ctx),
        None => visit_children(*document.root_element(), &mut ctx),
    }
    ctx.into_text()
}

fn visit_node(node: NodeRef<'_, Node>, ctx: &mut TextContext) {
    match node.value() {
        Node::Text(text) => ctx.append_text(text),
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                visit_element(element, ctx);
            }
        }
        _ => visit_children(node, ctx),
    }
}

fn visit_element(element: ElementRef, ctx: &mut TextContext) {
    let tag = element.value().name().to_ascii_lowercase();
    if REMOVED_TAGS.contains(&tag.as_str()) || is_hidden(&element) {
        return;
    }
    match tag.as_str() {
        "br" => ctx.ensure_newline(),
        "p" | "div" | "section" | "article" | "header" | "footer" | "nav" | "main" | "aside"
        | "figure" | "figcaption" | "table" | "tr" | "li" | "ul" | "ol" | "blockquote"
        | "address" | "pre" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "hr" => {
            ctx.ensure_newline();
            visit_children(*element, ctx);
            ctx.ensure_newline();
        }
        "td" | "th" => {
            visit_children(*element, ctx);
            ctx.append_text(" ");
        }
        _ => visit_children(*element, ctx),
    }
}

fn visit_children(node: NodeRef<'_, Node>, ctx: &mut TextContext) {
    for child in node.children() {
        visit_node(child, ctx);
    }
}

fn is_hidden(element: &ElementRef) -> bool {
    let el = element.value();
    if el.attr("hidden").is_some() {
        return true;
    }
    if el
        .attr("aria-hidden")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    {
        return true;
    }
    el.attr("style").is_some_and(|style| {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        compact.contains("display:none") || compact.contains("visibility:hidden")
    })
}

#[derive(Default)]
struct TextContext {
    builder: String,
    last_char: Option<char>,
}

impl TextContext {
    fn into_text(self) -> String {
        self.builder
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn append_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                if self.last_char.is_none()
                    || self.last_char == Some(' ')
                    || self.last_char == Some('\n')
                {
                    continue;
                }
                self.push_char(' ');
            } else {
                self.push_char(ch);
            }
        }
    }

    fn ensure_newline(&mut self) {
        if self.last_char == Some('\n') || self.builder.is_empty() {
            return;
        }
        self.push_char('\n');
    }

    fn push_char(&mut self, ch: char) {
        self.builder.push(ch);
        self.last_char = Some(ch);
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::visible_text;

    fn text_of(html: &str) -> String {
        visible_text(&Html::parse_document(html))
    }

    #[test]
    fn removed_tags_and_hidden_elements_are_skipped() {
        let html = r#"<body>
            <p>Shown</p>
            <script>var secret = 1;</script>
            <div style="display: none">inline hidden</div>
            <div hidden>attribute hidden</div>
            <span aria-hidden="true">aria hidden</span>
            <svg><text>vector</text></svg>
            <p>Also shown</p>
        </body>"#;
        assert_eq!(text_of(html), "Shown\nAlso shown");
    }

    #[test]
    fn inline_whitespace_collapses_and_blocks_break_lines() {
        let html = "<body><h1>Title</h1><p>one\n   two <b>three</b></p>tail<br>end</body>";
        assert_eq!(text_of(html), "Title\none two three\ntail\nend");
    }

    #[test]
    fn document_without_text_is_empty() {
        assert_eq!(text_of("<body><img src=x><script>1</script></body>"), "");
    }
}
