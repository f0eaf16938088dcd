//! Editor HTML -> Telegram HTML.
//!
//! Telegram's `parse_mode: HTML` accepts only a handful of tags
//! (`<b>`, `<i>`, `<u>`, `<s>`, `<code>`, `<a href>`). Everything else the
//! editor produces is folded into plain text: paragraphs and line breaks
//! become newlines, lists become `•`/`N.` lines, emoji widgets become the
//! literal character, unknown tags are dropped with their text kept.
//!
//! The tokenizer is regex based and never fails. A `<` that does not start a
//! recognizable tag is plain text and is escaped on output.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref TAG: Regex =
        Regex::new(r#"<(/?)([a-zA-Z][a-zA-Z0-9]*)((?:[^<>"']|"[^"]*"|'[^']*')*)>"#).unwrap();
    static ref COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref ATTR: Regex = Regex::new(
        r#"([a-zA-Z][a-zA-Z0-9_:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#
    )
    .unwrap();
    static ref ENTITY: Regex =
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});").unwrap();
    static ref INDENT_CLASS: Regex = Regex::new(r"ql-indent-([0-9])").unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Convert editor HTML into a string valid for `parse_mode: HTML`.
pub fn sanitize(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let html = COMMENT.replace_all(html, "");
    let mut renderer = Renderer::default();

    let mut last = 0;
    for caps in TAG.captures_iter(&html) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        if whole.start > last {
            renderer.text(&html[last..whole.start]);
        }
        last = whole.end;

        let name = caps[2].to_ascii_lowercase();
        let attrs = caps.get(3).map_or("", |m| m.as_str());
        if caps[1].is_empty() {
            renderer.open(&name, attrs);
        } else {
            renderer.close(&name);
        }
    }
    if last < html.len() {
        renderer.text(&html[last..]);
    }

    renderer.finish()
}

/// Text as the reader sees it: tags stripped, entities decoded.
pub fn plain_text(html: &str) -> String {
    decode_entities(&TAG.replace_all(html, ""))
}

/// Length the way Telegram counts it (UTF-16 code units), on plain text.
pub fn plain_len(html: &str) -> usize {
    plain_text(html).encode_utf16().count()
}

pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

pub fn decode_entities(s: &str) -> String {
    let decoded = ENTITY.replace_all(s, |caps: &Captures| {
        let name = &caps[1];
        let c = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = name.strip_prefix('#') {
            dec.parse().ok().and_then(char::from_u32)
        } else {
            named_entity(name)
        };

        match c {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    });

    decoded.replace('\u{a0}', " ").replace('\u{feff}', "")
}

fn named_entity(name: &str) -> Option<char> {
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "laquo" => '«',
        "raquo" => '»',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "bull" => '•',
        "middot" => '·',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "deg" => '°',
        "times" => '×',
        "euro" => '€',
        _ => return None,
    })
}

fn attr(attrs: &str, name: &str) -> Option<String> {
    ATTR.captures_iter(attrs)
        .find(|caps| caps[1].eq_ignore_ascii_case(name))
        .and_then(|caps| caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4)))
        .map(|m| decode_entities(m.as_str()))
}

/// `data-unicode="1f600"` or `"1f1fa-1f1f8"` on an emoji widget span.
fn emoji(attrs: &str) -> Option<String> {
    let class = attr(attrs, "class")?;
    if !class.contains("ql-emoji") {
        return None;
    }

    attr(attrs, "data-unicode")?
        .split('-')
        .map(|code| u32::from_str_radix(code.trim(), 16).ok().and_then(char::from_u32))
        .collect()
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div" | "li" | "ul" | "ol" | "blockquote" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Inline {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
}

impl Inline {
    fn from_tag(name: &str) -> Option<Self> {
        Some(match name {
            "b" | "strong" => Inline::Bold,
            "i" | "em" => Inline::Italic,
            "u" | "ins" => Inline::Underline,
            "s" | "del" | "strike" => Inline::Strike,
            "code" | "pre" => Inline::Code,
            _ => return None,
        })
    }

    fn tag(self) -> &'static str {
        match self {
            Inline::Bold => "b",
            Inline::Italic => "i",
            Inline::Underline => "u",
            Inline::Strike => "s",
            Inline::Code => "code",
        }
    }
}

struct List {
    ordered: bool,
    /// Next number per `ql-indent` level inside this list.
    counters: Vec<usize>,
}

impl List {
    fn new(ordered: bool) -> Self {
        Self { ordered, counters: vec![] }
    }

    /// Deeper levels restart whenever an item at `indent` appears.
    fn number(&mut self, indent: usize) -> usize {
        self.counters.truncate(indent + 1);
        self.counters.resize(indent + 1, 1);
        let n = self.counters[indent];
        self.counters[indent] += 1;
        n
    }

    fn bullet(&mut self, indent: usize) {
        self.counters.truncate(indent + 1);
    }
}

struct Link {
    href: String,
    text: String,
}

/// Content being dropped until `tag` closes `depth` times.
struct Skip {
    tag: String,
    depth: usize,
}

#[derive(Default)]
struct Renderer {
    out: String,
    /// Open inline tags and whether each was actually written out.
    open: Vec<(Inline, bool)>,
    lists: Vec<List>,
    link: Option<Link>,
    skip: Option<Skip>,
}

impl Renderer {
    fn text(&mut self, raw: &str) {
        if self.skip.is_some() {
            return;
        }
        let text = decode_entities(raw);
        match self.link.as_mut() {
            Some(link) => link.text.push_str(&text),
            None => self.out.push_str(&escape_text(&text)),
        }
    }

    fn open(&mut self, name: &str, attrs: &str) {
        if let Some(skip) = self.skip.as_mut() {
            if skip.tag == name {
                skip.depth += 1;
            }
            return;
        }

        if let Some(link) = self.link.as_mut() {
            if name == "br" {
                link.text.push(' ');
            }
            return;
        }

        match name {
            "span" => {
                if let Some(emoji) = emoji(attrs) {
                    self.out.push_str(&emoji);
                    self.skip = Some(Skip { tag: "span".into(), depth: 1 });
                }
            }
            "script" | "style" => {
                self.skip = Some(Skip { tag: name.into(), depth: 1 });
            }
            "br" => self.out.push('\n'),
            "ul" | "ol" => {
                self.start_line();
                self.lists.push(List::new(name == "ol"));
            }
            "li" => self.list_item(attrs),
            "a" => {
                let href = attr(attrs, "href").unwrap_or_default().trim().to_string();
                self.link = Some(Link { href, text: String::new() });
            }
            _ => {
                if let Some(kind) = Inline::from_tag(name) {
                    self.open_inline(kind);
                }
            }
        }
    }

    fn close(&mut self, name: &str) {
        if let Some(skip) = self.skip.as_mut() {
            if skip.tag == name {
                skip.depth -= 1;
                if skip.depth == 0 {
                    self.skip = None;
                }
            }
            return;
        }

        if self.link.is_some() {
            if name == "a" {
                self.finish_link();
                return;
            }
            if !is_block(name) {
                return;
            }
            // unclosed <a> ends with its block
            self.finish_link();
        }

        match name {
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" | "div" => {
                self.out.push('\n')
            }
            "li" => self.start_line(),
            "ul" | "ol" => {
                self.lists.pop();
            }
            _ => {
                if let Some(kind) = Inline::from_tag(name) {
                    self.close_inline(kind);
                }
            }
        }
    }

    fn start_line(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn list_item(&mut self, attrs: &str) {
        self.start_line();

        let extra = attr(attrs, "class")
            .and_then(|class| INDENT_CLASS.captures(&class).and_then(|c| c[1].parse().ok()))
            .unwrap_or(0usize);
        let depth = self.lists.len().saturating_sub(1) + extra;
        self.out.push_str(&"  ".repeat(depth));

        let ordered = match attr(attrs, "data-list").as_deref() {
            Some("bullet") => false,
            Some("ordered") => true,
            _ => self.lists.last().map_or(false, |l| l.ordered),
        };

        match self.lists.last_mut() {
            Some(list) if ordered => {
                let n = list.number(extra);
                self.out.push_str(&format!("{n}. "));
            }
            Some(list) => {
                list.bullet(extra);
                self.out.push_str("• ");
            }
            None => self.out.push_str("• "),
        }
    }

    fn in_code(&self) -> bool {
        self.open.iter().any(|(k, written)| *k == Inline::Code && *written)
    }

    fn open_inline(&mut self, kind: Inline) {
        let blocked = self.in_code() || self.open.iter().any(|(k, written)| *k == kind && *written);
        if !blocked {
            self.out.push('<');
            self.out.push_str(kind.tag());
            self.out.push('>');
        }
        self.open.push((kind, !blocked));
    }

    /// Closing a tag that is not on top closes the ones above it and reopens
    /// them afterwards, so the output always nests.
    fn close_inline(&mut self, kind: Inline) {
        let Some(pos) = self.open.iter().rposition(|(k, _)| *k == kind) else {
            return;
        };

        let above: Vec<(Inline, bool)> = self.open.drain(pos + 1..).collect();
        for (k, written) in above.iter().rev() {
            if *written {
                self.write_close(*k);
            }
        }
        if let Some((k, true)) = self.open.pop() {
            self.write_close(k);
        }
        for (k, _) in above {
            self.open_inline(k);
        }
    }

    fn write_close(&mut self, kind: Inline) {
        self.out.push_str("</");
        self.out.push_str(kind.tag());
        self.out.push('>');
    }

    fn finish_link(&mut self) {
        let Some(link) = self.link.take() else {
            return;
        };

        let text = if link.text.trim().is_empty() { link.href.clone() } else { link.text };
        if link.href.is_empty() || self.in_code() {
            self.out.push_str(&escape_text(&text));
        } else {
            self.out.push_str(&format!(
                "<a href=\"{}\">{}</a>",
                escape_attr(&link.href),
                escape_text(&text)
            ));
        }
    }

    fn finish(mut self) -> String {
        self.finish_link();
        while let Some((kind, written)) = self.open.pop() {
            if written {
                self.write_close(kind);
            }
        }

        BLANK_LINES.replace_all(&self.out, "\n\n").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("   "), "");
        assert_eq!(sanitize("<p><br></p>"), "");
    }

    #[test]
    fn test_paragraphs_and_inline_tags() {
        assert_eq!(sanitize("<p>Hello <b>world</b></p>"), "Hello <b>world</b>");
        assert_eq!(
            sanitize("<p><strong>a</strong> <em>b</em> <u>c</u> <del>d</del> <pre>e</pre></p>"),
            "<b>a</b> <i>b</i> <u>c</u> <s>d</s> <code>e</code>"
        );
        assert_eq!(sanitize("<p>one</p><p>two</p>"), "one\ntwo");
        assert_eq!(sanitize("a<br>b<br/>c"), "a\nb\nc");
    }

    #[test]
    fn test_attributes_dropped_from_inline_tags() {
        assert_eq!(sanitize(r#"<strong class="x" style="color:red">a</strong>"#), "<b>a</b>");
    }

    #[test]
    fn test_blank_lines_collapse() {
        assert_eq!(sanitize("<p>a</p><p><br></p><p><br></p><p><br></p><p>b</p>"), "a\n\nb");
    }

    #[test]
    fn test_emoji_widget() {
        let html = r#"<p>hi <span class="ql-emojiblot" data-unicode="1f600"><span>﻿<span class="ap">😀</span>﻿</span></span>!</p>"#;
        assert_eq!(sanitize(html), "hi 😀!");

        let flag = r#"<span class="ql-emoji" data-unicode="1f1fa-1f1f8"></span>"#;
        assert_eq!(sanitize(flag), "🇺🇸");
    }

    #[test]
    fn test_links() {
        assert_eq!(
            sanitize(r#"<a href="https://example.com/?a=1&amp;b=2" target="_blank"><b>site</b></a>"#),
            r#"<a href="https://example.com/?a=1&amp;b=2">site</a>"#
        );
        assert_eq!(sanitize(r#"<a href="">bare</a>"#), "bare");
        assert_eq!(
            sanitize(r#"<a href='https://e.com/"q"'>x</a>"#),
            r#"<a href="https://e.com/&quot;q&quot;">x</a>"#
        );
    }

    #[test]
    fn test_lists() {
        assert_eq!(sanitize("<ul><li>one</li><li>two</li></ul>"), "• one\n• two");
        assert_eq!(sanitize("<p>Steps</p><ol><li>a</li><li>b</li></ol><p>end</p>"), "Steps\n1. a\n2. b\nend");
        assert_eq!(
            sanitize(r#"<ol><li data-list="bullet">x</li><li data-list="ordered">y</li><li data-list="ordered" class="ql-indent-1">z</li></ol>"#),
            "• x\n1. y\n  1. z"
        );
        assert_eq!(sanitize("<ul><li>a<ul><li>b</li></ul></li></ul>"), "• a\n  • b");
    }

    #[test]
    fn test_quill_indented_ordered_items_count_per_level() {
        let html = concat!(
            r#"<ol><li data-list="ordered">a</li>"#,
            r#"<li data-list="ordered" class="ql-indent-1">b</li>"#,
            r#"<li data-list="ordered" class="ql-indent-1">c</li>"#,
            r#"<li data-list="ordered">d</li>"#,
            r#"<li data-list="ordered" class="ql-indent-1">e</li></ol>"#,
        );
        assert_eq!(sanitize(html), "1. a\n  1. b\n  2. c\n2. d\n  1. e");
    }

    #[test]
    fn test_empty_div_is_a_line() {
        assert_eq!(sanitize("<div>a</div><div></div><div>b</div>"), "a\n\nb");
        assert_eq!(sanitize("<div>a</div><div>b</div>"), "a\nb");
    }

    #[test]
    fn test_unclosed_link_ends_with_block() {
        assert_eq!(
            sanitize(r#"<p><a href="https://example.com">a</p><p>b</p>"#),
            "<a href=\"https://example.com\">a</a>\nb"
        );
        assert_eq!(
            sanitize(r#"<ul><li><a href="https://e.com">x</li><li>y</li></ul>"#),
            "• <a href=\"https://e.com\">x</a>\n• y"
        );
    }

    #[test]
    fn test_entities() {
        assert_eq!(
            sanitize("<p>&laquo;quote&raquo; &ndash; &mdash; &hellip; &quot;x&quot; &apos;y&apos;&nbsp;z</p>"),
            "«quote» – — … \"x\" 'y' z"
        );
        assert_eq!(sanitize("<p>1 &lt; 2 &amp;&amp; 3 &gt; 2</p>"), "1 &lt; 2 &amp;&amp; 3 &gt; 2");
        assert_eq!(sanitize("&#128512; &#x41;"), "😀 A");
        assert_eq!(sanitize("&unknown;"), "&amp;unknown;");
    }

    #[test]
    fn test_unknown_and_malformed_markup() {
        assert_eq!(sanitize("<h1>Title</h1><span style='x'>body</span>"), "Title\nbody");
        assert_eq!(sanitize("a < b and <b>bold"), "a &lt; b and <b>bold</b>");
        assert_eq!(sanitize("</i>stray<b"), "stray&lt;b");
        assert_eq!(sanitize("<script>alert(1)</script>ok"), "ok");
        assert_eq!(sanitize("<!-- note -->ok"), "ok");
    }

    #[test]
    fn test_output_always_nests() {
        assert_eq!(sanitize("<b><i>x</b>y</i>"), "<b><i>x</i></b><i>y</i>");
        assert_eq!(sanitize("<b><strong>x</strong></b>"), "<b>x</b>");
        assert_eq!(sanitize("<code><b>x</b></code>"), "<code>x</code>");
    }

    #[test]
    fn test_idempotent_on_supported_tags() {
        let inputs = [
            "<p>Hello <b>world</b></p>",
            "<p>a &amp; b &lt;c&gt;</p><p><br></p><p><br></p><p>d</p>",
            r#"<p><a href="https://example.com/?q=&quot;x&quot;">link <i>x</i></a></p>"#,
            "<ul><li><u>one</u></li><li><s>two</s></li></ul><ol><li>three</li></ol>",
            "<b><i>x</b>y</i><code>&lt;tag&gt;</code>",
            "  lead and trail  &unknown; ",
        ];

        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {input}");
        }
    }

    #[test]
    fn test_plain_text_len() {
        assert_eq!(plain_text("Hello <b>world</b> &amp; co"), "Hello world & co");
        assert_eq!(plain_len(r#"<a href="https://example.com">ab</a>"#), 2);
        assert_eq!(plain_len("😀"), 2);
    }
}
