//! Minimal HTML slicing for the dashboard pages.
//!
//! Not a parser: it finds elements by tag name, balances nesting of the same
//! tag and reads attributes from opening tags. Matching is ASCII
//! case-insensitive. Lowercasing ASCII keeps byte offsets, so indices found in
//! the lowercased copy are valid in the original.

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

fn tag_name(tag: &str) -> &str {
    let body = tag.trim_start_matches('<').trim_start_matches('/');
    let end = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(body.len());
    &body[..end]
}

fn is_open_at(lc: &str, tag: &str, at: usize) -> bool {
    let Some(rest) = lc.get(at + 1..) else {
        return false;
    };
    rest.starts_with(tag)
        && rest[tag.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_whitespace() || c == '>' || c == '/')
}

fn is_self_closing(lc: &str, at: usize) -> bool {
    lc[at..]
        .find('>')
        .is_some_and(|gt| lc[at..at + gt + 1].ends_with("/>"))
}

/// Byte offset of the next `<tag` opening at or after `from`.
fn find_open(lc: &str, tag: &str, from: usize) -> Option<usize> {
    let pat = format!("<{tag}");
    let mut i = from;
    loop {
        let at = lc.get(i..)?.find(&pat)? + i;
        if is_open_at(lc, tag, at) {
            return Some(at);
        }
        i = at + 1;
    }
}

/// Byte offset just past the close of the element opening at `start`.
fn element_end(lc: &str, tag: &str, start: usize) -> Option<usize> {
    let open_end = lc[start..].find('>')? + start + 1;
    if lc[start..open_end].ends_with("/>") {
        return Some(open_end);
    }

    let close = format!("</{tag}");
    let mut depth = 1usize;
    let mut i = open_end;
    loop {
        let next_close = lc[i..].find(&close)? + i;
        match find_open(lc, tag, i).filter(|&o| o < next_close) {
            Some(open) => {
                if !is_self_closing(lc, open) {
                    depth += 1;
                }
                i = open + 1;
            }
            None => {
                let end = lc[next_close..].find('>')? + next_close + 1;
                depth -= 1;
                if depth == 0 {
                    return Some(end);
                }
                i = end;
            }
        }
    }
}

/// Every `<tag>...</tag>` element in `s`, outermost first, in document order.
/// Unclosed elements are dropped.
pub fn elements<'a>(s: &'a str, tag: &str) -> Vec<&'a str> {
    let lc = s.to_ascii_lowercase();
    let tag = tag.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut from = 0;

    while let Some(start) = find_open(&lc, &tag, from) {
        match element_end(&lc, &tag, start) {
            Some(end) => {
                out.push(&s[start..end]);
                from = end;
            }
            None => break,
        }
    }
    out
}

/// Opening-tag offsets and elements, for callers that need the position.
pub fn elements_with_offsets<'a>(s: &'a str, tag: &str) -> Vec<(usize, &'a str)> {
    let lc = s.to_ascii_lowercase();
    let tag = tag.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut from = 0;

    while let Some(start) = find_open(&lc, &tag, from) {
        match element_end(&lc, &tag, start) {
            Some(end) => {
                out.push((start, &s[start..end]));
                from = end;
            }
            None => break,
        }
    }
    out
}

/// The parent element of the element whose opening tag starts at `pos`.
pub fn enclosing_element(s: &str, pos: usize) -> Option<&str> {
    let lc = s.to_ascii_lowercase();
    let mut depth = 0usize;
    let mut cursor = pos;

    while let Some(lt) = lc[..cursor].rfind('<') {
        cursor = lt;
        let Some(gt) = lc[lt..].find('>') else {
            continue;
        };
        let tag = &lc[lt..=lt + gt];
        if tag.starts_with("<!") || tag.ends_with("/>") {
            continue;
        }
        let name = tag_name(tag);
        if name.is_empty() || VOID_TAGS.contains(&name) {
            continue;
        }
        if tag.starts_with("</") {
            depth += 1;
            continue;
        }
        if depth > 0 {
            depth -= 1;
            continue;
        }
        let end = element_end(&lc, name, lt)?;
        return Some(&s[lt..end]);
    }
    None
}

/// Value of attribute `name` on the opening tag of `element`.
pub fn attr<'a>(element: &'a str, name: &str) -> Option<&'a str> {
    let open = &element[..element.find('>')?];
    let lc = open.to_ascii_lowercase();
    let pat = format!("{}=", name.to_ascii_lowercase());
    let mut from = 0;

    while let Some(rel) = lc[from..].find(&pat) {
        let at = from + rel;
        from = at + pat.len();
        if !lc[..at].ends_with(char::is_whitespace) {
            continue;
        }
        let rest = &open[from..];
        let quote = rest.chars().next()?;
        if quote == '"' || quote == '\'' {
            let value = &rest[1..];
            return value.find(quote).map(|close| &value[..close]);
        }
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '/')
            .unwrap_or(rest.len());
        return Some(&rest[..end]);
    }
    None
}

/// Attribute `name` of every `<tag>` inside `s`, including self-closing ones.
pub fn attr_values<'a>(s: &'a str, tag: &str, name: &str) -> Vec<&'a str> {
    let lc = s.to_ascii_lowercase();
    let tag = tag.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut from = 0;

    while let Some(start) = find_open(&lc, &tag, from) {
        if let Some(value) = attr(&s[start..], name) {
            out.push(value);
        }
        from = start + 1;
    }
    out
}

/// Content between the opening and closing tag.
pub fn inner(element: &str) -> &str {
    match (element.find('>'), element.rfind('<')) {
        (Some(oe), Some(cs)) if cs > oe => &element[oe + 1..cs],
        _ => "",
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Visible text with tags removed and whitespace collapsed.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for ch in s.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }

    decode_entities(&out)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_elements_balances_nesting() {
        let html = "<div id=a><div id=b>x</div></div><div id=c>y</div>";
        let found = elements(html, "div");
        assert_eq!(found, vec!["<div id=a><div id=b>x</div></div>", "<div id=c>y</div>"]);
    }

    #[test]
    fn test_elements_ignores_longer_tag_names() {
        let html = "<track src=x><tr><td>1</td></tr>";
        assert_eq!(elements(html, "tr"), vec!["<tr><td>1</td></tr>"]);
    }

    #[test]
    fn test_elements_case_insensitive() {
        let html = "<TD>One</TD><td>Two</td>";
        assert_eq!(elements(html, "td").len(), 2);
    }

    #[test]
    fn test_attr_quoted_and_bare() {
        assert_eq!(attr(r#"<a href="/terminal/5" class=x>"#, "href"), Some("/terminal/5"));
        assert_eq!(attr("<a class=x href='/t/1'>", "href"), Some("/t/1"));
        assert_eq!(attr("<a class=link>", "class"), Some("link"));
        assert_eq!(attr(r#"<a data-href="/no">"#, "href"), None);
    }

    #[test]
    fn test_attr_values_self_closing() {
        let html = r#"<svg><path d="M1 2"/><path d='M3 4'></path></svg>"#;
        assert_eq!(attr_values(html, "path", "d"), vec!["M1 2", "M3 4"]);
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<b>Lenina&nbsp;1</b>\n  <i>kv. 2</i>"), "Lenina 1 kv. 2");
        assert_eq!(strip_tags("A &amp; B"), "A & B");
        assert_eq!(strip_tags("<td>12</td><td>34</td>"), "12 34");
    }

    #[test]
    fn test_inner() {
        assert_eq!(inner("<td class=x>42</td>"), "42");
        assert_eq!(inner("<br>"), "");
    }

    #[test]
    fn test_enclosing_element_skips_siblings() {
        let html = r#"<li><span>w</span><br><a href="/t/1">T1</a></li>"#;
        let pos = html.find("<a").unwrap();
        assert_eq!(enclosing_element(html, pos), Some(html));
    }

    #[test]
    fn test_enclosing_element_nearest_parent() {
        let html = r#"<ul><li><a href="/t/1">T1</a></li><li><a href="/t/2">T2</a></li></ul>"#;
        let pos = html.find(r#"<a href="/t/2""#).unwrap();
        assert_eq!(
            enclosing_element(html, pos),
            Some(r#"<li><a href="/t/2">T2</a></li>"#)
        );
    }
}
