use std::fmt::Write as _;

/// Wrap filled contract text in a minimal HTML document. Blank lines separate paragraphs.
pub fn render_contract_markup(title: &str, text: &str) -> String {
    let mut html = String::new();
    writeln!(html, "<!DOCTYPE html>").expect("write doctype");
    writeln!(html, "<html><head><meta charset=\"utf-8\">").expect("write head");
    writeln!(html, "<title>{}</title></head><body>", escape_html(title)).expect("write title");
    writeln!(html, "<h1>{}</h1>", escape_html(title)).expect("write heading");

    for paragraph in text
        .split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
    {
        let lines: Vec<String> = paragraph.lines().map(escape_html).collect();
        writeln!(html, "<p>{}</p>", lines.join("<br>")).expect("contract paragraph");
    }

    html.push_str("</body></html>\n");
    html
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
