//! Condenses a webpage body into LLM-friendly plain text.

use log::debug;
use scraper::{ElementRef, Html, Selector};

/// Elements that never carry recipe content
const REMOVED_ELEMENTS: &str =
    "script, style, noscript, svg, iframe, canvas, link, meta, header, footer";

/// Elements whose text is kept, in document order
const CONTENT_ELEMENTS: &str =
    "h1,h2,h3,h4,h5,h6,p,li,dt,dd,th,td,figcaption,time,span,img,picture,source";

/// Attributes checked for an image URL, in priority order
const IMAGE_SOURCE_ATTRIBUTES: [&str; 3] = ["src", "data-src", "data-lazy-src"];

/// Extract the condensed text of `html`'s body.
///
/// Never fails: if the document has no body or anything goes wrong, the
/// input is returned unchanged.
pub fn sanitize(html: &str) -> String {
    match sanitized_body(html) {
        Ok(Some(text)) => text,
        Ok(None) => html.to_string(),
        Err(e) => {
            debug!("Sanitizer fell back to raw input: {}", e);
            html.to_string()
        }
    }
}

fn sanitized_body(html: &str) -> Result<Option<String>, String> {
    let body_selector = parse_selector("body")?;
    let removed_selector = parse_selector(REMOVED_ELEMENTS)?;
    let content_selector = parse_selector(CONTENT_ELEMENTS)?;

    let mut document = Html::parse_document(html);

    let Some((body_id, removed)) = document.select(&body_selector).next().map(|body| {
        let removed: Vec<_> = body.select(&removed_selector).map(|el| el.id()).collect();
        (body.id(), removed)
    }) else {
        return Ok(None);
    };

    for id in removed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let body = document
        .tree
        .get(body_id)
        .and_then(ElementRef::wrap)
        .ok_or("body element vanished while detaching")?;

    let blocks: Vec<String> = body
        .select(&content_selector)
        .filter_map(|el| {
            if el.value().name().eq_ignore_ascii_case("img") {
                image_line(&el)
            } else {
                let text = el.text().collect::<String>();
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
        })
        .collect();

    Ok(Some(collapse_horizontal_whitespace(
        &blocks.join("\n").replace('\r', ""),
    )))
}

fn parse_selector(selector: &str) -> Result<Selector, String> {
    Selector::parse(selector).map_err(|e| format!("invalid selector '{}': {:?}", selector, e))
}

/// `[img] <alt> | <url>`, or `None` when no URL can be resolved
fn image_line(el: &ElementRef) -> Option<String> {
    let element = el.value();
    let alt = element.attr("alt").unwrap_or("").trim();

    let src = IMAGE_SOURCE_ATTRIBUTES
        .iter()
        .filter_map(|name| element.attr(name))
        .find(|value| !value.is_empty())
        .unwrap_or("")
        .trim();

    let url = if src.is_empty() {
        element
            .attr("srcset")
            .unwrap_or("")
            .split(',')
            .find_map(|candidate| candidate.split_whitespace().next())
            .unwrap_or("")
    } else {
        src
    };

    if url.is_empty() {
        return None;
    }

    if alt.is_empty() {
        Some(format!("[img] {}", url))
    } else {
        Some(format!("[img] {} | {}", alt, url))
    }
}

/// Collapse runs of two or more spaces/tabs into one space
fn collapse_horizontal_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut run = String::new();

    for c in text.chars() {
        if c == ' ' || c == '\t' {
            run.push(c);
            continue;
        }
        flush_run(&mut result, &mut run);
        result.push(c);
    }
    flush_run(&mut result, &mut run);

    result
}

fn flush_run(result: &mut String, run: &mut String) {
    match run.chars().count() {
        0 => {}
        1 => result.push_str(run),
        _ => result.push(' '),
    }
    run.clear();
}
