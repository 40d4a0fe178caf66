//! Host element tag tables.
//!
//! Component names may not shadow these (case-insensitively). Tags that are
//! neither registered components nor listed here are rejected in strict mode,
//! except custom elements (any tag containing `-`).

const HTML_TAGS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "cite", "code", "col",
    "colgroup", "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div", "dl", "dt",
    "em", "embed", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "head", "header", "hgroup", "hr", "html", "i", "iframe", "img", "input", "ins",
    "kbd", "label", "legend", "li", "link", "main", "map", "mark", "menu", "meta", "meter",
    "nav", "noscript", "object", "ol", "optgroup", "option", "output", "p", "param", "picture",
    "pre", "progress", "q", "rp", "rt", "ruby", "s", "samp", "script", "search", "section",
    "select", "slot", "small", "source", "span", "strong", "style", "sub", "summary", "sup",
    "table", "tbody", "td", "template", "textarea", "tfoot", "th", "thead", "time", "title",
    "tr", "track", "u", "ul", "var", "video", "wbr",
];

const SVG_TAGS: &[&str] = &[
    "animate", "animatemotion", "animatetransform", "circle", "clippath", "defs", "desc",
    "ellipse", "feblend", "fecolormatrix", "fecomposite", "feflood", "fegaussianblur",
    "femerge", "femergenode", "feoffset", "filter", "foreignobject", "g", "image", "line",
    "lineargradient", "marker", "mask", "metadata", "mpath", "path", "pattern", "polygon",
    "polyline", "radialgradient", "rect", "set", "stop", "svg", "switch", "symbol", "text",
    "textpath", "tspan", "use", "view",
];

/// Whether `name` is a standard HTML or SVG element tag.
pub fn is_reserved(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    HTML_TAGS.contains(&lower.as_str()) || SVG_TAGS.contains(&lower.as_str())
}

/// Whether `tag` names a host element: a standard tag or a custom element.
pub fn is_host_tag(tag: &str) -> bool {
    tag.contains('-') || is_reserved(tag)
}
