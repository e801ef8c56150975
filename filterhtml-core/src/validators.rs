// File: filterhtml-core/src/validators.rs
//! Value purifiers for the built-in [`Semantic`](crate::spec::Semantic) kinds.
//!
//! Each function takes one raw, already quote-unwrapped value and returns the
//! purified value, or `None` to reject it. They hold no state and never look at
//! the surrounding markup.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::profiles::AllowedSchemes;
use crate::sanitizers::text::escape_outside;

static URL_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%[0-9a-fA-F]{2}").expect("valid percent-escape pattern"));

static CHARACTER_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&[#0-9A-Za-z]").expect("valid character reference pattern"));

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9a-f]{3}){1,2}$").expect("valid hex color pattern"));

static RGB_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgb\(\s*\d+%?\s*,\s*\d+%?\s*,\s*\d+%?\s*\)$").expect("valid rgb pattern")
});

static RGBA_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgba\(\s*\d+%?\s*,\s*\d+%?\s*,\s*\d+%?\s*,\s*(\d+\.)?\d+\s*\)$")
        .expect("valid rgba pattern")
});

static HSL_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^hsl\(\s*\d+\s*,\s*\d+%\s*,\s*\d+%\s*\)$").expect("valid hsl pattern")
});

static HSLA_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^hsla\(\s*\d+\s*,\s*\d+%\s*,\s*\d+%\s*,\s*(\d+\.)?\d+\s*\)$")
        .expect("valid hsla pattern")
});

static MEASUREMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?\d+(px|cm|pt|em|ex|pc|mm|in)?|\d+%)$").expect("valid measurement pattern")
});

static NAMED_COLORS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set = HashSet::new();
    set.extend([
        "aliceblue", "antiquewhite", "aqua", "aquamarine", "azure", "beige", "bisque",
        "black", "blanchedalmond", "blue", "blueviolet", "brown", "burlywood", "cadetblue",
        "chartreuse", "chocolate", "coral", "cornflowerblue", "cornsilk", "crimson", "cyan",
        "darkblue", "darkcyan", "darkgoldenrod", "darkgray", "darkgreen", "darkkhaki",
        "darkmagenta", "darkolivegreen", "darkorange", "darkorchid", "darkred", "darksalmon",
        "darkseagreen", "darkslateblue", "darkslategray", "darkturquoise", "darkviolet",
        "deeppink", "deepskyblue", "dimgray", "dimgrey", "dodgerblue", "firebrick",
        "floralwhite", "forestgreen", "fuchsia", "gainsboro", "ghostwhite", "gold",
        "goldenrod", "gray", "green", "greenyellow", "honeydew", "hotpink", "indianred",
        "indigo", "ivory", "khaki", "lavender", "lavenderblush", "lawngreen", "lemonchiffon",
        "lightblue", "lightcoral", "lightcyan", "lightgoldenrodyellow", "lightgray",
        "lightgreen", "lightpink", "lightsalmon", "lightseagreen", "lightskyblue",
        "lightslategray", "lightsteelblue", "lightyellow", "lime", "limegreen", "linen",
        "magenta", "maroon", "mediumaquamarine", "mediumblue", "mediumorchid",
        "mediumpurple", "mediumseagreen", "mediumslateblue", "mediumspringgreen",
        "mediumturquoise", "mediumvioletred", "midnightblue", "mintcream", "mistyrose",
        "moccasin", "navajowhite", "navy", "oldlace", "olive", "olivedrab", "orange",
        "orangered", "orchid", "palegoldenrod", "palegreen", "paleturquoise",
        "palevioletred", "papayawhip", "peachpuff", "peru", "pink", "plum", "powderblue",
        "purple", "red", "rosybrown", "royalblue", "saddlebrown", "salmon", "sandybrown",
        "seagreen", "seashell", "sienna", "silver", "skyblue", "slateblue", "slategray",
        "snow", "springgreen", "steelblue", "tan", "teal", "thistle", "tomato", "turquoise",
        "violet", "wheat", "white", "whitesmoke", "yellow", "yellowgreen",
    ]);
    set
});

/// Percent-encoding for characters that must never appear raw in a URL.
fn url_escape(c: char) -> Option<&'static str> {
    Some(match c {
        ' ' => "%20",
        '%' => "%25",
        '>' => "%3E",
        '<' => "%3C",
        '[' => "%5B",
        ']' => "%5D",
        '{' => "%7B",
        '}' => "%7D",
        '|' => "%7C",
        '\\' => "%5C",
        '^' => "%5E",
        _ => return None,
    })
}

/// Purifies a URL.
///
/// Unsafe characters are percent-encoded (existing `%XX` escapes are kept), a
/// leading `//` is refused unless protocol-relative URLs are allowed, and a
/// scheme, when present, must be in `schemes`. The text before the first `:` is
/// only a scheme if it contains neither `/` nor `#`.
///
/// A character reference before the first `/`, `?` or `#` is rejected, since a
/// browser decodes it and `javascript&colon;` would otherwise pass as scheme-less.
pub fn purify_url(value: &str, schemes: &AllowedSchemes) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let url = escape_outside(trimmed, &URL_ESCAPE, |c, out| match url_escape(c) {
        Some(escaped) => out.push_str(escaped),
        None => out.push(c),
    });

    if url.starts_with("//") && !schemes.allows_protocol_relative() {
        return None;
    }

    let scheme_region = url
        .find(|c| matches!(c, '/' | '?' | '#'))
        .map_or(url.as_str(), |end| &url[..end]);
    if CHARACTER_REFERENCE.is_match(scheme_region) {
        return None;
    }

    match url.split_once(':') {
        Some((scheme, _)) if scheme.contains('/') || scheme.contains('#') => Some(url),
        Some((scheme, _)) if schemes.allows(scheme) => Some(url),
        Some(_) => None,
        None => Some(url),
    }
}

/// Accepts named colors, `#rgb`, `#rrggbb` and `rgb()/rgba()/hsl()/hsla()`.
/// The accepted value is lowercased.
pub fn purify_color(value: &str) -> Option<String> {
    let color = value.to_ascii_lowercase();
    let valid = NAMED_COLORS.contains(color.as_str())
        || HEX_COLOR.is_match(&color)
        || RGB_COLOR.is_match(&color)
        || RGBA_COLOR.is_match(&color)
        || HSL_COLOR.is_match(&color)
        || HSLA_COLOR.is_match(&color);
    valid.then_some(color)
}

/// A CSS length: optional `-`, digits and a unit, or a bare percentage.
pub fn purify_measurement(value: &str) -> Option<String> {
    MEASUREMENT.is_match(value).then(|| value.to_string())
}

/// Parses an integer and renders it canonically (`007` becomes `7`).
pub fn purify_int(value: &str) -> Option<String> {
    value.trim().parse::<i64>().ok().map(|n| n.to_string())
}

/// ASCII letters only. The whole value is rejected if any other character is present.
pub fn purify_alpha(value: &str, allow_empty: bool) -> Option<String> {
    purify_class(value, allow_empty, |c| c.is_ascii_alphabetic())
}

/// ASCII letters and digits only.
pub fn purify_alphanumeric(value: &str, allow_empty: bool) -> Option<String> {
    purify_class(value, allow_empty, |c| c.is_ascii_alphanumeric())
}

/// A non-empty value made only of the characters in `allowed`.
pub fn purify_charset(value: &str, allowed: &str) -> Option<String> {
    purify_class(value, false, |c| allowed.contains(c))
}

fn purify_class(value: &str, allow_empty: bool, accept: impl Fn(char) -> bool) -> Option<String> {
    if value.is_empty() {
        return allow_empty.then(String::new);
    }
    value.chars().all(accept).then(|| value.to_string())
}

/// A boolean attribute is present with no value, an empty value, or its own name.
pub fn is_boolean_value(value: &str, attribute_name: &str) -> bool {
    value.is_empty() || value == attribute_name
}
