use crate::fragment::Attrs;

/// Legacy `<font size>` scale bounds.
pub const MIN_FONT_SIZE: u8 = 1;
pub const MAX_FONT_SIZE: u8 = 7;

/// Maps a pixel size onto the 1-7 `<font size>` scale.
pub fn px_to_font_bucket(px: f32) -> u8 {
    match px {
        px if px <= 10.0 => 1,
        px if px <= 12.0 => 2,
        px if px <= 14.0 => 3,
        px if px <= 18.0 => 4,
        px if px <= 24.0 => 5,
        px if px <= 36.0 => 6,
        _ => 7,
    }
}

pub fn parse_px(value: &str) -> Option<f32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f32>().ok().filter(|px| px.is_finite() && *px > 0.0)
}

const NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("white", "#ffffff"),
    ("red", "#ff0000"),
    ("green", "#008000"),
    ("lime", "#00ff00"),
    ("blue", "#0000ff"),
    ("yellow", "#ffff00"),
    ("orange", "#ffa500"),
    ("purple", "#800080"),
    ("gray", "#808080"),
    ("grey", "#808080"),
    ("silver", "#c0c0c0"),
    ("navy", "#000080"),
    ("teal", "#008080"),
    ("maroon", "#800000"),
    ("fuchsia", "#ff00ff"),
    ("aqua", "#00ffff"),
];

/// Normalizes a CSS colour (`#rgb`, `#rrggbb`, `rgb()`, `rgba()` or a basic
/// keyword) to lowercase `#rrggbb`.
pub fn css_color_to_hex(value: &str) -> Option<String> {
    let value = value.trim().to_ascii_lowercase();

    if let Some(hex) = value.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        return match hex.len() {
            3 => Some(hex.chars().fold(String::from("#"), |mut out, c| {
                out.push(c);
                out.push(c);
                out
            })),
            6 => Some(format!("#{hex}")),
            _ => None,
        };
    }

    if let Some(args) = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let channels: Vec<u8> = args
            .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .take(3)
            .map(|part| part.parse::<f32>().ok().map(|v| v.round().clamp(0.0, 255.0) as u8))
            .collect::<Option<Vec<_>>>()?;
        let [r, g, b] = channels.as_slice() else {
            return None;
        };
        return Some(format!("#{r:02x}{g:02x}{b:02x}"));
    }

    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, hex)| hex.to_string())
}

/// Declarations of an inline `style` attribute, in source order.
pub fn style_declarations(attrs: &Attrs) -> Vec<(String, String)> {
    let Some(style) = attrs.get("style") else {
        return Vec::new();
    };
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            (!name.is_empty() && !value.is_empty()).then_some((name, value))
        })
        .collect()
}

pub fn style_value(attrs: &Attrs, property: &str) -> Option<String> {
    style_declarations(attrs)
        .into_iter()
        .rev()
        .find(|(name, _)| name == property)
        .map(|(_, value)| value)
}

/// Drops `property` from the inline style. Returns whether anything changed.
pub fn remove_style_property(attrs: &mut Attrs, property: &str) -> bool {
    let declarations = style_declarations(attrs);
    if !declarations.iter().any(|(name, _)| name == property) {
        return false;
    }
    let kept: Vec<String> = declarations
        .into_iter()
        .filter(|(name, _)| name != property)
        .map(|(name, value)| format!("{name}: {value}"))
        .collect();
    if kept.is_empty() {
        attrs.remove("style");
    } else {
        attrs.insert("style".to_string(), format!("{};", kept.join("; ")));
    }
    true
}

pub fn is_bold_weight(value: &str) -> bool {
    match value.trim() {
        "bold" | "bolder" => true,
        other => other.parse::<u16>().is_ok_and(|weight| weight >= 600),
    }
}
