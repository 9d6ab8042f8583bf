//! Value helpers: lengths, font sizes and `var()` substitution

/// Maximum nesting of `var()` references before a value is treated as invalid
const MAX_VAR_DEPTH: usize = 16;

/// Format a pixel quantity the way computed styles report it (`18.4px`)
pub fn format_px(px: f64) -> String {
    let rounded = (px * 1000.0).round() / 1000.0;
    format!("{rounded}px")
}

fn split_number(value: &str) -> Option<(f64, &str)> {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || ((c == '-' || c == '+') && i == 0)))
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    let number = value[..end].parse::<f64>().ok()?;
    number.is_finite().then_some((number, value[end..].trim()))
}

/// Resolve a `font-size` value to pixels.
///
/// Returns `None` for values this resolver does not understand; callers
/// treat those as inherited.
pub fn parse_font_size(value: &str, parent_px: f64, root_px: f64) -> Option<f64> {
    let value = value.trim().to_ascii_lowercase();
    let keyword = match value.as_str() {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(16.0),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        "xxx-large" => Some(48.0),
        "larger" => Some(parent_px * 1.2),
        "smaller" => Some(parent_px / 1.2),
        _ => None,
    };
    if keyword.is_some() {
        return keyword;
    }
    let (number, unit) = split_number(&value)?;
    let px = match unit {
        "px" => number,
        "em" => number * parent_px,
        "%" => number * parent_px / 100.0,
        "rem" => number * root_px,
        "pt" => number * 4.0 / 3.0,
        "pc" => number * 16.0,
        "in" => number * 96.0,
        "cm" => number * 96.0 / 2.54,
        "mm" => number * 96.0 / 25.4,
        "" if number == 0.0 => 0.0,
        _ => return None,
    };
    (px >= 0.0).then_some(px)
}

/// Replace every `var(--name[, fallback])` in `value`.
///
/// `lookup` returns the raw value of a custom property. Returns `None` when a
/// reference has neither a value nor a fallback (invalid at computed-value
/// time).
pub fn substitute_vars(value: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Option<String> {
    substitute_at_depth(value, lookup, 0)
}

fn substitute_at_depth(
    value: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
    depth: usize,
) -> Option<String> {
    if depth > MAX_VAR_DEPTH {
        return None;
    }
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("var(") {
        out.push_str(&rest[..start]);
        let args_start = start + "var(".len();
        let close = matching_paren(&rest[args_start..])?;
        let args = &rest[args_start..args_start + close];
        let (name, fallback) = match split_first_comma(args) {
            Some((name, fallback)) => (name.trim(), Some(fallback.trim())),
            None => (args.trim(), None),
        };
        let replacement = match lookup(name).filter(|v| !v.trim().is_empty()) {
            Some(raw) => substitute_at_depth(&raw, lookup, depth + 1)?,
            None => substitute_at_depth(fallback?, lookup, depth + 1)?,
        };
        out.push_str(replacement.trim());
        rest = &rest[args_start + close + 1..];
    }
    out.push_str(rest);
    Some(out)
}

/// Byte offset of the `)` closing an already opened parenthesis
fn matching_paren(input: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn split_first_comma(input: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Some((&input[..i], &input[i + 1..])),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_size_units() {
        assert_eq!(parse_font_size("20px", 16.0, 16.0), Some(20.0));
        assert_eq!(parse_font_size("1.5em", 20.0, 16.0), Some(30.0));
        assert_eq!(parse_font_size("150%", 10.0, 16.0), Some(15.0));
        assert_eq!(parse_font_size("2rem", 40.0, 16.0), Some(32.0));
        assert_eq!(parse_font_size("12pt", 16.0, 16.0), Some(16.0));
        assert_eq!(parse_font_size("LARGE", 16.0, 16.0), Some(18.0));
        assert_eq!(parse_font_size("calc(1em + 2px)", 16.0, 16.0), None);
        assert_eq!(parse_font_size("-3px", 16.0, 16.0), None);
    }

    #[test]
    fn test_format_px() {
        assert_eq!(format_px(16.0), "16px");
        assert_eq!(format_px(18.4), "18.4px");
        assert_eq!(format_px(1.0 / 3.0), "0.333px");
    }

    #[test]
    fn test_var_substitution() {
        let lookup = |name: &str| match name {
            "--line-spacing-factor" => Some("1.5".to_string()),
            "--alias" => Some("var(--line-spacing-factor)".to_string()),
            _ => None,
        };
        assert_eq!(
            substitute_vars("calc(1.4 * var(--line-spacing-factor, 1))", &lookup).as_deref(),
            Some("calc(1.4 * 1.5)")
        );
        assert_eq!(substitute_vars("var(--alias)", &lookup).as_deref(), Some("1.5"));
        assert_eq!(
            substitute_vars("var(--missing, var(--nope, 2px))", &lookup).as_deref(),
            Some("2px")
        );
        assert_eq!(substitute_vars("var(--missing)", &lookup), None);
    }

    #[test]
    fn test_var_cycle_is_invalid() {
        let lookup = |_: &str| Some("var(--loop)".to_string());
        assert_eq!(substitute_vars("var(--loop)", &lookup), None);
    }
}
