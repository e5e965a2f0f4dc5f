// Approximate text metrics and cell fitting for the builtin Helvetica
// faces. The width model is a flat per-character average, which keeps the
// layout a pure function of its inputs.

/// Average Helvetica glyph advance as a fraction of the font size
const AVG_GLYPH_FRACTION: f32 = 0.5;

/// Points to millimetres
const PT_TO_MM: f32 = 0.352_778;

const ELLIPSIS: &str = "...";

/// Estimated rendered width of `text` in millimetres at `font_size` points
pub fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * char_width(font_size)
}

/// Width of one average character cell in millimetres
pub fn char_width(font_size: f32) -> f32 {
    font_size * AVG_GLYPH_FRACTION * PT_TO_MM
}

/// Fit `text` into `available` millimetres of cell interior.
///
/// Oversized text is truncated one character at a time, keeping a
/// three-character ellipsis suffix, until it fits. If even three raw
/// characters plus the ellipsis cannot fit, those are returned anyway;
/// the cell overflows rather than rendering empty. Never fails.
pub fn fit_cell_text(text: &str, available: f32, font_size: f32) -> String {
    if text_width(text, font_size) <= available {
        return text.to_string();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut keep = chars.len();

    while keep > 1 {
        keep -= 1;
        let candidate: String = chars.iter().take(keep).collect::<String>() + ELLIPSIS;

        if text_width(&candidate, font_size) <= available {
            return candidate;
        }
    }

    // Even one character plus the ellipsis overflows; fall back to the
    // first three raw characters plus ellipsis, overflow accepted
    chars.iter().take(3).collect::<String>() + ELLIPSIS
}

/// Greedy word wrap into lines no wider than `available` millimetres.
/// A single word wider than the line is hard-fit with `fit_cell_text`.
pub fn wrap_text(text: &str, available: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if text_width(&candidate, font_size) <= available {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(current);
            }
            if text_width(word, font_size) <= available {
                current = word.to_string();
            } else {
                lines.push(fit_cell_text(word, available, font_size));
                current = String::new();
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}
