use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

/// Deterministic fallback ruler: a flat per-character advance, with a
/// floor for blank labels so empty cards still get a sensible box.
pub const STUB_CHAR_WIDTH: f32 = 7.0;
pub const STUB_BLANK_WIDTH: f32 = 40.0;

pub fn stub_measure(text: &str) -> f32 {
    if text.trim().is_empty() {
        return STUB_BLANK_WIDTH;
    }
    text.chars().count() as f32 * STUB_CHAR_WIDTH
}

static RULERS: Lazy<Mutex<HashMap<String, Option<FontRuler>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Measure `text` at `font_size` using system font metrics for `family`.
/// Returns None when no matching font face can be loaded; callers fall
/// back to the stub ruler.
pub fn measure_text_width(text: &str, font_size: f32, family: &str) -> Option<f32> {
    if font_size <= 0.0 {
        return None;
    }
    if text.is_empty() {
        return Some(0.0);
    }
    let mut rulers = RULERS.lock().ok()?;
    let key = normalize_family_key(family);
    let ruler = rulers
        .entry(key)
        .or_insert_with(|| FontRuler::load(family))
        .as_ref()?;
    Some(ruler.measure(text, font_size))
}

/// Font metrics for one resolved face. The raw font bytes are kept and the
/// ASCII advance table is precomputed; non-ASCII text re-parses the face on
/// demand (capability names are overwhelmingly ASCII).
struct FontRuler {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    ascii_advances: [u16; 128],
}

impl FontRuler {
    fn load(family: &str) -> Option<FontRuler> {
        let mut db = Database::new();
        db.load_system_fonts();

        let families = parse_family_list(family);
        let refs: Vec<Family<'_>> = families
            .iter()
            .map(|token| match token {
                FamilyToken::Generic(generic) => *generic,
                FamilyToken::Name(name) => Family::Name(name.as_str()),
            })
            .collect();

        let query = Query {
            families: &refs,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = db.query(&query)?;

        let mut ruler: Option<FontRuler> = None;
        let _ = db.with_face_data(id, |data, index| {
            if let Ok(face) = Face::parse(data, index) {
                let units_per_em = face.units_per_em().max(1);
                let mut ascii_advances = [0u16; 128];
                for byte in 0u8..=127 {
                    if let Some(glyph) = face.glyph_index(byte as char) {
                        ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
                    }
                }
                ruler = Some(FontRuler {
                    data: data.to_vec(),
                    index,
                    units_per_em,
                    ascii_advances,
                });
            }
        });
        ruler
    }

    fn measure(&self, text: &str, font_size: f32) -> f32 {
        let scale = font_size / f32::from(self.units_per_em);
        let fallback = font_size * 0.56;

        if text.is_ascii() {
            let mut width = 0.0f32;
            for byte in text.bytes() {
                if byte == b'\n' {
                    continue;
                }
                let advance = self.ascii_advances[byte as usize];
                width += if advance == 0 {
                    fallback
                } else {
                    f32::from(advance) * scale
                };
            }
            return width.max(0.0);
        }

        let Ok(face) = Face::parse(&self.data, self.index) else {
            return text.chars().count() as f32 * fallback;
        };
        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            match face.glyph_index(ch) {
                Some(glyph) => {
                    let advance = face.glyph_hor_advance(glyph).unwrap_or(0);
                    width += if advance == 0 {
                        fallback
                    } else {
                        f32::from(advance) * scale
                    };
                }
                None => width += fallback,
            }
        }
        width.max(0.0)
    }
}

enum FamilyToken {
    Generic(Family<'static>),
    Name(String),
}

/// Split a CSS-style family list into fontdb query tokens, mapping the
/// generic keywords and treating everything else as a concrete name.
fn parse_family_list(family: &str) -> Vec<FamilyToken> {
    let mut tokens: Vec<FamilyToken> = Vec::new();
    for part in family.split(',') {
        let raw = part.trim().trim_matches('"').trim_matches('\'');
        if raw.is_empty() {
            continue;
        }
        match raw.to_ascii_lowercase().as_str() {
            "serif" => tokens.push(FamilyToken::Generic(Family::Serif)),
            "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                tokens.push(FamilyToken::Generic(Family::SansSerif))
            }
            "monospace" | "ui-monospace" => tokens.push(FamilyToken::Generic(Family::Monospace)),
            "cursive" => tokens.push(FamilyToken::Generic(Family::Cursive)),
            "fantasy" => tokens.push(FamilyToken::Generic(Family::Fantasy)),
            _ => tokens.push(FamilyToken::Name(raw.to_string())),
        }
    }
    if tokens.is_empty() {
        tokens.push(FamilyToken::Generic(Family::SansSerif));
    }
    tokens
}

fn normalize_family_key(family: &str) -> String {
    let trimmed = family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_scales_with_char_count() {
        assert_eq!(stub_measure("Hi"), 14.0);
        assert_eq!(stub_measure("Billing"), 49.0);
    }

    #[test]
    fn stub_floors_blank_text() {
        assert_eq!(stub_measure(""), 40.0);
        assert_eq!(stub_measure("   "), 40.0);
    }

    #[test]
    fn family_list_maps_generics() {
        let tokens = parse_family_list("Inter, system-ui, sans-serif");
        assert_eq!(tokens.len(), 3);
        assert!(matches!(&tokens[0], FamilyToken::Name(name) if name == "Inter"));
        assert!(matches!(tokens[1], FamilyToken::Generic(Family::SansSerif)));
        assert!(matches!(tokens[2], FamilyToken::Generic(Family::SansSerif)));
    }

    #[test]
    fn empty_family_falls_back_to_sans() {
        let tokens = parse_family_list("");
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0], FamilyToken::Generic(Family::SansSerif)));
    }
}
