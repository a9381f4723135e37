use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub bold: bool,
    pub color: Option<String>,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Segoe UI".to_string(),
            size: 13.0,
            bold: false,
            color: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: String,
    pub leaf_fill: String,
    /// Container fill per depth; depths past the end reuse the last entry.
    pub depth_fills: Vec<String>,
    pub border: String,
    pub parent_font: FontSpec,
    pub leaf_font: FontSpec,
    pub corner_radius: f32,
    pub stroke_width: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::classic()
    }
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            background: "#FFFFFF".to_string(),
            leaf_fill: "#E8E8E8".to_string(),
            depth_fills: vec![
                "#D6E4F0".to_string(),
                "#D9EAD3".to_string(),
                "#E1D5E7".to_string(),
                "#FCE5CD".to_string(),
                "#FFF2CC".to_string(),
                "#F4CCCC".to_string(),
            ],
            border: "#CCCCCC".to_string(),
            parent_font: FontSpec {
                family: "Segoe UI".to_string(),
                size: 13.0,
                bold: true,
                color: None,
            },
            leaf_font: FontSpec {
                family: "Segoe UI".to_string(),
                size: 11.0,
                bold: false,
                color: None,
            },
            corner_radius: 4.0,
            stroke_width: 1.0,
        }
    }

    pub fn depth_fill(&self, depth: usize) -> &str {
        if self.depth_fills.is_empty() {
            return &self.leaf_fill;
        }
        let index = depth.min(self.depth_fills.len() - 1);
        &self.depth_fills[index]
    }
}

/// CLI-level style overrides layered on top of the theme file.
#[derive(Debug, Clone, Default)]
pub struct ThemeOverrides {
    pub font: Option<String>,
    pub font_size: Option<f32>,
    pub leaf_fill: Option<String>,
    pub background: Option<String>,
    pub border: Option<String>,
}

/// Defaults, then the theme file (JSON5, partial — missing fields keep
/// their defaults), then CLI overrides.
pub fn resolve_theme(
    overrides: &ThemeOverrides,
    theme_file: Option<&Path>,
) -> Result<Theme, AppError> {
    let mut theme = match theme_file {
        Some(path) => {
            if !path.exists() {
                return Err(AppError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            let raw = std::fs::read_to_string(path).map_err(|source| AppError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            json5::from_str::<Theme>(&raw).map_err(|err| AppError::JsonParse {
                message: format!("invalid theme file {}: {err}", path.display()),
            })?
        }
        None => Theme::classic(),
    };

    if let Some(font) = &overrides.font {
        theme.parent_font.family = font.clone();
        theme.leaf_font.family = font.clone();
    }
    if let Some(size) = overrides.font_size {
        theme.parent_font.size = size;
        theme.leaf_font.size = size;
    }
    if let Some(fill) = &overrides.leaf_fill {
        theme.leaf_fill = fill.clone();
    }
    if let Some(background) = &overrides.background {
        theme.background = background.clone();
    }
    if let Some(border) = &overrides.border {
        theme.border = border.clone();
    }

    Ok(theme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_fill_saturates_at_last_color() {
        let theme = Theme::classic();
        assert_eq!(theme.depth_fill(0), "#D6E4F0");
        assert_eq!(theme.depth_fill(5), "#F4CCCC");
        assert_eq!(theme.depth_fill(99), "#F4CCCC");
    }

    #[test]
    fn partial_theme_json_keeps_defaults() {
        let theme: Theme = json5::from_str(r#"{ background: "#101010" }"#).unwrap();
        assert_eq!(theme.background, "#101010");
        assert_eq!(theme.leaf_fill, "#E8E8E8");
        assert_eq!(theme.depth_fills.len(), 6);
    }

    #[test]
    fn overrides_apply_to_both_fonts() {
        let overrides = ThemeOverrides {
            font: Some("Inter".to_string()),
            font_size: Some(10.0),
            ..Default::default()
        };
        let theme = resolve_theme(&overrides, None).unwrap();
        assert_eq!(theme.parent_font.family, "Inter");
        assert_eq!(theme.leaf_font.family, "Inter");
        assert_eq!(theme.leaf_font.size, 10.0);
        assert!(theme.parent_font.bold);
    }
}
