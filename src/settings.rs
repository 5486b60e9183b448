use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default mask geometry/opacity used whenever a key is missing or unusable.
pub const DEFAULT_WIDTH: i32 = 200;
pub const DEFAULT_HEIGHT: i32 = 575;
pub const DEFAULT_OPACITY: u8 = 245;
pub const DEFAULT_OFFSET_X: i32 = 130;
pub const DEFAULT_OFFSET_Y: i32 = 80;

/// Geometry and opacity of the mask surface. An immutable snapshot; a reload
/// replaces the whole value rather than mutating it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaskConfig {
    pub width: i32,
    pub height: i32,
    /// 0 = fully transparent, 255 = opaque. Always within range after load.
    pub opacity: u8,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            opacity: DEFAULT_OPACITY,
            offset_x: DEFAULT_OFFSET_X,
            offset_y: DEFAULT_OFFSET_Y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Settings {
    pub mask: MaskConfig,
    /// When enabled the logger is initialised at debug level.
    pub debug_logging: bool,
    /// Optional log file; when `None` logging goes to stderr only.
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `path`. No failure is fatal: a missing or unreadable
    /// file yields all defaults, and each mask key falls back on its own when
    /// absent or of the wrong type.
    pub fn load(path: &Path) -> Self {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        let root: serde_json::Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(err) => {
                if !content.is_empty() {
                    tracing::warn!(%err, path = %path.display(), "settings unreadable; using defaults");
                }
                serde_json::Value::Null
            }
        };

        let mask_section = root.get("mask").cloned().unwrap_or(serde_json::Value::Null);
        let field = |key: &str, default: i32| -> i32 {
            match mask_section.get(key).and_then(serde_json::Value::as_i64) {
                Some(v) => v as i32,
                None => default,
            }
        };

        let width = positive_or(field("width", DEFAULT_WIDTH), DEFAULT_WIDTH);
        let height = positive_or(field("height", DEFAULT_HEIGHT), DEFAULT_HEIGHT);
        let opacity = field("opacity", DEFAULT_OPACITY as i32).clamp(0, 255) as u8;
        let offset_x = field("offset_x", DEFAULT_OFFSET_X);
        let offset_y = field("offset_y", DEFAULT_OFFSET_Y);

        let settings = Self {
            mask: MaskConfig {
                width,
                height,
                opacity,
                offset_x,
                offset_y,
            },
            debug_logging: root
                .get("debug_logging")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false),
            log_file: root
                .get("log_file")
                .and_then(serde_json::Value::as_str)
                .map(PathBuf::from),
        };

        tracing::info!(
            width = settings.mask.width,
            height = settings.mask.height,
            opacity = settings.mask.opacity,
            offset_x = settings.mask.offset_x,
            offset_y = settings.mask.offset_y,
            "settings resolved"
        );
        settings
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn positive_or(value: i32, default: i32) -> i32 {
    if value > 0 {
        value
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_is_clamped_not_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"mask": {"opacity": 999}}"#).unwrap();
        assert_eq!(Settings::load(&path).mask.opacity, 255);

        std::fs::write(&path, r#"{"mask": {"opacity": -3}}"#).unwrap();
        assert_eq!(Settings::load(&path).mask.opacity, 0);
    }

    #[test]
    fn non_positive_dimensions_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"mask": {"width": 0, "height": -20}}"#).unwrap();
        let settings = Settings::load(&path);
        assert_eq!(settings.mask.width, DEFAULT_WIDTH);
        assert_eq!(settings.mask.height, DEFAULT_HEIGHT);
    }
}
