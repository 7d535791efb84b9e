use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::collector::SupersedePolicy;

/// Which media kinds the picker offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Photo,
    Video,
    #[default]
    #[serde(other)]
    Any,
}

/// Per-call options, as sent by the calling layer.
///
/// The calling layer passes an open, loosely typed dictionary. Every key is
/// optional, unknown keys are ignored, and numbers may arrive as floats.
///
/// # Example
///
/// ```rust
/// use cropping_picker::config::{MediaType, PickerOptions};
///
/// let opts = PickerOptions::from_value(&serde_json::json!({
///     "multiple": true,
///     "mediaType": "photo",
///     "compressImageQuality": 0.8,
///     "width": 300.0,
/// })).unwrap();
/// assert!(opts.multiple);
/// assert_eq!(opts.media_type, MediaType::Photo);
/// assert_eq!(opts.jpeg_quality(), 80);
/// assert_eq!(opts.width, 300);
/// assert_eq!(opts.compress_image_max_width, 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PickerOptions {
    pub multiple: bool,
    pub cropping: bool,
    pub include_base64: bool,
    pub include_exif: bool,
    /// Crop output width; 0 means unset.
    #[serde(deserialize_with = "lenient_u32")]
    pub width: u32,
    /// Crop output height; 0 means unset.
    #[serde(deserialize_with = "lenient_u32")]
    pub height: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub compress_image_max_width: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub compress_image_max_height: u32,
    /// Fraction of maximum JPEG quality, `0.0..=1.0`.
    pub compress_image_quality: f64,
    pub compress_video_preset: String,
    pub media_type: MediaType,
    pub force_jpg: bool,
    pub use_front_camera: bool,
    pub cropper_circle_overlay: bool,
    pub free_style_crop_enabled: bool,
    pub show_crop_guidelines: bool,
    pub show_crop_frame: bool,
    pub hide_bottom_controls: bool,
    pub enable_rotation_gesture: bool,
    pub disable_cropper_color_setters: bool,
    pub cropper_active_widget_color: Option<String>,
    pub cropper_status_bar_color: Option<String>,
    pub cropper_toolbar_color: Option<String>,
    pub cropper_toolbar_title: Option<String>,
    pub cropper_toolbar_widget_color: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    pub min_files: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub max_files: u32,
    /// Source image for `open_cropper`.
    pub path: Option<String>,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            multiple: false,
            cropping: false,
            include_base64: false,
            include_exif: false,
            width: 0,
            height: 0,
            compress_image_max_width: 1000,
            compress_image_max_height: 1000,
            compress_image_quality: 1.0,
            compress_video_preset: "MediumQuality".to_string(),
            media_type: MediaType::Any,
            force_jpg: false,
            use_front_camera: false,
            cropper_circle_overlay: false,
            free_style_crop_enabled: false,
            show_crop_guidelines: true,
            show_crop_frame: true,
            hide_bottom_controls: false,
            enable_rotation_gesture: false,
            disable_cropper_color_setters: false,
            cropper_active_widget_color: None,
            cropper_status_bar_color: None,
            cropper_toolbar_color: None,
            cropper_toolbar_title: None,
            cropper_toolbar_widget_color: None,
            min_files: 0,
            max_files: 0,
            path: None,
        }
    }
}

/// Presentation settings handed to the crop host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropPresentation {
    /// `(width, height)` when both target dimensions are set.
    pub aspect_ratio: Option<(u32, u32)>,
    pub circle_overlay: bool,
    pub free_style: bool,
    pub show_guidelines: bool,
    pub show_frame: bool,
    pub hide_bottom_controls: bool,
    pub rotation_gesture: bool,
    pub toolbar_title: Option<String>,
    /// Color overrides, empty when `disableCropperColorSetters` is set.
    pub colors: Vec<(String, String)>,
}

impl PickerOptions {
    /// Parse a loosely typed options dictionary.
    pub fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(value).context("Failed to parse picker options")
    }

    /// Merge per-call options over configured defaults, then parse.
    ///
    /// Keys present in `call` win; everything else falls back to `defaults`
    /// and then to the built-in defaults.
    pub fn resolve(defaults: &Value, call: &Value) -> Result<Self> {
        Self::from_value(&merge_objects(defaults, call))
    }

    /// JPEG quality on the 0–100 scale.
    pub fn jpeg_quality(&self) -> u8 {
        (self.compress_image_quality.clamp(0.0, 1.0) * 100.0).round() as u8
    }

    pub fn has_target_size(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn crop_presentation(&self) -> CropPresentation {
        let mut colors = Vec::new();
        if !self.disable_cropper_color_setters {
            let named = [
                ("activeWidget", &self.cropper_active_widget_color),
                ("statusBar", &self.cropper_status_bar_color),
                ("toolbar", &self.cropper_toolbar_color),
                ("toolbarWidget", &self.cropper_toolbar_widget_color),
            ];
            for (name, color) in named {
                if let Some(c) = color {
                    colors.push((name.to_string(), c.clone()));
                }
            }
        }

        CropPresentation {
            aspect_ratio: self.has_target_size().then_some((self.width, self.height)),
            circle_overlay: self.cropper_circle_overlay,
            free_style: self.free_style_crop_enabled,
            show_guidelines: self.show_crop_guidelines,
            show_frame: self.show_crop_frame,
            hide_bottom_controls: self.hide_bottom_controls,
            rotation_gesture: self.enable_rotation_gesture,
            toolbar_title: self.cropper_toolbar_title.clone(),
            colors,
        }
    }
}

fn merge_objects(defaults: &Value, call: &Value) -> Value {
    let mut merged: Map<String, Value> = defaults.as_object().cloned().unwrap_or_default();
    if let Some(overrides) = call.as_object() {
        for (k, v) in overrides {
            merged.insert(k.clone(), v.clone());
        }
    }
    Value::Object(merged)
}

/// Accept any JSON number (or null) for a dimension-like field.
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.min(u32::MAX as f64) as u32)
        .unwrap_or(0))
}

/// Top-level configuration for the picker library and CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the scratch folder; the OS temp dir when unset.
    pub tmp_root: Option<PathBuf>,
    /// Behavior when a new request starts while one is pending.
    pub supersede_policy: SupersedePolicy,
    /// Options applied to every call unless the call overrides them.
    pub default_options: Value,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmp_root: None,
            supersede_policy: SupersedePolicy::Silent,
            default_options: Value::Object(Map::new()),
        }
    }
}

impl Config {
    /// `picker.json` beside the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("picker.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    pub fn tmp_root(&self) -> PathBuf {
        self.tmp_root.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Parse per-call options on top of `default_options`.
    pub fn options_for(&self, call: &Value) -> Result<PickerOptions> {
        PickerOptions::resolve(&self.default_options, call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    // ── PickerOptions ────────────────────────────────────────────────

    #[test]
    fn defaults_from_empty_map() {
        let opts = PickerOptions::from_value(&json!({})).unwrap();
        assert_eq!(opts, PickerOptions::default());
        assert_eq!(opts.compress_image_max_width, 1000);
        assert_eq!(opts.compress_image_max_height, 1000);
        assert_eq!(opts.jpeg_quality(), 100);
        assert_eq!(opts.media_type, MediaType::Any);
        assert!(opts.show_crop_guidelines);
        assert!(opts.show_crop_frame);
    }

    #[test]
    fn null_is_default() {
        assert_eq!(PickerOptions::from_value(&Value::Null).unwrap(), PickerOptions::default());
    }

    #[test]
    fn unknown_keys_ignored() {
        let opts = PickerOptions::from_value(&json!({ "smartAlbums": ["Favorites"], "cropping": true })).unwrap();
        assert!(opts.cropping);
    }

    #[test]
    fn unknown_media_type_is_any() {
        let opts = PickerOptions::from_value(&json!({ "mediaType": "hologram" })).unwrap();
        assert_eq!(opts.media_type, MediaType::Any);
    }

    #[test]
    fn float_dimensions_accepted() {
        let opts = PickerOptions::from_value(&json!({
            "width": 300.7,
            "height": null,
            "compressImageMaxWidth": -5
        }))
        .unwrap();
        assert_eq!(opts.width, 300);
        assert_eq!(opts.height, 0);
        assert_eq!(opts.compress_image_max_width, 0);
    }

    #[test]
    fn wrong_type_is_an_error() {
        assert!(PickerOptions::from_value(&json!({ "multiple": "yes" })).is_err());
    }

    #[test]
    fn quality_clamped() {
        let mut opts = PickerOptions::default();
        opts.compress_image_quality = 1.7;
        assert_eq!(opts.jpeg_quality(), 100);
        opts.compress_image_quality = -1.0;
        assert_eq!(opts.jpeg_quality(), 0);
        opts.compress_image_quality = 0.55;
        assert_eq!(opts.jpeg_quality(), 55);
    }

    #[test]
    fn call_options_override_defaults() {
        let defaults = json!({ "includeExif": true, "compressImageQuality": 0.5 });
        let opts = PickerOptions::resolve(&defaults, &json!({ "compressImageQuality": 0.9 })).unwrap();
        assert!(opts.include_exif);
        assert_eq!(opts.jpeg_quality(), 90);
    }

    #[test]
    fn crop_presentation_colors() {
        let opts = PickerOptions::from_value(&json!({
            "width": 200, "height": 100,
            "cropperToolbarColor": "#000000",
            "cropperCircleOverlay": true
        }))
        .unwrap();
        let p = opts.crop_presentation();
        assert_eq!(p.aspect_ratio, Some((200, 100)));
        assert!(p.circle_overlay);
        assert_eq!(p.colors, vec![("toolbar".to_string(), "#000000".to_string())]);

        let opts = PickerOptions::from_value(&json!({
            "cropperToolbarColor": "#000000",
            "disableCropperColorSetters": true
        }))
        .unwrap();
        let p = opts.crop_presentation();
        assert!(p.colors.is_empty());
        assert_eq!(p.aspect_ratio, None);
    }

    // ── Config ───────────────────────────────────────────────────────

    #[test]
    fn config_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.json"))).unwrap();
        assert_eq!(config.supersede_policy, SupersedePolicy::Silent);
        assert!(config.tmp_root.is_none());
    }

    #[test]
    fn config_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("picker.json");
        let mut config = Config::default();
        config.supersede_policy = SupersedePolicy::RejectPrevious;
        config.default_options = json!({ "includeBase64": true });
        config.save(Some(&path)).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.supersede_policy, SupersedePolicy::RejectPrevious);
        let opts = loaded.options_for(&json!({})).unwrap();
        assert!(opts.include_base64);
    }

    #[test]
    fn config_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("picker.json");
        std::fs::write(&path, r#"{ "supersede_policy": "reject_previous" }"#).unwrap();
        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.supersede_policy, SupersedePolicy::RejectPrevious);
        assert!(loaded.default_options.is_object());
    }

    #[test]
    fn config_invalid_json_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("picker.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
