// i18n.rs
//
// Message catalog for diagnostics and status text.
// - Built-in English strings are always available.
// - A language can override any of them from assets/i18n/<lang>.json
//   (flat object: { "key": "value" }), searched next to the executable and
//   in the working directory.
// - Lookup: tr("key") / tr_with("key", &[("name", ...)]) with {name} placeholders.
//
// Language selection:
// - CLI: --lang <code>
// - Env: PANORAMA_LANG
// - Default: en

use once_cell::sync::{Lazy, OnceCell};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

pub const DEFAULT_LANG: &str = "en";

static BUILTIN: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("app.title", "Panorama Sphere"),
        ("motion.unavailable", "Device motion is not available on this device"),
        ("motion.simulated", "Using simulated device motion"),
        ("config.loaded", "Loaded configuration from {path}"),
        ("config.invalid", "Ignoring configuration {path}: {err}"),
        ("image.loading", "Loading image in background: {path}"),
        ("image.loaded", "Image loaded: {w} x {h}"),
        ("image.open_failed", "Failed to open file: {err}"),
        ("image.decode_failed", "Failed to decode image: {err}"),
        ("image.send_failed", "Failed to hand decoded image to the main thread"),
        ("image.scaled", "Image {src_w}x{src_h} exceeds GPU limit {max}, scaled to {new_w}x{new_h}"),
        ("file.filter.images", "Images"),
        ("status.loading", "Loading image..."),
        ("status.inertia", "Inertia"),
        ("status.gesture", "Gesture"),
        ("status.motion", "Motion"),
        ("status.on", "on"),
        ("status.off", "off"),
        ("render.error", "Render error: {err}"),
    ])
});

#[derive(Debug, Clone)]
pub struct I18n {
    pub lang: String,
    overrides: HashMap<String, String>,
}

static I18N: OnceCell<RwLock<I18n>> = OnceCell::new();

fn load_json_map(path: &Path) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(map) => Some(map),
        Err(e) => {
            log::warn!("ignoring malformed catalog {}: {e}", path.display());
            None
        }
    }
}

/// <exe_dir>/assets/i18n/<lang>.json, then ./assets/i18n/<lang>.json
fn find_lang_file(lang: &str) -> Option<PathBuf> {
    let file = format!("{}.json", lang);

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    exe_dir
        .into_iter()
        .chain(std::iter::once(PathBuf::new()))
        .map(|dir| dir.join("assets").join("i18n").join(&file))
        .find(|p| p.exists())
}

/// Initialize the global catalog. Later calls replace the active language.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();
    let overrides = if lang == DEFAULT_LANG {
        HashMap::new()
    } else {
        find_lang_file(&lang)
            .and_then(|p| load_json_map(&p))
            .unwrap_or_default()
    };

    let i = I18n { lang, overrides };

    if let Some(lock) = I18N.get() {
        if let Ok(mut w) = lock.write() {
            *w = i;
        }
    } else {
        let _ = I18N.set(RwLock::new(i));
    }
}

pub fn current_lang() -> String {
    I18N.get()
        .and_then(|l| l.read().ok().map(|i| i.lang.clone()))
        .unwrap_or_else(|| DEFAULT_LANG.to_string())
}

/// Localized text for `key`; the key itself when nothing matches.
pub fn tr(key: &str) -> String {
    let overridden = I18N
        .get()
        .and_then(|l| l.read().ok())
        .and_then(|i| i.overrides.get(key).cloned());

    overridden
        .or_else(|| BUILTIN.get(key).map(|s| s.to_string()))
        .unwrap_or_else(|| key.to_string())
}

/// Localized text with `{name}` placeholders substituted.
/// Placeholders without a value are kept as-is.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    let mut s = tr(key);
    for (k, v) in args {
        let placeholder = format!("{{{}}}", k);
        s = s.replace(&placeholder, v);
    }
    s
}

/// Language from `--lang <code>`, then PANORAMA_LANG, then the default.
pub fn resolve_lang_from_args() -> String {
    resolve_lang(std::env::args(), std::env::var("PANORAMA_LANG").ok())
}

fn resolve_lang(args: impl IntoIterator<Item = String>, env: Option<String>) -> String {
    let mut it = args.into_iter();
    while let Some(a) = it.next() {
        if a == "--lang" {
            if let Some(v) = it.next() {
                return v;
            }
        }
    }

    env.filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LANG.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builtin_text_without_init() {
        assert_eq!(tr("motion.unavailable"), "Device motion is not available on this device");
    }

    #[test]
    fn missing_key_echoes_key() {
        assert_eq!(tr("no.such.key"), "no.such.key");
    }

    #[test]
    fn placeholders_substituted() {
        let s = tr_with("image.loaded", &[("w", "4096".into()), ("h", "2048".into())]);
        assert_eq!(s, "Image loaded: 4096 x 2048");
        let s = tr_with("image.loaded", &[("w", "1".into())]);
        assert_eq!(s, "Image loaded: 1 x {h}");
    }

    #[test]
    fn lang_resolution_order() {
        assert_eq!(resolve_lang(args(&["bin", "--lang", "ja"]), Some("fr".into())), "ja");
        assert_eq!(resolve_lang(args(&["bin"]), Some("fr".into())), "fr");
        assert_eq!(resolve_lang(args(&["bin"]), Some("  ".into())), "en");
        assert_eq!(resolve_lang(args(&["bin", "--lang"]), None), "en");
    }
}
