use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::event::KeyCode;
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;

use crate::loader::{Source, DEFAULT_SOURCE_URL};

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "rdial";

#[derive(Debug, Clone)]
pub struct Config {
    /// File the configuration was read from, if any.
    pub config_path: Option<PathBuf>,
    pub source: SourceConfig,
    pub log_file: Option<PathBuf>,
    pub keys: Keys,
    pub ui: UiConfig,
    pub commands: Commands,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(ConfigFile::default(), None)
    }
}

impl Config {
    fn from_file(file: ConfigFile, config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            source: file.source.into(),
            log_file: file.log_file.as_deref().map(expand_tilde),
            keys: file.keys.into(),
            ui: file.ui.into(),
            commands: file.commands.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub url: String,
    pub timeout: Option<Duration>,
}

impl SourceConfig {
    pub fn to_source(&self) -> Source {
        Source::new(self.url.clone()).with_timeout(self.timeout)
    }
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub separator: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone)]
pub struct Commands {
    pub dial: Option<CommandExec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandExec {
    pub program: String,
    pub args: Vec<String>,
}

// =============================================================================
// Key Bindings
// =============================================================================

/// Key bindings. Both contexts are live at the same time because the search
/// box always has focus, so printable characters cannot be bound.
#[derive(Debug, Clone)]
pub struct Keys {
    pub global: GlobalKeys,
    pub list: ListKeys,
}

#[derive(Debug, Clone)]
pub struct GlobalKeys {
    pub quit: Vec<String>,
    pub help: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ListKeys {
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub page_down: Vec<String>,
    pub page_up: Vec<String>,
    pub first: Vec<String>,
    pub last: Vec<String>,
    pub dial: Vec<String>,
}

impl Default for Keys {
    fn default() -> Self {
        Self {
            global: GlobalKeys::default(),
            list: ListKeys::default(),
        }
    }
}

impl Default for GlobalKeys {
    fn default() -> Self {
        Self {
            quit: vec!["Escape".into()],
            help: vec!["F1".into()],
        }
    }
}

impl Default for ListKeys {
    fn default() -> Self {
        Self {
            next: vec!["Down".into(), "Tab".into()],
            prev: vec!["Up".into(), "Backtab".into()],
            page_down: vec!["PageDown".into()],
            page_up: vec!["PageUp".into()],
            first: vec!["Home".into()],
            last: vec!["End".into()],
            dial: vec!["Enter".into()],
        }
    }
}

// =============================================================================
// Serde deserialization types (support both single string and array)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KeyBinding {
    Single(String),
    Multiple(Vec<String>),
}

impl KeyBinding {
    fn into_vec(self) -> Vec<String> {
        match self {
            KeyBinding::Single(s) => vec![s],
            KeyBinding::Multiple(v) => v,
        }
    }
}

impl Default for KeyBinding {
    fn default() -> Self {
        KeyBinding::Multiple(vec![])
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct KeysFile {
    global: GlobalKeysFile,
    list: ListKeysFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GlobalKeysFile {
    quit: KeyBinding,
    help: KeyBinding,
}

impl Default for GlobalKeysFile {
    fn default() -> Self {
        let defaults = GlobalKeys::default();
        Self {
            quit: KeyBinding::Multiple(defaults.quit),
            help: KeyBinding::Multiple(defaults.help),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ListKeysFile {
    next: KeyBinding,
    prev: KeyBinding,
    page_down: KeyBinding,
    page_up: KeyBinding,
    first: KeyBinding,
    last: KeyBinding,
    dial: KeyBinding,
}

impl Default for ListKeysFile {
    fn default() -> Self {
        let defaults = ListKeys::default();
        Self {
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
            page_down: KeyBinding::Multiple(defaults.page_down),
            page_up: KeyBinding::Multiple(defaults.page_up),
            first: KeyBinding::Multiple(defaults.first),
            last: KeyBinding::Multiple(defaults.last),
            dial: KeyBinding::Multiple(defaults.dial),
        }
    }
}

impl From<KeysFile> for Keys {
    fn from(file: KeysFile) -> Self {
        Self {
            global: GlobalKeys {
                quit: file.global.quit.into_vec(),
                help: file.global.help.into_vec(),
            },
            list: ListKeys {
                next: file.list.next.into_vec(),
                prev: file.list.prev.into_vec(),
                page_down: file.list.page_down.into_vec(),
                page_up: file.list.page_up.into_vec(),
                first: file.list.first.into_vec(),
                last: file.list.last.into_vec(),
                dial: file.list.dial.into_vec(),
            },
        }
    }
}

/// Resolve a binding name to the key it stands for.
///
/// Names are case-insensitive. Returns `None` for anything the key
/// dispatcher cannot match.
pub fn named_key(binding: &str) -> Option<KeyCode> {
    let name = binding.trim().to_ascii_lowercase();
    let code = match name.as_str() {
        "enter" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backtab" | "shift+tab" => KeyCode::BackTab,
        "esc" | "escape" => KeyCode::Esc,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "pageup" | "page_up" => KeyCode::PageUp,
        "pagedown" | "page_down" => KeyCode::PageDown,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "insert" => KeyCode::Insert,
        other => {
            let number = other.strip_prefix('f')?.parse::<u8>().ok()?;
            if !(1..=12).contains(&number) {
                return None;
            }
            KeyCode::F(number)
        }
    };
    Some(code)
}

/// Keys the search field consumes for editing.
fn is_search_input_key(binding: &str) -> bool {
    let trimmed = binding.trim();
    if trimmed.chars().count() == 1 {
        return true;
    }
    matches!(
        trimmed.to_ascii_lowercase().as_str(),
        "space" | "backspace" | "delete" | "del" | "left" | "right"
    )
}

fn validate_key_bindings(keys: &Keys) -> Result<()> {
    let bindings: [(&str, &[String]); 9] = [
        ("global.quit", &keys.global.quit),
        ("global.help", &keys.global.help),
        ("list.next", &keys.list.next),
        ("list.prev", &keys.list.prev),
        ("list.page_down", &keys.list.page_down),
        ("list.page_up", &keys.list.page_up),
        ("list.first", &keys.list.first),
        ("list.last", &keys.list.last),
        ("list.dial", &keys.list.dial),
    ];

    let mut seen: HashMap<KeyCode, &str> = HashMap::new();
    for (action_name, keys) in bindings {
        for key in keys {
            if key.trim().is_empty() {
                continue;
            }
            if is_search_input_key(key) {
                bail!(
                    "key binding '{}' for '{}' would swallow search input; use a named key",
                    key,
                    action_name
                );
            }
            let Some(code) = named_key(key) else {
                bail!("unknown key '{}' for '{}'", key, action_name);
            };
            if let Some(existing_action) = seen.get(&code) {
                bail!(
                    "key binding collision: '{}' is bound to both '{}' and '{}'",
                    key,
                    existing_action,
                    action_name
                );
            }
            seen.insert(code, action_name);
        }
    }

    Ok(())
}

// =============================================================================
// Config file structure
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    source: SourceFile,
    log_file: Option<PathBuf>,
    keys: KeysFile,
    ui: UiFile,
    commands: CommandsFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SourceFile {
    url: String,
    timeout_secs: Option<u64>,
}

impl Default for SourceFile {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            timeout_secs: None,
        }
    }
}

impl From<SourceFile> for SourceConfig {
    fn from(file: SourceFile) -> Self {
        let url = file.url.trim();
        Self {
            url: if url.is_empty() {
                DEFAULT_SOURCE_URL.to_string()
            } else {
                url.to_string()
            },
            timeout: file
                .timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    let dir = base.config_dir().join(APP_NAME);
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Per-user data directory holding preferences and the log file.
pub fn data_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine data directories")?;
    Ok(base.data_dir().join(APP_NAME))
}

/// Load configuration from `explicit` or the default location.
///
/// A missing default file yields the built-in defaults; a missing explicit
/// file is an error.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = config_path()?;
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    parse(&raw, Some(path))
}

fn parse(raw: &str, path: Option<PathBuf>) -> Result<Config> {
    let display = path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<inline>".to_string());

    let value: toml::Value =
        toml::from_str(raw).with_context(|| format!("failed to parse {} as TOML", display))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", display))?;

    let config = Config::from_file(cfg_file, path);
    validate_key_bindings(&config.keys)?;
    Ok(config)
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    warn_unknown_in(table, "", &["source", "log_file", "keys", "ui", "commands"]);

    if let Some(source) = table.get("source").and_then(|v| v.as_table()) {
        warn_unknown_in(source, "source.", &["url", "timeout_secs"]);
    }
    if let Some(keys) = table.get("keys").and_then(|v| v.as_table()) {
        warn_unknown_in(keys, "keys.", &["global", "list"]);
        if let Some(global) = keys.get("global").and_then(|v| v.as_table()) {
            warn_unknown_in(global, "keys.global.", &["quit", "help"]);
        }
        if let Some(list) = keys.get("list").and_then(|v| v.as_table()) {
            warn_unknown_in(
                list,
                "keys.list.",
                &["next", "prev", "page_down", "page_up", "first", "last", "dial"],
            );
        }
    }
    if let Some(ui) = table.get("ui").and_then(|v| v.as_table()) {
        warn_unknown_in(ui, "ui.", &["colors"]);
        if let Some(colors) = ui.get("colors").and_then(|v| v.as_table()) {
            warn_unknown_in(
                colors,
                "ui.colors.",
                &[
                    "border",
                    "selection_bg",
                    "selection_fg",
                    "separator",
                    "status_fg",
                    "status_bg",
                ],
            );
        }
    }
    if let Some(commands) = table.get("commands").and_then(|v| v.as_table()) {
        warn_unknown_in(commands, "commands.", &["dial"]);
    }
}

fn warn_unknown_in(table: &toml::map::Map<String, toml::Value>, prefix: &str, known: &[&str]) {
    let known: HashSet<&str> = known.iter().copied().collect();
    for key in table.keys() {
        if !known.contains(key.as_str()) {
            eprintln!("warning: unknown configuration key `{}{}`", prefix, key);
        }
    }
}

// =============================================================================
// UI config
// =============================================================================

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    separator: RgbColor,
    status_fg: RgbColor,
    status_bg: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        Self {
            border: RgbColor::new(255, 165, 0),
            selection_bg: RgbColor::new(255, 165, 0),
            selection_fg: RgbColor::new(0, 0, 0),
            separator: RgbColor::new(255, 165, 0),
            status_fg: RgbColor::new(255, 165, 0),
            status_bg: RgbColor::new(0, 0, 0),
        }
    }
}

impl From<UiFile> for UiConfig {
    fn from(file: UiFile) -> Self {
        Self {
            colors: UiColors {
                border: file.colors.border,
                selection_bg: file.colors.selection_bg,
                selection_fg: file.colors.selection_fg,
                separator: file.colors.separator,
                status_fg: file.colors.status_fg,
                status_bg: file.colors.status_bg,
            },
        }
    }
}

// =============================================================================
// Commands config
// =============================================================================

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct CommandsFile {
    dial: Option<CommandDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CommandDef {
    Simple(String),
    List(Vec<String>),
}

impl From<CommandsFile> for Commands {
    fn from(file: CommandsFile) -> Self {
        Self {
            dial: file.dial.and_then(CommandExec::from_def),
        }
    }
}

impl CommandExec {
    fn from_def(def: CommandDef) -> Option<Self> {
        match def {
            CommandDef::Simple(cmd) => {
                let trimmed = cmd.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self {
                        program: trimmed.to_string(),
                        args: Vec::new(),
                    })
                }
            }
            CommandDef::List(mut parts) => {
                if parts.is_empty() || parts[0].trim().is_empty() {
                    return None;
                }
                let program = parts.remove(0);
                Some(Self {
                    program,
                    args: parts,
                })
            }
        }
    }
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let helper = Helper::deserialize(deserializer)?;
        let (r, g, b) = match helper {
            Helper::Array(values) => (values[0], values[1], values[2]),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.source.url, DEFAULT_SOURCE_URL);
        assert!(config.source.timeout.is_none());
        assert!(config.commands.dial.is_none());
        assert_eq!(config.keys.list.dial, vec!["Enter".to_string()]);
        assert!(validate_key_bindings(&config.keys).is_ok());
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let config = parse("", None).unwrap();
        assert_eq!(config.source.url, DEFAULT_SOURCE_URL);
        assert_eq!(config.keys.global.quit, vec!["Escape".to_string()]);
    }

    #[test]
    fn test_source_section() {
        let config = parse(
            r#"
            [source]
            url = "http://localhost:8080/contacts.json"
            timeout_secs = 15
            "#,
            None,
        )
        .unwrap();
        assert_eq!(config.source.url, "http://localhost:8080/contacts.json");
        assert_eq!(config.source.timeout, Some(Duration::from_secs(15)));

        let source = config.source.to_source();
        assert_eq!(source.url, "http://localhost:8080/contacts.json");
    }

    #[test]
    fn test_blank_url_and_zero_timeout_fall_back() {
        let config = parse(
            r#"
            [source]
            url = "  "
            timeout_secs = 0
            "#,
            None,
        )
        .unwrap();
        assert_eq!(config.source.url, DEFAULT_SOURCE_URL);
        assert!(config.source.timeout.is_none());
    }

    #[test]
    fn test_dial_command_forms() {
        let simple = parse("[commands]\ndial = \"xdg-open\"\n", None).unwrap();
        assert_eq!(
            simple.commands.dial,
            Some(CommandExec {
                program: "xdg-open".into(),
                args: vec![]
            })
        );

        let list = parse("[commands]\ndial = [\"kdeconnect-cli\", \"--call\", \"{phone}\"]\n", None)
            .unwrap();
        let dial = list.commands.dial.unwrap();
        assert_eq!(dial.program, "kdeconnect-cli");
        assert_eq!(dial.args, vec!["--call", "{phone}"]);

        let empty = parse("[commands]\ndial = []\n", None).unwrap();
        assert!(empty.commands.dial.is_none());
    }

    #[test]
    fn test_key_binding_single_and_list() {
        let config = parse(
            r#"
            [keys.global]
            quit = "F10"
            [keys.list]
            next = ["Down", "PageDown"]
            page_down = []
            "#,
            None,
        )
        .unwrap();
        assert_eq!(config.keys.global.quit, vec!["F10".to_string()]);
        assert_eq!(config.keys.list.next, vec!["Down".to_string(), "PageDown".to_string()]);
        assert!(config.keys.list.page_down.is_empty());
    }

    #[test]
    fn test_key_binding_collision_rejected() {
        let err = parse(
            r#"
            [keys.list]
            dial = ["enter"]
            next = ["Enter"]
            "#,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("collision"));
    }

    #[test]
    fn test_printable_binding_rejected() {
        let err = parse("[keys.global]\nquit = \"q\"\n", None).unwrap_err();
        assert!(err.to_string().contains("swallow search input"));
    }

    #[test]
    fn test_editing_keys_rejected() {
        for key in ["Backspace", "Left", "Right", "Delete", "space"] {
            let err = parse(&format!("[keys.global]\nquit = \"{}\"\n", key), None).unwrap_err();
            assert!(err.to_string().contains("swallow search input"), "{key}");
        }
    }

    #[test]
    fn test_unknown_key_name_rejected() {
        for key in ["F13", "F0", "Ctrl+Q", "PrintScreen"] {
            let err = parse(&format!("[keys.list]\ndial = \"{}\"\n", key), None).unwrap_err();
            assert!(err.to_string().contains("unknown key"), "{key}");
        }
    }

    #[test]
    fn test_alias_collision_rejected() {
        let err = parse("[keys.list]\npage_up = \"page_up\"\nfirst = \"PageUp\"\n", None)
            .unwrap_err();
        assert!(err.to_string().contains("collision"));
    }

    #[test]
    fn test_named_key() {
        assert_eq!(named_key("Escape"), Some(KeyCode::Esc));
        assert_eq!(named_key(" esc "), Some(KeyCode::Esc));
        assert_eq!(named_key("F12"), Some(KeyCode::F(12)));
        assert_eq!(named_key("page_down"), Some(KeyCode::PageDown));
        assert_eq!(named_key("f13"), None);
        assert_eq!(named_key("backspace"), None);
        assert_eq!(named_key(""), None);
    }

    #[test]
    fn test_colors_array_and_map() {
        let config = parse(
            r#"
            [ui.colors]
            border = [1, 2, 3]
            status_bg = { r = 4, g = 5, b = 6 }
            "#,
            None,
        )
        .unwrap();
        assert_eq!(config.ui.colors.border, RgbColor::new(1, 2, 3));
        assert_eq!(config.ui.colors.status_bg, RgbColor::new(4, 5, 6));
        assert_eq!(config.ui.colors.selection_fg, RgbColor::new(0, 0, 0));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(parse("[source\nurl = 1", None).is_err());
        assert!(parse("[source]\nurl = 1\n", None).is_err());
    }

    #[test]
    fn test_log_file_tilde_expanded() {
        let config = parse("log_file = \"~/rdial.log\"\n", None).unwrap();
        let path = config.log_file.unwrap();
        if let Some(home) = home::home_dir() {
            assert_eq!(path, home.join("rdial.log"));
        }
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[source]\nurl = \"http://example.invalid/c.json\"\n").unwrap();
        let config = load(Some(&path)).unwrap();
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.source.url, "http://example.invalid/c.json");
    }
}
