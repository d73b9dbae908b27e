use freedesktop_desktop_entry::DesktopEntry;
use std::env;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefixes tried for a desktop file, in priority order. The empty prefix
/// lets an app id that already is a path to a desktop file win outright.
pub const DESKTOP_PREFIXES: &[&str] = &[
    "",
    "/usr/share/applications/",
    "/usr/share/applications/kde/",
    "/usr/share/applications/org.kde.",
    "/usr/local/share/applications/",
    "/usr/local/share/applications/org.kde.",
];

pub const ICON_THEME_DIR: &str = "/usr/share/icons/Papirus-Dark";
const ICON_SIZE_DIR: &str = "24x24";
const APPS_CATEGORY: &str = "apps";
const ICON_EXTENSION: &str = "svg";
const FALLBACK_ICON: &str = "mimetypes/application-x-executable.svg";

const DESKTOP_SUFFIXES: [&str; 2] = ["", ".desktop"];

/// Image extensions dropped from a themed `Icon=` name.
const ICON_NAME_SUFFIXES: [&str; 3] = [".png", ".svg", ".xpm"];

/// Searched for `TryExec` programs when `PATH` is unset.
const DEFAULT_PATH: &str = "/bin:/usr/bin";

/// Icon declared by a desktop file.
#[derive(Debug, Clone, PartialEq, Eq)]
enum IconRef {
    Path(PathBuf),
    Themed(String),
}

impl IconRef {
    fn from_declared(icon: &str) -> Option<Self> {
        let icon = icon.trim();
        if icon.is_empty() {
            None
        } else if icon.starts_with('/') {
            Some(IconRef::Path(PathBuf::from(icon)))
        } else {
            let name = ICON_NAME_SUFFIXES
                .iter()
                .find_map(|ext| icon.strip_suffix(ext))
                .unwrap_or(icon);
            Some(IconRef::Themed(name.to_string()))
        }
    }
}

/// Maps an application id to an icon file path.
///
/// Nothing is cached: each call checks the filesystem again, so results
/// follow desktop files and themes being installed or removed.
#[derive(Debug, Clone)]
pub struct IconResolver {
    desktop_prefixes: Vec<String>,
    theme_dir: PathBuf,
    fallback: PathBuf,
}

impl Default for IconResolver {
    fn default() -> Self {
        let theme_dir = PathBuf::from(ICON_THEME_DIR);
        let fallback = theme_dir.join(ICON_SIZE_DIR).join(FALLBACK_ICON);
        IconResolver {
            desktop_prefixes: DESKTOP_PREFIXES.iter().map(|p| p.to_string()).collect(),
            theme_dir,
            fallback,
        }
    }
}

impl IconResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver probing custom locations instead of the system ones.
    pub fn with_locations(
        desktop_prefixes: Vec<String>,
        theme_dir: impl Into<PathBuf>,
        fallback: impl Into<PathBuf>,
    ) -> Self {
        IconResolver {
            desktop_prefixes,
            theme_dir: theme_dir.into(),
            fallback: fallback.into(),
        }
    }

    pub fn fallback(&self) -> &Path {
        &self.fallback
    }

    /// Resolve the icon for `app_id`. Always returns a path; when nothing
    /// matches it is the generic executable icon.
    pub fn resolve(&self, app_id: &str) -> PathBuf {
        if app_id.is_empty() {
            return self.fallback.clone();
        }

        match self.find_desktop_icon(app_id) {
            Some(IconRef::Path(path)) if path.exists() => return path,
            Some(IconRef::Themed(name)) => {
                let path = self.theme_path(&name);
                if path.exists() {
                    return path;
                }
            }
            _ => {}
        }

        let path = self.theme_path(app_id);
        if path.exists() {
            return path;
        }

        debug!("No icon for app_id '{}', using fallback", app_id);
        self.fallback.clone()
    }

    /// Every desktop file location tried for `app_id`, in the order they are tried.
    pub fn desktop_candidates(&self, app_id: &str) -> Vec<PathBuf> {
        let lower = app_id.to_ascii_lowercase();
        let mut variations = vec![app_id];
        if lower != app_id {
            variations.push(&lower);
        }

        let mut candidates = Vec::new();
        for prefix in &self.desktop_prefixes {
            for id in &variations {
                for suffix in DESKTOP_SUFFIXES {
                    candidates.push(PathBuf::from(format!("{}{}{}", prefix, id, suffix)));
                }
            }
        }
        candidates
    }

    /// Icon declared by the first parseable desktop file for `app_id`.
    fn find_desktop_icon(&self, app_id: &str) -> Option<IconRef> {
        for candidate in self.desktop_candidates(app_id) {
            if let Some(icon) = parse_desktop_file(&candidate) {
                debug!("Desktop file for '{}' is {:?}", app_id, candidate);
                return icon.as_deref().and_then(IconRef::from_declared);
            }
        }
        None
    }

    fn theme_path(&self, name: &str) -> PathBuf {
        self.theme_dir
            .join(ICON_SIZE_DIR)
            .join(APPS_CATEGORY)
            .join(format!("{}.{}", name, ICON_EXTENSION))
    }
}

/// Parse a desktop file. `None` when the file is missing, is not an
/// application entry or names a `TryExec` program that is not installed;
/// otherwise its `Icon` key, if any.
fn parse_desktop_file(path: &Path) -> Option<Option<String>> {
    if !path.is_file() {
        return None;
    }
    let bytes = std::fs::read(path).ok()?;
    let content = String::from_utf8(bytes).ok()?;
    let entry = DesktopEntry::decode(path, &content).ok()?;

    if entry.desktop_entry("Type") != Some("Application") {
        return None;
    }
    if let Some(program) = entry.desktop_entry("TryExec").filter(|p| !p.is_empty()) {
        if !program_available(program) {
            debug!("Skipping {:?}: TryExec {} not found", path, program);
            return None;
        }
    }
    Some(entry.icon().map(|s| s.to_string()))
}

/// Whether `program` is an executable path, or an executable found on `PATH`.
fn program_available(program: &str) -> bool {
    if program.contains('/') {
        return is_executable(Path::new(program));
    }
    let paths = env::var_os("PATH").unwrap_or_else(|| DEFAULT_PATH.into());
    env::split_paths(&paths).any(|dir| is_executable(&dir.join(program)))
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
