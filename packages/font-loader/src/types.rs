use serde::{Deserialize, Serialize};

/// Default weight used when a caller does not ask for one
pub const DEFAULT_FONT_WEIGHT: u16 = 400;

/// Font style as published by the catalog
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

impl FontStyle {
    /// The other style, used for cross-style variant substitution
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            FontStyle::Normal => FontStyle::Italic,
            FontStyle::Italic => FontStyle::Normal,
        }
    }

    #[inline]
    pub fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
        }
    }
}

impl std::fmt::Display for FontStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier for a concrete font face: family, weight and style
///
/// Used as the universal cache and queue key through [`FontIdentity::cache_key`].
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontIdentity {
    pub family: String,
    pub weight: u16,
    pub style: FontStyle,
}

impl FontIdentity {
    /// Create a new FontIdentity
    pub fn new(family: impl Into<String>, weight: u16, style: FontStyle) -> Self {
        Self {
            family: family.into(),
            weight,
            style,
        }
    }

    /// Regular (400, normal) face of a family
    pub fn regular(family: impl Into<String>) -> Self {
        Self::new(family, DEFAULT_FONT_WEIGHT, FontStyle::Normal)
    }

    /// Derived string key `family|weight|style`
    pub fn cache_key(&self) -> String {
        format!("{}|{}|{}", self.family, self.weight, self.style)
    }
}

impl std::fmt::Display for FontIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.family, self.weight, self.style)
    }
}

/// Intended use of a loaded font
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadPurpose {
    /// Lightweight single-weight stylesheet for font pickers
    Preview,
    /// Full variant set plus binaries
    #[default]
    TextEditing,
    Static,
    Context,
}

impl LoadPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadPurpose::Preview => "preview",
            LoadPurpose::TextEditing => "text-editing",
            LoadPurpose::Static => "static",
            LoadPurpose::Context => "context",
        }
    }

    /// Whether a load for this purpose also fetches and registers binaries
    #[inline]
    pub fn needs_binaries(self) -> bool {
        matches!(self, LoadPurpose::TextEditing)
    }
}

impl std::fmt::Display for LoadPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admission priority of a queued load
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPriority {
    Critical,
    High,
    #[default]
    Normal,
    Low,
}

impl LoadPriority {
    /// Sort rank, lower is served first
    #[inline]
    pub fn rank(self) -> u8 {
        match self {
            LoadPriority::Critical => 0,
            LoadPriority::High => 1,
            LoadPriority::Normal => 2,
            LoadPriority::Low => 3,
        }
    }
}

/// Options accepted by [`crate::FontSubsystem::load_with_options`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    pub priority: LoadPriority,
    pub purpose: LoadPurpose,
    pub force_reload: bool,
}

impl LoadOptions {
    /// Options used by `load_for_preview`
    pub fn preview() -> Self {
        Self {
            priority: LoadPriority::Low,
            purpose: LoadPurpose::Preview,
            force_reload: false,
        }
    }

    /// Options used by `load_for_text_editing`
    pub fn text_editing() -> Self {
        Self {
            priority: LoadPriority::Normal,
            purpose: LoadPurpose::TextEditing,
            force_reload: false,
        }
    }

    #[inline]
    pub fn with_priority(mut self, priority: LoadPriority) -> Self {
        self.priority = priority;
        self
    }

    #[inline]
    pub fn with_purpose(mut self, purpose: LoadPurpose) -> Self {
        self.purpose = purpose;
        self
    }

    #[inline]
    pub fn force_reload(mut self) -> Self {
        self.force_reload = true;
        self
    }
}

/// Per-family load state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontLoadStatus {
    #[default]
    Idle,
    Queued,
    Active,
    Loaded,
    Failed,
}

impl std::fmt::Display for FontLoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontLoadStatus::Idle => write!(f, "idle"),
            FontLoadStatus::Queued => write!(f, "queued"),
            FontLoadStatus::Active => write!(f, "active"),
            FontLoadStatus::Loaded => write!(f, "loaded"),
            FontLoadStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Font as handed over by the editor when it records usage history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontDescriptor {
    pub family: Option<String>,
    pub postscript_name: Option<String>,
    pub style: Option<String>,
}

impl FontDescriptor {
    pub fn family(family: impl Into<String>) -> Self {
        Self {
            family: Some(family.into()),
            ..Self::default()
        }
    }
}
