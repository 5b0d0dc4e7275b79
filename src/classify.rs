//! Command kind → alarm class mapping.
//!
//! Pure and total: unknown kinds fall through to [`AlarmClass::None`] so
//! newer device firmware can introduce kinds without breaking older apps.

/// Severity class of an incoming command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmClass {
    /// Unrecognised kind, dropped without side effects.
    None,
    /// Informational, self-clearing banner (motion / sound detected).
    Transient,
    /// Quiet notification, no haptics.
    Silent,
    /// Sustained alarm that runs until acknowledged.
    Persistent,
}

impl AlarmClass {
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Transient => "transient",
            Self::Silent => "silent",
            Self::Persistent => "persistent",
        }
    }
}

pub const KIND_MOTION: &str = "motion_detected";
pub const KIND_SOUND: &str = "sound_detected";
pub const KIND_NOTIFICATION: &str = "notification";
pub const KIND_SILENT: &str = "silent";
pub const KIND_VIBRATE: &str = "vibrate";
pub const KIND_WARNING: &str = "warning";

/// Classify a command kind.  Matching is exact (case-sensitive).
pub fn classify(kind: &str) -> AlarmClass {
    match kind {
        KIND_MOTION | KIND_SOUND => AlarmClass::Transient,
        KIND_NOTIFICATION | KIND_SILENT => AlarmClass::Silent,
        KIND_VIBRATE | KIND_WARNING => AlarmClass::Persistent,
        _ => AlarmClass::None,
    }
}

/// Banner text shown for a transient kind.
pub fn banner_text(kind: &str) -> &'static str {
    match kind {
        KIND_MOTION => "Motion detected",
        KIND_SOUND => "Sound detected",
        _ => "Activity detected",
    }
}
