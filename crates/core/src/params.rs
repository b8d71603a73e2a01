// crates/core/src/params.rs
//! Parameter validation for the command endpoints.
//!
//! Every endpoint accepts untrusted input either from the query string or a
//! JSON body. The raw `*Input` types capture what the caller sent (all fields
//! optional); `validate()` turns them into fully-populated, in-range parameter
//! records. Validation never fails: out-of-range or unknown values are replaced
//! by the documented default and a warning is logged.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Suffix appended to caller-supplied log messages so generated traffic is
/// distinguishable from real application logs.
pub const MESSAGE_MARKER: &str = "(Fake message)";

// ============================================================================
// Numeric bounds
// ============================================================================

/// Inclusive range plus the value used when input is absent or out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
    pub default: i64,
}

impl Bounds {
    pub const fn new(min: i64, max: i64, default: i64) -> Self {
        Self { min, max, default }
    }

    /// Return `value` if it lies inside the range, the default otherwise.
    pub fn apply(&self, field: &'static str, value: Option<i64>) -> i64 {
        match value {
            None => self.default,
            Some(v) if (self.min..=self.max).contains(&v) => v,
            Some(v) => {
                tracing::warn!(
                    field,
                    value = v,
                    min = self.min,
                    max = self.max,
                    default = self.default,
                    "parameter out of range, using default"
                );
                self.default
            }
        }
    }
}

pub const DELAY_DURATION: Bounds = Bounds::new(0, 300, 0);
pub const RESPONSE_CODE: Bounds = Bounds::new(100, 599, 200);
pub const LOG_INTERVAL: Bounds = Bounds::new(0, 3600, 0);
pub const LOG_DURATION: Bounds = Bounds::new(0, 86_400, 0);
pub const CPU_DURATION: Bounds = Bounds::new(0, 3600, 60);
pub const MEMORY_SIZE_MB: Bounds = Bounds::new(1, 8192, 100);
pub const MEMORY_DURATION: Bounds = Bounds::new(0, 3600, 60);
pub const KILL_DELAY: Bounds = Bounds::new(0, 3600, 0);
pub const EXIT_CODE: Bounds = Bounds::new(0, 255, 0);

// ============================================================================
// Enumerated fields
// ============================================================================

/// Error returned when an enumerated field does not match its allow-list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field} value: {value}")]
pub struct UnknownChoice {
    pub field: &'static str,
    pub value: String,
}

/// Parse an optional enumerated field, falling back to `default` on a miss.
///
/// Matching is case-insensitive for every enumeration. Blank input counts as
/// absent and is not reported.
fn parse_choice<T>(raw: Option<&str>, default: T) -> T
where
    T: FromStr<Err = UnknownChoice> + Copy + fmt::Display,
{
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return default;
    };
    match raw.parse() {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(field = err.field, value = %err.value, default = %default, "invalid choice, using default");
            default
        }
    }
}

/// Requested severity for generated log entries, including the `random` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Random,
}

/// A concrete severity; what `LogLevel::Random` resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Info, Severity::Warning, Severity::Error];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Random => "random",
        }
    }

    /// Resolve to a concrete severity. `Random` picks a fresh one on every call.
    pub fn resolve_with<R: Rng + ?Sized>(self, rng: &mut R) -> Severity {
        match self {
            LogLevel::Info => Severity::Info,
            LogLevel::Warning => Severity::Warning,
            LogLevel::Error => Severity::Error,
            LogLevel::Random => *Severity::ALL.choose(rng).unwrap_or(&Severity::Info),
        }
    }

    pub fn resolve(self) -> Severity {
        self.resolve_with(&mut rand::thread_rng())
    }
}

impl FromStr for LogLevel {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(LogLevel::Info),
            "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "random" => Ok(LogLevel::Random),
            _ => Err(UnknownChoice { field: "level", value: s.to_string() }),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested length of generated messages, including the `random` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSize {
    Short,
    Medium,
    Long,
    Random,
}

/// A concrete message length category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeCategory {
    Short,
    Medium,
    Long,
}

impl SizeCategory {
    pub const ALL: [SizeCategory; 3] = [SizeCategory::Short, SizeCategory::Medium, SizeCategory::Long];
}

impl LogSize {
    pub fn as_str(self) -> &'static str {
        match self {
            LogSize::Short => "short",
            LogSize::Medium => "medium",
            LogSize::Long => "long",
            LogSize::Random => "random",
        }
    }

    pub fn resolve_with<R: Rng + ?Sized>(self, rng: &mut R) -> SizeCategory {
        match self {
            LogSize::Short => SizeCategory::Short,
            LogSize::Medium => SizeCategory::Medium,
            LogSize::Long => SizeCategory::Long,
            LogSize::Random => *SizeCategory::ALL.choose(rng).unwrap_or(&SizeCategory::Short),
        }
    }
}

impl FromStr for LogSize {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(LogSize::Short),
            "medium" => Ok(LogSize::Medium),
            "long" => Ok(LogSize::Long),
            "random" => Ok(LogSize::Random),
            _ => Err(UnknownChoice { field: "size", value: s.to_string() }),
        }
    }
}

impl fmt::Display for LogSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named CPU workload tier. See [`crate::workload::CpuProfile`] for the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuIntensity {
    Light,
    Medium,
    Heavy,
    Extreme,
}

impl CpuIntensity {
    pub const ALL: [CpuIntensity; 4] = [
        CpuIntensity::Light,
        CpuIntensity::Medium,
        CpuIntensity::Heavy,
        CpuIntensity::Extreme,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CpuIntensity::Light => "light",
            CpuIntensity::Medium => "medium",
            CpuIntensity::Heavy => "heavy",
            CpuIntensity::Extreme => "extreme",
        }
    }
}

impl FromStr for CpuIntensity {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(CpuIntensity::Light),
            "medium" => Ok(CpuIntensity::Medium),
            "heavy" => Ok(CpuIntensity::Heavy),
            "extreme" => Ok(CpuIntensity::Extreme),
            _ => Err(UnknownChoice { field: "intensity", value: s.to_string() }),
        }
    }
}

impl fmt::Display for CpuIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Free text and flags
// ============================================================================

/// Empty messages mean "generate one"; anything else gets the marker suffix.
pub fn normalize_message(raw: Option<&str>) -> Option<String> {
    let raw = raw.filter(|m| !m.is_empty())?;
    if raw.ends_with(MESSAGE_MARKER) {
        Some(raw.to_string())
    } else {
        Some(format!("{raw} {MESSAGE_MARKER}"))
    }
}

/// Boolean-ish flag accepted either as a JSON bool or as a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FlagInput {
    Bool(bool),
    Text(String),
}

impl FlagInput {
    /// Only an explicit `false` turns the flag off.
    fn enabled(&self) -> bool {
        match self {
            FlagInput::Bool(b) => *b,
            FlagInput::Text(s) => !s.trim().eq_ignore_ascii_case("false"),
        }
    }
}

fn secs(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

// ============================================================================
// Raw inputs and validated records
// ============================================================================

/// Raw input for `/delay`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DelayInput {
    pub duration: Option<i64>,
    pub code: Option<i64>,
}

/// Validated `/delay` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DelayParams {
    pub duration: u64,
    pub code: u16,
}

impl DelayParams {
    pub fn sleep(&self) -> Duration {
        Duration::from_secs(self.duration)
    }
}

impl DelayInput {
    pub fn validate(self) -> DelayParams {
        DelayParams {
            duration: secs(DELAY_DURATION.apply("duration", self.duration)),
            code: u16::try_from(RESPONSE_CODE.apply("code", self.code)).unwrap_or(200),
        }
    }
}

/// Raw input for `/respond`. Header pairs are passed through untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RespondInput {
    pub duration: Option<i64>,
    pub code: Option<i64>,
    #[serde(default)]
    pub headers: Option<std::collections::BTreeMap<String, String>>,
}

/// Validated `/respond` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RespondParams {
    pub delay: DelayParams,
    pub headers: std::collections::BTreeMap<String, String>,
}

impl RespondInput {
    pub fn validate(self) -> RespondParams {
        RespondParams {
            delay: DelayInput { duration: self.duration, code: self.code }.validate(),
            headers: self.headers.unwrap_or_default(),
        }
    }
}

/// Raw input for `/log`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogInput {
    pub level: Option<String>,
    pub size: Option<String>,
    pub message: Option<String>,
    pub interval: Option<i64>,
    pub duration: Option<i64>,
    pub correlation: Option<FlagInput>,
}

/// Validated `/log` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogParams {
    pub level: LogLevel,
    pub size: LogSize,
    /// Caller message with the marker applied; `None` means generate.
    pub message: Option<String>,
    pub interval: u64,
    pub duration: u64,
    pub include_correlation: bool,
}

impl LogInput {
    pub fn validate(self) -> LogParams {
        LogParams {
            level: parse_choice(self.level.as_deref(), LogLevel::Info),
            size: parse_choice(self.size.as_deref(), LogSize::Short),
            message: normalize_message(self.message.as_deref()),
            interval: secs(LOG_INTERVAL.apply("interval", self.interval)),
            duration: secs(LOG_DURATION.apply("duration", self.duration)),
            include_correlation: self.correlation.as_ref().map_or(true, FlagInput::enabled),
        }
    }
}

/// Raw input for `/cpu`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpuInput {
    pub intensity: Option<String>,
    pub duration: Option<i64>,
}

/// Validated `/cpu` parameters. `duration == 0` means run until cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuParams {
    pub intensity: CpuIntensity,
    pub duration: u64,
}

impl CpuInput {
    pub fn validate(self) -> CpuParams {
        CpuParams {
            intensity: parse_choice(self.intensity.as_deref(), CpuIntensity::Medium),
            duration: secs(CPU_DURATION.apply("duration", self.duration)),
        }
    }
}

/// Raw input for `/memory`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryInput {
    pub size: Option<i64>,
    pub duration: Option<i64>,
}

/// Validated `/memory` parameters. `duration == 0` means hold forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryParams {
    pub size_mb: u64,
    pub duration: u64,
}

impl MemoryInput {
    pub fn validate(self) -> MemoryParams {
        MemoryParams {
            size_mb: secs(MEMORY_SIZE_MB.apply("size", self.size)),
            duration: secs(MEMORY_DURATION.apply("duration", self.duration)),
        }
    }
}

/// Raw input for `/kill`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KillInput {
    pub delay: Option<i64>,
    pub code: Option<i64>,
}

/// Validated `/kill` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KillParams {
    pub delay: u64,
    pub code: i32,
}

impl KillInput {
    pub fn validate(self) -> KillParams {
        KillParams {
            delay: secs(KILL_DELAY.apply("delay", self.delay)),
            code: i32::try_from(EXIT_CODE.apply("code", self.code)).unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_bounds_keep_in_range_values() {
        assert_eq!(DELAY_DURATION.apply("duration", Some(0)), 0);
        assert_eq!(DELAY_DURATION.apply("duration", Some(300)), 300);
        assert_eq!(RESPONSE_CODE.apply("code", Some(599)), 599);
    }

    #[test]
    fn test_bounds_replace_out_of_range_with_default() {
        for bad in [-1, 301, 10_000, i64::MIN, i64::MAX] {
            assert_eq!(DELAY_DURATION.apply("duration", Some(bad)), 0, "value {bad}");
        }
        assert_eq!(RESPONSE_CODE.apply("code", Some(99)), 200);
        assert_eq!(RESPONSE_CODE.apply("code", Some(600)), 200);
        assert_eq!(CPU_DURATION.apply("duration", Some(3601)), 60);
        assert_eq!(MEMORY_SIZE_MB.apply("size", Some(0)), 100);
        assert_eq!(EXIT_CODE.apply("code", Some(256)), 0);
    }

    #[test]
    fn test_absent_values_use_default() {
        let cpu = CpuInput::default().validate();
        assert_eq!(cpu, CpuParams { intensity: CpuIntensity::Medium, duration: 60 });

        let mem = MemoryInput::default().validate();
        assert_eq!(mem, MemoryParams { size_mb: 100, duration: 60 });

        let delay = DelayInput::default().validate();
        assert_eq!(delay, DelayParams { duration: 0, code: 200 });

        let kill = KillInput::default().validate();
        assert_eq!(kill, KillParams { delay: 0, code: 0 });
    }

    #[test]
    fn test_choices_are_case_insensitive() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("Long".parse::<LogSize>(), Ok(LogSize::Long));
        assert_eq!("EXTREME".parse::<CpuIntensity>(), Ok(CpuIntensity::Extreme));
        assert_eq!("Random".parse::<LogLevel>(), Ok(LogLevel::Random));
    }

    #[test]
    fn test_unknown_intensity_defaults_to_medium() {
        for raw in ["turbo", "", "   ", "lightest", "medium-ish"] {
            let params = CpuInput { intensity: Some(raw.to_string()), duration: None }.validate();
            assert_eq!(params.intensity, CpuIntensity::Medium, "input {raw:?}");
        }
    }

    #[test]
    fn test_unknown_level_and_size_fall_back() {
        let params = LogInput {
            level: Some("debug".into()),
            size: Some("huge".into()),
            ..Default::default()
        }
        .validate();
        assert_eq!(params.level, LogLevel::Info);
        assert_eq!(params.size, LogSize::Short);
    }

    #[test]
    fn test_random_level_resolves_to_concrete_values() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(LogLevel::Random.resolve_with(&mut rng));
        }
        assert_eq!(seen.len(), 3, "random should cover every severity");
        assert_eq!(LogLevel::Error.resolve_with(&mut rng), Severity::Error);
    }

    #[test]
    fn test_random_size_resolves_to_concrete_values() {
        let mut rng = StdRng::seed_from_u64(11);
        let seen: std::collections::HashSet<_> =
            (0..200).map(|_| LogSize::Random.resolve_with(&mut rng)).collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_message_marker_appended_once() {
        assert_eq!(normalize_message(None), None);
        assert_eq!(normalize_message(Some("")), None);
        assert_eq!(
            normalize_message(Some("disk full")),
            Some("disk full (Fake message)".to_string())
        );
        assert_eq!(
            normalize_message(Some("disk full (Fake message)")),
            Some("disk full (Fake message)".to_string())
        );
    }

    #[test]
    fn test_correlation_flag() {
        let on = LogInput::default().validate();
        assert!(on.include_correlation);

        let off = LogInput { correlation: Some(FlagInput::Text("false".into())), ..Default::default() }.validate();
        assert!(!off.include_correlation);

        let off_bool = LogInput { correlation: Some(FlagInput::Bool(false)), ..Default::default() }.validate();
        assert!(!off_bool.include_correlation);

        let other = LogInput { correlation: Some(FlagInput::Text("nope".into())), ..Default::default() }.validate();
        assert!(other.include_correlation);
    }

    #[test]
    fn test_log_input_from_json() {
        let input: LogInput = serde_json::from_str(
            r#"{"level":"error","size":"long","interval":5,"duration":60,"correlation":false}"#,
        )
        .unwrap();
        let params = input.validate();
        assert_eq!(params.level, LogLevel::Error);
        assert_eq!(params.size, LogSize::Long);
        assert_eq!(params.interval, 5);
        assert_eq!(params.duration, 60);
        assert!(!params.include_correlation);
    }

    #[test]
    fn test_log_bounds() {
        let params = LogInput { interval: Some(3601), duration: Some(86_401), ..Default::default() }.validate();
        assert_eq!(params.interval, 0);
        assert_eq!(params.duration, 0);
    }
}
