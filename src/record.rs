//! The four-field feature record reported by the CPU dispatch configuration.
//!
//! Values arrive either space separated (console summary) or semicolon
//! separated (CMake list variables). [`FeatureList`] accepts both so that an
//! expectation written one way matches output produced the other way.

use std::fmt;

/// Ordered list of instruction-set tokens such as `SSE4_1` or `NEON`.
///
/// An empty list doubles as the "absent" sentinel: a field that was not
/// reported at all and a field reported with no value compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FeatureList(Vec<String>);

impl FeatureList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `value` on semicolons and whitespace, dropping empty tokens.
    pub fn parse(value: &str) -> Self {
        FeatureList(
            value
                .split(|c: char| c == ';' || c.is_whitespace())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|t| t == token)
    }

    /// Tokens in lexical order, for order-insensitive comparison.
    pub fn sorted(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.0.iter().map(String::as_str).collect();
        v.sort_unstable();
        v
    }

    /// Semicolon-joined form, as CMake writes list variables.
    pub fn to_cmake_list(&self) -> String {
        self.0.join(";")
    }
}

impl fmt::Display for FeatureList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

impl From<&str> for FeatureList {
    fn from(value: &str) -> Self {
        FeatureList::parse(value)
    }
}

/// Sentinel modes accepted by `CPU_BASELINE` instead of a feature list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaselineMode {
    /// Use whatever the compiler enables by default.
    Detect,
    /// Use everything the build host supports.
    Native,
}

impl BaselineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaselineMode::Detect => "DETECT",
            BaselineMode::Native => "NATIVE",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "DETECT" => Some(BaselineMode::Detect),
            "NATIVE" => Some(BaselineMode::Native),
            _ => None,
        }
    }
}

/// The `requested` field: either an explicit list or a sentinel mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requested {
    Features(FeatureList),
    Mode(BaselineMode),
}

impl Requested {
    pub fn parse(value: &str) -> Self {
        let list = FeatureList::parse(value);
        if let [only] = list.tokens() {
            if let Some(mode) = BaselineMode::from_token(only) {
                return Requested::Mode(mode);
            }
        }
        Requested::Features(list)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Requested::Features(list) if list.is_empty())
    }
}

impl Default for Requested {
    fn default() -> Self {
        Requested::Features(FeatureList::new())
    }
}

impl fmt::Display for Requested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requested::Features(list) => list.fmt(f),
            Requested::Mode(mode) => f.write_str(mode.as_str()),
        }
    }
}

/// Baseline, requested, disabled and dispatched features of one configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FeatureRecord {
    pub baseline: FeatureList,
    pub requested: Requested,
    pub disabled: FeatureList,
    pub dispatched: FeatureList,
}

impl FeatureRecord {
    /// Build an expected record from literal strings.
    ///
    /// Pass `""` for fields that should be absent.
    pub fn expect(baseline: &str, requested: &str, disabled: &str, dispatched: &str) -> Self {
        FeatureRecord {
            baseline: FeatureList::parse(baseline),
            requested: Requested::parse(requested),
            disabled: FeatureList::parse(disabled),
            dispatched: FeatureList::parse(dispatched),
        }
    }

    /// True when no field carries any value.
    pub fn is_empty(&self) -> bool {
        self.baseline.is_empty()
            && self.requested.is_empty()
            && self.disabled.is_empty()
            && self.dispatched.is_empty()
    }
}

impl fmt::Display for FeatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.baseline, self.requested, self.disabled, self.dispatched
        )
    }
}
