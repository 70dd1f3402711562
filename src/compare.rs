use std::fmt;

use crate::record::{FeatureList, FeatureRecord, Requested};

/// How token lists are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareMode {
    /// Same tokens in the same order.
    #[default]
    Exact,
    /// Same tokens with the same multiplicity, any order.
    Unordered,
}

/// Names of the record fields, in record order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Baseline,
    Requested,
    Disabled,
    Dispatched,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Baseline => "baseline",
            Field::Requested => "requested",
            Field::Disabled => "disabled",
            Field::Dispatched => "dispatched",
        }
    }
}

/// One differing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    pub field: Field,
    pub actual: String,
    pub expected: String,
}

/// Every field where the actual record differs from the expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub actual: FeatureRecord,
    pub expected: FeatureRecord,
    pub diffs: Vec<FieldDiff>,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  actual:   {}", self.actual)?;
        writeln!(f, "  expected: {}", self.expected)?;
        for d in &self.diffs {
            writeln!(
                f,
                "  {}: {:?} != {:?}",
                d.field.name(),
                d.actual,
                d.expected
            )?;
        }
        Ok(())
    }
}

fn lists_equal(a: &FeatureList, b: &FeatureList, mode: CompareMode) -> bool {
    match mode {
        CompareMode::Exact => a == b,
        CompareMode::Unordered => a.sorted() == b.sorted(),
    }
}

fn requested_equal(a: &Requested, b: &Requested, mode: CompareMode) -> bool {
    match (a, b) {
        (Requested::Features(x), Requested::Features(y)) => lists_equal(x, y, mode),
        (Requested::Mode(x), Requested::Mode(y)) => x == y,
        _ => false,
    }
}

/// Compare `actual` against `expected` field by field.
pub fn compare(
    actual: &FeatureRecord,
    expected: &FeatureRecord,
    mode: CompareMode,
) -> Result<(), Mismatch> {
    let mut diffs = Vec::new();
    let mut check = |field: Field, equal: bool, a: String, e: String| {
        if !equal {
            diffs.push(FieldDiff {
                field,
                actual: a,
                expected: e,
            });
        }
    };

    check(
        Field::Baseline,
        lists_equal(&actual.baseline, &expected.baseline, mode),
        actual.baseline.to_string(),
        expected.baseline.to_string(),
    );
    check(
        Field::Requested,
        requested_equal(&actual.requested, &expected.requested, mode),
        actual.requested.to_string(),
        expected.requested.to_string(),
    );
    check(
        Field::Disabled,
        lists_equal(&actual.disabled, &expected.disabled, mode),
        actual.disabled.to_string(),
        expected.disabled.to_string(),
    );
    check(
        Field::Dispatched,
        lists_equal(&actual.dispatched, &expected.dispatched, mode),
        actual.dispatched.to_string(),
        expected.dispatched.to_string(),
    );

    if diffs.is_empty() {
        Ok(())
    } else {
        Err(Mismatch {
            actual: actual.clone(),
            expected: expected.clone(),
            diffs,
        })
    }
}
