//! Mock and fixture planning for one suite.
//!
//! Takes the synthesized cases for a single source file and resolves their
//! mock requirements into shared fixtures. Fixtures dedup by (patch target,
//! scope) so no two fixtures shadow the same symbol within a suite, and case
//! fixture references come out in a stable order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::error::{Result, TestsmithError};
use crate::synth::cases::{MockBehavior, TestCaseSpec};
use crate::synth::Literal;

/// Lifetime of a planned fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureScope {
    PerCase,
    PerUnit,
    PerSuite,
}

/// One reusable fixture: a patched symbol with scripted behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureSpec {
    /// Unique within the suite; doubles as the fixture function name.
    pub id: String,
    pub scope: FixtureScope,
    pub patch_target: String,
    pub behavior: MockBehavior,
    /// Setup return literal handed to the test body, when the behavior
    /// yields one.
    pub yields: Option<Literal>,
}

/// Planned suite: the fixture table plus cases annotated with fixture refs.
#[derive(Debug, Clone, Default)]
pub struct SuitePlan {
    pub fixtures: Vec<FixtureSpec>,
    pub cases: Vec<TestCaseSpec>,
}

/// Resolve mocks into fixtures for one suite.
///
/// With `generate_fixtures` off, cases keep their inline mocks and the
/// fixture table stays empty; the emitter then patches per test.
///
/// # Errors
///
/// Returns [`TestsmithError::Config`] when one case requires the same symbol
/// with two different behaviors. Different cases may script the same symbol
/// differently; one case may not.
pub fn plan_suite(config: &GeneratorConfig, cases: Vec<TestCaseSpec>) -> Result<SuitePlan> {
    for case in &cases {
        check_intra_case_conflicts(case)?;
    }

    if !config.generate_fixtures {
        return Ok(SuitePlan {
            fixtures: Vec::new(),
            cases,
        });
    }

    // Dedup key is (patch_target, scope); behavior must agree to share.
    let mut by_key: BTreeMap<(String, FixtureScope), FixtureSpec> = BTreeMap::new();
    let mut planned_cases = Vec::with_capacity(cases.len());

    for mut case in cases {
        let mut refs = Vec::new();
        for mock in &case.mocks {
            let scope = FixtureScope::PerCase;
            let key = (mock.patch_target.clone(), scope);
            let entry = by_key.entry(key).or_insert_with(|| FixtureSpec {
                id: fixture_id(&mock.patch_target),
                scope,
                patch_target: mock.patch_target.clone(),
                behavior: mock.behavior.clone(),
                yields: match &mock.behavior {
                    MockBehavior::Return(value) => Some(value.clone()),
                    MockBehavior::Raise(_) => None,
                },
            });
            if entry.behavior == mock.behavior {
                if !refs.contains(&entry.id) {
                    refs.push(entry.id.clone());
                }
            } else {
                // Same target, different script: this case keeps the mock
                // inline instead of sharing the fixture.
            }
        }
        case.fixtures = refs;
        planned_cases.push(case);
    }

    let mut fixtures: Vec<FixtureSpec> = by_key.into_values().collect();
    fixtures.sort_by(|a, b| a.id.cmp(&b.id));
    dedup_ids(&mut fixtures);

    Ok(SuitePlan {
        fixtures,
        cases: planned_cases,
    })
}

fn check_intra_case_conflicts(case: &TestCaseSpec) -> Result<()> {
    let mut seen: BTreeMap<&str, &MockBehavior> = BTreeMap::new();
    for mock in &case.mocks {
        if let Some(previous) = seen.get(mock.patch_target.as_str()) {
            if **previous != mock.behavior {
                return Err(TestsmithError::Config(format!(
                    "case '{}' requires '{}' with conflicting behaviors",
                    case.name, mock.patch_target
                )));
            }
        } else {
            seen.insert(&mock.patch_target, &mock.behavior);
        }
    }
    Ok(())
}

fn fixture_id(patch_target: &str) -> String {
    let slug: String = patch_target
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("mock_{}", slug.trim_matches('_'))
}

/// Same symbol patched at different scopes can collide on the slug; suffix
/// duplicates to keep ids unique.
fn dedup_ids(fixtures: &mut [FixtureSpec]) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for fixture in fixtures.iter_mut() {
        let n = counts.entry(fixture.id.clone()).or_insert(0);
        *n += 1;
        if *n > 1 {
            fixture.id = format!("{}_{}", fixture.id, n);
        }
    }
}
