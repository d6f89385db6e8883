use miette::Error;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::ResolutionError,
    host::MemberResolver,
    runner::{Test, TestResult},
};

/// All tests of one member, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemberTests {
    pub member: String,
    #[serde(default)]
    pub tests: Vec<Test>,
}

impl MemberTests {
    pub fn new(member: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            tests: Vec::new(),
        }
    }

    pub fn test(&self, id: Uuid) -> Option<&Test> {
        self.tests.iter().find(|t| t.id == id)
    }

    pub fn test_mut(&mut self, id: Uuid) -> Option<&mut Test> {
        self.tests.iter_mut().find(|t| t.id == id)
    }
}

/// The persisted collection of tests for a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestRepo {
    #[serde(default)]
    pub member_tests: Vec<MemberTests>,
}

impl TestRepo {
    pub const FILE_EXTENSION: &'static str = ".quicktest";

    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the group for `member`, creating it on first use. The same name
    /// always yields the same group.
    pub fn member_tests(&mut self, member: &str) -> Result<&mut MemberTests, Error> {
        if member.is_empty() {
            return Err(ResolutionError::EmptyName.into());
        }

        let index = match self.member_tests.iter().position(|m| m.member == member) {
            Some(index) => index,
            None => {
                self.member_tests.push(MemberTests::new(member));
                self.member_tests.len() - 1
            }
        };
        Ok(&mut self.member_tests[index])
    }

    pub fn find_member_tests(&self, member: &str) -> Option<&MemberTests> {
        self.member_tests.iter().find(|m| m.member == member)
    }

    /// Copies results from a plan run back onto the tests they were cloned
    /// from. Tests the plan does not contain are left untouched.
    pub fn record_results(&mut self, plan: &TestPlan) {
        for ran in &plan.tests {
            let target = self
                .member_tests
                .iter_mut()
                .filter(|m| m.member == ran.member)
                .find_map(|m| m.test_mut(ran.id));
            if let Some(test) = target {
                test.record_results(ran);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlanSummary {
    pub passed: usize,
    pub failed: usize,
    pub unknown: usize,
}

impl PlanSummary {
    fn record(&mut self, result: TestResult) {
        match result {
            TestResult::Pass => self.passed += 1,
            TestResult::Fail => self.failed += 1,
            TestResult::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.unknown
    }
}

/// An ordered batch of tests to run against one build of the code under test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestPlan {
    pub assembly_path: String,
    #[serde(default)]
    pub tests: Vec<Test>,
}

impl TestPlan {
    pub fn new(assembly_path: impl Into<String>) -> Self {
        Self {
            assembly_path: assembly_path.into(),
            tests: Vec::new(),
        }
    }

    pub fn push(&mut self, test: Test) {
        self.tests.push(test);
    }

    /// Runs every test in order. A failing test never stops the rest.
    pub fn run(&mut self, resolver: &dyn MemberResolver) -> PlanSummary {
        let span = tracing::info_span!("plan", assembly = %self.assembly_path, tests = self.tests.len());
        let _guard = span.enter();

        let mut summary = PlanSummary::default();
        for test in &mut self.tests {
            summary.record(test.run(resolver));
        }

        info!(
            passed = summary.passed,
            failed = summary.failed,
            unknown = summary.unknown,
            "plan finished"
        );
        summary
    }
}
