use chrono::{DateTime, Utc};
use miette::{Diagnostic, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    ast::Expression,
    codec,
    error::{EvaluationError, InvocationError, ResolutionError},
    evaluator::{construct_object, first_member, EvalEnv},
    host::{MemberHandle, MemberResolver, TypeHandle},
    value::Value,
};

pub mod collection;
pub use collection::{MemberTests, PlanSummary, TestPlan, TestRepo};

pub const EXPECTED_VALUE_FAIL: &str = "Expected Value Fail";
pub const ASSERT_FAIL: &str = "Assert Fail";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TestType {
    #[default]
    Function,
    Procedure,
    PropertyGetter,
    PropertySetter,
}

impl TestType {
    /// Only these produce a value that an expected-value check can judge.
    pub fn checks_expected_value(&self) -> bool {
        matches!(self, TestType::Function | TestType::PropertyGetter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TestResult {
    Fail,
    Pass,
    #[default]
    Unknown,
}

/// A named argument, stored in its serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestArgument {
    pub name: String,
    #[serde(default)]
    pub value_string: String,
    #[serde(default)]
    pub value_type: String,
}

impl Default for TestArgument {
    fn default() -> Self {
        Self::named("value")
    }
}

impl TestArgument {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_string: String::new(),
            value_type: String::new(),
        }
    }

    pub fn new(name: impl Into<String>, value_string: impl Into<String>) -> Self {
        Self {
            value_string: value_string.into(),
            ..Self::named(name)
        }
    }

    pub fn with_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = value_type.into();
        self
    }

    pub fn value(&self, resolver: &dyn MemberResolver) -> Result<Value, Error> {
        codec::deserialize(resolver, &self.value_string, &self.value_type)
    }

    pub fn set_value(&mut self, value: &Value) {
        (self.value_string, self.value_type) = codec::serialize(value);
    }

    /// Empty text yields the declared type's default; object literals build a
    /// new instance of the declared type; anything else is evaluated in `env`.
    pub fn evaluate(&self, env: &EvalEnv<'_>) -> Result<Value, Error> {
        let resolver = env.resolver();
        if self.value_string.trim().is_empty() {
            return codec::default_of(resolver, &self.value_type);
        }

        let expr = Expression::parse(&self.value_string)?;
        match expr.as_object_literal() {
            Some(assignments) => {
                let ty = resolver.find_type(&self.value_type).ok_or_else(|| {
                    ResolutionError::TypeNotFound {
                        name: self.value_type.clone(),
                    }
                })?;
                construct_object(resolver, &ty, assignments, Some(env))
            }
            None => expr.eval(env),
        }
    }
}

/// One declarative test of one member.
///
/// `member` is `Namespace.Type.Member`. The result fields are only written by
/// [`Test::run`], which resets them first, so a test can be re-run freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Test {
    pub id: Uuid,
    pub member: String,
    pub test_type: TestType,

    #[serde(default)]
    pub this_string: String,
    #[serde(default)]
    pub arguments: Vec<TestArgument>,
    #[serde(default)]
    pub expected_value_string: String,
    #[serde(default)]
    pub assert_string: String,

    #[serde(default)]
    pub result: TestResult,
    #[serde(default)]
    pub result_time_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub value_string: String,
    #[serde(default)]
    pub value_type: String,
    #[serde(default)]
    pub fail_info: String,
}

impl Default for Test {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            member: String::new(),
            test_type: TestType::default(),
            this_string: String::new(),
            arguments: Vec::new(),
            expected_value_string: String::new(),
            assert_string: String::new(),
            result: TestResult::Unknown,
            result_time_utc: None,
            value_string: String::new(),
            value_type: String::new(),
            fail_info: String::new(),
        }
    }
}

/// What a failed run records: kind and message on one line. Engine errors
/// already lead with their kind. An invocation error is unwrapped to the
/// member's own error, named by its diagnostic code when it has one.
fn fail_info(err: &Error) -> String {
    match err.downcast_ref::<InvocationError>() {
        Some(invocation) => {
            let kind = Diagnostic::code(&*invocation.cause)
                .map(|code| code.to_string())
                .unwrap_or_else(|| "InvocationError".to_string());
            format!("{kind}: {}", invocation.cause)
        }
        None => err.to_string(),
    }
}

impl Test {
    pub fn new(member: impl Into<String>, test_type: TestType) -> Self {
        Self {
            member: member.into(),
            test_type,
            ..Self::default()
        }
    }

    /// Finds the argument called `name`, appending an empty one if missing.
    pub fn argument(&mut self, name: &str) -> &mut TestArgument {
        let index = match self.arguments.iter().position(|a| a.name == name) {
            Some(index) => index,
            None => {
                self.arguments.push(TestArgument::named(name));
                self.arguments.len() - 1
            }
        };
        &mut self.arguments[index]
    }

    /// The captured result, decoded.
    pub fn value(&self, resolver: &dyn MemberResolver) -> Result<Value, Error> {
        codec::deserialize(resolver, &self.value_string, &self.value_type)
    }

    pub fn set_value(&mut self, value: &Value) {
        (self.value_string, self.value_type) = codec::serialize(value);
    }

    /// Copies the outcome of another run of this test.
    pub fn record_results(&mut self, other: &Test) {
        self.result = other.result;
        self.result_time_utc = other.result_time_utc;
        self.value_string = other.value_string.clone();
        self.value_type = other.value_type.clone();
        self.fail_info = other.fail_info.clone();
    }

    /// Runs the test against `resolver` and records the verdict. Errors never
    /// escape: they become `Fail` with the error in `fail_info`.
    pub fn run(&mut self, resolver: &dyn MemberResolver) -> TestResult {
        self.result = TestResult::Unknown;
        self.fail_info.clear();
        self.set_value(&Value::Null);

        debug!(id = %self.id, member = %self.member, test_type = ?self.test_type, "running test");

        if let Err(err) = self.execute(resolver) {
            self.result = TestResult::Fail;
            self.fail_info = fail_info(&err);
            warn!(member = %self.member, fail_info = %self.fail_info, "test raised an error");
        }

        self.result_time_utc = Some(Utc::now());
        info!(member = %self.member, result = ?self.result, "test finished");
        self.result
    }

    fn execute(&mut self, resolver: &dyn MemberResolver) -> Result<(), Error> {
        let (type_name, member_name) =
            self.member
                .rsplit_once('.')
                .ok_or_else(|| ResolutionError::Unqualified {
                    member: self.member.clone(),
                })?;

        let ty = resolver
            .find_type(type_name)
            .ok_or_else(|| ResolutionError::TypeNotFound {
                name: type_name.to_string(),
            })?;
        let member = first_member(resolver, &ty, member_name)?;

        let receiver = if resolver.is_static(&member) {
            Value::Null
        } else {
            self.build_receiver(resolver, &ty)?
        };
        debug!(receiver = ?receiver, "receiver ready");

        let env = EvalEnv::new(resolver, receiver.clone(), Some(ty.clone()));

        let value = match self.test_type {
            TestType::Function | TestType::Procedure => {
                let args = self.evaluate_arguments(&env)?;
                self.invoke(resolver, &member, &receiver, args)?
            }
            TestType::PropertyGetter => resolver.get_value(&member, &receiver)?,
            TestType::PropertySetter => {
                let mut args = self.evaluate_arguments(&env)?;
                if args.len() != 1 {
                    return Err(EvaluationError::Arity {
                        member: self.member.clone(),
                        expected: 1,
                        found: args.len(),
                    }
                    .into());
                }
                let value = args.remove(0);
                resolver.set_value(&member, &receiver, value)?;
                Value::Null
            }
        };
        self.set_value(&value);

        if self.test_type.checks_expected_value() {
            self.check_expected_value();
        }
        self.check_asserts(&env)
    }

    fn build_receiver(
        &self,
        resolver: &dyn MemberResolver,
        ty: &TypeHandle,
    ) -> Result<Value, Error> {
        if self.this_string.trim().is_empty() {
            return resolver.construct(ty);
        }

        let expr = Expression::parse(&self.this_string)?;
        match expr.as_object_literal() {
            Some(assignments) => construct_object(resolver, ty, assignments, None),
            None => expr.eval(&EvalEnv::empty(resolver)),
        }
    }

    fn evaluate_arguments(&self, env: &EvalEnv<'_>) -> Result<Vec<Value>, Error> {
        self.arguments
            .iter()
            .map(|argument| argument.evaluate(env))
            .collect()
    }

    fn invoke(
        &self,
        resolver: &dyn MemberResolver,
        member: &MemberHandle,
        receiver: &Value,
        args: Vec<Value>,
    ) -> Result<Value, Error> {
        debug!(member = %self.member, args = args.len(), "invoking");
        resolver.invoke(member, receiver, args)
    }

    fn check_expected_value(&mut self) {
        if self.result == TestResult::Fail || self.expected_value_string.is_empty() {
            return;
        }

        // compared as text, not as typed values
        if self.value_string != self.expected_value_string {
            self.result = TestResult::Fail;
            self.fail_info = EXPECTED_VALUE_FAIL.to_string();
        } else {
            self.result = TestResult::Pass;
        }
    }

    fn check_asserts(&mut self, env: &EvalEnv<'_>) -> Result<(), Error> {
        if self.result == TestResult::Fail || self.assert_string.trim().is_empty() {
            return Ok(());
        }

        let expr = Expression::parse(&self.assert_string)?;
        match expr.eval(env)? {
            Value::Bool(true) => self.result = TestResult::Pass,
            _ => {
                self.result = TestResult::Fail;
                self.fail_info = ASSERT_FAIL.to_string();
            }
        }
        Ok(())
    }
}
