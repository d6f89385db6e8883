use miette::Error;

use crate::{
    ast::{Assignment, BinaryOp, Constant, Expression, ExpressionInner},
    error::{EvaluationError, ResolutionError},
    host::{MemberHandle, MemberResolver, TypeHandle},
    value::Value,
};

/// What names resolve against during one evaluation: a receiver (possibly
/// `Null`) and its type, reached through the host's resolver.
pub struct EvalEnv<'r> {
    resolver: &'r dyn MemberResolver,
    receiver: Value,
    receiver_type: Option<TypeHandle>,
}

impl<'r> EvalEnv<'r> {
    pub fn new(
        resolver: &'r dyn MemberResolver,
        receiver: Value,
        receiver_type: Option<TypeHandle>,
    ) -> Self {
        Self {
            resolver,
            receiver,
            receiver_type,
        }
    }

    /// No receiver: only constants and expressions built from them evaluate.
    pub fn empty(resolver: &'r dyn MemberResolver) -> Self {
        Self::new(resolver, Value::Null, None)
    }

    pub fn resolver(&self) -> &'r dyn MemberResolver {
        self.resolver
    }

    pub fn receiver(&self) -> &Value {
        &self.receiver
    }

    pub fn lookup(&self, name: &str) -> Result<Value, Error> {
        let ty = self
            .receiver_type
            .as_ref()
            .ok_or_else(|| ResolutionError::NoReceiver {
                name: name.to_string(),
            })?;
        read_member(self.resolver, ty, &self.receiver, name)
    }
}

pub(crate) fn first_member(
    resolver: &dyn MemberResolver,
    ty: &TypeHandle,
    name: &str,
) -> Result<MemberHandle, Error> {
    resolver
        .find_members(ty, name)
        .into_iter()
        .next()
        .ok_or_else(|| {
            ResolutionError::MemberNotFound {
                member: name.to_string(),
                type_name: ty.name.to_string(),
            }
            .into()
        })
}

fn read_member(
    resolver: &dyn MemberResolver,
    ty: &TypeHandle,
    target: &Value,
    name: &str,
) -> Result<Value, Error> {
    let member = first_member(resolver, ty, name)?;
    if !member.kind.is_readable() {
        return Err(EvaluationError::NotReadable {
            member: name.to_string(),
            type_name: ty.name.to_string(),
        }
        .into());
    }
    resolver.get_value(&member, target)
}

/// Default-constructs `ty` and applies `assignments` in order. Each value is
/// evaluated against `env`, or, when `env` is `None`, against the instance
/// being built.
pub fn construct_object(
    resolver: &dyn MemberResolver,
    ty: &TypeHandle,
    assignments: &[Assignment],
    env: Option<&EvalEnv<'_>>,
) -> Result<Value, Error> {
    let object = resolver.construct(ty)?;

    let own_env;
    let env = match env {
        Some(env) => env,
        None => {
            own_env = EvalEnv::new(resolver, object.clone(), Some(ty.clone()));
            &own_env
        }
    };

    for assignment in assignments {
        let member = first_member(resolver, ty, &assignment.name)?;
        let value = assignment.value.eval(env)?;
        resolver.set_value(&member, &object, value)?;
    }

    Ok(object)
}

impl From<&Constant> for Value {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Int(n) => Value::Int(*n),
            Constant::Float(n) => Value::Float(*n),
            Constant::String(s) => Value::Str(s.clone()),
        }
    }
}

fn bool_operand(operator: BinaryOp, side: &str, value: &Value) -> Result<bool, Error> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(EvaluationError::BadOperand {
            operator: operator.to_string(),
            reason: format!("{side} operand must be bool, found '{other}'"),
        }
        .into()),
    }
}

impl Expression {
    pub fn eval(&self, env: &EvalEnv<'_>) -> Result<Value, Error> {
        match &self.inner {
            ExpressionInner::Constant(constant) => Ok(constant.into()),

            ExpressionInner::Variable(name) => env.lookup(name),

            ExpressionInner::Member { target, name } => {
                let value = target.eval(env)?;
                if value.is_null() {
                    return Err(EvaluationError::NullTarget {
                        member: name.to_string(),
                    }
                    .into());
                }

                let ty = env.resolver.type_of(&value).ok_or_else(|| {
                    ResolutionError::TypeNotFound {
                        name: value.type_name().to_string(),
                    }
                })?;
                read_member(env.resolver, &ty, &value, name)
            }

            ExpressionInner::Binary {
                operator,
                left,
                right,
            } => {
                let left_value = left.eval(env)?;

                match operator {
                    // both sides always run, even when the left is false
                    BinaryOp::And => {
                        let right_value = right.eval(env)?;
                        let l = bool_operand(*operator, "left", &left_value)?;
                        let r = bool_operand(*operator, "right", &right_value)?;
                        Ok(Value::Bool(l && r))
                    }

                    BinaryOp::Equal => {
                        if left_value.is_null() {
                            return Err(EvaluationError::BadOperand {
                                operator: operator.to_string(),
                                reason: "left operand is null".to_string(),
                            }
                            .into());
                        }
                        let right_value = right.eval(env)?;
                        Ok(Value::Bool(left_value == right_value))
                    }

                    unsupported => Err(EvaluationError::UnsupportedOperator {
                        operator: unsupported.to_string(),
                    }
                    .into()),
                }
            }

            ExpressionInner::ObjectLiteral(_) => Err(EvaluationError::ObjectLiteral.into()),
        }
    }
}
