use super::value::{DisplayOperand, EntityKind, EntityRef, Scalar, Value};
use crate::eval::evaluator::{EvalError, EvalResult};

/// `protocol(id)`, `chain(id)`, `token(id)`: a single string argument
/// becomes an [`EntityRef`].
pub fn resolve_entity(kind: EntityKind, args: &[Option<Value>]) -> EvalResult<Value> {
    match args {
        [Some(Value::Scalar(Scalar::String(id)))] => {
            Ok(Value::Entity(EntityRef::new(kind, id.clone())))
        }
        _ => Err(EvalError::InvalidArgument(format!(
            "Invalid {} argument: {}",
            kind.as_ref().to_uppercase(),
            describe_args(args)
        ))),
    }
}

fn describe_args(args: &[Option<Value>]) -> String {
    match args {
        [] => DisplayOperand(None).to_string(),
        [single] => DisplayOperand(single.as_ref()).to_string(),
        many => many
            .iter()
            .map(|a| DisplayOperand(a.as_ref()).to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}
