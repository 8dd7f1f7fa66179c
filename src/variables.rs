use crate::error::{BasicError, RuntimeFault};
use crate::value::{Value, ValueType};
use serde::Serialize;
use std::collections::BTreeMap;

/// Folds a BASIC variable name into its storage key.
///
/// The name is lower-cased, dots become underscores and the type sigil is
/// turned into a suffix: `%` gives `I`, `!` or no sigil gives `R`, and `$`
/// is kept as is. `Count%` is stored as `countI`, `a` as `aR`.
pub fn mangle(name: &str) -> String {
    let (base, suffix) = match name.chars().last() {
        Some('%') => (&name[..name.len() - 1], "I"),
        Some('!') => (&name[..name.len() - 1], "R"),
        Some('$') => (&name[..name.len() - 1], "$"),
        _ => (name, "R"),
    };
    let mut key: String = base
        .chars()
        .map(|c| if c == '.' { '_' } else { c.to_ascii_lowercase() })
        .collect();
    key.push_str(suffix);
    key
}

/// Type of the value a variable with this (unmangled) name holds.
pub fn type_of(name: &str) -> ValueType {
    if name.ends_with('$') {
        ValueType::Str
    } else {
        ValueType::Number
    }
}

fn is_integer_key(key: &str) -> bool {
    key.ends_with('I')
}

/// The live variable table, keyed by mangled name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Variables {
    values: BTreeMap<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Reads a variable, yielding the type's zero value when it was never
    /// assigned.
    pub fn value_of(&self, key: &str, ty: ValueType) -> Value {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| Value::default_for(ty))
    }

    /// Stores a value without any conversion.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Assigns with BASIC semantics: integer variables are rounded and must
    /// fit in 16 bits.
    pub fn assign(&mut self, key: &str, value: Value) -> Result<(), RuntimeFault> {
        let value = match value {
            Value::Number(n) if is_integer_key(key) => {
                let rounded = n.round();
                if !(-32768.0..=32767.0).contains(&rounded) {
                    return Err(BasicError::Overflow.into());
                }
                Value::Number(rounded)
            }
            other => other,
        };
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Copies the whole table, for snapshots.
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mangles_names() {
        assert_eq!(mangle("a"), "aR");
        assert_eq!(mangle("Count%"), "countI");
        assert_eq!(mangle("x!"), "xR");
        assert_eq!(mangle("Name$"), "name$");
        assert_eq!(mangle("eval.result"), "eval_resultR");
        assert_eq!(mangle("eval.result$"), "eval_result$");
    }

    #[test]
    fn integer_assignment_rounds_and_checks_range() {
        let mut vars = Variables::new();
        vars.assign("nI", Value::from(2.6)).unwrap();
        assert_eq!(vars.get("nI"), Some(&Value::from(3)));

        let err = vars.assign("nI", Value::from(40000)).unwrap_err();
        assert_eq!(err.code, Some(6));
    }

    #[test]
    fn unset_variables_read_as_zero_values() {
        let vars = Variables::new();
        assert_eq!(vars.value_of("aR", ValueType::Number), Value::from(0));
        assert_eq!(vars.value_of("a$", ValueType::Str), Value::from(""));
    }
}
