//! Expression evaluation against a namespace.
//!
//! Evaluation follows the source language's semantics where they are
//! observable at load time: `/` always yields a float, floor division
//! and modulo round toward negative infinity, boolean operators
//! short-circuit and return an operand, comparisons chain. Anything
//! outside that (calling user functions, attribute access on modules)
//! fails with [`Error::Execution`].

use crate::error::{Error, Result};
use crate::parse::{BinOp, BoolOp, CmpOp, Expr, UnaryOp};

use super::namespace::Namespace;
use super::value::{Builtin, Value};

/// Evaluates expressions read-only against a namespace.
pub struct Evaluator<'a> {
    env: &'a Namespace,
}

/// A numeric operand with bools coerced to ints.
#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl<'a> Evaluator<'a> {
    pub fn new(env: &'a Namespace) -> Self {
        Self { env }
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::None => Ok(Value::None),
            Expr::True => Ok(Value::Bool(true)),
            Expr::False => Ok(Value::Bool(false)),
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Name(name) => self.lookup(name),
            Expr::Tuple(items) => Ok(Value::Tuple(self.eval_all(items)?)),
            Expr::List(items) => Ok(Value::List(self.eval_all(items)?)),
            Expr::Set(items) => {
                // Sets are carried as their element list; order is the
                // source order with duplicates collapsed.
                let mut values = Vec::new();
                for item in items {
                    let value = self.eval(item)?;
                    if !values.contains(&value) {
                        values.push(value);
                    }
                }
                Ok(Value::List(values))
            }
            Expr::Dict(pairs) => {
                let mut out = Vec::with_capacity(pairs.len());
                for (k, v) in pairs {
                    let key = self.eval(k)?;
                    let value = self.eval(v)?;
                    if let Some(slot) = out.iter_mut().find(|(existing, _)| *existing == key) {
                        slot.1 = value;
                    } else {
                        out.push((key, value));
                    }
                }
                Ok(Value::Dict(out))
            }
            Expr::Unary { op, operand } => self.eval_unary(*op, operand),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                eval_binary(*op, left, right)
            }
            Expr::Bool { op, values } => self.eval_bool(*op, values),
            Expr::Compare { left, ops } => self.eval_compare(left, ops),
            Expr::Call { func, args } => self.eval_call(func, args),
            Expr::Attribute { value, attr } => {
                let value = self.eval(value)?;
                Err(Error::Execution(format!(
                    "attribute '{attr}' of {} object is not loadable",
                    value.type_name()
                )))
            }
            Expr::Subscript { value, index } => {
                let value = self.eval(value)?;
                let index = self.eval(index)?;
                eval_subscript(value, index)
            }
            Expr::Opaque(text) => Err(Error::Execution(format!(
                "unsupported expression: {text}"
            ))),
        }
    }

    fn eval_all(&self, items: &[Expr]) -> Result<Vec<Value>> {
        items.iter().map(|item| self.eval(item)).collect()
    }

    fn lookup(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.env.get(name) {
            return Ok(value.clone());
        }
        if let Some(builtin) = Builtin::lookup(name) {
            return Ok(Value::Builtin(builtin));
        }
        Err(Error::Execution(format!("name '{name}' is not defined")))
    }

    fn eval_unary(&self, op: UnaryOp, operand: &Expr) -> Result<Value> {
        let value = self.eval(operand)?;
        match op {
            UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
            UnaryOp::Neg => match as_num(&value) {
                Some(Num::Int(n)) => Ok(Value::Int(-n)),
                Some(Num::Float(f)) => Ok(Value::Float(-f)),
                None => Err(bad_unary("-", &value)),
            },
            UnaryOp::Pos => match as_num(&value) {
                Some(Num::Int(n)) => Ok(Value::Int(n)),
                Some(Num::Float(f)) => Ok(Value::Float(f)),
                None => Err(bad_unary("+", &value)),
            },
        }
    }

    fn eval_bool(&self, op: BoolOp, values: &[Expr]) -> Result<Value> {
        debug_assert!(!values.is_empty());
        let mut last = Value::None;
        for expr in values {
            last = self.eval(expr)?;
            let stop = match op {
                BoolOp::And => !last.truthy(),
                BoolOp::Or => last.truthy(),
            };
            if stop {
                return Ok(last);
            }
        }
        Ok(last)
    }

    fn eval_compare(&self, left: &Expr, ops: &[(CmpOp, Expr)]) -> Result<Value> {
        let mut left = self.eval(left)?;
        for (op, right) in ops {
            let right = self.eval(right)?;
            if !compare(*op, &left, &right)? {
                return Ok(Value::Bool(false));
            }
            left = right;
        }
        Ok(Value::Bool(true))
    }

    fn eval_call(&self, func: &Expr, args: &[Expr]) -> Result<Value> {
        let func = self.eval(func)?;
        let args = self.eval_all(args)?;
        match func {
            Value::Builtin(builtin) => call_builtin(builtin, args),
            Value::Function(f) => Err(Error::Execution(format!(
                "function '{}' cannot be called while loading",
                f.name
            ))),
            Value::Class(c) => Err(Error::Execution(format!(
                "class '{}' cannot be instantiated while loading",
                c.name
            ))),
            other => Err(Error::Execution(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }
}

fn as_num(value: &Value) -> Option<Num> {
    match value {
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        Value::Int(n) => Some(Num::Int(*n)),
        Value::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

fn bad_unary(op: &str, value: &Value) -> Error {
    Error::Execution(format!(
        "bad operand type for unary {op}: '{}'",
        value.type_name()
    ))
}

fn bad_binary(op: &str, left: &Value, right: &Value) -> Error {
    Error::Execution(format!(
        "unsupported operand type(s) for {op}: '{}' and '{}'",
        left.type_name(),
        right.type_name()
    ))
}

fn eval_binary(op: BinOp, left: Value, right: Value) -> Result<Value> {
    // Sequence forms first, then numeric fallback.
    match (op, &left, &right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => {
            return Ok(Value::Str(format!("{a}{b}")));
        }
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            let mut out = a.clone();
            out.extend(b.iter().cloned());
            return Ok(Value::List(out));
        }
        (BinOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            let mut out = a.clone();
            out.extend(b.iter().cloned());
            return Ok(Value::Tuple(out));
        }
        (BinOp::Mul, Value::Str(s), Value::Int(n)) | (BinOp::Mul, Value::Int(n), Value::Str(s)) => {
            return Ok(Value::Str(s.repeat(usize::try_from(*n).unwrap_or(0))));
        }
        (BinOp::Mul, Value::List(items), Value::Int(n))
        | (BinOp::Mul, Value::Int(n), Value::List(items)) => {
            let times = usize::try_from(*n).unwrap_or(0);
            let mut out = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                out.extend(items.iter().cloned());
            }
            return Ok(Value::List(out));
        }
        _ => {}
    }

    let (a, b) = match (as_num(&left), as_num(&right)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(bad_binary(op_symbol(op), &left, &right)),
    };

    match (a, b) {
        (Num::Int(a), Num::Int(b)) => int_binary(op, a, b),
        (a, b) => float_binary(op, to_f64(a), to_f64(b)),
    }
}

fn op_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::FloorDiv => "//",
        BinOp::Mod => "%",
        BinOp::Pow => "**",
    }
}

fn to_f64(n: Num) -> f64 {
    match n {
        Num::Int(i) => i as f64,
        Num::Float(f) => f,
    }
}

fn int_binary(op: BinOp, a: i64, b: i64) -> Result<Value> {
    match op {
        BinOp::Add => Ok(Value::Int(a.wrapping_add(b))),
        BinOp::Sub => Ok(Value::Int(a.wrapping_sub(b))),
        BinOp::Mul => Ok(Value::Int(a.wrapping_mul(b))),
        // True division always yields a float.
        BinOp::Div => {
            if b == 0 {
                Err(Error::Execution("division by zero".to_string()))
            } else {
                Ok(Value::Float(a as f64 / b as f64))
            }
        }
        BinOp::FloorDiv => {
            if b == 0 {
                return Err(Error::Execution(
                    "integer division or modulo by zero".to_string(),
                ));
            }
            let q = a / b;
            let r = a % b;
            // Round toward negative infinity, not toward zero.
            Ok(Value::Int(if r != 0 && (r < 0) != (b < 0) {
                q - 1
            } else {
                q
            }))
        }
        BinOp::Mod => {
            if b == 0 {
                return Err(Error::Execution(
                    "integer division or modulo by zero".to_string(),
                ));
            }
            let r = a % b;
            // The result takes the sign of the divisor.
            Ok(Value::Int(if r != 0 && (r < 0) != (b < 0) {
                r + b
            } else {
                r
            }))
        }
        BinOp::Pow => {
            if b < 0 {
                // Negative exponents leave the integers.
                return Ok(Value::Float((a as f64).powf(b as f64)));
            }
            match u32::try_from(b).ok().and_then(|e| a.checked_pow(e)) {
                Some(n) => Ok(Value::Int(n)),
                None => Ok(Value::Float((a as f64).powf(b as f64))),
            }
        }
    }
}

fn float_binary(op: BinOp, a: f64, b: f64) -> Result<Value> {
    match op {
        BinOp::Add => Ok(Value::Float(a + b)),
        BinOp::Sub => Ok(Value::Float(a - b)),
        BinOp::Mul => Ok(Value::Float(a * b)),
        BinOp::Div => {
            if b == 0.0 {
                Err(Error::Execution("float division by zero".to_string()))
            } else {
                Ok(Value::Float(a / b))
            }
        }
        BinOp::FloorDiv => {
            if b == 0.0 {
                Err(Error::Execution("float floor division by zero".to_string()))
            } else {
                Ok(Value::Float((a / b).floor()))
            }
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(Error::Execution("float modulo".to_string()));
            }
            let r = a % b;
            Ok(Value::Float(if r != 0.0 && (r < 0.0) != (b < 0.0) {
                r + b
            } else {
                r
            }))
        }
        BinOp::Pow => Ok(Value::Float(a.powf(b))),
    }
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool> {
    match op {
        CmpOp::Eq => Ok(values_equal(left, right)),
        CmpOp::NotEq => Ok(!values_equal(left, right)),
        CmpOp::Lt | CmpOp::LtE | CmpOp::Gt | CmpOp::GtE => {
            let ordering = order_values(left, right).ok_or_else(|| {
                Error::Execution(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    cmp_symbol(op),
                    left.type_name(),
                    right.type_name()
                ))
            })?;
            Ok(match op {
                CmpOp::Lt => ordering.is_lt(),
                CmpOp::LtE => ordering.is_le(),
                CmpOp::Gt => ordering.is_gt(),
                CmpOp::GtE => ordering.is_ge(),
                _ => unreachable!(),
            })
        }
    }
}

fn cmp_symbol(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Eq => "==",
        CmpOp::NotEq => "!=",
        CmpOp::Lt => "<",
        CmpOp::LtE => "<=",
        CmpOp::Gt => ">",
        CmpOp::GtE => ">=",
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    if let (Some(a), Some(b)) = (as_num(left), as_num(right)) {
        return to_f64(a) == to_f64(b);
    }
    match (left, right) {
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        _ => left == right,
    }
}

fn order_values(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    if let (Some(a), Some(b)) = (as_num(left), as_num(right)) {
        return to_f64(a).partial_cmp(&to_f64(b));
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn eval_subscript(value: Value, index: Value) -> Result<Value> {
    match (&value, &index) {
        (Value::List(items), Value::Int(i)) | (Value::Tuple(items), Value::Int(i)) => {
            index_sequence(items.len(), *i)
                .map(|at| items[at].clone())
                .ok_or_else(|| {
                    Error::Execution(format!("{} index out of range", value.type_name()))
                })
        }
        (Value::Str(s), Value::Int(i)) => {
            let chars: Vec<char> = s.chars().collect();
            index_sequence(chars.len(), *i)
                .map(|at| Value::Str(chars[at].to_string()))
                .ok_or_else(|| Error::Execution("string index out of range".to_string()))
        }
        (Value::Dict(pairs), key) => pairs
            .iter()
            .find(|(k, _)| values_equal(k, key))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| Error::Execution(format!("key not found: {}", key.repr()))),
        _ => Err(Error::Execution(format!(
            "'{}' object is not subscriptable",
            value.type_name()
        ))),
    }
}

/// Resolve a possibly-negative index into a sequence of `len` items.
fn index_sequence(len: usize, i: i64) -> Option<usize> {
    let at = if i < 0 { i + len as i64 } else { i };
    usize::try_from(at).ok().filter(|&at| at < len)
}

fn call_builtin(builtin: Builtin, args: Vec<Value>) -> Result<Value> {
    match builtin {
        Builtin::Print => {
            let parts: Vec<String> = args.iter().map(Value::to_string).collect();
            println!("{}", parts.join(" "));
            Ok(Value::None)
        }
        Builtin::Len => {
            let value = one_arg(builtin, args)?;
            let len = match &value {
                Value::Str(s) => s.chars().count(),
                Value::List(items) | Value::Tuple(items) => items.len(),
                Value::Dict(pairs) => pairs.len(),
                other => {
                    return Err(Error::Execution(format!(
                        "object of type '{}' has no len()",
                        other.type_name()
                    )));
                }
            };
            Ok(Value::Int(len as i64))
        }
        Builtin::Abs => match as_num(&one_arg(builtin, args)?) {
            Some(Num::Int(n)) => Ok(Value::Int(n.abs())),
            Some(Num::Float(f)) => Ok(Value::Float(f.abs())),
            None => Err(Error::Execution("bad operand type for abs()".to_string())),
        },
        Builtin::Str => Ok(Value::Str(one_arg(builtin, args)?.to_string())),
        Builtin::Int => {
            let value = one_arg(builtin, args)?;
            match &value {
                Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
                Value::Int(n) => Ok(Value::Int(*n)),
                Value::Float(f) => Ok(Value::Int(f.trunc() as i64)),
                Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                    Error::Execution(format!(
                        "invalid literal for int() with base 10: {}",
                        value.repr()
                    ))
                }),
                other => Err(Error::Execution(format!(
                    "int() argument must be a string or a number, not '{}'",
                    other.type_name()
                ))),
            }
        }
        Builtin::Float => {
            let value = one_arg(builtin, args)?;
            match &value {
                Value::Bool(b) => Ok(Value::Float(f64::from(*b))),
                Value::Int(n) => Ok(Value::Float(*n as f64)),
                Value::Float(f) => Ok(Value::Float(*f)),
                Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                    Error::Execution(format!("could not convert string to float: {}", value.repr()))
                }),
                other => Err(Error::Execution(format!(
                    "float() argument must be a string or a number, not '{}'",
                    other.type_name()
                ))),
            }
        }
        Builtin::Bool => Ok(Value::Bool(one_arg(builtin, args)?.truthy())),
    }
}

fn one_arg(builtin: Builtin, mut args: Vec<Value>) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::Execution(format!(
            "{}() takes exactly one argument ({} given)",
            builtin.name(),
            args.len()
        )));
    }
    Ok(args.pop().unwrap_or(Value::None))
}
