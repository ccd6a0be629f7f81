//! Hook definitions and bound chain steps
//!
//! A `Hook` is what gets registered: a name, the declared argument types and
//! the function itself, plus an optional argument validator. Binding a hook
//! to the raw arguments of a call string yields a `HookStep`.

use std::fmt;
use std::sync::Arc;

use crate::{ArgType, Ctx, HookArg, TransformError, TransformResult};

/// Function run for one step of a pass
pub type HookFn = Arc<dyn Fn(&mut Ctx<'_>, &[HookArg]) -> TransformResult<()> + Send + Sync>;

/// Validator run once on coerced arguments when a chain is built
pub type ArgValidator = Arc<dyn Fn(&[HookArg]) -> Result<(), String> + Send + Sync>;

/// A named transform function with a typed signature
#[derive(Clone)]
pub struct Hook {
    name: String,
    arg_types: Vec<ArgType>,
    func: HookFn,
    validator: Option<ArgValidator>,
}

impl Hook {
    /// Define a hook
    pub fn new<F>(name: impl Into<String>, arg_types: Vec<ArgType>, func: F) -> Self
    where
        F: Fn(&mut Ctx<'_>, &[HookArg]) -> TransformResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arg_types,
            func: Arc::new(func),
            validator: None,
        }
    }

    /// Attach an argument validator (builder style)
    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: Fn(&[HookArg]) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn arg_types(&self) -> &[ArgType] {
        &self.arg_types
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.arg_types.len()
    }

    /// Bind raw call arguments to this hook
    ///
    /// # Errors
    ///
    /// - `ArgCount` if the number of arguments differs from the arity
    /// - `ArgType` if an argument cannot be coerced
    /// - `InvalidArgument` if the validator rejects the coerced arguments
    pub fn bind(&self, raw: &[String]) -> TransformResult<HookStep> {
        if raw.len() != self.arg_types.len() {
            return Err(TransformError::ArgCount {
                hook: self.name.clone(),
                expected: self.arg_types.len(),
                actual: raw.len(),
            });
        }

        let mut args = Vec::with_capacity(raw.len());
        for (index, (ty, value)) in self.arg_types.iter().zip(raw).enumerate() {
            let value = value.trim();
            let arg = ty.coerce(value).ok_or_else(|| TransformError::ArgType {
                hook: self.name.clone(),
                index,
                expected: *ty,
                value: value.to_string(),
            })?;
            args.push(arg);
        }

        if let Some(validator) = &self.validator {
            validator(&args).map_err(|msg| TransformError::invalid_argument(&self.name, msg))?;
        }

        Ok(HookStep {
            name: self.name.clone(),
            func: Arc::clone(&self.func),
            args,
        })
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("arg_types", &self.arg_types)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// A hook bound to typed arguments, one position of a chain
#[derive(Clone)]
pub struct HookStep {
    pub(crate) name: String,
    pub(crate) func: HookFn,
    pub(crate) args: Vec<HookArg>,
}

impl HookStep {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn args(&self) -> &[HookArg] {
        &self.args
    }
}

impl fmt::Debug for HookStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookStep")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish()
    }
}

impl fmt::Display for HookStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}
