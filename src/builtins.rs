//! Built-in control-flow macros: `log`, `repeat` and `lazy`.

use std::cell::RefCell;
use std::fmt;

use crate::ast::Argument;
use crate::config::CompilerConfig;
use crate::error::{Error, Result};
use crate::processor::{Expander, Macro, MacroRegistry};

/// Hands every argument to a sink and produces no output
pub struct Log {
    sink: Box<dyn Fn(&Argument)>,
}

impl Default for Log {
    fn default() -> Self {
        Self::with_sink(|value| tracing::info!(target: "macroline::log", "{value}"))
    }
}

impl fmt::Debug for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Log").finish_non_exhaustive()
    }
}

impl Log {
    pub fn with_sink(sink: impl Fn(&Argument) + 'static) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }
}

impl<E> Macro<E> for Log {
    fn evaluate(
        &self,
        args: Vec<Argument>,
        _env: &mut E,
        _expander: &mut Expander<'_, E>,
    ) -> Result<Vec<Argument>> {
        args.iter().for_each(|value| (self.sink)(value));
        Ok(Vec::new())
    }
}

/// Expands its body `count` times, `count` being the first argument
#[derive(Debug, Default, Clone, Copy)]
pub struct Repeat;

impl<E> Macro<E> for Repeat {
    /// Quote the body so it is expanded by `evaluate`, not before it
    fn transform(&self, args: &[Argument], _env: &mut E) -> Result<Vec<Argument>> {
        let Some((count, body)) = args.split_first() else {
            return Ok(Vec::new());
        };
        Ok(vec![count.clone(), Argument::Quoted(body.to_vec())])
    }

    fn evaluate(
        &self,
        args: Vec<Argument>,
        env: &mut E,
        expander: &mut Expander<'_, E>,
    ) -> Result<Vec<Argument>> {
        let mut args = args.into_iter();
        let count = args.next().ok_or(Error::RepeatCountMissing)?;
        let count = parse_count(&count)?;

        let body: Vec<Argument> = args
            .flat_map(|arg| match arg {
                Argument::Quoted(items) => items,
                other => vec![other],
            })
            .collect();

        let mut output = Vec::new();
        for _ in 0..count {
            output.extend(expander.expand(&body, env)?);
        }
        Ok(output)
    }
}

fn parse_count(arg: &Argument) -> Result<usize> {
    let invalid = || Error::InvalidRepeatCount {
        value: arg.to_string(),
    };
    match arg {
        Argument::Text(text) => text.trim().parse().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Captures its arguments unexpanded and replays them on every evaluation.
///
/// The capture lives on the registry entry, so the latest invocation's
/// arguments are what gets replayed.
#[derive(Debug, Default)]
pub struct Lazy {
    captured: RefCell<Vec<Argument>>,
}

impl Lazy {
    pub fn captured(&self) -> Vec<Argument> {
        self.captured.borrow().clone()
    }
}

impl<E> Macro<E> for Lazy {
    fn transform(&self, args: &[Argument], _env: &mut E) -> Result<Vec<Argument>> {
        *self.captured.borrow_mut() = args.to_vec();
        Ok(Vec::new())
    }

    fn evaluate(
        &self,
        _args: Vec<Argument>,
        _env: &mut E,
        _expander: &mut Expander<'_, E>,
    ) -> Result<Vec<Argument>> {
        Ok(self.captured())
    }
}

/// Register `log`, `repeat` and `lazy` under the configured sigil
pub fn register_builtins<E>(registry: &mut MacroRegistry<E>, config: &CompilerConfig) {
    registry.register_macro(&config.macro_name("log"), Log::default());
    registry.register_macro(&config.macro_name("repeat"), Repeat);
    registry.register_macro(&config.macro_name("lazy"), Lazy::default());
}
