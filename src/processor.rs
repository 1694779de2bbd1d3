use std::collections::HashMap;
use std::fmt;

use crate::ast::{self, Argument, MacroNode};
use crate::config::DEFAULT_MAX_EXPANSION_DEPTH;
use crate::error::{Error, Result};

/// A macro the [`Expander`] can invoke.
///
/// `transform` rewrites the raw arguments of an invocation; the result is
/// expanded and handed to `evaluate`, which may expand further argument lists
/// through the `expander` it is given. `E` is the caller's run environment,
/// passed through untouched.
pub trait Macro<E> {
    fn transform(&self, args: &[Argument], _env: &mut E) -> Result<Vec<Argument>> {
        Ok(args.to_vec())
    }

    fn evaluate(
        &self,
        args: Vec<Argument>,
        env: &mut E,
        expander: &mut Expander<'_, E>,
    ) -> Result<Vec<Argument>>;
}

/// A macro assembled from a transformer and an evaluator closure
pub struct FnMacro<T, V> {
    transformer: T,
    evaluator: V,
}

impl<T, V> FnMacro<T, V> {
    pub fn new(transformer: T, evaluator: V) -> Self {
        Self {
            transformer,
            evaluator,
        }
    }
}

impl<E, T, V> Macro<E> for FnMacro<T, V>
where
    T: Fn(&[Argument], &mut E) -> Result<Vec<Argument>>,
    V: Fn(Vec<Argument>, &mut E, &mut Expander<'_, E>) -> Result<Vec<Argument>>,
{
    fn transform(&self, args: &[Argument], env: &mut E) -> Result<Vec<Argument>> {
        (self.transformer)(args, env)
    }

    fn evaluate(
        &self,
        args: Vec<Argument>,
        env: &mut E,
        expander: &mut Expander<'_, E>,
    ) -> Result<Vec<Argument>> {
        (self.evaluator)(args, env, expander)
    }
}

/// Anything a macro can be looked up by
pub trait MacroName {
    fn macro_name(&self) -> &str;
}

impl MacroName for str {
    fn macro_name(&self) -> &str {
        self
    }
}

impl MacroName for String {
    fn macro_name(&self) -> &str {
        self
    }
}

impl MacroName for MacroNode {
    fn macro_name(&self) -> &str {
        &self.name
    }
}

/// Registry of macros by name (sigils included)
pub struct MacroRegistry<E = ()> {
    macros: HashMap<String, Box<dyn Macro<E>>>,
}

impl<E> Default for MacroRegistry<E> {
    fn default() -> Self {
        Self {
            macros: HashMap::new(),
        }
    }
}

impl<E> fmt::Debug for MacroRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.names();
        names.sort_unstable();
        f.debug_struct("MacroRegistry")
            .field("macros", &names)
            .finish()
    }
}

impl<E> MacroRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a macro from its transformer and evaluator under the name of
    /// `key`, replacing any macro of the same name. Returns the replaced macro.
    pub fn register<K, T, V>(
        &mut self,
        key: &K,
        transformer: T,
        evaluator: V,
    ) -> Option<Box<dyn Macro<E>>>
    where
        K: MacroName + ?Sized,
        T: Fn(&[Argument], &mut E) -> Result<Vec<Argument>> + 'static,
        V: Fn(Vec<Argument>, &mut E, &mut Expander<'_, E>) -> Result<Vec<Argument>>
            + 'static,
    {
        self.register_macro(key, FnMacro::new(transformer, evaluator))
    }

    /// Register a macro implementation, replacing any macro of the same name
    pub fn register_macro<K: MacroName + ?Sized>(
        &mut self,
        key: &K,
        item: impl Macro<E> + 'static,
    ) -> Option<Box<dyn Macro<E>>> {
        self.macros.insert(key.macro_name().to_owned(), Box::new(item))
    }

    pub fn unregister<K: MacroName + ?Sized>(&mut self, key: &K) -> Option<Box<dyn Macro<E>>> {
        self.macros.remove(key.macro_name())
    }

    pub fn get<K: MacroName + ?Sized>(&self, key: &K) -> Option<&dyn Macro<E>> {
        self.macros.get(key.macro_name()).map(|item| item.as_ref())
    }

    pub fn contains<K: MacroName + ?Sized>(&self, key: &K) -> bool {
        self.macros.contains_key(key.macro_name())
    }

    pub fn names(&self) -> Vec<&str> {
        self.macros.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

/// Macro expander with recursive expansion
pub struct Expander<'r, E> {
    registry: &'r MacroRegistry<E>,
    depth: usize,
    max_depth: usize,
}

impl<'r, E> Expander<'r, E> {
    pub fn new(registry: &'r MacroRegistry<E>) -> Self {
        Self::with_max_depth(registry, DEFAULT_MAX_EXPANSION_DEPTH)
    }

    pub fn with_max_depth(registry: &'r MacroRegistry<E>, max_depth: usize) -> Self {
        Self {
            registry,
            depth: 0,
            max_depth,
        }
    }

    /// Expand root nodes, as produced by the parser
    pub fn expand_nodes(&mut self, nodes: &[MacroNode], env: &mut E) -> Result<Vec<Argument>> {
        let nesting = nodes.iter().map(MacroNode::nesting_depth).max().unwrap_or(0);
        self.check_budget(nesting)?;
        let mut output = Vec::new();
        for node in nodes {
            output.extend(self.expand_node(node, env)?);
        }
        Ok(output)
    }

    /// Expand a list of arguments left to right.
    ///
    /// Text and quoted arguments are emitted unchanged; macros are looked up,
    /// transformed, have their arguments expanded, and are evaluated.
    pub fn expand(&mut self, items: &[Argument], env: &mut E) -> Result<Vec<Argument>> {
        self.check_budget(ast::nesting_depth(items))?;
        let mut output = Vec::new();
        for item in items {
            match item {
                Argument::Macro(node) => output.extend(self.expand_node(node, env)?),
                other => output.push(other.clone()),
            }
        }
        Ok(output)
    }

    /// Rejects input nested deeper than the levels left before `max_depth`,
    /// before any of it is transformed or cloned
    fn check_budget(&self, nesting: usize) -> Result<()> {
        if nesting > self.max_depth.saturating_sub(self.depth) {
            return Err(Error::ExpansionDepthExceeded {
                depth: self.max_depth,
            });
        }
        Ok(())
    }

    fn expand_node(&mut self, node: &MacroNode, env: &mut E) -> Result<Vec<Argument>> {
        let registry = self.registry;
        let Some(item) = registry.get(node) else {
            return Err(Error::MacroNotFound {
                name: node.name.clone(),
                position: node.position,
            });
        };

        if self.depth >= self.max_depth {
            return Err(Error::ExpansionDepthExceeded {
                depth: self.max_depth,
            });
        }

        tracing::trace!(
            name = %node.name,
            position = %node.position,
            depth = self.depth,
            "expanding macro"
        );
        self.depth += 1;
        let result = self.invoke(item, node, env);
        self.depth -= 1;
        result
    }

    fn invoke(
        &mut self,
        item: &dyn Macro<E>,
        node: &MacroNode,
        env: &mut E,
    ) -> Result<Vec<Argument>> {
        let transformed = item.transform(&node.arguments, env)?;
        let args = self.expand(&transformed, env)?;
        item.evaluate(args, env, self)
    }
}

/// Expand `roots` against `registry`, threading `env` through every macro
pub fn expand<E>(
    roots: &[MacroNode],
    registry: &MacroRegistry<E>,
    env: &mut E,
) -> Result<Vec<Argument>> {
    Expander::new(registry).expand_nodes(roots, env)
}
