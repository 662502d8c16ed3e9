//! Function registry
//!
//! A generator dumps every export of a package into a [`SymbolTable`]
//! without knowing which exports are functions. [`Registry::from_symbols`]
//! keeps the ones implementing [`FunctionDescriptor`] and drops the rest.

use crate::descriptor::FunctionDescriptor;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One exported value
#[derive(Clone)]
pub enum Symbol {
    /// A deployable function
    Function(Arc<dyn FunctionDescriptor>),

    /// Any other export, remembered by type name only
    Opaque(&'static str),
}

impl Symbol {
    pub fn function<D: FunctionDescriptor>(descriptor: D) -> Self {
        Symbol::Function(Arc::new(descriptor))
    }

    pub fn opaque<T: ?Sized>() -> Self {
        Symbol::Opaque(std::any::type_name::<T>())
    }

    pub fn as_descriptor(&self) -> Option<&Arc<dyn FunctionDescriptor>> {
        match self {
            Symbol::Function(descriptor) => Some(descriptor),
            Symbol::Opaque(_) => None,
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Function(_) => f.write_str("Symbol::Function"),
            Symbol::Opaque(type_name) => write!(f, "Symbol::Opaque({type_name})"),
        }
    }
}

/// Name → export mapping handed to the runtime
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: BTreeMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an export, returning the one previously registered under `name`
    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) -> Option<Symbol> {
        self.entries.insert(name.into(), symbol)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Symbol)> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = (String, Symbol)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for SymbolTable {
    type Item = (String, Symbol);
    type IntoIter = std::collections::btree_map::IntoIter<String, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Registered functions by symbol name. Immutable once built.
#[derive(Clone, Default)]
pub struct Registry {
    functions: BTreeMap<String, Arc<dyn FunctionDescriptor>>,
}

impl Registry {
    /// Keep the function exports of `symbols`, ignoring everything else
    pub fn from_symbols(symbols: SymbolTable) -> Self {
        let mut functions = BTreeMap::new();

        for (name, symbol) in symbols {
            match symbol {
                Symbol::Function(descriptor) => {
                    functions.insert(name, descriptor);
                }
                Symbol::Opaque(type_name) => {
                    debug!(symbol = %name, type_name, "Ignoring export that is not a cloud function");
                }
            }
        }

        Self { functions }
    }

    pub fn get(&self, symbol: &str) -> Option<&Arc<dyn FunctionDescriptor>> {
        self.functions.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.functions.contains_key(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn FunctionDescriptor>)> {
        self.functions.iter().map(|(name, d)| (name.as_str(), d))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Build a [`SymbolTable`] from arbitrary exports.
///
/// Values implementing [`FunctionDescriptor`] become
/// [`Symbol::Function`]; every other value becomes [`Symbol::Opaque`].
///
/// ```ignore
/// let table = symbols! {
///     "Webhook" => lib::webhook(),
///     "NotAFunction" => "plain string",
/// };
/// ```
#[macro_export]
macro_rules! symbols {
    ($($name:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_imports)]
        use $crate::registry::__private::{ViaDescriptor as _, ViaOpaque as _};
        #[allow(unused_mut)]
        let mut table = $crate::registry::SymbolTable::new();
        $(
            table.insert($name, $crate::registry::__private::Export($value).into_symbol());
        )*
        table
    }};
}

// Method resolution tries the by-value receiver `Export<T>` (`ViaDescriptor`)
// before autoref to `&Export<T>` (`ViaOpaque`), so the descriptor path wins
// whenever its bound holds. The value moves into the symbol unchanged.
#[doc(hidden)]
pub mod __private {
    use super::Symbol;
    use crate::descriptor::FunctionDescriptor;

    pub struct Export<T>(pub T);

    pub trait ViaDescriptor {
        fn into_symbol(self) -> Symbol;
    }

    impl<T: FunctionDescriptor> ViaDescriptor for Export<T> {
        fn into_symbol(self) -> Symbol {
            Symbol::function(self.0)
        }
    }

    pub trait ViaOpaque {
        fn into_symbol(self) -> Symbol;
    }

    impl<T> ViaOpaque for &Export<T> {
        fn into_symbol(self) -> Symbol {
            Symbol::opaque::<T>()
        }
    }
}
