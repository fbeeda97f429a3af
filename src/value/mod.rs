/*!
 * Value Module
 * Dynamic value model mediated by the guards
 *
 * Lists, dicts and iterators have reference semantics: cloning a `Value`
 * shares the underlying container, so a mutation through one handle is
 * visible through every other.
 */

pub mod collections;
pub mod function;
pub mod native;
pub mod ops;
pub mod types;

pub use collections::{DictRef, IterRef, ListRef, ValueIter};
pub use function::{CallArgs, Function, NativeFn};
pub use native::{dict_fromkeys, native_getattr};
pub use types::{HostObject, TypeKey, Value};
