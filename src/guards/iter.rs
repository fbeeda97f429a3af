/*!
 * Guarded Iteration
 *
 * Lazy validation: one authority check per produced element, never ahead
 * of demand. A denial is yielded in place of the element and ends the
 * iteration for good.
 */

use super::containers::IterKind;
use crate::authority::context::ExecutionContext;
use crate::core::errors::GuardResult;
use crate::value::{DictRef, IterRef, Value, ValueIter};

/// Part of each element handed to the authority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subject {
    Element,
    /// Both halves of a `(key, value)` pair, key first
    Pair,
    /// Source already validates what it yields
    Trusted,
}

/// Iterator validating each element as it is pulled
pub struct GuardedIterator {
    context: ExecutionContext,
    source: ValueIter,
    subject: Subject,
    done: bool,
}

impl GuardedIterator {
    /// Guard the native iteration of any iterable value
    ///
    /// Iterators that already validate are wrapped without a second check.
    pub fn over(ctx: &ExecutionContext, iterable: &Value) -> GuardResult<Self> {
        let subject = match iterable {
            Value::Iter(it) if it.is_guarded() => Subject::Trusted,
            _ => Subject::Element,
        };
        Ok(Self {
            context: ctx.clone(),
            source: iterable.iterate()?,
            subject,
            done: false,
        })
    }

    /// Guard one side of a mapping, snapshotted now
    pub fn mapping(ctx: &ExecutionContext, dict: &DictRef, kind: IterKind) -> Self {
        let (source, subject): (ValueIter, Subject) = match kind {
            IterKind::Keys => (Box::new(dict.keys().into_iter().map(Ok)), Subject::Element),
            IterKind::Values => (Box::new(dict.values().into_iter().map(Ok)), Subject::Element),
            IterKind::Items => {
                let pairs = dict.items().into_iter().map(|(k, v)| Ok(Value::tuple([k, v])));
                (Box::new(pairs), Subject::Pair)
            }
        };
        Self {
            context: ctx.clone(),
            source,
            subject,
            done: false,
        }
    }

    /// True once the source ran out or an element was refused
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Shareable iterator value for restricted code
    pub fn into_value(self) -> Value {
        Value::Iter(IterRef::guarded(self))
    }

    fn check(&self, item: &Value) -> GuardResult<()> {
        match self.subject {
            Subject::Trusted => Ok(()),
            Subject::Element => self.context.validate_value(item),
            Subject::Pair => match item {
                Value::Tuple(pair) if pair.len() == 2 => {
                    self.context.validate_value(&pair[0])?;
                    self.context.validate_value(&pair[1])
                }
                other => self.context.validate_value(other),
            },
        }
    }
}

impl Iterator for GuardedIterator {
    type Item = GuardResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = match self.source.next() {
            Some(Ok(item)) => item,
            Some(Err(err)) => {
                self.done = true;
                return Some(Err(err));
            }
            None => {
                self.done = true;
                return None;
            }
        };
        match self.check(&item) {
            Ok(()) => Some(Ok(item)),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Guarded iterator value over `iterable`, the `_getiter_` entry point
///
/// An iterator that is already guarded is returned as is.
pub fn guarded_iter(ctx: &ExecutionContext, iterable: &Value) -> GuardResult<Value> {
    match iterable {
        Value::Iter(it) if it.is_guarded() => Ok(iterable.clone()),
        other => Ok(GuardedIterator::over(ctx, other)?.into_value()),
    }
}
