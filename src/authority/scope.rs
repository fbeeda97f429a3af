/*!
 * Scoped Authority Binding
 *
 * RAII guard tying an authority binding to a unit of work. The binding is
 * released on every exit path, including early returns and panics, so a
 * reused context never inherits a stale authority.
 */

use super::context::ExecutionContext;
use super::traits::Authority;
use std::sync::Arc;
use tracing::debug;

/// Active authority binding, released on drop
///
/// On release the previously bound authority (if any) is restored;
/// otherwise the context is left unbound.
#[must_use = "the authority is unbound as soon as the binding is dropped"]
pub struct AuthorityBinding {
    context: ExecutionContext,
    previous: Option<Arc<dyn Authority>>,
    active: bool,
}

impl AuthorityBinding {
    pub fn bind(context: &ExecutionContext, authority: Arc<dyn Authority>) -> Self {
        let previous = context.bind(authority);
        Self {
            context: context.clone(),
            previous,
            active: true,
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Release now instead of at end of scope
    pub fn release(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        match self.previous.take() {
            Some(previous) => {
                debug!(context = %self.context.id(), "restoring previous authority");
                self.context.bind(previous);
            }
            None => {
                self.context.unbind();
            }
        }
    }
}

impl Drop for AuthorityBinding {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Run one unit of work with `authority` bound to `context`
///
/// The binding is released whether `work` succeeds, fails or panics.
pub fn run_unit<T, E, F>(context: &ExecutionContext, authority: Arc<dyn Authority>, work: F) -> Result<T, E>
where
    F: FnOnce(&ExecutionContext) -> Result<T, E>,
{
    let binding = AuthorityBinding::bind(context, authority);
    let result = work(binding.context());
    drop(binding);
    result
}
