//! Process-wide context slot
//!
//! For call sites that cannot be handed an `Arc<ApplicationContext>`. The
//! slot is filled at most once; concurrent first callers block until the
//! winner's initializer returns and all observe the same instance.

use super::ApplicationContext;
use crate::error::ContextResult;
use once_cell::sync::OnceCell;
use std::sync::Arc;

static GLOBAL: OnceCell<Arc<ApplicationContext>> = OnceCell::new();

impl ApplicationContext {
    /// The process-wide context, built by `init` on first call
    pub fn global_or_init<F>(init: F) -> &'static Arc<ApplicationContext>
    where
        F: FnOnce() -> Arc<ApplicationContext>,
    {
        GLOBAL.get_or_init(init)
    }

    /// Like [`ApplicationContext::global_or_init`] with a fallible initializer.
    ///
    /// A failed initializer leaves the slot empty.
    pub fn global_or_try_init<F>(init: F) -> ContextResult<&'static Arc<ApplicationContext>>
    where
        F: FnOnce() -> ContextResult<Arc<ApplicationContext>>,
    {
        GLOBAL.get_or_try_init(init)
    }

    /// The process-wide context, if initialized
    pub fn global() -> Option<&'static Arc<ApplicationContext>> {
        GLOBAL.get()
    }
}
