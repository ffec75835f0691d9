use std::sync::Arc;

use crate::core::BoxError;

/// A forward or backward action run against the host's backing-store handle.
pub type StepAction<C> = Arc<dyn Fn(&mut C) -> Result<(), BoxError> + Send + Sync>;

/// A migration step declaration.
///
/// Built fluently and handed to [`Registry::register`](super::Registry::register):
///
/// ```
/// use rustmigrate::{Registry, Step};
///
/// let mut registry: Registry<Vec<String>> = Registry::new();
/// registry
///     .register(
///         Step::new("user_table_start")
///             .with_level("mig0001")
///             .with_forward(|db: &mut Vec<String>| {
///                 db.push("users".to_string());
///                 Ok(())
///             })
///             .with_backward(|db: &mut Vec<String>| {
///                 db.retain(|t| t != "users");
///                 Ok(())
///             }),
///     )
///     .unwrap();
/// assert_eq!(registry.len(), 1);
/// ```
pub struct Step<C> {
    pub(crate) tag: String,
    pub(crate) level: Option<String>,
    pub(crate) forward: Option<StepAction<C>>,
    pub(crate) backward: Option<StepAction<C>>,
}

impl<C> Clone for Step<C> {
    fn clone(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            level: self.level.clone(),
            forward: self.forward.clone(),
            backward: self.backward.clone(),
        }
    }
}

impl<C> std::fmt::Debug for Step<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("tag", &self.tag)
            .field("level", &self.level)
            .field("has_forward", &self.forward.is_some())
            .field("has_backward", &self.backward.is_some())
            .finish()
    }
}

impl<C> Step<C> {
    /// Creates a new step declaration with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            level: None,
            forward: None,
            backward: None,
        }
    }

    /// Sets the ordering level. Without it the registering file name is used.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Sets the upgrade action.
    pub fn with_forward<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.forward = Some(Arc::new(action));
        self
    }

    /// Sets the downgrade action.
    pub fn with_backward<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.backward = Some(Arc::new(action));
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }
}

/// A step owned by the registry, with its level resolved.
pub struct RegisteredStep<C> {
    tag: String,
    level: String,
    forward: Option<StepAction<C>>,
    backward: Option<StepAction<C>>,
}

impl<C> std::fmt::Debug for RegisteredStep<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredStep")
            .field("tag", &self.tag)
            .field("level", &self.level)
            .field("has_forward", &self.forward.is_some())
            .field("has_backward", &self.backward.is_some())
            .finish()
    }
}

impl<C> RegisteredStep<C> {
    pub(crate) fn from_step(step: Step<C>, level: String) -> Self {
        Self {
            tag: step.tag,
            level,
            forward: step.forward,
            backward: step.backward,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn forward(&self) -> Option<&StepAction<C>> {
        self.forward.as_ref()
    }

    pub fn backward(&self) -> Option<&StepAction<C>> {
        self.backward.as_ref()
    }
}
