//! Service Registry — ordered construction, initialization, and shutdown of
//! the daemon's long-lived components.
//!
//! `main.rs` previously wired every component inline, in a fixed sequence;
//! the registry formalizes that sequence as data so initialization failures
//! roll back cleanly (later services never outlive an earlier one that
//! failed to start) and shutdown always runs in reverse order.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use anyhow::{anyhow, Result};

/// A registry-managed component. Most services have nothing to do at
/// start/stop time beyond existing; the default no-op bodies cover those.
pub trait Service: Any + Send + Sync {
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    fn as_any(&self) -> &dyn Any;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Service>) {}
};

/// Lets a component that needs runtime-shared ownership (e.g. the Recorder,
/// which the Pipeline Controller also holds an `Arc::clone()` of) register
/// itself as `Arc<T>` rather than by value, while `Registry::get` still
/// downcasts to the same `Arc<T>` type the caller registered.
impl<T: Service + ?Sized> Service for std::sync::Arc<T> {
    fn initialize(&self) -> Result<()> {
        (**self).initialize()
    }

    fn shutdown(&self) {
        (**self).shutdown()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Holds every registered service and the order they were registered in.
///
/// `initialize` runs in registration order; on the first failure, every
/// service that already initialized is shut down in reverse before the
/// error is returned, so a partially-started daemon never lingers.
#[derive(Default)]
pub struct Registry {
    order: Vec<TypeId>,
    services: HashMap<TypeId, Box<dyn Service>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service under its concrete type. Re-registering the same
    /// type replaces the previous instance but keeps its original position.
    pub fn register<T: Service + 'static>(&mut self, service: T) {
        let id = TypeId::of::<T>();
        if !self.services.contains_key(&id) {
            self.order.push(id);
        }
        self.services.insert(id, Box::new(service));
    }

    /// Looks up a previously registered service by concrete type.
    pub fn get<T: Service + 'static>(&self) -> Option<&T> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<T>())
    }

    /// Runs `initialize` on every service in registration order.
    ///
    /// On failure, already-initialized services are shut down in reverse
    /// order before the error propagates.
    pub fn initialize_all(&self) -> Result<()> {
        let mut started = Vec::new();
        for id in &self.order {
            let service = self
                .services
                .get(id)
                .ok_or_else(|| anyhow!("registry inconsistency: missing service"))?;
            match service.initialize() {
                Ok(()) => started.push(id),
                Err(e) => {
                    for rollback_id in started.into_iter().rev() {
                        if let Some(s) = self.services.get(rollback_id) {
                            s.shutdown();
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Shuts down every service in reverse registration order. Individual
    /// shutdown failures have no return value to report (see
    /// [`Service::shutdown`]); implementations log their own errors.
    pub fn shutdown_all(&self) {
        for id in self.order.iter().rev() {
            if let Some(service) = self.services.get(id) {
                service.shutdown();
            }
        }
    }
}
