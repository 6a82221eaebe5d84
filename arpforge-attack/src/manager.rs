//! Manager for orchestrating generator instances
//!
//! The [`AppManager`] is the host environment's entry point: it owns the
//! registered generator instances and turns "start this one at 2.0 s, stop
//! it at 6.0 s" into scheduler callbacks that invoke the instances'
//! activation hooks. The instances themselves never see absolute time.

use arpforge_core::{Error, Result, Scheduler};
use arpforge_protocols::arp::{ArpSpoofApp, SpoofStats};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Identifier handed out at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppId(pub u64);

/// Information about a registered generator instance
#[derive(Debug, Clone)]
pub struct AppInfo {
    pub id: AppId,
    pub name: String,
    pub is_running: bool,
    pub stats: SpoofStats,
}

struct ManagedApp {
    id: AppId,
    name: String,
    app: Rc<ArpSpoofApp>,
}

/// Orchestrates generator instances over one scheduler
pub struct AppManager {
    scheduler: Rc<dyn Scheduler>,
    apps: RefCell<Vec<ManagedApp>>,
    next_id: Cell<u64>,
}

impl AppManager {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        debug!("creating new AppManager");
        Self {
            scheduler,
            apps: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Register a generator instance under a display name
    pub fn register<S: Into<String>>(&self, name: S, app: Rc<ArpSpoofApp>) -> AppId {
        let id = AppId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let name = name.into();
        info!(id = id.0, app = %name, "generator registered");
        self.apps.borrow_mut().push(ManagedApp { id, name, app });
        id
    }

    /// Schedule the activation hook to fire after `delay` of simulated time
    ///
    /// An activation failure at fire time has no caller to return to, so it
    /// is logged; the instance schedules nothing further.
    pub fn start_after(&self, id: AppId, delay: Duration) -> Result<()> {
        let (app, name) = self.lookup(id)?;
        let scheduler = Rc::clone(&self.scheduler);
        info!(id = id.0, app = %name, delay_us = delay.as_micros() as u64, "start scheduled");
        self.scheduler.schedule_after(
            delay,
            Box::new(move || {
                if let Err(e) = app.activate(Rc::clone(&scheduler)) {
                    error!(app = %name, error = %e, "activation failed");
                }
            }),
        );
        Ok(())
    }

    /// Schedule the deactivation hook to fire after `delay` of simulated time
    pub fn stop_after(&self, id: AppId, delay: Duration) -> Result<()> {
        let (app, name) = self.lookup(id)?;
        info!(id = id.0, app = %name, delay_us = delay.as_micros() as u64, "stop scheduled");
        self.scheduler.schedule_after(
            delay,
            Box::new(move || {
                app.deactivate();
            }),
        );
        Ok(())
    }

    /// Deactivate every registered instance immediately
    pub fn stop_all(&self) {
        info!("stopping all generators");
        for managed in self.apps.borrow().iter() {
            managed.app.deactivate();
        }
    }

    /// Get the listing entry for one instance
    pub fn info(&self, id: AppId) -> Result<AppInfo> {
        let apps = self.apps.borrow();
        apps.iter()
            .find(|managed| managed.id == id)
            .map(ManagedApp::info)
            .ok_or_else(|| Error::NotFound(format!("generator {}", id.0)))
    }

    /// List all registered instances
    pub fn list(&self) -> Vec<AppInfo> {
        self.apps.borrow().iter().map(ManagedApp::info).collect()
    }

    pub fn len(&self) -> usize {
        self.apps.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.borrow().is_empty()
    }

    fn lookup(&self, id: AppId) -> Result<(Rc<ArpSpoofApp>, String)> {
        let apps = self.apps.borrow();
        apps.iter()
            .find(|managed| managed.id == id)
            .map(|managed| (Rc::clone(&managed.app), managed.name.clone()))
            .ok_or_else(|| Error::NotFound(format!("generator {}", id.0)))
    }
}

impl ManagedApp {
    fn info(&self) -> AppInfo {
        AppInfo {
            id: self.id,
            name: self.name.clone(),
            is_running: self.app.is_running(),
            stats: self.app.stats(),
        }
    }
}

impl Drop for AppManager {
    fn drop(&mut self) {
        for managed in self.apps.borrow().iter() {
            managed.app.deactivate();
        }
    }
}
