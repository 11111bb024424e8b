use std::sync::Arc;

use crate::models::nav_item::{default_menu, MenuItem};
use crate::models::workflow::{Timeouts, TransitionExecutor};
use crate::remote::PortalBackend;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct Portal {
    pub backend: Arc<dyn PortalBackend>,
    pub executor: TransitionExecutor,
    pub menu: Arc<Vec<MenuItem>>,
}

impl Portal {
    pub fn new(backend: Arc<dyn PortalBackend>, timeouts: Timeouts) -> Self {
        Portal {
            executor: TransitionExecutor::new(backend.clone(), timeouts),
            backend,
            menu: Arc::new(default_menu()),
        }
    }

    pub fn with_menu(mut self, menu: Vec<MenuItem>) -> Self {
        self.menu = Arc::new(menu);
        self
    }
}
