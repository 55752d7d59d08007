// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::dispatch::Dispatcher;
use crate::error::RelayError;
use crate::registry::{ConnectionRegistry, RegistryStats};

/// Shared relay state.
pub struct RelayState {
    pub config: RelayConfig,
    pub shutdown: CancellationToken,
    /// Installed at startup. `None` means the relay is not ready yet and
    /// trigger requests are refused.
    pub registry: Option<Arc<ConnectionRegistry>>,
}

impl RelayState {
    pub fn new(config: RelayConfig, shutdown: CancellationToken) -> Self {
        Self { config, shutdown, registry: None }
    }

    pub fn registry(&self) -> Result<&Arc<ConnectionRegistry>, RelayError> {
        self.registry.as_ref().ok_or(RelayError::NotReady)
    }

    pub fn dispatcher(&self) -> Result<Dispatcher, RelayError> {
        self.registry().map(|r| Dispatcher::new(Arc::clone(r)))
    }

    pub fn is_ready(&self) -> bool {
        self.registry.is_some()
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.as_ref().map(|r| r.stats()).unwrap_or_default()
    }
}
