//! Admin approval of broker accounts.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::Backend;
use crate::error::Result;
use crate::models::BrokerAccount;

/// Broker accounts as seen from the admin dashboard
pub struct ModerationQueue {
    backend: Arc<dyn Backend>,
    brokers: Vec<BrokerAccount>,
    error: Option<String>,
}

impl ModerationQueue {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            brokers: Vec::new(),
            error: None,
        }
    }

    pub fn brokers(&self) -> &[BrokerAccount] {
        &self.brokers
    }

    pub fn pending(&self) -> impl Iterator<Item = &BrokerAccount> {
        self.brokers.iter().filter(|broker| !broker.is_approved)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn load(&mut self) -> Result<()> {
        match self.backend.list_brokers().await {
            Ok(brokers) => {
                self.brokers = brokers;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                warn!("Could not load brokers: {err}");
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    pub async fn approve(&mut self, broker_id: &str) -> Result<()> {
        self.set_approval(broker_id, true).await
    }

    pub async fn revoke(&mut self, broker_id: &str) -> Result<()> {
        self.set_approval(broker_id, false).await
    }

    async fn set_approval(&mut self, broker_id: &str, approved: bool) -> Result<()> {
        let outcome = if approved {
            self.backend.approve_broker(broker_id).await
        } else {
            self.backend.revoke_broker(broker_id).await
        };

        if let Err(err) = outcome {
            warn!("Changing approval of broker {broker_id} failed: {err}");
            self.error = Some(err.user_message());
            return Err(err);
        }

        info!("Broker {broker_id} approved: {approved}");
        if let Some(broker) = self.brokers.iter_mut().find(|broker| broker.id == broker_id) {
            broker.is_approved = approved;
        }
        self.error = None;
        Ok(())
    }
}
