use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::OrmConn,
    pricing::{TotalVerifier, verifier_for},
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub total_verifier: Arc<dyn TotalVerifier>,
}

impl AppState {
    pub fn new(orm: OrmConn, config: AppConfig) -> Self {
        let total_verifier = verifier_for(config.order_total_policy);
        Self {
            orm,
            config: Arc::new(config),
            total_verifier,
        }
    }

    /// Replace the order total check, e.g. with a custom pricing rule.
    pub fn with_total_verifier(mut self, verifier: Arc<dyn TotalVerifier>) -> Self {
        self.total_verifier = verifier;
        self
    }
}
