use std::time::Duration;

use rst_common::with_logging::log::{info, warn};
use rst_common::with_tracing::tracing_subscriber::{
    self, layer::SubscriberExt, util::SubscriberInitExt,
};

use prople_issuance_agent::network::Transport;
use prople_issuance_agent::{ConfigManager, MemoryAgent, MemoryLedger, RuntimeBuilder};
use prople_issuance_core::credential::AcceptPolicy;
use prople_issuance_core::issuance::types::IssuanceOutcome;
use prople_issuance_core::issuance::Orchestrator;

use crate::errors::DaemonError;

/// `Issuance` runs a single issuance flow between the issuer and the holder described by the
/// given config file
pub struct Issuance {
    config: String,
}

impl Issuance {
    pub fn new(config: String) -> Issuance {
        Self { config }
    }

    pub fn setup_tracing() {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    format!(
                        "{}=debug,prople_issuance_core=debug,prople_issuance_agent=debug",
                        env!("CARGO_CRATE_NAME")
                    )
                    .into()
                }),
            )
            .with(tracing_subscriber::fmt::layer().without_time())
            .try_init();
    }

    pub async fn run(&self) -> Result<IssuanceOutcome, DaemonError> {
        let config = ConfigManager::new(self.config.to_owned())
            .parse()
            .map_err(|err| DaemonError::ConfigError(err.to_string()))?;

        let (ledger_id, is_production) = config.ledger().get();
        let ledger = MemoryLedger::new(ledger_id, is_production);
        let transport = Transport::new();

        info!(
            "using ledger {} (production: {})",
            ledger.get_id(),
            ledger.is_production()
        );

        let issuer = RuntimeBuilder::new(config.issuer().to_owned(), ledger.clone(), transport.clone())
            .build()
            .map_err(|err| DaemonError::AgentError(err.to_string()))?;

        let holder = RuntimeBuilder::new(config.holder().to_owned(), ledger, transport)
            .build()
            .map_err(|err| DaemonError::AgentError(err.to_string()))?;

        let issuance = config.issuance();
        let policy = issuance.get_accept_policy().build();
        let completion_timeout = issuance.get_completion_timeout();

        info!(
            "issuing from {} ({}) to {} ({})",
            config.issuer().get_label(),
            issuer.get_did(),
            config.holder().get_label(),
            holder.get_did()
        );

        let result = Self::issue(
            Orchestrator::new(issuer.clone(), holder.clone(), policy, issuance.to_params()),
            completion_timeout,
        )
        .await;

        for agent in [&issuer, &holder] {
            if let Err(err) = agent.shutdown() {
                warn!("unable to shut {} down: {}", agent.get_endpoint(), err)
            }
        }

        result
    }

    async fn issue(
        mut orchestrator: Orchestrator<MemoryAgent, MemoryAgent, Box<dyn AcceptPolicy>>,
        completion_timeout: Duration,
    ) -> Result<IssuanceOutcome, DaemonError> {
        let _ = orchestrator
            .run()
            .await
            .map_err(|err| DaemonError::IssuanceError(err.to_string()))?;

        let completed = orchestrator
            .await_completion(completion_timeout)
            .await
            .map_err(|err| DaemonError::IssuanceError(err.to_string()))?;

        info!("credential issued: {}", completed.get_id().as_str());
        Ok(orchestrator.outcome())
    }
}
