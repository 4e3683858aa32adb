use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use admissions_ai::config::NotificationConfig;
use admissions_ai::workflows::applications::{
    ApplicationNotice, LogNotifier, Notifier, NotifyError, TelegramNotifier, NOTIFY_TIMEOUT,
};
use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Notification channel selected from configuration at startup.
pub(crate) enum ConfiguredNotifier {
    Telegram(TelegramNotifier),
    Log(LogNotifier),
}

impl ConfiguredNotifier {
    pub(crate) fn from_config(config: &NotificationConfig) -> Result<Self, NotifyError> {
        match config.telegram() {
            Some((token, chat_id)) => Ok(Self::Telegram(TelegramNotifier::with_timeout(
                token,
                chat_id,
                NOTIFY_TIMEOUT,
            )?)),
            None => Ok(Self::Log(LogNotifier)),
        }
    }

    pub(crate) const fn label(&self) -> &'static str {
        match self {
            ConfiguredNotifier::Telegram(_) => "telegram",
            ConfiguredNotifier::Log(_) => "log",
        }
    }
}

#[async_trait]
impl Notifier for ConfiguredNotifier {
    async fn publish(&self, notice: &ApplicationNotice) -> Result<(), NotifyError> {
        match self {
            ConfiguredNotifier::Telegram(notifier) => notifier.publish(notice).await,
            ConfiguredNotifier::Log(notifier) => notifier.publish(notice).await,
        }
    }
}
