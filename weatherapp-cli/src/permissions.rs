use async_trait::async_trait;
use inquire::error::InquireResult;
use std::path::PathBuf;
use tracing::warn;
use weatherapp_core::{Config, Permission, PermissionGate};

type Ask = fn(&str) -> InquireResult<bool>;

fn confirm_on_terminal(question: &str) -> InquireResult<bool> {
    inquire::Confirm::new(question).with_default(false).prompt()
}

/// Asks on the terminal and remembers a grant in the config file.
#[derive(Debug)]
pub struct PromptPermissionGate {
    config: Config,
    config_path: PathBuf,
    ask: Ask,
}

impl PromptPermissionGate {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        Self::with_prompt(config, config_path, confirm_on_terminal)
    }

    fn with_prompt(config: Config, config_path: PathBuf, ask: Ask) -> Self {
        Self {
            config,
            config_path,
            ask,
        }
    }

    fn record_grant(&mut self, permission: Permission) {
        match permission {
            Permission::FineLocation => self.config.location_permission_granted = true,
        }
        if let Err(err) = self.config.save_to(&self.config_path) {
            warn!(error = %err, "failed to remember permission grant");
        }
    }
}

#[async_trait]
impl PermissionGate for PromptPermissionGate {
    fn is_granted(&self, permission: Permission) -> bool {
        match permission {
            Permission::FineLocation => self.config.location_permission_granted,
        }
    }

    async fn request(&mut self, permission: Permission) -> bool {
        let question = format!("Allow weather to access your {permission}?");
        let ask = self.ask;
        let answer = tokio::task::spawn_blocking(move || ask(&question)).await;

        let granted = match answer {
            Ok(Ok(granted)) => granted,
            Ok(Err(err)) => {
                warn!(error = %err, "permission prompt failed");
                false
            }
            Err(err) => {
                warn!(error = %err, "permission prompt task failed");
                false
            }
        };

        if granted {
            self.record_grant(permission);
        }

        granted
    }
}
