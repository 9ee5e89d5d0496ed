//! Send-email action handler.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::gateway::Mailer;
use crate::handler::{substitute, ActionHandler};
use crate::types::{Action, ActionKind, HandlerOutcome};

/// Sends one email through the mailer seam.
///
/// The recipient comes from the extracted parameter named by the email
/// spec's `to_field`; subject and body get `{param}` placeholders
/// substituted.
pub struct SendEmailHandler {
    mailer: Arc<dyn Mailer>,
}

impl SendEmailHandler {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl ActionHandler for SendEmailHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::SendEmail
    }

    async fn execute(
        &self,
        action: &Action,
        parameters: &BTreeMap<String, String>,
    ) -> Result<HandlerOutcome, ActionError> {
        let spec = action.spec.email.as_ref().ok_or_else(|| {
            ActionError::InvalidConfig("send_email action has no email configuration".to_string())
        })?;

        let to = parameters
            .get(&spec.to_field)
            .ok_or_else(|| ActionError::MissingParameter(spec.to_field.clone()))?;

        let subject = substitute(&spec.subject, parameters);
        let body = substitute(&spec.body, parameters);

        self.mailer.send(to, &subject, &body).await?;
        tracing::info!(to = %to, action = %action.name, "Email sent");

        Ok(HandlerOutcome {
            records_affected: 1,
            detail: serde_json::json!({
                "to": to,
                "subject": subject,
            }),
        })
    }

    fn describe(&self, action: &Action, parameters: &BTreeMap<String, String>) -> String {
        let to = action
            .spec
            .email
            .as_ref()
            .and_then(|spec| parameters.get(&spec.to_field))
            .map(String::as_str)
            .unwrap_or("<unknown>");
        format!("Send email to {}", to)
    }
}
