use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::MailConfig;
use crate::error::RateError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Outbound operator notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends an HTML email and returns a transport confirmation string.
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<String, RateError>;
}

/// Sends mail through the external mail-relay API.
#[derive(Debug, Clone)]
pub struct MailApiNotifier {
    client: reqwest::Client,
    config: MailConfig,
}

#[derive(Serialize)]
struct MailApiPayload<'a> {
    token_api: &'a str,
    passwdor_encryted_api: &'a str,
    name_contact: &'a str,
    email_contact: &'a str,
    subject_page: &'a str,
    subject_contact: &'a str,
    message_contact: &'a str,
    host_server: &'a str,
    port_server: u16,
    email_user_server: &'a str,
    password_email_user_server: &'a str,
    #[serde(rename = "name_sendMail")]
    name_send_mail: &'a str,
    #[serde(rename = "email_sendMail")]
    email_send_mail: &'a str,
    name_receiver: &'a str,
    email_receiver: &'a str,
    email_copy: &'a str,
    body_html: &'a str,
}

impl MailApiNotifier {
    pub fn new(config: MailConfig) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RateError::Notify(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, RateError> {
        value
            .as_deref()
            .ok_or_else(|| RateError::Notify(format!("{name} is not configured")))
    }
}

#[async_trait]
impl Notifier for MailApiNotifier {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<String, RateError> {
        let cfg = &self.config;

        let bearer = Self::required(&cfg.bearer_token, "EMAIL_API_TOKEN")?;
        let payload = MailApiPayload {
            token_api: Self::required(&cfg.auth_token, "EMAIL_API_AUTH_TOKEN")?,
            passwdor_encryted_api: Self::required(
                &cfg.password_encrypted,
                "EMAIL_API_PASSWD_ENCRYPTED",
            )?,
            name_contact: "Notificación del Sistema",
            email_contact: &cfg.from_address,
            subject_page: "MassivaMovil ERP: ",
            subject_contact: subject,
            message_contact: "Este correo es generado automáticamente por MassivaMovil ERP.",
            host_server: Self::required(&cfg.server_host, "EMAIL_SERVER_HOST")?,
            port_server: cfg
                .server_port
                .ok_or_else(|| RateError::Notify("EMAIL_SERVER_PORT is not configured".into()))?,
            email_user_server: Self::required(&cfg.server_user, "EMAIL_SERVER_USER")?,
            password_email_user_server: Self::required(
                &cfg.server_password,
                "EMAIL_SERVER_PASSWORD",
            )?,
            name_send_mail: "Monitoreo MassivaMovil.com",
            email_send_mail: &cfg.from_address,
            name_receiver: "Administrador ERP",
            email_receiver: to,
            email_copy: cfg.copy_email.as_deref().unwrap_or(""),
            body_html: html,
        };

        let resp = self
            .client
            .post(&cfg.api_url)
            .bearer_auth(bearer)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RateError::Notify(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(RateError::Notify(format!(
                "mail API returned status {status}: {body}"
            )));
        }

        log::info!("notification sent to {to}: {subject}");
        Ok(format!("Email sent successfully to {to}. API response: {body}"))
    }
}

/// HTML body announcing a successful rate publication.
pub fn success_email(base_url: &str, rate: &str, valid_from: &str, valid_to: &str) -> String {
    format!(
        r#"<div style="text-align: center; font-family: Arial, sans-serif; color: #333;">
  <img src="{base_url}/massivamovil.png" alt="MassivaMovil Logo" style="max-width: 150px; margin-bottom: 20px;">
  <h1 style="color: #6D28D9;">Actualización de Tasa BCV</h1>
  <p>La tasa del BCV ha sido actualizada exitosamente en el sistema.</p>
  <ul style="list-style: none; padding: 0; display: inline-block; text-align: left;">
    <li><strong>Tasa:</strong> {rate}</li>
    <li><strong>Fecha de Inicio de Validez:</strong> {valid_from}</li>
    <li><strong>Fecha de Fin de Validez:</strong> {valid_to}</li>
  </ul>
  <p style="margin-top: 30px; font-size: 0.8em; color: #777;">Este es un mensaje automático. Por favor, no responda a este correo.</p>
</div>"#
    )
}

/// HTML body reporting a failed publication run.
pub fn failure_email(base_url: &str, error: &str) -> String {
    format!(
        r#"<div style="text-align: center; font-family: Arial, sans-serif; color: #333;">
  <img src="{base_url}/massivamovil.png" alt="MassivaMovil Logo" style="max-width: 150px; margin-bottom: 20px;">
  <h1 style="color: #D92828;">Error en la Actualización de Tasa BCV</h1>
  <p>Ocurrió un error al intentar actualizar la tasa del BCV en el sistema.</p>
  <p style="text-align: left; display: inline-block; background-color: #fdd; padding: 10px; border-left: 5px solid #D92828;">
    <strong>Error:</strong> {error}
  </p>
  <p style="margin-top: 30px; font-size: 0.8em; color: #777;">Este es un mensaje automático. Por favor, no responda a este correo.</p>
</div>"#
    )
}
