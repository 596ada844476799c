use serde_json::json;

use crate::config::Config;

/// Outbound email sink. Fire-and-forget from the call sites: a failed send
/// is logged, never surfaced to the client.
#[derive(Clone)]
pub struct Mailer {
    http: reqwest::Client,
    api_url: String,
    from_email: String,
    from_name: String,
}

impl Mailer {
    pub fn new(config: &Config) -> Self {
        Mailer {
            http: reqwest::Client::new(),
            api_url: config.mail_api_url.clone(),
            from_email: config.mail_from_email.clone(),
            from_name: config.mail_from_name.clone(),
        }
    }

    pub async fn send(&self, to: &str, subject: &str, html: &str, text: &str) -> bool {
        let payload = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from_email, "name": self.from_name },
            "subject": subject,
            "content": [
                { "type": "text/html", "value": html },
                { "type": "text/plain", "value": text },
            ],
        });

        match self.http.post(&self.api_url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("email sent to {}", to);
                true
            }
            Ok(response) => {
                tracing::error!("email send failed for {}: status {}", to, response.status());
                false
            }
            Err(e) => {
                tracing::error!("email send error for {}: {}", to, e);
                false
            }
        }
    }

    pub async fn send_verification_code(&self, to: &str, code: &str) -> bool {
        let subject = "Your verification code";
        let html = format!(
            "<p>Your verification code is <strong>{}</strong>. It expires in 10 minutes.</p>",
            code
        );
        let text = format!("Your verification code is {}. It expires in 10 minutes.", code);
        self.send(to, subject, &html, &text).await
    }

    pub async fn send_password_reset(&self, to: &str, token: &str) -> bool {
        let subject = "Reset your password";
        let html = format!(
            "<p>Use this token to reset your password: <strong>{}</strong>. \
             It expires in 30 minutes and can be used once.</p>",
            token
        );
        let text = format!(
            "Use this token to reset your password: {}. It expires in 30 minutes.",
            token
        );
        self.send(to, subject, &html, &text).await
    }
}
