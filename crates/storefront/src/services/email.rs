//! Order confirmation email.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and text templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use cwish_core::Price;

use crate::config::EmailConfig;
use crate::models::{Order, ShippingDetails};

/// One order item as shown in the email.
#[derive(Debug, Clone)]
pub struct EmailLine {
    pub name: String,
    pub image: Option<String>,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
    pub print_position: Option<&'static str>,
    pub personalization: Option<String>,
}

/// HTML template for the order confirmation.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    short_id: &'a str,
    customer_name: &'a str,
    lines: &'a [EmailLine],
    total: &'a str,
    shipping: &'a ShippingDetails,
}

/// Plain text template for the order confirmation.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    short_id: &'a str,
    customer_name: &'a str,
    lines: &'a [EmailLine],
    total: &'a str,
    shipping: &'a ShippingDetails,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A rendered message, ready to send.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Render the confirmation for an order.
///
/// # Errors
///
/// Returns `EmailError::Template` if a template fails to render.
pub fn render_order_confirmation(order: &Order) -> Result<RenderedEmail, EmailError> {
    let short_id = order.id.short();
    let customer_name = order.shipping.full_name();
    let lines: Vec<EmailLine> = order
        .items
        .iter()
        .map(|item| EmailLine {
            name: item.product_name.clone(),
            image: item.product_image.clone(),
            quantity: item.quantity,
            unit_price: Price::new(item.unit_price, order.currency).display(),
            line_total: Price::new(item.total_price, order.currency).display(),
            print_position: item.print_position.map(|p| p.label()),
            personalization: item.personalization.clone(),
        })
        .collect();
    let total = Price::new(order.total_amount, order.currency).display();

    let html = OrderConfirmationHtml {
        short_id: &short_id,
        customer_name: &customer_name,
        lines: &lines,
        total: &total,
        shipping: &order.shipping,
    }
    .render()?;
    let text = OrderConfirmationText {
        short_id: &short_id,
        customer_name: &customer_name,
        lines: &lines,
        total: &total,
        shipping: &order.shipping,
    }
    .render()?;

    Ok(RenderedEmail {
        subject: format!("Order confirmation #{short_id}"),
        text,
        html,
    })
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send the order confirmation to the order's email address.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_confirmation(&self, order: &Order) -> Result<(), EmailError> {
        let email = render_order_confirmation(order)?;
        self.send_multipart_email(
            order.shipping.email.as_str(),
            &email.subject,
            &email.text,
            &email.html,
        )
        .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}
