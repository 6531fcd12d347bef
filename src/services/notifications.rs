//! # Email notifications
//!
//! [`Mailer`] is the delivery seam: [`SmtpMailer`] talks to a STARTTLS relay
//! through lettre, [`LogMailer`] only writes the message to the log and is
//! used whenever SMTP is not configured. [`Notifier`] renders the shop's
//! plain-text askama templates (`templates/email/`) and sends them off the
//! request path.

use std::sync::Arc;

use askama::Template;
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, warn};

use crate::{
    config::SmtpConfig,
    error::{AppError, Result},
    models::{OrderDetails, User},
    utils::{format_cents, mask_email},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<()>;
}

// =====================================
// SMTP
// =====================================
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// # Errors
    /// Fails when the relay host cannot be resolved into a transport.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Email(e.to_string()))?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: Email) -> Result<()> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| AppError::Email(format!("Invalid sender '{}'", self.from_address)))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|_| AppError::Email(format!("Invalid recipient '{}'", email.to)))?)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| AppError::Email(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        Ok(())
    }
}

// =====================================
// Log only
// =====================================
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<()> {
        info!(
            to = %mask_email(&email.to),
            subject = %email.subject,
            "SMTP disabled, email not delivered"
        );
        Ok(())
    }
}

/// SMTP when a relay host is configured, logging otherwise.
///
/// # Errors
/// See [`SmtpMailer::new`].
pub fn mailer_from_config(config: &SmtpConfig) -> Result<Arc<dyn Mailer>> {
    if config.is_enabled() {
        Ok(Arc::new(SmtpMailer::new(config)?))
    } else {
        Ok(Arc::new(LogMailer))
    }
}

// =====================================
// Templates
// =====================================
#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeText<'a> {
    name: &'a str,
    email: &'a str,
    base_url: &'a str,
}

struct ConfirmationLine<'a> {
    quantity: i64,
    title: &'a str,
    unit_price: String,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    number: &'a str,
    lines: Vec<ConfirmationLine<'a>>,
    total: String,
    address: &'a str,
}

/// # Errors
/// [`AppError::Template`] if the body fails to render.
pub fn welcome_email(user: &User, base_url: &str) -> Result<Email> {
    let body = WelcomeText {
        name: user.name.as_deref().unwrap_or("reader"),
        email: &user.email,
        base_url,
    }
    .render()?;

    Ok(Email {
        to: user.email.clone(),
        subject: "Welcome to the bookstore".to_string(),
        body,
    })
}

/// Itemised receipt with the order number in the subject.
///
/// # Errors
/// [`AppError::Template`] if the body fails to render.
pub fn order_confirmation_email(user: &User, order: &OrderDetails) -> Result<Email> {
    let lines = order
        .items
        .iter()
        .map(|item| ConfirmationLine {
            quantity: item.quantity,
            title: &item.title,
            unit_price: format_cents(item.unit_price_cents),
        })
        .collect();

    let body = OrderConfirmationText {
        number: &order.order.order_number,
        lines,
        total: format_cents(order.order.total_cents),
        address: &order.order.shipping_address,
    }
    .render()?;

    Ok(Email {
        to: user.email.clone(),
        subject: format!("Order {} received", order.order.order_number),
        body,
    })
}

// =====================================
// Notifier
// =====================================
/// Sends shop emails in the background. Delivery failures are logged and
/// never reach the caller.
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    base_url: String,
}

impl Notifier {
    #[must_use]
    pub fn new(mailer: Arc<dyn Mailer>, base_url: impl Into<String>) -> Self {
        Self {
            mailer,
            base_url: base_url.into(),
        }
    }

    /// Greets a newly registered user.
    pub fn welcome(&self, user: &User) -> tokio::task::JoinHandle<()> {
        self.dispatch(welcome_email(user, &self.base_url))
    }

    /// Receipt for a placed order.
    pub fn order_confirmation(&self, user: &User, order: &OrderDetails) -> tokio::task::JoinHandle<()> {
        self.dispatch(order_confirmation_email(user, order))
    }

    fn dispatch(&self, email: Result<Email>) -> tokio::task::JoinHandle<()> {
        let mailer = Arc::clone(&self.mailer);

        tokio::spawn(async move {
            let email = match email {
                Ok(email) => email,
                Err(e) => {
                    warn!(error = %e, "Email could not be rendered");
                    return;
                }
            };
            let to = mask_email(&email.to);
            let subject = email.subject.clone();
            if let Err(e) = mailer.send(email).await {
                warn!(error = %e, to = %to, subject = %subject, "Email delivery failed");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{test_user, Order, OrderItem, OrderStatus, Role};
    use chrono::Utc;

    fn sample_order() -> OrderDetails {
        let now = Utc::now();
        OrderDetails {
            order: Order {
                id: "o1".into(),
                order_number: "BK-1-0001".into(),
                user_id: "u1".into(),
                status: OrderStatus::Pending,
                total_cents: 3998,
                shipping_address: "1 Library Lane".into(),
                created_at: now,
                updated_at: now,
            },
            items: vec![OrderItem {
                id: "i1".into(),
                order_id: "o1".into(),
                book_id: "b1".into(),
                title: "Dune".into(),
                unit_price_cents: 1999,
                quantity: 2,
            }],
        }
    }

    #[test]
    fn test_order_confirmation_lists_items_and_total() {
        let email = order_confirmation_email(&test_user(Role::Customer), &sample_order()).unwrap();
        assert_eq!(email.subject, "Order BK-1-0001 received");
        assert!(email.body.contains("2 x Dune @ 19.99\n"));
        assert!(email.body.contains("Total: 39.98"));
        assert!(email.body.contains("Shipping to: 1 Library Lane"));
    }

    #[test]
    fn test_order_confirmation_puts_each_item_on_its_own_line() {
        let mut order = sample_order();
        let mut second = order.items[0].clone();
        second.title = "Emma & Persuasion".into();
        second.unit_price_cents = 850;
        second.quantity = 1;
        order.items.push(second);

        let email = order_confirmation_email(&test_user(Role::Customer), &order).unwrap();
        assert!(email
            .body
            .contains("2 x Dune @ 19.99\n1 x Emma & Persuasion @ 8.50\n"));
    }

    #[test]
    fn test_welcome_email_greets_and_links() {
        let email = welcome_email(&test_user(Role::Customer), "https://books.example.com").unwrap();
        assert_eq!(email.to, "reader@example.com");
        assert!(email.body.starts_with("Hello "));
        assert!(email.body.contains("sign in at https://books.example.com with reader@example.com"));
    }

    #[tokio::test]
    async fn test_notifier_sends_welcome() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|email| email.to == "reader@example.com" && email.subject.contains("Welcome"))
            .times(1)
            .returning(|_| Ok(()));

        let notifier = Notifier::new(Arc::new(mailer), "http://localhost:3000");
        notifier.welcome(&test_user(Role::Customer)).await.unwrap();
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(1)
            .returning(|_| Err(AppError::Email("relay down".into())));

        let notifier = Notifier::new(Arc::new(mailer), "http://localhost:3000");
        let handle = notifier.order_confirmation(&test_user(Role::Customer), &sample_order());
        assert!(handle.await.is_ok());
    }

    #[test]
    fn test_disabled_smtp_uses_log_mailer() {
        let config = SmtpConfig {
            host: String::new(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from_address: "shop@example.com".into(),
        };
        assert!(mailer_from_config(&config).is_ok());
    }
}
