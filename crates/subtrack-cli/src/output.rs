//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use subtrack_core::{Subscription, User};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single subscription in full
    pub fn print_subscription(&self, sub: &Subscription) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:           {}", sub.id);
                println!("Name:         {}", sub.name);
                println!("Price:        {}", format_price(sub.price, &sub.currency));
                println!("Billing:      {}", sub.billing_cycle);
                println!("Renews:       {}", sub.renewal_date.format("%Y-%m-%d"));
                if let Some(next) = sub.next_billing_date {
                    println!("Next billing: {}", next.format("%Y-%m-%d"));
                }
                if let Some(ref logo) = sub.logo_url {
                    println!("Logo:         {}", logo);
                }

                if !sub.transaction_history.is_empty() {
                    println!();
                    println!("── Payments ({}) ──", sub.transaction_history.len());
                    for tx in &sub.transaction_history {
                        println!(
                            "[{}] {}",
                            tx.date.format("%Y-%m-%d"),
                            format_price(tx.amount, &sub.currency)
                        );
                    }
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(sub).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", sub.id);
            }
        }
    }

    /// Print a list of subscriptions
    pub fn print_subscriptions(&self, subs: &[Subscription]) {
        match self.format {
            OutputFormat::Human => {
                if subs.is_empty() {
                    println!("No subscriptions found.");
                    return;
                }
                for sub in subs {
                    println!(
                        "{} | {} | {} {} | renews {}",
                        short_id(&sub.id),
                        truncate(&sub.name, 25),
                        format_price(sub.price, &sub.currency),
                        sub.billing_cycle,
                        sub.renewal_date.format("%Y-%m-%d")
                    );
                }
                println!("\n{} subscription(s)", subs.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(subs).unwrap());
            }
            OutputFormat::Quiet => {
                for sub in subs {
                    println!("{}", sub.id);
                }
            }
        }
    }

    /// Print the signed-in account
    pub fn print_user(&self, user: &User) {
        match self.format {
            OutputFormat::Human => {
                println!("Signed in as {} ({})", user.email, user.uid);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(user).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", user.uid);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Format an amount with its currency code
///
/// Known codes get their symbol; anything else falls back to "amount CODE".
pub fn format_price(amount: f64, currency: &str) -> String {
    match currency.to_ascii_uppercase().as_str() {
        "USD" => format!("${:.2}", amount),
        "EUR" => format!("€{:.2}", amount),
        "GBP" => format!("£{:.2}", amount),
        "JPY" => format!("¥{:.0}", amount),
        code => format!("{:.2} {}", amount, code),
    }
}

/// First 8 characters of an id, for list rows
fn short_id(id: &str) -> &str {
    if id.len() <= 8 {
        id
    } else {
        &id[..8]
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
