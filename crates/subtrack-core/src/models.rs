//! Data models for subtrack
//!
//! Defines the core data structures: Subscription, SubscriptionDraft,
//! Transaction, and BillingCycle. Field names serialize in camelCase to
//! match the backend wire format.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How often a subscription bills
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingCycle {
    /// All cycles, in ascending period order
    pub const ALL: [BillingCycle; 5] = [
        BillingCycle::Daily,
        BillingCycle::Weekly,
        BillingCycle::Monthly,
        BillingCycle::Quarterly,
        BillingCycle::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Daily => "daily",
            BillingCycle::Weekly => "weekly",
            BillingCycle::Monthly => "monthly",
            BillingCycle::Quarterly => "quarterly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(BillingCycle::Daily),
            "weekly" => Ok(BillingCycle::Weekly),
            "monthly" => Ok(BillingCycle::Monthly),
            "quarterly" => Ok(BillingCycle::Quarterly),
            "yearly" => Ok(BillingCycle::Yearly),
            other => Err(format!("unknown billing cycle: {}", other)),
        }
    }
}

/// A single recorded payment against a subscription
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Amount paid
    pub amount: f64,
    /// When the payment happened
    pub date: NaiveDate,
}

/// A tracked recurring payment
///
/// The `id` is assigned by the remote store on creation and is immutable
/// afterwards. All other fields travel in the write payload via
/// [`SubscriptionDraft`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Remote-assigned identifier
    pub id: String,
    /// Id of the authenticated owner; set at creation, never changed
    pub owner_id: String,
    /// Display name ("Netflix", "Spotify", ...)
    pub name: String,
    /// Optional logo image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Price per billing cycle (non-negative)
    pub price: f64,
    /// ISO 4217-style currency code ("USD", "EUR", ...)
    pub currency: String,
    /// Billing cadence
    pub billing_cycle: BillingCycle,
    /// Next renewal date
    pub renewal_date: NaiveDate,
    /// Optional upcoming billing date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_billing_date: Option<NaiveDate>,
    /// Recorded payments, oldest first (append-only in practice)
    #[serde(default)]
    pub transaction_history: Vec<Transaction>,
}

impl Subscription {
    /// Reassemble a subscription from a remote-assigned id and its payload
    pub fn from_draft(id: impl Into<String>, draft: SubscriptionDraft) -> Self {
        Self {
            id: id.into(),
            owner_id: draft.owner_id,
            name: draft.name,
            logo_url: draft.logo_url,
            price: draft.price,
            currency: draft.currency,
            billing_cycle: draft.billing_cycle,
            renewal_date: draft.renewal_date,
            next_billing_date: draft.next_billing_date,
            transaction_history: draft.transaction_history,
        }
    }

    /// The write payload: everything except `id`
    pub fn draft(&self) -> SubscriptionDraft {
        SubscriptionDraft {
            owner_id: self.owner_id.clone(),
            name: self.name.clone(),
            logo_url: self.logo_url.clone(),
            price: self.price,
            currency: self.currency.clone(),
            billing_cycle: self.billing_cycle,
            renewal_date: self.renewal_date,
            next_billing_date: self.next_billing_date,
            transaction_history: self.transaction_history.clone(),
        }
    }

    /// Append a payment to the transaction history
    pub fn record_payment(&mut self, amount: f64, date: NaiveDate) {
        self.transaction_history.push(Transaction { amount, date });
    }
}

/// A subscription without its remote-assigned id
///
/// Used as the payload for create and replace operations; the remote store
/// owns id assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDraft {
    pub owner_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub price: f64,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub renewal_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_billing_date: Option<NaiveDate>,
    #[serde(default)]
    pub transaction_history: Vec<Transaction>,
}

impl SubscriptionDraft {
    /// Create a draft with the required fields
    pub fn new(
        owner_id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        currency: impl Into<String>,
        billing_cycle: BillingCycle,
        renewal_date: NaiveDate,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            name: name.into(),
            logo_url: None,
            price,
            currency: currency.into(),
            billing_cycle,
            renewal_date,
            next_billing_date: None,
            transaction_history: Vec::new(),
        }
    }

    /// Set the logo URL
    pub fn set_logo_url(&mut self, url: Option<String>) {
        self.logo_url = url;
    }

    /// Set the upcoming billing date
    pub fn set_next_billing_date(&mut self, date: Option<NaiveDate>) {
        self.next_billing_date = date;
    }

    /// Check the field constraints screens are expected to enforce
    /// before calling create/update
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.price < 0.0 {
            return Err("price must be non-negative".to_string());
        }
        if self.currency.trim().is_empty() {
            return Err("currency must not be empty".to_string());
        }
        Ok(())
    }
}
