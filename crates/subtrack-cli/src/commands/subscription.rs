//! Subscription command handlers

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;

use subtrack_core::{BillingCycle, Subscription, SubscriptionDraft, SyncClient, User};

use crate::output::Output;
use crate::prompt::confirm;

/// Optional field changes for `edit`
#[derive(Default)]
pub struct EditArgs {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub cycle: Option<BillingCycle>,
    pub renews: Option<NaiveDate>,
    pub next_billing: Option<NaiveDate>,
    pub logo: Option<String>,
}

/// Create a new subscription
#[allow(clippy::too_many_arguments)]
pub async fn add(
    client: &SyncClient,
    owner: &User,
    name: String,
    price: f64,
    currency: String,
    cycle: BillingCycle,
    renews: NaiveDate,
    logo: Option<String>,
    next_billing: Option<NaiveDate>,
    output: &Output,
) -> Result<()> {
    let mut draft = SubscriptionDraft::new(&owner.uid, name, price, currency, cycle, renews);
    draft.set_logo_url(logo);
    draft.set_next_billing_date(next_billing);

    // Field constraints are checked here, before the layer is involved
    draft.validate().map_err(|e| anyhow!(e))?;

    let id = client
        .create(&draft)
        .await
        .context("Failed to create subscription")?;

    output.success(&format!("Created subscription: {}", id));
    output.print_subscription(&Subscription::from_draft(id, draft));

    Ok(())
}

/// List the signed-in user's subscriptions
pub async fn list(client: &SyncClient, owner: &User, output: &Output) -> Result<()> {
    let subs = client
        .fetch_list(Some(&owner.uid))
        .await
        .context("Failed to fetch subscriptions")?;

    output.print_subscriptions(&subs);
    Ok(())
}

/// Show a single subscription
pub async fn show(client: &SyncClient, id: String, output: &Output) -> Result<()> {
    let sub = client
        .fetch_detail(&id)
        .await
        .context("Failed to fetch subscription")?
        .ok_or_else(|| anyhow!("Subscription not found: {}", id))?;

    output.print_subscription(&sub);
    Ok(())
}

/// Edit a subscription
pub async fn edit(
    client: &SyncClient,
    id: String,
    changes: EditArgs,
    output: &Output,
) -> Result<()> {
    let mut sub = client
        .fetch_detail(&id)
        .await
        .context("Failed to fetch subscription")?
        .ok_or_else(|| anyhow!("Subscription not found: {}", id))?;

    if let Some(name) = changes.name {
        sub.name = name;
    }
    if let Some(price) = changes.price {
        sub.price = price;
    }
    if let Some(currency) = changes.currency {
        sub.currency = currency;
    }
    if let Some(cycle) = changes.cycle {
        sub.billing_cycle = cycle;
    }
    if let Some(renews) = changes.renews {
        sub.renewal_date = renews;
    }
    if let Some(next) = changes.next_billing {
        sub.next_billing_date = Some(next);
    }
    if let Some(logo) = changes.logo {
        sub.logo_url = if logo.is_empty() { None } else { Some(logo) };
    }

    sub.draft().validate().map_err(|e| anyhow!(e))?;

    client
        .update(&sub)
        .await
        .context("Failed to update subscription")?;

    output.success("Subscription updated");
    output.print_subscription(&sub);

    Ok(())
}

/// Record a payment against a subscription
pub async fn pay(
    client: &SyncClient,
    id: String,
    amount: f64,
    date: NaiveDate,
    output: &Output,
) -> Result<()> {
    let mut sub = client
        .fetch_detail(&id)
        .await
        .context("Failed to fetch subscription")?
        .ok_or_else(|| anyhow!("Subscription not found: {}", id))?;

    sub.record_payment(amount, date);

    client
        .update(&sub)
        .await
        .context("Failed to record payment")?;

    output.success(&format!(
        "Recorded payment of {} on {}",
        amount,
        date.format("%Y-%m-%d")
    ));
    Ok(())
}

/// Delete a subscription
pub async fn remove(client: &SyncClient, owner: &User, id: String, output: &Output) -> Result<()> {
    let cached = client.cached_detail(&id).await;

    // Confirm deletion
    if output.should_prompt() {
        let label = cached
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| id.clone());
        println!("Delete subscription: {}", label);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    client
        .remove(&id)
        .await
        .context("Failed to delete subscription")?;

    // Deleting from the list view: the layer never saw the detail, so it
    // cannot recover the owner. This screen knows its own list key.
    if cached.is_none() {
        client.invalidate_list(&owner.uid).await;
    }

    output.success(&format!("Deleted subscription: {}", id));
    Ok(())
}
