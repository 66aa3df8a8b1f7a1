use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::time::Instant;

use crate::{
    api::OrderApi,
    dto::orders::{NewOrder, NewOrderItem},
    error::CheckoutError,
    models::{OrderId, OrderItemId},
    services::cart_service::{CartLine, CartStore},
    storage::KeyValueStore,
};

pub const ORDER_PLACED_DISPLAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    Submitting,
    Succeeded { order_id: OrderId },
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyCart,
    BlankCustomerName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub item_ids: Vec<Option<OrderItemId>>,
    /// Units across all lines, not the number of lines.
    pub units: u32,
    pub total: Decimal,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Skipped(SkipReason),
    Placed(PlacedOrder),
}

#[derive(Debug)]
enum Phase {
    Idle,
    Submitting,
    Succeeded { order_id: OrderId, at: Instant },
    Failed { message: String },
}

/// Turns a cart into an order plus one order item per line.
///
/// Items are created one at a time in cart order and the first failure stops
/// the run. Items already accepted by the server stay there: there is no
/// compensation, and a retry creates a fresh order.
#[derive(Debug)]
pub struct CheckoutSequencer<A> {
    api: A,
    phase: Phase,
    display_for: Duration,
}

impl<A: OrderApi> CheckoutSequencer<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            phase: Phase::Idle,
            display_for: ORDER_PLACED_DISPLAY,
        }
    }

    pub fn with_display_duration(mut self, display_for: Duration) -> Self {
        self.display_for = display_for;
        self
    }

    pub fn state(&self) -> CheckoutState {
        match &self.phase {
            Phase::Idle => CheckoutState::Idle,
            Phase::Submitting => CheckoutState::Submitting,
            Phase::Succeeded { order_id, at } => {
                if at.elapsed() >= self.display_for {
                    CheckoutState::Idle
                } else {
                    CheckoutState::Succeeded {
                        order_id: *order_id,
                    }
                }
            }
            Phase::Failed { message } => CheckoutState::Failed {
                message: message.clone(),
            },
        }
    }

    /// Dismisses a failure so the shopper can retry.
    pub fn acknowledge(&mut self) {
        if matches!(self.phase, Phase::Failed { .. }) {
            self.phase = Phase::Idle;
        }
    }

    pub async fn submit<S: KeyValueStore>(
        &mut self,
        customer_name: &str,
        cart: &mut CartStore<S>,
    ) -> Result<SubmitOutcome, CheckoutError> {
        if cart.is_empty() {
            tracing::debug!("checkout skipped: cart is empty");
            return Ok(SubmitOutcome::Skipped(SkipReason::EmptyCart));
        }
        if customer_name.trim().is_empty() {
            tracing::debug!("checkout skipped: customer name is blank");
            return Ok(SubmitOutcome::Skipped(SkipReason::BlankCustomerName));
        }

        self.phase = Phase::Submitting;
        let lines = cart.lines().to_vec();
        let total = cart.total();
        let units = lines.iter().map(|line| line.quantity).sum();

        match self.place(customer_name, &lines).await {
            Ok((order_id, item_ids)) => {
                cart.clear();
                self.phase = Phase::Succeeded {
                    order_id,
                    at: Instant::now(),
                };
                tracing::info!(order_id = %order_id, items = item_ids.len(), "order placed");
                Ok(SubmitOutcome::Placed(PlacedOrder {
                    order_id,
                    item_ids,
                    units,
                    total,
                    placed_at: Utc::now(),
                }))
            }
            Err(err) => {
                tracing::error!(error = %err, failed_index = ?err.failed_index(), "checkout failed");
                self.phase = Phase::Failed {
                    message: err.to_string(),
                };
                Err(err)
            }
        }
    }

    async fn place(
        &self,
        customer_name: &str,
        lines: &[CartLine],
    ) -> Result<(OrderId, Vec<Option<OrderItemId>>), CheckoutError> {
        let order = self
            .api
            .create_order(NewOrder {
                customer_name: customer_name.to_string(),
            })
            .await
            .map_err(CheckoutError::OrderCreation)?;
        let order_id = order.order_id;
        tracing::debug!(
            order_id = %order_id,
            lines = lines.len(),
            server_message = order.message.as_deref().unwrap_or_default(),
            "order created"
        );

        let mut item_ids = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            let created = self
                .api
                .create_order_item(NewOrderItem {
                    order_id,
                    product_id: line.id,
                    quantity: line.quantity,
                })
                .await
                .map_err(|source| CheckoutError::OrderItem {
                    index,
                    product_id: line.id,
                    order_id,
                    source,
                })?;
            tracing::debug!(
                index,
                order_item_id = ?created.order_item_id,
                server_message = created.message.as_deref().unwrap_or_default(),
                "order item created"
            );
            item_ids.push(created.order_item_id);
        }

        Ok((order_id, item_ids))
    }
}
