use std::sync::Arc;

use backend::{Ack, TradingBackend};
use common::{
    error::ValidationError,
    models::{Exchange, OrderAction, OrderRequest, OrderType},
    notifications::{Notifier, Toast},
};
use tracing::{error, info};

use crate::error::MonitorError;

pub const ORDER_PLACED: &str = "Order Placed Successfully";
pub const ORDER_FAILED: &str = "Failed to Place Order";
pub const ORDER_FAILED_DETAIL: &str = "There was an error placing your order. Please try again.";

/// Editable order entry state.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderForm {
    instrument: String,
    quantity: u32,
    price: f64,
    exchange: Exchange,
    order_type: OrderType,
    action: OrderAction,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self {
            instrument: String::new(),
            quantity: 1,
            price: 0.0,
            exchange: Exchange::Nse,
            order_type: OrderType::Market,
            action: OrderAction::Buy,
        }
    }
}

impl OrderForm {
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn action(&self) -> OrderAction {
        self.action
    }

    pub fn price_editable(&self) -> bool {
        self.order_type != OrderType::Market
    }

    pub fn set_instrument(&mut self, instrument: &str) {
        self.instrument = instrument.to_string();
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }

    /// Ignored while the order type is MARKET. Returns whether the edit took.
    pub fn set_price(&mut self, price: f64) -> bool {
        if !self.price_editable() {
            return false;
        }
        self.price = price;
        true
    }

    pub fn set_exchange(&mut self, exchange: Exchange) {
        self.exchange = exchange;
    }

    pub fn set_order_type(&mut self, order_type: OrderType) {
        self.order_type = order_type;
    }

    pub fn set_action(&mut self, action: OrderAction) {
        self.action = action;
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.instrument.trim().is_empty() {
            return Err(ValidationError::MissingInstrument);
        }
        if self.quantity < 1 {
            return Err(ValidationError::QuantityTooSmall);
        }
        if self.price_editable() && !(self.price.is_finite() && self.price >= 0.0) {
            return Err(ValidationError::InvalidPrice(self.price));
        }
        Ok(())
    }

    /// The payload as it would be sent. Market orders never carry a price.
    pub fn resolve(&self) -> Result<OrderRequest, ValidationError> {
        self.validate()?;
        Ok(OrderRequest {
            instrument: self.instrument.trim().to_string(),
            quantity: self.quantity,
            price: if self.price_editable() { self.price } else { 0.0 },
            exchange: self.exchange,
            order_type: self.order_type,
            action: self.action,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationPolicy {
    #[default]
    Manual,
    Auto,
}

/// A resolved order waiting for the operator's go-ahead. Only
/// [`OrderDesk::confirm`] sends it; dropping it cancels.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOrder {
    request: OrderRequest,
}

impl PendingOrder {
    pub fn request(&self) -> &OrderRequest {
        &self.request
    }

    pub fn prompt(&self) -> String {
        let r = &self.request;
        let price = if r.order_type == OrderType::Market {
            String::new()
        } else {
            format!(" at {}", r.price)
        };
        format!(
            "Are you sure you want to place a {} order for {} {}{} on {}?",
            r.action, r.quantity, r.instrument, price, r.exchange
        )
    }
}

#[derive(Debug)]
pub enum Submission {
    AwaitingConfirmation(PendingOrder),
    Placed(Ack),
}

pub struct OrderDesk<B: TradingBackend> {
    backend: Arc<B>,
    notifier: Notifier,
    form: OrderForm,
    policy: ConfirmationPolicy,
}

impl<B: TradingBackend> OrderDesk<B> {
    pub fn new(backend: Arc<B>, notifier: Notifier) -> Self {
        Self {
            backend,
            notifier,
            form: OrderForm::default(),
            policy: ConfirmationPolicy::default(),
        }
    }

    pub fn form(&self) -> &OrderForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut OrderForm {
        &mut self.form
    }

    pub fn policy(&self) -> ConfirmationPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ConfirmationPolicy) {
        self.policy = policy;
    }

    /// Manual policy stops at the confirmation step without touching the
    /// backend; auto policy dispatches right away.
    pub async fn submit(&mut self) -> Result<Submission, MonitorError> {
        let request = self.form.resolve()?;
        match self.policy {
            ConfirmationPolicy::Manual => {
                Ok(Submission::AwaitingConfirmation(PendingOrder { request }))
            }
            ConfirmationPolicy::Auto => self.dispatch(request).await.map(Submission::Placed),
        }
    }

    pub async fn confirm(&mut self, pending: PendingOrder) -> Result<Ack, MonitorError> {
        self.dispatch(pending.request).await
    }

    async fn dispatch(&mut self, request: OrderRequest) -> Result<Ack, MonitorError> {
        match self.backend.place_order(&request).await {
            Ok(ack) => {
                let summary = format!(
                    "{} order for {} {} at {}",
                    request.action, request.quantity, request.instrument, request.price
                );
                info!("Order placed: {}", summary);
                self.notifier.notify(Toast::success(ORDER_PLACED, summary));
                self.form = OrderForm::default();
                Ok(ack)
            }
            Err(e) => {
                error!("Error placing order: {}", e);
                self.notifier
                    .notify(Toast::failure(ORDER_FAILED, ORDER_FAILED_DETAIL));
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::notifications::ToastVariant;

    use crate::testing::{Call, MockBackend, RecordingBackend, http_error};

    fn infy_market() -> OrderForm {
        let mut form = OrderForm::default();
        form.set_instrument("INFY");
        form.set_quantity(10);
        form
    }

    #[tokio::test]
    async fn manual_mode_waits_for_confirmation() {
        let backend = Arc::new(RecordingBackend::default());
        let mut desk = OrderDesk::new(backend.clone(), Notifier::default());
        *desk.form_mut() = infy_market();

        let Submission::AwaitingConfirmation(pending) = desk.submit().await.unwrap() else {
            panic!("manual mode must ask for confirmation");
        };
        assert!(backend.calls().is_empty());
        assert_eq!(
            pending.prompt(),
            "Are you sure you want to place a BUY order for 10 INFY on NSE?"
        );

        desk.confirm(pending).await.unwrap();
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn cancelling_sends_nothing() {
        let backend = Arc::new(RecordingBackend::default());
        let mut desk = OrderDesk::new(backend.clone(), Notifier::default());
        *desk.form_mut() = infy_market();

        let submission = desk.submit().await.unwrap();
        drop(submission);

        assert!(backend.calls().is_empty());
        assert_eq!(desk.form(), &infy_market());
    }

    #[tokio::test]
    async fn auto_mode_places_immediately_and_resets() {
        let expected = OrderRequest {
            instrument: "INFY".to_string(),
            quantity: 10,
            price: 0.0,
            exchange: Exchange::Nse,
            order_type: OrderType::Market,
            action: OrderAction::Buy,
        };
        let mut backend = MockBackend::new();
        let sent = expected.clone();
        backend
            .expect_place_order()
            .withf(move |order| *order == sent)
            .times(1)
            .returning(|_| Ok(Ack::empty()));
        let notifier = Notifier::default();
        let mut toasts = notifier.subscribe();
        let mut desk = OrderDesk::new(Arc::new(backend), notifier);
        desk.set_policy(ConfirmationPolicy::Auto);
        *desk.form_mut() = infy_market();

        assert!(matches!(desk.submit().await.unwrap(), Submission::Placed(_)));

        let toast = toasts.recv().await.unwrap();
        assert_eq!(toast.title, ORDER_PLACED);
        assert_eq!(toast.description.as_deref(), Some("BUY order for 10 INFY at 0"));
        assert_eq!(desk.form(), &OrderForm::default());
    }

    #[tokio::test]
    async fn market_orders_drop_the_displayed_price() {
        let backend = Arc::new(RecordingBackend::default());
        let mut desk = OrderDesk::new(backend.clone(), Notifier::default());
        desk.set_policy(ConfirmationPolicy::Auto);
        let form = desk.form_mut();
        form.set_instrument("RELIANCE");
        form.set_order_type(OrderType::Limit);
        assert!(form.set_price(2950.5));
        form.set_order_type(OrderType::Market);
        assert!(!form.set_price(3000.0));
        assert_eq!(form.price(), 2950.5);

        desk.submit().await.unwrap();

        let calls = backend.calls();
        let Call::PlaceOrder(sent) = &calls[0] else {
            panic!("expected an order");
        };
        assert_eq!(sent.price, 0.0);
    }

    #[tokio::test]
    async fn limit_prompt_shows_price() {
        let mut desk = OrderDesk::new(Arc::new(MockBackend::new()), Notifier::default());
        let form = desk.form_mut();
        form.set_instrument("TATASTEEL");
        form.set_quantity(5);
        form.set_order_type(OrderType::Limit);
        form.set_price(152.35);
        form.set_exchange(Exchange::Bse);
        form.set_action(OrderAction::Sell);

        let Submission::AwaitingConfirmation(pending) = desk.submit().await.unwrap() else {
            panic!("manual mode must ask for confirmation");
        };
        assert_eq!(
            pending.prompt(),
            "Are you sure you want to place a SELL order for 5 TATASTEEL at 152.35 on BSE?"
        );
    }

    #[tokio::test]
    async fn failure_keeps_the_form_for_retry() {
        let mut backend = MockBackend::new();
        backend
            .expect_place_order()
            .times(1)
            .returning(|_| Err(http_error("place-order")));
        let notifier = Notifier::default();
        let mut toasts = notifier.subscribe();
        let mut desk = OrderDesk::new(Arc::new(backend), notifier);
        desk.set_policy(ConfirmationPolicy::Auto);
        *desk.form_mut() = infy_market();

        let err = desk.submit().await.unwrap_err();

        assert!(matches!(err, MonitorError::Backend(_)));
        assert_eq!(desk.form(), &infy_market());
        let toast = toasts.recv().await.unwrap();
        assert_eq!(toast.title, ORDER_FAILED);
        assert_eq!(toast.variant, ToastVariant::Destructive);
    }

    #[tokio::test]
    async fn invalid_forms_never_reach_the_backend() {
        let mut desk = OrderDesk::new(Arc::new(MockBackend::new()), Notifier::default());
        desk.set_policy(ConfirmationPolicy::Auto);

        assert!(matches!(
            desk.submit().await,
            Err(MonitorError::Validation(ValidationError::MissingInstrument))
        ));

        desk.form_mut().set_instrument("  ");
        assert!(matches!(
            desk.submit().await,
            Err(MonitorError::Validation(ValidationError::MissingInstrument))
        ));

        desk.form_mut().set_instrument("INFY");
        desk.form_mut().set_quantity(0);
        assert!(matches!(
            desk.submit().await,
            Err(MonitorError::Validation(ValidationError::QuantityTooSmall))
        ));

        desk.form_mut().set_quantity(1);
        desk.form_mut().set_order_type(OrderType::StopLoss);
        desk.form_mut().set_price(-1.0);
        assert!(matches!(
            desk.submit().await,
            Err(MonitorError::Validation(ValidationError::InvalidPrice(_)))
        ));
    }
}
