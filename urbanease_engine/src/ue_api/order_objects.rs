use serde::{Deserialize, Serialize};

use crate::{
    db_types::{
        LineItem,
        NewOrder,
        OrderId,
        OrderStatus,
        Paise,
        Payment,
        PaymentMethod,
        ShippingAddress,
        StatusGuard,
        UserId,
        DEFAULT_PAYMENT_METHOD_HINT,
    },
    ue_api::errors::OrderFlowError,
};

/// Caller totals may differ from the recomputed total by at most this much, to absorb client-side rounding.
pub const TOTAL_TOLERANCE: Paise = Paise::ONE_PAISA;

/// A checkout request, as submitted by the storefront.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    #[serde(default)]
    pub products: Vec<LineItem>,
    #[serde(default)]
    pub total: Paise,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
}

impl NewOrderRequest {
    pub fn new(products: Vec<LineItem>, total: Paise, shipping_address: ShippingAddress) -> Self {
        Self { products, total, payment_method: None, shipping_address }
    }

    pub fn with_payment_method<S: Into<String>>(mut self, method: S) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    /// The sum of `quantity × unit price` over all line items. `None` if the sum cannot be represented.
    pub fn computed_total(&self) -> Option<Paise> {
        self.products.iter().try_fold(Paise::default(), |total, item| total.checked_add(item.subtotal()?))
    }

    /// Checks the request for completeness. If `verify_total` is set, the caller's total must also agree with the
    /// line items.
    pub fn validate(&self, verify_total: bool) -> Result<(), OrderFlowError> {
        let invalid = |msg: &str| Err(OrderFlowError::ValidationError(msg.to_string()));
        let too_large = || OrderFlowError::ValidationError("Order total is too large".to_string());
        if self.products.is_empty() {
            return invalid("Order must contain at least one product");
        }
        if self.products.iter().any(|p| p.product_id.trim().is_empty()) {
            return invalid("Every product needs a product id");
        }
        if self.products.iter().any(|p| p.quantity < 1) {
            return invalid("Product quantity must be at least 1");
        }
        if self.products.iter().any(|p| p.unit_price.value() < 0) {
            return invalid("Product price cannot be negative");
        }
        if !self.total.is_positive() {
            return invalid("Order total must be greater than zero");
        }
        let shipping = &self.shipping_address;
        if shipping.name.trim().is_empty() {
            return invalid("Shipping name is required");
        }
        if shipping.address.trim().is_empty() {
            return invalid("Shipping address is required");
        }
        if shipping.phone.trim().is_empty() {
            return invalid("Shipping phone is required");
        }
        let expected = self.computed_total().ok_or_else(too_large)?;
        if verify_total {
            let diff = expected.checked_sub(self.total).ok_or_else(too_large)?.value().unsigned_abs();
            if diff > TOTAL_TOLERANCE.value().unsigned_abs() {
                return Err(OrderFlowError::ValidationError(format!(
                    "Order total {} does not match the products, which add up to {expected}",
                    self.total
                )));
            }
        }
        Ok(())
    }

    /// Converts the (validated) request into a storable order for `owner`.
    ///
    /// The payment record starts out pending. Its method follows the checkout hint when we recognise it, and is UPI
    /// otherwise.
    pub fn into_new_order(self, owner: UserId) -> NewOrder {
        let payment_method = self
            .payment_method
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD_HINT.to_string());
        let method = PaymentMethod::from_hint(&payment_method).unwrap_or_default();
        NewOrder {
            owner_id: owner,
            products: self.products,
            total: self.total,
            payment_method,
            payment: Payment::pending(method),
            shipping_address: self.shipping_address,
        }
    }
}

/// How privileged callers may move orders between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Any status may be set from any other status.
    #[default]
    Permissive,
    /// Orders only move forward along the fulfilment path, or get cancelled. Terminal orders are frozen.
    ForwardOnly,
}

impl StatusPolicy {
    pub fn guard_for(&self, target: OrderStatus) -> StatusGuard {
        match self {
            StatusPolicy::Permissive => StatusGuard::Any,
            StatusPolicy::ForwardOnly => StatusGuard::From(target.forward_predecessors()),
        }
    }
}

/// Everything a client needs to hand the customer over to a UPI app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpiPaymentRequest {
    pub order_id: OrderId,
    pub upi_uri: String,
    pub vpa: String,
    pub payee_name: String,
    pub amount: Paise,
    pub note: String,
    pub payment: Option<Payment>,
}
