//! Marketplace order <-> local order record <-> order service request.

use contracts::domain::a001_connection::aggregate::Connection;
use contracts::domain::a006_marketplace_order::aggregate::{
    order_status, BuyerInfo, MarketplaceOrder, OrderData, OrderItemData, ShippingInfo,
};

use crate::shared::clients::{CreateOrderRequest, OrderItemRequest, OrderShippingAddress};
use crate::shared::marketplaces::types::ExternalOrder;

pub fn to_local(connection: &Connection, ext: &ExternalOrder) -> MarketplaceOrder {
    let mut order = MarketplaceOrder::new_for_insert(
        connection.id,
        connection.platform,
        ext.external_order_id.clone(),
        order_status::normalize(&ext.status).to_string(),
    );

    let items: Vec<OrderItemData> = ext
        .items
        .iter()
        .map(|i| OrderItemData {
            external_product_id: i.external_product_id.clone(),
            internal_product_id: None,
            sku: i.external_sku.clone(),
            name: i.name.clone(),
            quantity: i.quantity,
            unit_price: i.unit_price,
            total_price: i.total_price,
            variant_name: None,
        })
        .collect();
    let subtotal: f64 = items.iter().map(|i| i.total_price).sum();

    let data = OrderData {
        items,
        subtotal_amount: subtotal,
        marketplace_status: ext.status.clone(),
        paid_at: ext.paid_at,
        ..Default::default()
    };
    let buyer = BuyerInfo {
        name: ext.buyer_name.clone(),
        user_id: (!ext.buyer_id.is_empty()).then(|| ext.buyer_id.clone()),
        ..Default::default()
    };
    let address = &ext.shipping_address;
    let shipping = ShippingInfo {
        recipient_name: address.name.clone(),
        phone: address.phone.clone(),
        address_line1: address.address.clone(),
        address_line2: None,
        city: address.city.clone(),
        state: address.state.clone(),
        postal_code: address.zip_code.clone(),
        country: address.country.clone(),
        courier: (!ext.carrier.is_empty()).then(|| ext.carrier.clone()),
        tracking_number: (!ext.tracking_number.is_empty()).then(|| ext.tracking_number.clone()),
    };

    order.order_data = serde_json::to_value(data).unwrap_or_default();
    order.buyer_info = serde_json::to_value(buyer).unwrap_or_default();
    order.shipping_info = serde_json::to_value(shipping).unwrap_or_default();
    order.total_amount = ext.total_amount;
    if !ext.currency.is_empty() {
        order.currency = ext.currency.clone();
    }
    order.created_at = ext.created_at;
    order.updated_at = ext.updated_at;
    order
}

pub fn order_data(order: &MarketplaceOrder) -> OrderData {
    serde_json::from_value(order.order_data.clone()).unwrap_or_default()
}

pub fn shipping_info(order: &MarketplaceOrder) -> ShippingInfo {
    serde_json::from_value(order.shipping_info.clone()).unwrap_or_default()
}

/// Запрос на создание заказа во внутреннем сервисе
pub fn create_request(order: &MarketplaceOrder) -> CreateOrderRequest {
    let data = order_data(order);
    let buyer: BuyerInfo = serde_json::from_value(order.buyer_info.clone()).unwrap_or_default();
    let shipping = shipping_info(order);

    let customer_name = if buyer.name.is_empty() {
        shipping.recipient_name.clone()
    } else {
        buyer.name.clone()
    };
    let customer_phone = if buyer.phone.is_empty() {
        shipping.phone.clone()
    } else {
        buyer.phone.clone()
    };

    CreateOrderRequest {
        external_order_id: order.external_order_id.clone(),
        source: order.platform.code().to_string(),
        customer_name,
        customer_email: buyer.email,
        customer_phone,
        shipping_address: OrderShippingAddress {
            name: shipping.recipient_name,
            phone: shipping.phone,
            address_1: shipping.address_line1,
            address_2: shipping.address_line2.unwrap_or_default(),
            city: shipping.city,
            state: shipping.state,
            country: shipping.country,
            postal_code: shipping.postal_code,
        },
        items: data
            .items
            .iter()
            .map(|i| OrderItemRequest {
                product_id: i.internal_product_id,
                variant_id: None,
                sku: i.sku.clone(),
                name: i.name.clone(),
                quantity: i.quantity,
                unit_price: i.unit_price,
                total_price: i.total_price,
            })
            .collect(),
        total_amount: order.total_amount,
        currency: order.currency.clone(),
        status: order.status.clone(),
        paid_at: data.paid_at,
    }
}
