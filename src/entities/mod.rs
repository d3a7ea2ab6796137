pub mod client;
pub mod material;
pub mod order;
pub mod order_item;
pub mod payment_installment;
pub mod user;
