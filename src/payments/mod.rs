pub mod paystack;
pub mod webhook;

pub use paystack::{
    Bank, ChargeData, CheckoutSession, CreateRecipientParams, Customer, GatewayResponse,
    InitiateTransferParams, PaymentGateway, PaystackClient, RecipientData, RecipientDetails,
    TransferData, is_valid_reference,
};
pub use webhook::{verify_signature, WebhookEvent, SIGNATURE_HEADER};
