//! Bazaar prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    amounts::{AmountError, MinorUnits, Minutes},
    api::{
        ApiError, ChatApi, CouponRequest, CouponValidation, CouponValidator, HttpApi, OrdersApi,
        SlotProvider, SlotQuery, TimeSlot,
    },
    catalog::{CategoryId, LineItem, LineItems, SubItem, SubItemId, VendorId},
    chat::{
        ChatAction, ChatError, ChatSession, ChatState, Conversation, ConversationId, Delivery,
        InboundDisposition, InboundMessage, LocalMessageId, Message, Outbox, PendingSend,
        RealtimeChannel, RealtimeEvent, Sender, ServerMessage, ServerMessageId, UserId,
        session::SendOutcome,
    },
    checkout::{
        Checkout, CheckoutError,
        contact::{ContactDetails, CustomerProfile},
        order::{OrderLine, OrderRequest, PlacedOrder},
        payment::{PaymentType, PointsRate, PointsRedemption, RemainderMethod},
        schedule::{OrderType, SlotStatus},
        steps::{CheckoutStep, Step},
        validation::{FieldError, FieldId, ValidationErrors},
    },
    config::{Config, ConfigError},
    context::{AppContext, AppInitError},
    fixtures::{FixtureError, QuoteFixture},
    pricing::{AppliedCoupon, AppliedVat, PricingInput, PricingResult, VatSettings, VatSource, calculate},
    summary::{Summary, SummaryError},
};
