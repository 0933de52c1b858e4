//! The CheeseMap rule set
//!
//! The fixed, ordered list of rules that brings `schema.prisma` in line
//! with the evolved CheeseMap data model. Order is load-bearing: the two
//! model renames run first so every later block-scoped rule anchors on the
//! new names, and the booking index rewrite runs after both fields it
//! mentions exist. `RuleSet::new` verifies these dependencies.

use crate::field_patch::{InsertFields, Position, RemoveField, ReplaceField, UpdateAnnotation};
use crate::relation::{LinkRelation, RequireRelation};
use crate::rename::{RenameField, RenameModel};
use crate::ruleset::{OrderingError, Rule, RuleSet};

/// All CheeseMap rules in application order.
pub fn cheesemap_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(RenameModel {
            name: "rename-booking-model",
            description: "Rename Booking to TourBooking and remap its table",
            old: "Booking",
            new: "TourBooking",
            map: Some(("bookings", "tour_bookings")),
            skip_before: Some("@relation"),
            produces: &["TourBooking"],
        }),
        Box::new(RenameModel {
            name: "rename-aging-log-model",
            description: "Rename BatchAgingLog to AgingLog and remap its table",
            old: "BatchAgingLog",
            new: "AgingLog",
            map: Some(("batch_aging_logs", "aging_logs")),
            skip_before: None,
            produces: &["AgingLog"],
        }),
        Box::new(InsertFields {
            name: "farm-batch-quantity-fields",
            description: "Add quantity, pricing and environment tracking to FarmBatch",
            model: "FarmBatch",
            anchor: "status",
            position: Position::Before,
            fields: &[
                "initialQuantityKg Float",
                "currentQuantityKg Float",
                "pricePerKg        Float",
                "minimumAgeDays    Int              @default(0)",
                "location          String?",
                "temperature       Float?",
                "humidity          Float?",
            ],
            requires: &[],
            produces: &[],
        }),
        Box::new(ReplaceField {
            name: "aging-log-weight-kg",
            description: "Record aging weight explicitly in kilograms",
            model: "AgingLog",
            field: "weight",
            expect_ty: Some("Float?"),
            replacement: &["weightKg    Float?"],
            requires: &["AgingLog"],
            produces: &[],
        }),
        Box::new(ReplaceField {
            name: "aging-log-notes",
            description: "Generalize visualNotes to notes",
            model: "AgingLog",
            field: "visualNotes",
            expect_ty: Some("String?"),
            replacement: &["notes       String?"],
            requires: &["AgingLog"],
            produces: &[],
        }),
        Box::new(RemoveField {
            name: "aging-log-drop-action-taken",
            description: "Drop the unused actionTaken column",
            model: "AgingLog",
            field: "actionTaken",
            requires: &["AgingLog"],
        }),
        Box::new(ReplaceField {
            name: "aging-log-photos",
            description: "Add photo attachments and make loggedBy required",
            model: "AgingLog",
            field: "loggedBy",
            expect_ty: Some("String?"),
            replacement: &["photos      Json?", "loggedBy    String"],
            requires: &["AgingLog"],
            produces: &[],
        }),
        Box::new(ReplaceField {
            name: "order-type-optional",
            description: "Make orderType optional",
            model: "Order",
            field: "orderType",
            expect_ty: Some("OrderType"),
            replacement: &["orderType       OrderType?"],
            requires: &[],
            produces: &[],
        }),
        Box::new(InsertFields {
            name: "order-delivery-fields",
            description: "Add delivery method and notes to Order",
            model: "Order",
            anchor: "orderType",
            position: Position::After,
            fields: &["deliveryMethod  String?", "deliveryNotes   String?"],
            requires: &[],
            produces: &[],
        }),
        Box::new(InsertFields {
            name: "order-total-field",
            description: "Add the order total ahead of totalAmount",
            model: "Order",
            anchor: "totalAmount",
            position: Position::Before,
            fields: &["total           Float"],
            requires: &[],
            produces: &[],
        }),
        Box::new(InsertFields {
            name: "order-cancellation-fields",
            description: "Add cancellation and refund tracking to Order",
            model: "Order",
            anchor: "notes",
            position: Position::After,
            fields: &[
                "cancelledBy     String?",
                "cancellationReason String?",
                "refundStatus    String?",
            ],
            requires: &[],
            produces: &[],
        }),
        Box::new(RequireRelation {
            name: "order-item-required-inventory",
            description: "Order items must reference a shop inventory entry",
            model: "OrderItem",
            scalar: "inventoryId",
            relation: "inventory",
            related: "ShopInventory",
            requires: &[],
        }),
        Box::new(InsertFields {
            name: "order-item-pricing-fields",
            description: "Add per-unit price and subtotal to OrderItem",
            model: "OrderItem",
            anchor: "quantity",
            position: Position::After,
            fields: &["pricePerUnit Float", "subtotal     Float"],
            requires: &[],
            produces: &[],
        }),
        Box::new(InsertFields {
            name: "payment-provider",
            description: "Record the payment provider",
            model: "Payment",
            anchor: "currency",
            position: Position::After,
            fields: &["provider                String        @default(\"STRIPE\")"],
            requires: &[],
            produces: &[],
        }),
        Box::new(InsertFields {
            name: "payment-provider-payment-id",
            description: "Track the provider-side payment id",
            model: "Payment",
            anchor: "status",
            position: Position::After,
            fields: &["", "providerPaymentId       String?"],
            requires: &[],
            produces: &[],
        }),
        Box::new(InsertFields {
            name: "payment-settlement-fields",
            description: "Add settlement timestamps and provider metadata",
            model: "Payment",
            anchor: "refundReason",
            position: Position::After,
            fields: &[
                "paidAt                  DateTime?",
                "refundedAt              DateTime?",
                "metadata                Json?",
            ],
            requires: &[],
            produces: &[],
        }),
        Box::new(InsertFields {
            name: "tour-approval-fields",
            description: "Add approval workflow state to Tour",
            model: "Tour",
            anchor: "status",
            position: Position::After,
            fields: &[
                "approvalStatus          String     @default(\"PENDING\")",
                "isActive                Boolean    @default(false)",
            ],
            requires: &[],
            produces: &[],
        }),
        Box::new(InsertFields {
            name: "tour-schedule-max-participants",
            description: "Track the participant limit per schedule",
            model: "TourSchedule",
            anchor: "maxCapacity",
            position: Position::After,
            fields: &["maxParticipants Int"],
            requires: &[],
            produces: &[],
        }),
        Box::new(InsertFields {
            name: "tour-schedule-extras",
            description: "Add price override and notes to TourSchedule",
            model: "TourSchedule",
            anchor: "isAvailable",
            position: Position::After,
            fields: &["priceOverride   Float?", "notes           String?"],
            requires: &[],
            produces: &["TourSchedule.notes"],
        }),
        Box::new(LinkRelation {
            name: "tour-schedule-booking-link",
            description: "Pair bookings with the schedule they belong to",
            owner: "TourBooking",
            scalar_decl: "scheduleId        String",
            owner_anchor: "bookingNumber",
            related: "TourSchedule",
            collection_decl: "bookings        TourBooking[]",
            related_anchor: "notes",
            requires: &["TourBooking", "TourSchedule.notes"],
            produces: &["TourBooking.scheduleId"],
        }),
        Box::new(RenameField {
            name: "tour-booking-customer-id",
            description: "Bookings belong to customers, not generic users",
            model: "TourBooking",
            old: "userId",
            new: "customerId",
            expect_ty: Some("String"),
            requires: &["TourBooking"],
            produces: &["TourBooking.customerId"],
        }),
        Box::new(ReplaceField {
            name: "tour-booking-customer-name",
            description: "Rename guestName to customerName",
            model: "TourBooking",
            field: "guestName",
            expect_ty: Some("String"),
            replacement: &["customerName      String"],
            requires: &["TourBooking"],
            produces: &[],
        }),
        Box::new(ReplaceField {
            name: "tour-booking-customer-email",
            description: "Rename guestEmail to customerEmail",
            model: "TourBooking",
            field: "guestEmail",
            expect_ty: Some("String"),
            replacement: &["customerEmail     String"],
            requires: &["TourBooking"],
            produces: &[],
        }),
        Box::new(ReplaceField {
            name: "tour-booking-customer-phone",
            description: "Rename guestPhone to customerPhone and make it optional",
            model: "TourBooking",
            field: "guestPhone",
            expect_ty: Some("String"),
            replacement: &["customerPhone     String?"],
            requires: &["TourBooking"],
            produces: &[],
        }),
        Box::new(ReplaceField {
            name: "tour-booking-participants",
            description: "Rename numberOfGuests to participants",
            model: "TourBooking",
            field: "numberOfGuests",
            expect_ty: Some("Int"),
            replacement: &["participants      Int"],
            requires: &["TourBooking"],
            produces: &[],
        }),
        Box::new(ReplaceField {
            name: "tour-booking-pricing",
            description: "Split totalAmount into per-person price and total price",
            model: "TourBooking",
            field: "totalAmount",
            expect_ty: Some("Float"),
            replacement: &["pricePerPerson    Float", "totalPrice        Float"],
            requires: &["TourBooking"],
            produces: &[],
        }),
        Box::new(RemoveField {
            name: "tour-booking-drop-payment-status",
            description: "Payment state now lives on Payment",
            model: "TourBooking",
            field: "paymentStatus",
            requires: &["TourBooking"],
        }),
        Box::new(ReplaceField {
            name: "tour-booking-single-status",
            description: "Collapse bookingStatus into a single status field",
            model: "TourBooking",
            field: "bookingStatus",
            expect_ty: Some("BookingStatus"),
            replacement: &["status            BookingStatus @default(PENDING)"],
            requires: &["TourBooking"],
            produces: &["TourBooking.status"],
        }),
        Box::new(UpdateAnnotation {
            name: "tour-booking-index",
            description: "Re-point the booking index at the renamed fields",
            model: "TourBooking",
            old: "@@index([customerId, bookingStatus])",
            new: "@@index([customerId, status])",
            requires: &["TourBooking.customerId", "TourBooking.status"],
        }),
        Box::new(InsertFields {
            name: "business-stripe-account",
            description: "Add the Stripe Connect account id to Business",
            model: "Business",
            anchor: "website",
            position: Position::After,
            fields: &["", "// Stripe Connect", "stripeAccountId         String?"],
            requires: &[],
            produces: &[],
        }),
        Box::new(ReplaceField {
            name: "verification-review-notes",
            description: "Rename adminNotes to reviewNotes and track rejection reasons",
            model: "VerificationRequest",
            field: "adminNotes",
            expect_ty: Some("String?"),
            replacement: &["reviewNotes   String?", "rejectionReason String?"],
            requires: &[],
            produces: &[],
        }),
        Box::new(RenameModel {
            name: "rename-delivery-settings",
            description: "Rename BusinessDeliverySettings to DeliverySettings",
            old: "BusinessDeliverySettings",
            new: "DeliverySettings",
            map: None,
            skip_before: None,
            produces: &["DeliverySettings"],
        }),
    ]
}

/// The validated CheeseMap rule set.
pub fn cheesemap_rule_set() -> Result<RuleSet, OrderingError> {
    RuleSet::new(cheesemap_rules())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_set_order_is_valid() {
        let set = cheesemap_rule_set().unwrap();
        assert_eq!(set.len(), 32);
    }

    #[test]
    fn test_rule_names_are_unique() {
        let mut names = cheesemap_rule_set().unwrap().names();
        names.sort();
        let before = names.len();
        names.dedup();
        assert_eq!(names.len(), before);
    }

    #[test]
    fn test_renames_run_before_their_dependents() {
        let names = cheesemap_rule_set().unwrap().names();
        let pos = |n: &str| names.iter().position(|x| *x == n).unwrap();

        assert!(pos("rename-booking-model") < pos("tour-booking-customer-id"));
        assert!(pos("rename-aging-log-model") < pos("aging-log-weight-kg"));
        assert!(pos("tour-booking-customer-id") < pos("tour-booking-index"));
        assert!(pos("tour-booking-single-status") < pos("tour-booking-index"));
        assert!(pos("tour-schedule-extras") < pos("tour-schedule-booking-link"));
    }

    #[test]
    fn test_swapped_rename_rejected() {
        // pull rename-aging-log-model behind the rules that need AgingLog
        let mut rules = cheesemap_rules();
        let rename = rules.remove(1);
        rules.push(rename);

        let err = RuleSet::new(rules).unwrap_err();
        let OrderingError::UnmetRequirement { rule, ident, .. } = err;
        assert_eq!(rule, "aging-log-weight-kg");
        assert_eq!(ident, "AgingLog");
    }
}
