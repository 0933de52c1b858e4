//! End-to-end runs of the CheeseMap rule set against a drifted schema

use schemamend_rules::cheesemap_rule_set;

const DRIFTED: &str = include_str!("fixtures/drifted.prisma");

fn mend(source: &str) -> String {
    cheesemap_rule_set()
        .unwrap()
        .apply(source.to_string())
        .unwrap()
        .buffer
}

fn block<'a>(source: &'a str, model: &str) -> &'a str {
    let header = format!("model {} {{", model);
    let start = source.find(&header).unwrap();
    let end = source[start..].find("\n}").unwrap();
    &source[start..start + end + 2]
}

#[test]
fn booking_model_renamed_with_mapping() {
    let out = mend(DRIFTED);

    assert!(out.contains("model TourBooking {"));
    assert!(!out.contains("model Booking {"));
    assert!(out.contains("@@map(\"tour_bookings\")"));
    assert!(!out.contains("@@map(\"bookings\")"));

    // list types follow the rename, the status enum does not
    assert!(out.contains("TourBooking[]"));
    assert!(out.contains("enum BookingStatus {"));

    // unrelated blocks keep their mappings
    assert!(out.contains("@@map(\"users\")"));
    assert!(out.contains("@@map(\"orders\")"));
}

#[test]
fn aging_log_renamed_and_patched() {
    let out = mend(DRIFTED);
    let aging = block(&out, "AgingLog");

    assert!(!out.contains("BatchAgingLog"));
    assert!(out.contains("@@map(\"aging_logs\")"));
    assert!(out.contains("agingLogs   AgingLog[]"));

    assert!(aging.contains("weightKg    Float?"));
    assert!(aging.contains("notes       String?"));
    assert!(aging.contains("photos      Json?"));
    assert!(aging.contains("loggedBy    String\n"));
    assert!(!aging.contains("actionTaken"));
    assert!(!aging.contains("visualNotes"));
}

#[test]
fn farm_batch_fields_inserted_before_status() {
    let out = mend(DRIFTED);
    let farm = block(&out, "FarmBatch");

    let quantity = farm.find("initialQuantityKg").unwrap();
    let humidity = farm.find("humidity").unwrap();
    let status = farm.find("status      BatchStatus").unwrap();
    assert!(quantity < humidity && humidity < status);

    // declared insertion order is preserved
    assert!(farm.contains(
        "  initialQuantityKg Float\n  currentQuantityKg Float\n  pricePerKg        Float\n"
    ));
}

#[test]
fn order_gains_delivery_and_cancellation_fields() {
    let out = mend(DRIFTED);
    let order = block(&out, "Order");

    assert!(order.contains("orderType       OrderType?"));
    assert!(order.contains("deliveryMethod  String?"));
    assert!(order.contains("total           Float\n  totalAmount Float"));
    assert!(order.contains("cancelledBy     String?"));
    assert!(order.contains("refundStatus    String?"));
}

#[test]
fn order_item_inventory_made_required() {
    let out = mend(DRIFTED);
    let item = block(&out, "OrderItem");

    assert!(item.contains("inventoryId String\n"));
    assert!(item.contains("inventory   ShopInventory @relation"));
    assert!(item.contains("pricePerUnit Float"));
    assert!(item.contains("subtotal     Float"));
}

#[test]
fn schedule_and_booking_are_linked_symmetrically() {
    let out = mend(DRIFTED);

    let schedule = block(&out, "TourSchedule");
    assert!(schedule.contains("maxParticipants Int"));
    assert!(schedule.contains("priceOverride   Float?"));
    assert!(schedule.contains("notes           String?\n  bookings        TourBooking[]"));

    let booking = block(&out, "TourBooking");
    assert!(booking.contains("bookingNumber  String        @unique\n  scheduleId        String"));
}

#[test]
fn booking_customer_fields_and_index() {
    let out = mend(DRIFTED);
    let booking = block(&out, "TourBooking");

    assert!(booking.contains("customerId"));
    assert!(booking.contains("fields: [customerId]"));
    assert!(booking.contains("customerName      String"));
    assert!(booking.contains("customerEmail     String"));
    assert!(booking.contains("customerPhone     String?"));
    assert!(booking.contains("participants      Int"));
    assert!(booking.contains("pricePerPerson    Float\n  totalPrice        Float"));
    assert!(booking.contains("status            BookingStatus @default(PENDING)"));
    assert!(!booking.contains("paymentStatus"));
    assert!(!booking.contains("guestName"));
    assert!(booking.contains("@@index([customerId, status])"));
}

#[test]
fn block_scoping_leaves_order_amount_alone() {
    let out = mend(DRIFTED);

    // TourBooking's totalAmount was split; Order's must survive
    let order = block(&out, "Order");
    assert!(order.contains("totalAmount Float"));
    let booking = block(&out, "TourBooking");
    assert!(!booking.contains("totalAmount"));
}

#[test]
fn business_and_verification_patched() {
    let out = mend(DRIFTED);

    let business = block(&out, "Business");
    assert!(business.contains("// Stripe Connect\n  stripeAccountId         String?"));
    assert!(business.contains("deliverySettings DeliverySettings?"));

    let verification = block(&out, "VerificationRequest");
    assert!(verification.contains("reviewNotes   String?\n  rejectionReason String?"));
    assert!(!verification.contains("adminNotes"));

    assert!(out.contains("model DeliverySettings {"));
    assert!(!out.contains("BusinessDeliverySettings"));
}

#[test]
fn payment_gains_provider_and_settlement_fields() {
    let out = mend(DRIFTED);

    let payment = block(&out, "Payment");
    assert!(payment.contains("provider                String        @default(\"STRIPE\")"));
    // the provider-side id starts its own paragraph after status
    assert!(payment.contains("@default(PENDING)\n\n  providerPaymentId       String?\n"));
    assert!(payment.contains(
        "refundReason          String?\n  paidAt                  DateTime?\n  refundedAt              DateTime?\n  metadata                Json?"
    ));
}

#[test]
fn rule_set_is_idempotent() {
    let once = mend(DRIFTED);
    let twice = mend(&once);
    assert_eq!(once, twice);
}

#[test]
fn second_run_reports_zero_edits() {
    let set = cheesemap_rule_set().unwrap();
    let once = set.apply(DRIFTED.to_string()).unwrap();
    let again = set.apply(once.buffer).unwrap();

    for application in &again.applied {
        assert_eq!(
            application.edits, 0,
            "rule '{}' edited an already-corrected schema",
            application.name
        );
    }
}

#[test]
fn first_run_applies_every_rule() {
    let set = cheesemap_rule_set().unwrap();
    let outcome = set.apply(DRIFTED.to_string()).unwrap();

    for application in &outcome.applied {
        assert!(
            application.edits > 0,
            "rule '{}' found nothing to do in the drifted schema",
            application.name
        );
    }
}
