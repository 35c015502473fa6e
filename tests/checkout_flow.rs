//! Integration tests for the checkout wizard, end to end

use std::num::NonZeroU32;

use jiff::civil::{Time, date};
use rust_decimal::Decimal;
use rusty_money::iso::SAR;
use testresult::TestResult;

use bazaar::{
    amounts::{MinorUnits, Minutes},
    api::{
        CouponValidation, MockCouponValidator, MockOrdersApi, MockSlotProvider, SlotTechnician,
        TimeSlot,
    },
    catalog::{CategoryId, SubItem, SubItemId, VendorId},
    checkout::{
        Checkout, CheckoutError,
        contact::CustomerProfile,
        order::PlacedOrder,
        payment::{PaymentType, PointsRate, RemainderMethod},
        schedule::OrderType,
        steps::{CheckoutStep, Step},
        validation::FieldId,
    },
    pricing::VatSettings,
    summary::Summary,
};

fn service(id: u64, price_minor: i64, minutes: u32) -> SubItem {
    SubItem {
        id: SubItemId(id),
        name: format!("Service {id}"),
        price: MinorUnits::new(price_minor),
        duration: Minutes::new(minutes),
    }
}

fn slot(time: &str, available_count: u32) -> TimeSlot {
    TimeSlot {
        time: time.to_string(),
        available_count,
        available_technicians: (0..available_count)
            .map(|id| SlotTechnician {
                id: u64::from(id),
                name: format!("Technician {id}"),
            })
            .collect(),
    }
}

fn profile() -> CustomerProfile {
    CustomerProfile {
        name: "Noor Haddad".to_string(),
        phone: "+966500000000".to_string(),
        address: Some("12 Olaya St, Riyadh".to_string()),
        points_balance: 600,
    }
}

/// A checkout with a category, a 5% VAT vendor and 250.00 / 150 minutes of
/// services, standing on the address step.
fn at_address_step() -> TestResult<Checkout> {
    let rate = PointsRate::new(Decimal::TEN).ok_or("invalid rate")?;
    let mut checkout = Checkout::new(SAR, rate);
    checkout.set_profile(profile());

    checkout.select_category(CategoryId(3));
    checkout.next()?;

    checkout.select_vendor(
        VendorId(42),
        Some(VatSettings {
            enabled: true,
            rate: Decimal::from(5),
            registration_number: Some("300000000000003".to_string()),
        }),
    );
    checkout.next()?;

    checkout.add_item(service(1, 10_000, 60), NonZeroU32::new(2).ok_or("qty")?);
    checkout.add_item(service(2, 5_000, 30), NonZeroU32::MIN);
    checkout.next()?;

    assert_eq!(checkout.step(), Step::Checkout(CheckoutStep::AddressSchedule));

    Ok(checkout)
}

#[test]
fn steps_cannot_be_skipped() -> TestResult {
    let rate = PointsRate::new(Decimal::TEN).ok_or("invalid rate")?;
    let mut checkout = Checkout::new(SAR, rate);

    let Err(CheckoutError::Invalid(errors)) = checkout.next() else {
        panic!("expected the category step to block");
    };

    assert!(errors.contains(FieldId::Category));
    assert_eq!(checkout.step(), Step::Category);
    assert!(matches!(checkout.back(), Err(CheckoutError::AtFirstStep)));

    Ok(())
}

#[tokio::test]
async fn scheduled_card_order_with_coupon() -> TestResult {
    let mut checkout = at_address_step()?;

    assert_eq!(checkout.contact().name, "Noor Haddad");
    assert_eq!(checkout.contact().address, "12 Olaya St, Riyadh");

    checkout.set_date(date(2026, 11, 2));

    let mut slots = MockSlotProvider::new();
    slots
        .expect_available_slots()
        .withf(|query| {
            query.vendor == VendorId(42)
                && query.date == date(2026, 11, 2)
                && query.service_duration == Minutes::new(150)
        })
        .once()
        .return_once(|_| Ok(vec![slot("09:00", 2), slot("11:30", 0)]));

    assert!(checkout.refresh_slots(&slots).await?);

    let full = Time::constant(11, 30, 0, 0);
    assert!(matches!(
        checkout.select_time(full),
        Err(CheckoutError::SlotUnavailable(time)) if time == full
    ));

    checkout.select_time(Time::constant(9, 0, 0, 0))?;
    checkout.next()?;

    checkout.set_payment_type(PaymentType::Card);

    let mut coupons = MockCouponValidator::new();
    coupons
        .expect_validate_coupon()
        .withf(|request| request.code == "SAVE50" && request.subtotal == Decimal::from(250))
        .once()
        .return_once(|_| {
            Ok(CouponValidation {
                code: "SAVE50".to_string(),
                discount: MinorUnits::new(5_000),
            })
        });

    checkout.apply_coupon(&coupons, " SAVE50 ").await?;

    assert_eq!(checkout.pricing().total.to_minor_units(), 21_000);

    checkout.next()?;

    let Err(CheckoutError::Invalid(errors)) = checkout.order_request() else {
        panic!("terms have not been accepted yet");
    };
    assert!(errors.contains(FieldId::Terms));

    checkout.accept_terms(true);

    let mut rendered = Vec::new();
    Summary::from_checkout(&mut checkout).write_to(&mut rendered)?;
    let rendered = String::from_utf8(rendered)?;
    assert!(rendered.contains("When: 2026-11-02 at 09:00"), "{rendered}");

    let mut orders = MockOrdersApi::new();
    orders
        .expect_place_order()
        .withf(|order| {
            order.order_type == OrderType::Scheduled
                && order.scheduled_time == Some(Time::constant(9, 0, 0, 0))
                && order.coupon_code.as_deref() == Some("SAVE50")
                && order.points_used.is_none()
                && order.total == Decimal::from(210)
                && order.items.len() == 2
        })
        .once()
        .return_once(|_| {
            Ok(PlacedOrder {
                id: 1_001,
                status: "pending".to_string(),
            })
        });

    let placed = checkout.place_order(&orders).await?;

    assert_eq!(placed.id, 1_001);
    assert_eq!(checkout.step(), Step::Category);
    assert!(checkout.items().is_empty());
    assert_eq!(checkout.payment().balance(), 600, "profile survives the reset");

    Ok(())
}

#[tokio::test]
async fn immediate_order_paid_with_points_and_cash() -> TestResult {
    let mut checkout = at_address_step()?;

    checkout.set_order_type(OrderType::Now);
    checkout.next()?;

    checkout.set_payment_type(PaymentType::Points);

    let coupons = MockCouponValidator::new();
    assert!(matches!(
        checkout.apply_coupon(&coupons, "SAVE50").await,
        Err(CheckoutError::CouponWithPoints)
    ));

    let Err(CheckoutError::Invalid(errors)) = checkout.next() else {
        panic!("no points have been redeemed yet");
    };
    assert!(errors.contains(FieldId::Points));
    assert_eq!(checkout.payment().remainder(), Some(RemainderMethod::Card));

    // 600 points at 10 per unit buy 60.00 off 262.50.
    let redemption = checkout.redeem_points(5_000)?;
    assert_eq!(redemption.points, 600);
    assert_eq!(checkout.pricing().total.to_minor_units(), 20_250);

    checkout.set_remainder_method(RemainderMethod::Cash)?;
    checkout.next()?;
    checkout.accept_terms(true);

    let mut orders = MockOrdersApi::new();
    orders
        .expect_place_order()
        .withf(|order| {
            order.order_type == OrderType::Now
                && order.scheduled_date.is_none()
                && order.payment_type == PaymentType::Points
                && order.remaining_payment_type == Some(RemainderMethod::Cash)
                && order.points_used == Some(600)
                && order.total == Decimal::new(20_250, 2)
        })
        .once()
        .return_once(|_| {
            Ok(PlacedOrder {
                id: 1_002,
                status: "pending".to_string(),
            })
        });

    checkout.place_order(&orders).await?;

    assert_eq!(checkout.step(), Step::Category);

    Ok(())
}

#[test]
fn removing_services_clamps_redeemed_points() -> TestResult {
    let mut checkout = at_address_step()?;
    checkout.set_payment_type(PaymentType::Points);
    checkout.redeem_points(600)?;

    // Only 52.50 is left to pay: 525 points cover it.
    checkout.remove_item(SubItemId(1));

    assert_eq!(checkout.payment().redemption().points, 525);
    assert_eq!(checkout.pricing().total.to_minor_units(), 0);

    Ok(())
}
