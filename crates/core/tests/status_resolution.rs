//! Integration tests for lifecycle status derivation.

use jiff::{Timestamp, ToSpan};
use testresult::TestResult;

use shopifree::{
    coupons::Coupon,
    discounts::CouponDiscount,
    status::{DiscountRecord, LifecycleStatus, resolve_status},
    usage::UsageCap,
    window::DiscountWindow,
};

fn coupon(window: DiscountWindow) -> Coupon {
    Coupon {
        name: "Launch".to_string(),
        code: "LAUNCH".to_string(),
        discount: CouponDiscount::FreeShipping,
        window,
        paused: false,
        usage_cap: UsageCap {
            max_uses: Some(100),
            uses_per_customer: Some(1),
        },
        total_uses: 12,
        is_recovery_coupon: false,
    }
}

#[test]
fn status_is_total_over_a_sweep_of_instants() -> TestResult {
    let start: Timestamp = "2026-05-01T00:00:00Z".parse()?;
    let end: Timestamp = "2026-05-10T00:00:00Z".parse()?;

    let windows = [
        DiscountWindow::bounded(start, end),
        DiscountWindow::bounded(end, start),
        DiscountWindow::open_ended(start),
    ];

    for window in windows {
        for offset in -20..=20 {
            let now = start.checked_add((offset * 24).hours())?;

            for paused in [false, true] {
                let first = resolve_status(now, &window, paused);
                let second = resolve_status(now, &window, paused);

                assert_eq!(first, second, "status should be stable at {now}");

                if paused {
                    assert_eq!(first, LifecycleStatus::Paused);
                }
            }
        }
    }

    Ok(())
}

#[test]
fn resuming_recomputes_instead_of_forcing_active() -> TestResult {
    let window = DiscountWindow::bounded(
        "2026-05-01T00:00:00Z".parse()?,
        "2026-05-10T00:00:00Z".parse()?,
    );

    let mut paused = coupon(window);
    paused.paused = true;

    let after_end: Timestamp = "2026-06-01T00:00:00Z".parse()?;

    assert_eq!(paused.status_at(after_end), LifecycleStatus::Paused);

    paused.paused = false;

    assert_eq!(paused.status_at(after_end), LifecycleStatus::Expired);

    Ok(())
}

#[test]
fn live_usage_overrides_cached_counter() -> TestResult {
    let coupon = coupon(DiscountWindow::open_ended("2026-05-01T00:00:00Z".parse()?));
    let now: Timestamp = "2026-05-05T00:00:00Z".parse()?;

    let cached = coupon.state_at(now, None);

    assert_eq!(cached.uses, 12);
    assert!(!cached.exhausted);

    let live = coupon.state_at(now, Some(100));

    assert_eq!(live.uses, 100);
    assert!(live.exhausted, "live count at the cap should be exhausted");
    assert_eq!(live.status, LifecycleStatus::Active);

    Ok(())
}

#[test]
fn expired_coupons_can_still_be_paused() -> TestResult {
    let mut coupon = coupon(DiscountWindow::bounded(
        "2026-01-01T00:00:00Z".parse()?,
        "2026-01-02T00:00:00Z".parse()?,
    ));
    coupon.paused = true;

    assert_eq!(
        coupon.status_at("2026-03-01T00:00:00Z".parse()?),
        LifecycleStatus::Paused
    );

    Ok(())
}
