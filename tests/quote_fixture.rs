//! Integration tests for YAML quote fixtures

use std::path::PathBuf;

use rusty_money::{Money, iso::SAR};
use testresult::TestResult;

use bazaar::fixtures::QuoteFixture;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos/quotes")
        .join(name)
}

#[test]
fn deep_clean_quote_prices_correctly() -> TestResult {
    let fixture = QuoteFixture::from_path(demo("deep-clean.yml"))?;

    let pricing = fixture.quote()?;

    // 180.00 + 2 * 45.50 = 271.00, less 20.00, plus 15% VAT, less 15.00 of points.
    assert_eq!(pricing.subtotal, Money::from_minor(27_100, SAR));
    assert_eq!(pricing.tax, Money::from_minor(3_765, SAR));
    assert_eq!(pricing.total, Money::from_minor(27_365, SAR));
    assert_eq!(pricing.total_duration.as_mins(), 230);

    Ok(())
}

#[test]
fn deep_clean_summary_renders() -> TestResult {
    let fixture = QuoteFixture::from_path(demo("deep-clean.yml"))?;

    let mut out = Vec::new();
    fixture.summary()?.write_to(&mut out)?;
    let rendered = String::from_utf8(out)?;

    assert!(rendered.contains("Sofa shampoo"), "{rendered}");
    assert!(rendered.contains("Coupon (WELCOME20)"), "{rendered}");
    assert!(rendered.contains("VAT 15% (reg. 310122393500003)"), "{rendered}");
    assert!(rendered.contains("Points (150)"), "{rendered}");
    assert!(rendered.contains("3h 50m"), "{rendered}");
    assert!(!rendered.contains("When:"), "{rendered}");
    assert!(!rendered.contains("Payment:"), "{rendered}");

    Ok(())
}
