use rust_decimal::Decimal;

use super::*;

fn page(body: &str) -> String {
    format!("<!DOCTYPE html><html><head><title>t</title></head><body>{body}</body></html>")
}

const TITLE_SPAN: &str =
    r#"<span id="productTitle" class="a-size-large">   Acme Kettle, 1.5L, Steel   </span>"#;

#[test]
fn extracts_title_and_offscreen_price() {
    let html = page(&format!(
        r#"{TITLE_SPAN}
        <span id="tp_price_block_total_price_ww">
          <span class="a-price">
            <span class="a-offscreen">₹1,299.00</span>
            <span aria-hidden="true"><span class="a-price-whole">1,299<span class="a-price-decimal">.</span></span></span>
          </span>
        </span>"#
    ));

    let listing = parse_listing(&html);

    assert_eq!(listing.title.as_deref(), Some("Acme Kettle 1.5L Steel"));
    assert_eq!(listing.price, Price::Amount(Decimal::new(129_900, 2)));
}

#[test]
fn falls_back_to_whole_units_fragment() {
    let html = page(&format!(
        r#"{TITLE_SPAN}
        <span id="tp_price_block_total_price_ww">
          <span class="a-price-whole">95<span class="a-price-decimal">.</span></span>
        </span>"#
    ));

    let listing = parse_listing(&html);
    assert_eq!(listing.price, Price::Amount(Decimal::new(95, 0)));
}

#[test]
fn offscreen_wins_over_whole_when_both_present() {
    let html = page(
        r#"<span id="tp_price_block_total_price_ww">
             <span class="a-price-whole">100.</span>
             <span class="a-offscreen">₹95.50</span>
           </span>"#,
    );
    assert_eq!(
        parse_listing(&html).price,
        Price::Amount(Decimal::new(9_550, 2))
    );
}

#[test]
fn missing_price_block_is_not_available() {
    let html = page(&format!(
        r#"{TITLE_SPAN}<span class="a-offscreen">₹10.00</span>"#
    ));

    let listing = parse_listing(&html);
    assert!(listing.title.is_some(), "title must survive a missing price");
    assert_eq!(listing.price, Price::NotAvailable);
}

#[test]
fn price_block_without_known_inner_form_is_not_available() {
    let html = page(r#"<span id="tp_price_block_total_price_ww"><b>₹10</b></span>"#);
    assert_eq!(parse_listing(&html).price, Price::NotAvailable);
}

#[test]
fn missing_title_is_none_but_price_still_extracted() {
    let html = page(
        r#"<span id="tp_price_block_total_price_ww"><span class="a-offscreen">₹499</span></span>"#,
    );

    let listing = parse_listing(&html);
    assert_eq!(listing.title, None);
    assert_eq!(listing.price, Price::Amount(Decimal::new(499, 0)));
}

#[test]
fn blank_title_is_none() {
    let html = page(r#"<span id="productTitle">   </span>"#);
    assert_eq!(parse_listing(&html).title, None);
}

#[test]
fn non_numeric_price_text_is_invalid() {
    let html = page(
        r#"<span id="tp_price_block_total_price_ww"><span class="a-offscreen">Currently unavailable</span></span>"#,
    );
    assert!(matches!(parse_listing(&html).price, Price::Invalid(_)));
}

#[test]
fn garbage_input_degrades_to_sentinels() {
    let listing = parse_listing("<<<not really html");
    assert_eq!(listing.title, None);
    assert_eq!(listing.price, Price::NotAvailable);
}
