use super::*;

#[test]
fn parses_hex_forms() {
    assert_eq!(CssColor::parse("#fff"), Some(CssColor::WHITE));
    assert_eq!(
        CssColor::parse("#89B4FA"),
        Some(CssColor::rgba(0x89, 0xb4, 0xfa, 255))
    );
    assert_eq!(
        CssColor::parse("#0000ff80"),
        Some(CssColor::rgba(0, 0, 255, 0x80))
    );
    assert_eq!(CssColor::parse("#12"), None);
    assert_eq!(CssColor::parse("#zzzzzz"), None);
}

#[test]
fn parses_rgb_functions() {
    assert_eq!(
        CssColor::parse("rgba(0, 0, 0, 0.5)"),
        Some(CssColor::rgba(0, 0, 0, 128))
    );
    assert_eq!(
        CssColor::parse("rgb(10 20 30)"),
        Some(CssColor::rgba(10, 20, 30, 255))
    );
    assert_eq!(CssColor::parse("rgb(1, 2)"), None);
}

#[test]
fn parses_names_and_falls_back() {
    assert_eq!(CssColor::parse(" White "), Some(CssColor::WHITE));
    assert_eq!(
        CssColor::parse_or(Some("not-a-color"), CssColor::BLACK),
        CssColor::BLACK
    );
    assert_eq!(CssColor::parse_or(None, CssColor::WHITE), CssColor::WHITE);
}

#[test]
fn premul_conversion() {
    let c = CssColor::rgba(255, 255, 255, 0).to_premul();
    assert_eq!(c, Rgba8Premul::transparent());
}
