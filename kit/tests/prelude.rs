use pretty_assertions::assert_eq;
use serde_json::json;
use trellis::prelude::*;

#[test]
fn test_prelude_drives_a_page() {
    trellis::init_stdout_tracing();
    trellis::init_stdout_tracing();

    let mut page = Page::load(
        r#"<html><body><form id="login"><input id="user" name="user"></form></body></html>"#,
        RuntimeConfig::default(),
    );
    let errors = page.init(&json!({"validate": {"user": [["required", "Who are you?"]]}}));
    assert!(errors.is_empty());

    assert_eq!(page.submit("login").unwrap(), SubmitOutcome::Blocked);
    let user = page.state::<FieldState>("user").unwrap();
    assert_eq!(user.message.as_deref(), Some("Who are you?"));
}
